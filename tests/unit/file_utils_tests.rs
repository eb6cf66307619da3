/*!
 * Tests for file utility functions
 */

use std::fs;
use anyhow::Result;
use texprep::file_utils::FileManager;
use crate::common;

/// Test that find_files returns matching files sorted, across subdirectories
#[test]
fn test_find_files_withNestedDirs_shouldReturnSortedMatches() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "b.tex", "")?;
    common::create_test_file(temp_dir.path(), "a.STY", "")?;
    common::create_test_file(temp_dir.path(), "chapters/c.tex", "")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "")?;

    let files = FileManager::find_files(temp_dir.path(), &["tex".to_string(), "sty".to_string()])?;
    let names: Vec<String> = files
        .iter()
        .map(|p| p.strip_prefix(temp_dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
        .collect();

    assert_eq!(names, vec!["a.STY", "b.tex", "chapters/c.tex"]);

    Ok(())
}

/// Test that write_backup copies the original next to it
#[test]
fn test_write_backup_withExistingFile_shouldCopyContent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "chapter.tex", "original")?;

    let backup = FileManager::write_backup(&file, ".bak")?;

    assert_eq!(backup, temp_dir.path().join("chapter.tex.bak"));
    assert_eq!(fs::read_to_string(backup)?, "original");

    Ok(())
}

/// Test that write_backup fails for a missing source
#[test]
fn test_write_backup_withMissingFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    assert!(FileManager::write_backup(temp_dir.path().join("gone.tex"), ".bak").is_err());

    Ok(())
}

/// Test that remove_if_exists tolerates missing files
#[test]
fn test_remove_if_exists_withMissingFile_shouldReturnFalse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "main.pdf", "x")?;

    assert!(FileManager::remove_if_exists(&file)?);
    assert!(!FileManager::remove_if_exists(&file)?);

    Ok(())
}

/// Test that tail_lines keeps the last non-empty lines
#[test]
fn test_tail_lines_withLongOutput_shouldKeepLastLines() {
    let text = (1..=30).map(|i| format!("line {}\n\n", i)).collect::<String>();

    let tail = FileManager::tail_lines(&text, 20);

    assert_eq!(tail.len(), 20);
    assert_eq!(tail[0], "line 11");
    assert_eq!(tail[19], "line 30");
}
