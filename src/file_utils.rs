use anyhow::{Context, Result, anyhow};
use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @returns: Size in bytes, None if the file is absent or unreadable
    pub fn file_size<P: AsRef<Path>>(path: P) -> Option<u64> {
        fs::metadata(path.as_ref())
            .ok()
            .filter(|meta| meta.is_file())
            .map(|meta| meta.len())
    }

    /// Find files whose extension is one of `extensions` (case-insensitive)
    ///
    /// Results are sorted so repeated runs visit files in the same order.
    pub fn find_files<P: AsRef<Path>>(dir: P, extensions: &[String]) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        let normalized: Vec<String> = extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    let ext = ext.to_string_lossy().to_lowercase();
                    if normalized.iter().any(|wanted| *wanted == ext) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                Self::ensure_dir(parent)?;
            }
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    // @generates: Sibling backup path, e.g. chapter.tex -> chapter.tex.bak
    pub fn backup_path<P: AsRef<Path>>(path: P, suffix: &str) -> PathBuf {
        let path = path.as_ref();
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(suffix);
        path.with_file_name(name)
    }

    /// Copy `path` to its backup sibling and flush it to disk
    ///
    /// Returns only after the backup contents are synced, so the original can be
    /// overwritten afterwards without risk of losing data.
    pub fn write_backup<P: AsRef<Path>>(path: P, suffix: &str) -> Result<PathBuf> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(anyhow!("Source file does not exist: {:?}", path));
        }

        let content = fs::read(path)
            .with_context(|| format!("Failed to read file for backup: {:?}", path))?;
        let backup = Self::backup_path(path, suffix);

        let mut file = File::create(&backup)
            .with_context(|| format!("Failed to create backup file: {:?}", backup))?;
        file.write_all(&content)
            .with_context(|| format!("Failed to write backup file: {:?}", backup))?;
        file.sync_all()
            .with_context(|| format!("Failed to flush backup file: {:?}", backup))?;

        Ok(backup)
    }

    /// Rename `from` to `to`, replacing any file at `to`
    pub fn move_file<P: AsRef<Path>, Q: AsRef<Path>>(from: P, to: Q) -> Result<()> {
        fs::rename(from.as_ref(), to.as_ref())
            .with_context(|| format!("Failed to move {:?} to {:?}", from.as_ref(), to.as_ref()))
    }

    /// Remove a file if present; a missing file is not an error
    pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> Result<bool> {
        let path = path.as_ref();
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove file: {:?}", path)),
        }
    }

    // @returns: Last `count` non-empty lines of `text`
    pub fn tail_lines(text: &str, count: usize) -> Vec<String> {
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(count);
        lines[start..].iter().map(|l| l.to_string()).collect()
    }
}
