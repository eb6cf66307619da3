/*!
 * Tests for configuration loading and validation
 */

use anyhow::Result;
use texprep::app_config::{Config, LogLevel};
use crate::common;

/// Test that a missing config file is created with defaults
#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("texprep.json");

    let config = Config::load_or_create(&path)?;

    assert!(path.exists());
    assert_eq!(config.build.compiler.program, "pdflatex");
    assert_eq!(config.escaping.max_passes, 6);
    assert_eq!(config.build.min_artifact_bytes, 1024);

    Ok(())
}

/// Test that partial config files keep defaults for unspecified fields
#[test]
fn test_load_or_create_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "texprep.json",
        r#"{"build": {"root_document": "thesis.tex", "compiler": {"timeout_secs": 30}}, "log_level": "debug"}"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.build.root_document.to_str(), Some("thesis.tex"));
    assert_eq!(config.build.compiler.timeout_secs, 30);
    assert_eq!(config.build.compiler.program, "pdflatex");
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.escaping.backup);

    Ok(())
}

/// Test that malformed JSON is reported as an error
#[test]
fn test_load_or_create_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "texprep.json", "{ not json")?;

    assert!(Config::load_or_create(&path).is_err());

    Ok(())
}

/// Test that validation rejects a zero pass bound
#[test]
fn test_validate_withZeroPasses_shouldFail() {
    let mut config = Config::default();
    config.escaping.max_passes = 0;

    assert!(config.validate().is_err());
}

/// Test that the default configuration is valid
#[test]
fn test_validate_withDefaults_shouldSucceed() {
    assert!(Config::default().validate().is_ok());
}

/// Test that an empty package lookup program is rejected but a disabled lookup is fine
#[test]
fn test_validate_withEmptyPackageLookup_shouldFail() {
    let mut config = Config::default();
    config.build.package_lookup = Some("  ".to_string());
    assert!(config.validate().is_err());

    config.build.package_lookup = None;
    assert!(config.validate().is_ok());
}
