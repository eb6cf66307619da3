/*!
 * Directory-level escaping repair.
 *
 * Walks a target directory, repairs every matching file, optionally writes a
 * flushed backup before overwriting, and aggregates a session summary.
 */

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::app_config::EscapingConfig;
use crate::file_utils::FileManager;

use super::engine::{EngineConfig, EscapingRepairEngine, PatternEngineWarning};

/// Result of repairing one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscapingFixResult {
    pub path: PathBuf,
    pub changed: bool,
    pub replacement_count: usize,
    pub passes_used: usize,
    /// Backup written before the file was overwritten
    pub backup: Option<PathBuf>,
    pub warnings: Vec<PatternEngineWarning>,
    /// Read or write failure; the file was left untouched
    pub error: Option<String>,
}

/// Totals for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixSessionSummary {
    pub files_scanned: usize,
    pub files_changed: usize,
    pub total_replacements: usize,
}

impl FixSessionSummary {
    /// Get a summary string
    pub fn summary(&self) -> String {
        format!(
            "Escaping repair: {} file(s) scanned, {} changed, {} replacement(s)",
            self.files_scanned, self.files_changed, self.total_replacements
        )
    }
}

/// Per-file results plus totals
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixSessionReport {
    pub results: Vec<EscapingFixResult>,
    pub summary: FixSessionSummary,
}

impl FixSessionReport {
    pub fn failed(&self) -> impl Iterator<Item = &EscapingFixResult> {
        self.results.iter().filter(|r| r.error.is_some())
    }
}

/// Options for a fix session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Write a backup before overwriting
    pub backup: bool,
    /// Suffix for backup files
    pub backup_suffix: String,
    /// Extensions of files to repair
    pub extensions: Vec<String>,
    /// Compute results without writing anything
    pub dry_run: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&EscapingConfig::default())
    }
}

impl From<&EscapingConfig> for SessionOptions {
    fn from(config: &EscapingConfig) -> Self {
        Self {
            backup: config.backup,
            backup_suffix: config.backup_suffix.clone(),
            extensions: config.extensions.clone(),
            dry_run: false,
        }
    }
}

/// Repairs every matching file under a directory
pub struct EscapingFixSession {
    engine: EscapingRepairEngine,
    options: SessionOptions,
}

impl EscapingFixSession {
    pub fn new(engine: EscapingRepairEngine, options: SessionOptions) -> Self {
        Self { engine, options }
    }

    /// Build a session from the escaping section of the config
    pub fn from_config(config: &EscapingConfig) -> Self {
        Self::new(
            EscapingRepairEngine::with_config(EngineConfig::from(config)),
            SessionOptions::from(config),
        )
    }

    /// Files this session would visit under `dir`
    pub fn discover<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let backup_suffix = self.options.backup_suffix.as_str();
        let files = FileManager::find_files(dir, &self.options.extensions)?
            .into_iter()
            .filter(|p| !p.to_string_lossy().ends_with(backup_suffix))
            .collect();
        Ok(files)
    }

    /// Repair every file under `dir`
    pub fn run<P: AsRef<Path>>(&self, dir: P) -> Result<FixSessionReport> {
        self.run_with_progress(dir, |_, _| {})
    }

    /// Repair every file under `dir`, calling `progress(done, total)` after each file
    pub fn run_with_progress<P, F>(&self, dir: P, mut progress: F) -> Result<FixSessionReport>
    where
        P: AsRef<Path>,
        F: FnMut(usize, usize),
    {
        let files = self.discover(dir.as_ref())?;
        info!("Repairing escaping in {} file(s) under {:?}", files.len(), dir.as_ref());

        let mut report = FixSessionReport::default();
        for (idx, path) in files.iter().enumerate() {
            let result = self.fix_file(path);

            report.summary.files_scanned += 1;
            if result.changed {
                report.summary.files_changed += 1;
                report.summary.total_replacements += result.replacement_count;
            }
            report.results.push(result);
            progress(idx + 1, files.len());
        }

        info!("{}", report.summary.summary());
        Ok(report)
    }

    /// Repair a single file in place
    ///
    /// Failures are recorded on the result, never propagated, so one bad file
    /// does not stop the session.
    pub fn fix_file(&self, path: &Path) -> EscapingFixResult {
        let mut result = EscapingFixResult {
            path: path.to_path_buf(),
            changed: false,
            replacement_count: 0,
            passes_used: 0,
            backup: None,
            warnings: Vec::new(),
            error: None,
        };

        let original = match FileManager::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping {:?}: {:#}", path, e);
                result.error = Some(format!("{:#}", e));
                return result;
            }
        };

        let outcome = self.engine.repair(&original);
        result.passes_used = outcome.passes_used;
        result.warnings = outcome.warnings.clone();
        for warning in &outcome.warnings {
            warn!("{:?}: {}", path, warning);
        }

        if !outcome.changed() {
            debug!("No escaping artifacts in {:?}", path);
            return result;
        }

        result.changed = true;
        result.replacement_count = outcome.replacement_count;

        if self.options.dry_run {
            info!("Would fix {} replacement(s) in {:?}", outcome.replacement_count, path);
            return result;
        }

        if self.options.backup {
            match FileManager::write_backup(path, &self.options.backup_suffix) {
                Ok(backup) => result.backup = Some(backup),
                Err(e) => {
                    warn!("Backup failed, leaving {:?} untouched: {:#}", path, e);
                    result.error = Some(format!("{:#}", e));
                    return result;
                }
            }
        }

        if let Err(e) = FileManager::write_to_file(path, &outcome.text) {
            warn!("Failed to write {:?}: {:#}", path, e);
            result.error = Some(format!("{:#}", e));
            return result;
        }

        info!("Fixed {} replacement(s) in {:?}", outcome.replacement_count, path);
        result
    }
}
