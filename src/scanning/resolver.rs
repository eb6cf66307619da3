/*!
 * Dependency resolution against the filesystem.
 */

use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::file_utils::FileManager;

use super::scanner::{Reference, ReferenceKind};

/// Existence of one referenced file at resolution time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileExistenceRecord {
    /// Path checked on disk
    pub path: PathBuf,
    pub exists: bool,
}

/// A reference whose file was not found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingFile {
    pub reference: Reference,
    /// Where the file was expected
    pub expected_path: PathBuf,
}

/// Outcome of one resolution run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// One record per reference, in reference order
    pub records: Vec<FileExistenceRecord>,
    /// References without a file, in reference order
    pub missing: Vec<MissingFile>,
    /// Packages absent from the project but installed in the distribution
    #[serde(default)]
    pub provided: Vec<String>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Names of the missing style packages, in reference order
    pub fn missing_packages(&self) -> impl Iterator<Item = &str> {
        self.missing
            .iter()
            .filter(|m| m.reference.kind == ReferenceKind::StylePackage)
            .map(|m| m.reference.path.as_str())
    }

    /// Record that the distribution provides package `name`, so it is no longer missing
    pub fn mark_provided(&mut self, name: &str) -> bool {
        let before = self.missing.len();
        self.missing
            .retain(|m| !(m.reference.kind == ReferenceKind::StylePackage && m.reference.path == name));
        let removed = self.missing.len() != before;
        if removed && !self.provided.iter().any(|p| p == name) {
            self.provided.push(name.to_string());
        }
        removed
    }
}

/// Resolves references relative to the root document's directory
#[derive(Debug, Clone)]
pub struct DependencyResolver {
    base_dir: PathBuf,
}

impl DependencyResolver {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Path a reference is expected at
    pub fn expected_path(&self, reference: &Reference) -> PathBuf {
        self.base_dir.join(reference.file_name())
    }

    /// Check every reference on disk
    ///
    /// Filesystem errors count as "does not exist". Duplicate references are
    /// checked once.
    pub fn resolve(&self, references: &[Reference]) -> Resolution {
        let mut resolution = Resolution::default();
        let mut seen = std::collections::HashSet::new();

        for reference in references {
            if !seen.insert(reference) {
                continue;
            }

            let path = self.expected_path(reference);
            let exists = FileManager::file_exists(&path);

            if !exists {
                debug!("Missing {}: {:?}", reference.kind, path);
                resolution.missing.push(MissingFile {
                    reference: reference.clone(),
                    expected_path: path.clone(),
                });
            }
            resolution.records.push(FileExistenceRecord { path, exists });
        }

        resolution
    }
}
