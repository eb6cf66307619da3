/*!
 * Stub generation for missing references.
 *
 * Style packages get a minimal `\ProvidesPackage` header; content modules get
 * a section heading derived from the file name. Both carry `STUB_MARKER` so a
 * human can find what still needs writing.
 */

use std::path::{Component, Path, PathBuf};

use chrono::Local;
use log::info;

use crate::errors::StubGenerationError;
use crate::file_utils::FileManager;

use super::resolver::MissingFile;
use super::scanner::{Reference, ReferenceKind};

/// Marker line placed in every generated stub
pub const STUB_MARKER: &str = "AUTO-GENERATED STUB: manual completion required";

/// Outcome of generating stubs for a set of missing files
#[derive(Debug, Default)]
pub struct StubOutcome {
    /// Files written, in input order
    pub created: Vec<PathBuf>,
    /// Files that could not be written
    pub failed: Vec<StubGenerationError>,
}

/// Writes placeholder files for missing references
#[derive(Debug, Clone, Default)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Stub text for a reference
    pub fn render(&self, reference: &Reference) -> String {
        match reference.kind {
            ReferenceKind::StylePackage => self.render_package(&reference.path),
            ReferenceKind::ContentModule => self.render_content(&reference.path),
        }
    }

    fn render_package(&self, name: &str) -> String {
        let date = Local::now().format("%Y/%m/%d");
        let name = name.trim_end_matches(".sty");
        format!(
            "% {marker}\n\
             % Package '{name}' was referenced by the root document but did not exist.\n\
             \\NeedsTeXFormat{{LaTeX2e}}\n\
             \\ProvidesPackage{{{name}}}[{date} placeholder package]\n\
             \n\
             \\endinput\n",
            marker = STUB_MARKER,
        )
    }

    fn render_content(&self, path: &str) -> String {
        format!(
            "% {marker}\n\
             \\section{{{title}}}\n\
             \n\
             % Content for '{path}' goes here.\n",
            marker = STUB_MARKER,
            title = title_from_path(path),
        )
    }

    /// Write a stub for `missing` at its expected path
    ///
    /// Overwrites existing files; callers gate on the resolver's missing list.
    pub fn generate(&self, missing: &MissingFile) -> Result<PathBuf, StubGenerationError> {
        check_relative(&missing.reference.path)?;

        let path = &missing.expected_path;
        FileManager::write_to_file(path, &self.render(&missing.reference)).map_err(|e| {
            StubGenerationError::WriteFailed {
                path: path.clone(),
                message: format!("{:#}", e),
            }
        })?;

        info!("Created {} stub: {:?}", missing.reference.kind, path);
        Ok(path.clone())
    }

    /// Write stubs for every missing file, collecting failures
    pub fn generate_all(&self, missing: &[MissingFile]) -> StubOutcome {
        let mut outcome = StubOutcome::default();
        for file in missing {
            match self.generate(file) {
                Ok(path) => outcome.created.push(path),
                Err(e) => outcome.failed.push(e),
            }
        }
        outcome
    }
}

/// Heading text from a path: `chapters/my_first-part` -> `My First Part`
pub fn title_from_path(path: &str) -> String {
    let stem = Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    stem.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn check_relative(path: &str) -> Result<(), StubGenerationError> {
    let escapes = Path::new(path)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(StubGenerationError::UnsafePath(path.to_string()));
    }
    Ok(())
}
