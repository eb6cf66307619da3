/*!
 * Reference scanning for the root document.
 *
 * Extracts the two kinds of file dependencies a root document declares:
 * - style packages (`\usepackage[opts]{name}`, comma-separated lists allowed)
 * - content modules (`\input{..}`, `\include{..}`, `\subfile{..}`)
 *
 * Comments are stripped line by line before matching. A `%` preceded by a
 * backslash is a literal percent sign, not a comment.
 */

use std::collections::HashSet;
use std::path::Path;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::app_config::BuildConfig;
use crate::errors::ScanError;

/// Regex for package load declarations
static PACKAGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(?:usepackage|RequirePackage)\s*(?:\[[^\]]*\])?\s*\{([^}]+)\}")
        .expect("Invalid package declaration regex")
});

/// Regex for content include declarations
static CONTENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(?:input|include|subfile)\s*\{([^}]+)\}").expect("Invalid include declaration regex")
});

/// Kind of a declared dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// A `.sty` package loaded by the preamble
    StylePackage,
    /// A `.tex` module included into the body
    ContentModule,
}

impl ReferenceKind {
    /// File extension appended when the declared path has none
    pub fn default_extension(&self) -> &'static str {
        match self {
            ReferenceKind::StylePackage => "sty",
            ReferenceKind::ContentModule => "tex",
        }
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceKind::StylePackage => write!(f, "style package"),
            ReferenceKind::ContentModule => write!(f, "content module"),
        }
    }
}

/// A declared dependency of the root document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Path exactly as declared (relative to the root document)
    pub path: String,
    /// What the root document expects the file to be
    pub kind: ReferenceKind,
}

impl Reference {
    pub fn new(path: &str, kind: ReferenceKind) -> Self {
        Self {
            path: path.to_string(),
            kind,
        }
    }

    /// Declared path with the kind's extension added if it has none
    pub fn file_name(&self) -> String {
        if Path::new(&self.path).extension().is_some() {
            self.path.clone()
        } else {
            format!("{}.{}", self.path, self.kind.default_extension())
        }
    }
}

/// Ordered, deduplicated references found in one root document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Local style package paths, in first-seen order
    pub style_packages: Vec<String>,
    /// Content module paths, in first-seen order
    pub content_modules: Vec<String>,
    /// Packages provided by the distribution, skipped for resolution
    pub external_packages: Vec<String>,
}

impl ScanResult {
    /// All local references, style packages first
    pub fn references(&self) -> Vec<Reference> {
        self.style_packages
            .iter()
            .map(|p| Reference::new(p, ReferenceKind::StylePackage))
            .chain(
                self.content_modules
                    .iter()
                    .map(|p| Reference::new(p, ReferenceKind::ContentModule)),
            )
            .collect()
    }

    pub fn total(&self) -> usize {
        self.style_packages.len() + self.content_modules.len()
    }
}

/// Scanner for dependency declarations in a root document
///
/// A package is local when its name looks like a project path (contains `/`
/// or starts with a configured prefix). Otherwise it is external when listed
/// as distribution-provided, and local when not.
#[derive(Debug, Clone, Default)]
pub struct ReferenceScanner {
    external_packages: HashSet<String>,
    local_prefixes: Vec<String>,
}

impl ReferenceScanner {
    /// Create a scanner that treats every package as local
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scanner that reports `packages` as distribution-provided
    pub fn with_external_packages(packages: &[String]) -> Self {
        Self {
            external_packages: packages.iter().cloned().collect(),
            local_prefixes: Vec::new(),
        }
    }

    /// Create a scanner with the package rules of a build config
    pub fn from_config(config: &BuildConfig) -> Self {
        Self::with_external_packages(&config.external_packages).with_local_prefixes(&config.local_package_prefixes)
    }

    /// Treat package names starting with any of `prefixes` as project packages
    pub fn with_local_prefixes(mut self, prefixes: &[String]) -> Self {
        self.local_prefixes = prefixes.iter().filter(|p| !p.is_empty()).cloned().collect();
        self
    }

    /// Whether a package name can only refer to a file of the project
    pub fn is_project_package(&self, name: &str) -> bool {
        name.contains('/') || self.local_prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()))
    }

    /// Read and scan the document at `path`
    pub fn scan_file<P: AsRef<Path>>(&self, path: P) -> Result<ScanResult, ScanError> {
        let text = read_document(path)?;
        Ok(self.scan(&text))
    }

    /// Scan document text for references
    pub fn scan(&self, text: &str) -> ScanResult {
        let mut result = ScanResult::default();
        let mut seen_style = HashSet::new();
        let mut seen_content = HashSet::new();
        let mut seen_external = HashSet::new();

        for line in text.lines() {
            let line = strip_comment(line);

            for caps in PACKAGE_REGEX.captures_iter(line) {
                for name in caps[1].split(',').map(str::trim).filter(|n| !n.is_empty()) {
                    if !self.is_project_package(name) && self.external_packages.contains(name) {
                        if seen_external.insert(name.to_string()) {
                            result.external_packages.push(name.to_string());
                        }
                    } else if seen_style.insert(name.to_string()) {
                        result.style_packages.push(name.to_string());
                    }
                }
            }

            for caps in CONTENT_REGEX.captures_iter(line) {
                let path = caps[1].trim();
                if !path.is_empty() && seen_content.insert(path.to_string()) {
                    result.content_modules.push(path.to_string());
                }
            }
        }

        debug!(
            "Scanned {} style package(s), {} content module(s), {} external package(s)",
            result.style_packages.len(),
            result.content_modules.len(),
            result.external_packages.len()
        );

        result
    }
}

/// Read a root document, mapping any failure to `ScanError`
pub fn read_document<P: AsRef<Path>>(path: P) -> Result<String, ScanError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|e| ScanError::Unreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Byte offset of the first unescaped `%` in `line`
pub fn comment_start(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    bytes
        .iter()
        .enumerate()
        .find(|(i, b)| **b == b'%' && (*i == 0 || bytes[*i - 1] != b'\\'))
        .map(|(i, _)| i)
}

/// `line` with everything from the first unescaped `%` removed
pub fn strip_comment(line: &str) -> &str {
    match comment_start(line) {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// `line` without its comment and without any content module declaration
///
/// Returns `None` when nothing but declarations was left, so the caller can
/// drop the line. Lines that declare nothing come back unchanged.
pub fn remove_content_declarations(line: &str) -> Option<String> {
    let code = strip_comment(line);
    if !CONTENT_REGEX.is_match(code) {
        return Some(line.to_string());
    }

    let rest = CONTENT_REGEX.replace_all(code, "");
    if rest.trim().is_empty() {
        None
    } else {
        Some(rest.trim_end().to_string())
    }
}
