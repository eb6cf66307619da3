/*!
 * Incremental build checks.
 *
 * Two checks with the same shape:
 * 1. Basic: compile a copy of the root document with every content module
 *    removed, isolating failures in the style/package layer.
 * 2. Full: compile the root document as-is.
 *
 * A check passes only when the compiler exited successfully, the expected
 * artifact exists afterwards, and the artifact is larger than a minimum size.
 * The exit status alone is not trusted: it can report success next to a
 * truncated artifact.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::app_config::{resolve_artifact_dir, BuildConfig};
use crate::errors::CompileError;
use crate::file_utils::FileManager;
use crate::scanning::scanner::{remove_content_declarations, strip_comment};

use super::compiler::{CompileOutput, CompileRequest, DocumentCompiler};

/// Suffix of the generated basic-check document
pub const BASIC_DOCUMENT_SUFFIX: &str = "_basic_check";

/// Number of compiler output lines kept for diagnostics
const LOG_TAIL_LINES: usize = 20;

/// Suffix of an earlier artifact held aside during a check
const PARKED_ARTIFACT_SUFFIX: &str = ".previous";

/// Which of the two checks a result belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildCheckKind {
    Basic,
    Full,
}

impl std::fmt::Display for BuildCheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildCheckKind::Basic => write!(f, "basic"),
            BuildCheckKind::Full => write!(f, "full"),
        }
    }
}

/// Outcome of one build check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildCheckResult {
    pub kind: BuildCheckKind,
    pub passed: bool,
    /// Passed only because the compiler is not installed
    pub vacuous: bool,
    /// Document handed to the compiler
    pub document: PathBuf,
    /// Artifact the check looked for
    pub artifact: PathBuf,
    pub artifact_size: Option<u64>,
    pub exit_code: Option<i32>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Last lines of compiler output
    pub log_tail: Vec<String>,
    pub duration_ms: u64,
}

impl BuildCheckResult {
    fn new(kind: BuildCheckKind, document: PathBuf, artifact: PathBuf) -> Self {
        Self {
            kind,
            passed: false,
            vacuous: false,
            document,
            artifact,
            artifact_size: None,
            exit_code: None,
            errors: Vec::new(),
            warnings: Vec::new(),
            log_tail: Vec::new(),
            duration_ms: 0,
        }
    }

    fn failed(kind: BuildCheckKind, document: PathBuf, error: String) -> Self {
        let mut result = Self::new(kind, document, PathBuf::new());
        result.errors.push(error);
        result
    }
}

/// Settings for the build checks
#[derive(Debug, Clone)]
pub struct TesterConfig {
    /// Artifacts at or below this size count as truncated
    pub min_artifact_bytes: u64,
    pub timeout: Duration,
    /// Artifact directory; relative paths resolve from the root document's directory
    pub output_dir: Option<PathBuf>,
    pub keep_basic_document: bool,
}

impl Default for TesterConfig {
    fn default() -> Self {
        Self::from(&BuildConfig::default())
    }
}

impl From<&BuildConfig> for TesterConfig {
    fn from(config: &BuildConfig) -> Self {
        Self {
            min_artifact_bytes: config.min_artifact_bytes,
            timeout: config.compiler.timeout(),
            output_dir: config.output_dir.clone(),
            keep_basic_document: config.keep_basic_document,
        }
    }
}

/// Runs the basic and full build checks through a compiler
#[derive(Debug, Clone)]
pub struct IncrementalBuildTester {
    compiler: Arc<dyn DocumentCompiler>,
    config: TesterConfig,
}

impl IncrementalBuildTester {
    pub fn new(compiler: Arc<dyn DocumentCompiler>, config: TesterConfig) -> Self {
        Self { compiler, config }
    }

    /// Root document text with content modules removed and a placeholder body
    pub fn basic_document_text(root_text: &str) -> String {
        let mut text = String::from("% Generated for the basic build check: content modules removed\n");

        for line in root_text.lines() {
            if strip_comment(line).contains("\\begin{document}") {
                break;
            }
            if let Some(kept) = remove_content_declarations(line) {
                text.push_str(&kept);
                text.push('\n');
            }
        }

        text.push_str("\\begin{document}\nBasic build check.\n\\end{document}\n");
        text
    }

    /// Where the basic document is written: next to the root document
    pub fn basic_document_path(root: &Path) -> PathBuf {
        let stem = root.file_stem().unwrap_or_default().to_string_lossy();
        root.with_file_name(format!("{}{}.tex", stem, BASIC_DOCUMENT_SUFFIX))
    }

    /// Compile the style layer alone
    pub async fn run_basic(&self, root: &Path) -> BuildCheckResult {
        let root_text = match FileManager::read_to_string(root) {
            Ok(text) => text,
            Err(e) => return BuildCheckResult::failed(BuildCheckKind::Basic, root.to_path_buf(), format!("{:#}", e)),
        };

        let basic_path = Self::basic_document_path(root);
        if let Err(e) = FileManager::write_to_file(&basic_path, &Self::basic_document_text(&root_text)) {
            return BuildCheckResult::failed(BuildCheckKind::Basic, basic_path, format!("{:#}", e));
        }

        let result = self.run_check(BuildCheckKind::Basic, &basic_path).await;

        if !self.config.keep_basic_document {
            if let Err(e) = FileManager::remove_if_exists(&basic_path) {
                debug!("Could not remove basic document: {:#}", e);
            }
        }
        result
    }

    /// Compile the root document with all content modules
    pub async fn run_full(&self, root: &Path) -> BuildCheckResult {
        self.run_check(BuildCheckKind::Full, root).await
    }

    async fn run_check(&self, kind: BuildCheckKind, document: &Path) -> BuildCheckResult {
        let working_dir = match document.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let working_dir = working_dir.canonicalize().unwrap_or(working_dir);
        let output_dir = resolve_artifact_dir(&working_dir, self.config.output_dir.as_deref());

        let request = CompileRequest {
            document: PathBuf::from(document.file_name().unwrap_or_default()),
            working_dir,
            output_dir,
            timeout: self.config.timeout,
        };
        let artifact = request.expected_artifact();
        let mut result = BuildCheckResult::new(kind, document.to_path_buf(), artifact.clone());

        if let Err(e) = FileManager::ensure_dir(&request.output_dir) {
            result.errors.push(format!("Could not create output directory: {:#}", e));
            return result;
        }

        // An artifact from an earlier run must not count as this run's output
        let parked = match Self::park_previous_artifact(&artifact) {
            Ok(parked) => parked,
            Err(e) => {
                result.errors.push(format!("{:#}", e));
                return result;
            }
        };

        info!("Running {} build check with {}", kind, self.compiler.name());
        let started = Instant::now();
        let outcome = self.compiler.compile(&request).await;
        result.duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => {
                result.exit_code = output.exit_code;
                result.log_tail = Self::log_tail(&output);
                result.artifact_size = FileManager::file_size(&artifact);
                result.errors = Self::evaluate(&output, &artifact, result.artifact_size, self.config.min_artifact_bytes);
                result.passed = result.errors.is_empty();
            }
            Err(CompileError::CompilerNotFound { program }) => {
                warn!("Compiler '{}' not found; {} build check skipped", program, kind);
                result.passed = true;
                result.vacuous = true;
                result.warnings.push(format!("Compiler '{}' not found; check skipped", program));
            }
            Err(e) => {
                result.errors.push(e.to_string());
            }
        }

        if let Some(parked) = parked {
            Self::settle_previous_artifact(&artifact, &parked);
        }

        if result.passed {
            info!("{} build check passed", kind);
        } else {
            warn!("{} build check failed: {}", kind, result.errors.join("; "));
        }
        result
    }

    /// Where an earlier artifact waits while the compiler runs
    pub fn parked_artifact_path(artifact: &Path) -> PathBuf {
        FileManager::backup_path(artifact, PARKED_ARTIFACT_SUFFIX)
    }

    /// Move an existing artifact aside; returns where it went
    fn park_previous_artifact(artifact: &Path) -> anyhow::Result<Option<PathBuf>> {
        if !FileManager::file_exists(artifact) {
            return Ok(None);
        }
        let parked = Self::parked_artifact_path(artifact);
        FileManager::move_file(artifact, &parked)?;
        debug!("Moved previous artifact to {:?}", parked);
        Ok(Some(parked))
    }

    /// Drop the earlier artifact if the compiler wrote a new one, else put it back
    fn settle_previous_artifact(artifact: &Path, parked: &Path) {
        let settled = if FileManager::file_exists(artifact) {
            FileManager::remove_if_exists(parked).map(|_| ())
        } else {
            FileManager::move_file(parked, artifact)
        };
        if let Err(e) = settled {
            warn!("Could not restore previous artifact from {:?}: {:#}", parked, e);
        }
    }

    /// Apply the three-part success rule to one compiler run
    pub fn evaluate(output: &CompileOutput, artifact: &Path, artifact_size: Option<u64>, min_bytes: u64) -> Vec<String> {
        let mut errors = Vec::new();

        if !output.success {
            match output.exit_code {
                Some(code) => errors.push(format!("Compiler exited with status {}", code)),
                None => errors.push("Compiler terminated by signal".to_string()),
            }
        }

        match artifact_size {
            None => errors.push(format!("Expected artifact {:?} was not produced", artifact)),
            Some(size) if size <= min_bytes => errors.push(format!(
                "Artifact {:?} is only {} bytes (must exceed {})",
                artifact, size, min_bytes
            )),
            Some(_) => {}
        }

        errors
    }

    fn log_tail(output: &CompileOutput) -> Vec<String> {
        let source = if output.stdout.trim().is_empty() {
            &output.stderr
        } else {
            &output.stdout
        };
        FileManager::tail_lines(source, LOG_TAIL_LINES)
    }
}
