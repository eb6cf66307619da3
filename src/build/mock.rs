/*!
 * Mock compiler and package lookup implementations for testing.
 *
 * This module provides a fake compiler that simulates different behaviors:
 * - `MockCompiler::working()` - Exits 0 and writes a plausible artifact
 * - `MockCompiler::empty_artifact()` - Exits 0 but writes a zero-byte artifact
 * - `MockCompiler::failing()` - Exits non-zero without an artifact
 * - `MockCompiler::missing()` - Behaves as if the binary is not installed
 *
 * `MockLocator` answers package lookups from a fixed list.
 */

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::CompileError;

use super::compiler::{CompileOutput, CompileRequest, DocumentCompiler};
use super::locator::{PackageLocator, PackageLookup};

/// Behavior mode for the mock compiler
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Exit 0 and write an artifact of the given size
    Working { artifact_bytes: usize },
    /// Exit 0 and write an empty artifact
    EmptyArtifact,
    /// Exit with the given code and write nothing
    Failing { exit_code: i32 },
    /// Exit non-zero but still write a full artifact (warning-only run)
    FailingWithArtifact { artifact_bytes: usize },
    /// Compiler binary not installed
    Missing,
    /// Never finishes within the timeout
    TimingOut,
}

/// Mock compiler recording every document it was asked to compile
#[derive(Debug, Clone)]
pub struct MockCompiler {
    behavior: MockBehavior,
    /// Behavior override for documents whose file name contains a marker
    overrides: Vec<(String, MockBehavior)>,
    calls: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockCompiler {
    /// Create a new mock compiler with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            overrides: Vec::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a compiler that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working { artifact_bytes: 4096 })
    }

    /// Create a compiler that reports success but writes an empty artifact
    pub fn empty_artifact() -> Self {
        Self::new(MockBehavior::EmptyArtifact)
    }

    /// Create a compiler that always fails
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing { exit_code: 1 })
    }

    /// Create a compiler that is not installed
    pub fn missing() -> Self {
        Self::new(MockBehavior::Missing)
    }

    /// Use `behavior` for documents whose file name contains `marker`
    pub fn with_override(mut self, marker: &str, behavior: MockBehavior) -> Self {
        self.overrides.push((marker.to_string(), behavior));
        self
    }

    /// Documents compiled so far, in call order
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().clone()
    }

    fn behavior_for(&self, request: &CompileRequest) -> MockBehavior {
        let name = request
            .document
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.overrides
            .iter()
            .find(|(marker, _)| name.contains(marker.as_str()))
            .map(|(_, behavior)| *behavior)
            .unwrap_or(self.behavior)
    }

    fn write_artifact(request: &CompileRequest, bytes: usize) -> Result<(), CompileError> {
        std::fs::create_dir_all(&request.output_dir).map_err(|e| CompileError::Io(e.to_string()))?;
        std::fs::write(request.expected_artifact(), vec![b'%'; bytes])
            .map_err(|e| CompileError::Io(e.to_string()))
    }

    fn output(success: bool, exit_code: i32, stdout: &str) -> CompileOutput {
        CompileOutput {
            success,
            exit_code: Some(exit_code),
            stdout: stdout.to_string(),
            stderr: String::new(),
            duration: Duration::from_millis(1),
        }
    }
}

#[async_trait]
impl DocumentCompiler for MockCompiler {
    fn name(&self) -> &str {
        "mock-compiler"
    }

    async fn compile(&self, request: &CompileRequest) -> Result<CompileOutput, CompileError> {
        self.calls.lock().push(request.document.clone());

        match self.behavior_for(request) {
            MockBehavior::Working { artifact_bytes } => {
                Self::write_artifact(request, artifact_bytes)?;
                Ok(Self::output(true, 0, "Output written."))
            }
            MockBehavior::EmptyArtifact => {
                Self::write_artifact(request, 0)?;
                Ok(Self::output(true, 0, "No pages of output."))
            }
            MockBehavior::Failing { exit_code } => Ok(Self::output(
                false,
                exit_code,
                "! Undefined control sequence.\nl.12 \\badmacro\n! Emergency stop.",
            )),
            MockBehavior::FailingWithArtifact { artifact_bytes } => {
                Self::write_artifact(request, artifact_bytes)?;
                Ok(Self::output(false, 1, "LaTeX Warning: There were undefined references."))
            }
            MockBehavior::Missing => Err(CompileError::CompilerNotFound {
                program: self.name().to_string(),
            }),
            MockBehavior::TimingOut => Err(CompileError::TimedOut {
                seconds: request.timeout.as_secs(),
            }),
        }
    }
}

/// Package lookup answering from a fixed list of installed packages
#[derive(Debug, Clone, Default)]
pub struct MockLocator {
    installed: Vec<String>,
    unavailable: bool,
    lookups: Arc<Mutex<Vec<String>>>,
}

impl MockLocator {
    /// A distribution providing exactly `packages`
    pub fn with_packages(packages: &[&str]) -> Self {
        Self {
            installed: packages.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    /// A distribution that cannot be asked
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    /// Package names looked up so far, in call order
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().clone()
    }
}

#[async_trait]
impl PackageLocator for MockLocator {
    async fn locate(&self, name: &str) -> PackageLookup {
        self.lookups.lock().push(name.to_string());

        if self.unavailable {
            PackageLookup::Unavailable("mock distribution unavailable".to_string())
        } else if self.installed.iter().any(|p| p == name) {
            PackageLookup::Found(PathBuf::from(format!("/texmf/tex/latex/{}/{}.sty", name, name)))
        } else {
            PackageLookup::NotFound
        }
    }
}
