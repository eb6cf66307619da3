/*!
 * External document compiler interface.
 *
 * The compiler is always an opaque subprocess. `DocumentCompiler` is the seam
 * tests use to substitute a fake; `ProcessCompiler` runs the real binary.
 */

use std::fmt::Debug;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use crate::app_config::CompilerConfig;
use crate::errors::CompileError;
use crate::file_utils::FileManager;

/// One compiler invocation
#[derive(Debug, Clone)]
pub struct CompileRequest {
    /// Document to compile
    pub document: PathBuf,
    /// Directory the compiler runs in (relative paths resolve from here)
    pub working_dir: PathBuf,
    /// Directory the compiler writes its artifact to
    pub output_dir: PathBuf,
    pub timeout: Duration,
}

impl CompileRequest {
    /// Artifact the compiler is expected to produce: `<output_dir>/<stem>.pdf`
    pub fn expected_artifact(&self) -> PathBuf {
        let stem = self.document.file_stem().unwrap_or_default();
        let mut name = stem.to_os_string();
        name.push(".pdf");
        self.output_dir.join(name)
    }
}

/// What the compiler process reported
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Whether the exit status indicated success
    pub success: bool,
    /// Exit code, None when killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

/// Common trait for document compilers
#[async_trait]
pub trait DocumentCompiler: Send + Sync + Debug {
    /// Program name, for diagnostics
    fn name(&self) -> &str;

    /// Run the compiler once
    ///
    /// # Returns
    /// * `Ok(CompileOutput)` - The process ran to completion (successfully or not)
    /// * `Err(CompileError)` - The process could not be run or timed out
    async fn compile(&self, request: &CompileRequest) -> Result<CompileOutput, CompileError>;
}

/// Runs the compiler binary as a non-interactive subprocess
#[derive(Debug, Clone)]
pub struct ProcessCompiler {
    program: String,
    extra_args: Vec<String>,
}

impl ProcessCompiler {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            extra_args: Vec::new(),
        }
    }

    pub fn from_config(config: &CompilerConfig) -> Self {
        Self {
            program: config.program.clone(),
            extra_args: config.extra_args.clone(),
        }
    }

    /// Arguments for one invocation: never prompt, stop at the first error
    pub fn arguments(&self, request: &CompileRequest) -> Vec<String> {
        let mut args = vec![
            "-interaction=nonstopmode".to_string(),
            "-halt-on-error".to_string(),
            format!("-output-directory={}", request.output_dir.display()),
        ];
        args.extend(self.extra_args.iter().cloned());
        args.push(request.document.display().to_string());
        args
    }
}

#[async_trait]
impl DocumentCompiler for ProcessCompiler {
    fn name(&self) -> &str {
        &self.program
    }

    async fn compile(&self, request: &CompileRequest) -> Result<CompileOutput, CompileError> {
        // A missing working directory also surfaces as NotFound from spawn
        if !FileManager::dir_exists(&request.working_dir) {
            return Err(CompileError::Io(format!(
                "Working directory does not exist: {:?}",
                request.working_dir
            )));
        }

        let args = self.arguments(request);
        debug!("Running {} {}", self.program, args.join(" "));

        let started = Instant::now();
        let compile_future = Command::new(&self.program)
            .args(&args)
            .current_dir(&request.working_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::select! {
            result = compile_future => {
                result.map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        CompileError::CompilerNotFound { program: self.program.clone() }
                    } else {
                        CompileError::Io(e.to_string())
                    }
                })?
            },
            _ = tokio::time::sleep(request.timeout) => {
                return Err(CompileError::TimedOut { seconds: request.timeout.as_secs() });
            }
        };

        Ok(CompileOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration: started.elapsed(),
        })
    }
}
