/*!
 * Error types for the texprep application.
 *
 * This module contains custom error types for the different pipeline stages,
 * using the thiserror crate for ergonomic error definitions.
 *
 * Missing files and pattern-engine warnings are not errors: they are
 * reported as data (`MissingFile`, `PatternEngineWarning`).
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading the root document
#[derive(Error, Debug)]
pub enum ScanError {
    /// The root document could not be read
    #[error("Failed to read root document {path:?}: {message}")]
    Unreadable {
        /// Path of the root document
        path: PathBuf,
        /// Underlying I/O message
        message: String,
    },
}

/// Errors raised while writing a stub for a missing reference
#[derive(Error, Debug)]
pub enum StubGenerationError {
    /// The stub (or one of its parent directories) could not be written
    #[error("Failed to write stub {path:?}: {message}")]
    WriteFailed {
        /// Target path of the stub
        path: PathBuf,
        /// Underlying I/O message
        message: String,
    },

    /// The reference points outside the project directory
    #[error("Refusing to generate stub outside the project: {0}")]
    UnsafePath(String),
}

/// Errors raised while invoking the external document compiler
#[derive(Error, Debug)]
pub enum CompileError {
    /// The compiler binary is not installed on this host
    #[error("Compiler binary '{program}' not found")]
    CompilerNotFound {
        /// Program that was looked up
        program: String,
    },

    /// The compiler did not finish within the configured timeout
    #[error("Compiler timed out after {seconds} seconds")]
    TimedOut {
        /// Timeout that was exceeded
        seconds: u64,
    },

    /// Spawning or waiting for the compiler failed for another reason
    #[error("Failed to run compiler: {0}")]
    Io(String),
}
