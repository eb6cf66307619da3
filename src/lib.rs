/*!
 * # texprep - dependency validation and build checks for TeX projects
 *
 * A Rust library that prepares a multi-file document project for compilation.
 *
 * ## Features
 *
 * - Scan a root document for style package and content module references
 * - Detect referenced files missing on disk and write placeholder stubs
 * - Run incremental build checks through an external compiler:
 *   - Basic check: style layer only
 *   - Full check: the complete document
 * - Validate compiler artifacts (exit status, existence, plausible size)
 * - Repair markup damaged by over-eager escaping, to a fixed point
 * - Produce an ordered build report (human-readable or JSON)
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 * - `scanning`: Reference scanning, resolution and stub generation
 * - `escaping`: Pattern table, repair engine and directory fix sessions
 * - `validation`: Structural checks shared by scanning and escaping
 * - `build`: Compiler interface and incremental build checks
 * - `pipeline`: Build orchestrator and report
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod build;
pub mod errors;
pub mod escaping;
pub mod file_utils;
pub mod pipeline;
pub mod scanning;
pub mod validation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use build::{DocumentCompiler, IncrementalBuildTester, MockCompiler, ProcessCompiler};
pub use errors::{CompileError, ScanError, StubGenerationError};
pub use escaping::{EscapingFixSession, EscapingRepairEngine, PatternTable};
pub use pipeline::{BuildOrchestrator, BuildReport, BuildStage};
pub use scanning::{DependencyResolver, ReferenceScanner, TemplateGenerator};
