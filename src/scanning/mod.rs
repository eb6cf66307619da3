/*!
 * Dependency validation for the root document.
 *
 * - `scanner`: Extracts style package and content module references
 * - `resolver`: Determines which referenced files are missing on disk
 * - `templates`: Writes placeholder stubs for missing files
 */

pub mod resolver;
pub mod scanner;
pub mod templates;

// Re-export main types
pub use resolver::{DependencyResolver, FileExistenceRecord, MissingFile, Resolution};
pub use scanner::{Reference, ReferenceKind, ReferenceScanner, ScanResult};
pub use templates::{StubOutcome, TemplateGenerator, STUB_MARKER};
