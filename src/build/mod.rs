/*!
 * Build checks against an external document compiler.
 *
 * - `compiler`: The compiler seam and the subprocess implementation
 * - `tester`: Basic and full build checks with artifact validation
 * - `locator`: Asks the distribution whether it provides a package
 * - `mock`: Scriptable compiler and package lookup for tests
 */

pub mod compiler;
pub mod locator;
pub mod mock;
pub mod tester;

// Re-export main types
pub use compiler::{CompileOutput, CompileRequest, DocumentCompiler, ProcessCompiler};
pub use locator::{KpsewhichLocator, PackageLocator, PackageLookup};
pub use mock::{MockBehavior, MockCompiler, MockLocator};
pub use tester::{BuildCheckKind, BuildCheckResult, IncrementalBuildTester, TesterConfig};
