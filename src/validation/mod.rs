/*!
 * Validation module for document markup.
 *
 * # Architecture
 *
 * - `structure`: Brace, environment, residual-escape and delimiter checks
 */

pub mod structure;

// Re-export main types
pub use structure::{StructureIssue, StructureValidator};
