/*!
 * Escaping repair for markup damaged by conversion tools.
 *
 * - `patterns`: Ordered, categorized rewrite rules (pure data)
 * - `engine`: Applies the rules to a fixed point and reports counts
 * - `session`: Repairs every file under a directory, with backups
 */

pub mod engine;
pub mod patterns;
pub mod session;

// Re-export main types
pub use engine::{EngineConfig, EscapingRepairEngine, PatternEngineWarning, RepairOutcome};
pub use patterns::{PatternCategory, PatternRule, PatternSpec, PatternTable};
pub use session::{EscapingFixResult, EscapingFixSession, FixSessionReport, FixSessionSummary, SessionOptions};
