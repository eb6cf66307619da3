/*!
 * Build pipeline: orchestration and reporting.
 *
 * - `orchestrator`: Runs the stages in order against one root document
 * - `report`: Ordered, append-only stage results
 */

pub mod orchestrator;
pub mod report;

// Re-export main types
pub use orchestrator::BuildOrchestrator;
pub use report::{BuildReport, BuildStage, StageData, StageResult};
