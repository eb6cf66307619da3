/*!
 * Build report: the ordered, append-only record of one orchestrator run.
 */

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::build::tester::BuildCheckResult;
use crate::scanning::resolver::Resolution;
use crate::scanning::scanner::ScanResult;
use crate::validation::structure::StructureIssue;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildStage {
    Scanning,
    Resolving,
    Stubbing,
    BasicBuildTest,
    FullBuildTest,
}

impl BuildStage {
    /// Fixed order every report follows
    pub const PIPELINE_ORDER: [BuildStage; 5] = [
        BuildStage::Scanning,
        BuildStage::Resolving,
        BuildStage::Stubbing,
        BuildStage::BasicBuildTest,
        BuildStage::FullBuildTest,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BuildStage::Scanning => "Scanning",
            BuildStage::Resolving => "Resolving",
            BuildStage::Stubbing => "Stubbing",
            BuildStage::BasicBuildTest => "BasicBuildTest",
            BuildStage::FullBuildTest => "FullBuildTest",
        }
    }

    /// Whether failing this stage stops the pipeline
    pub fn is_fatal(&self) -> bool {
        matches!(self, BuildStage::Scanning | BuildStage::BasicBuildTest)
    }

    fn position(&self) -> usize {
        Self::PIPELINE_ORDER
            .iter()
            .position(|stage| stage == self)
            .unwrap_or(Self::PIPELINE_ORDER.len())
    }
}

impl std::fmt::Display for BuildStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Stage-specific payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageData {
    Scan {
        result: ScanResult,
        /// Advisory structural issues in the root document
        structure: Vec<StructureIssue>,
    },
    Resolve(Resolution),
    Stub {
        created: Vec<PathBuf>,
        failed: Vec<String>,
    },
    Build(BuildCheckResult),
    None,
}

/// Result of one pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: BuildStage,
    pub passed: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub data: StageData,
    pub duration_ms: u64,
}

impl StageResult {
    pub fn new(stage: BuildStage, passed: bool, data: StageData) -> Self {
        Self {
            stage,
            passed,
            errors: Vec::new(),
            warnings: Vec::new(),
            data,
            duration_ms: 0,
        }
    }

    /// A failed stage carrying one error and no payload
    pub fn failure(stage: BuildStage, error: String) -> Self {
        let mut result = Self::new(stage, false, StageData::None);
        result.errors.push(error);
        result
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = duration.as_millis() as u64;
        self
    }

    /// Counts shown next to the stage name in the summary
    fn counts(&self) -> String {
        match &self.data {
            StageData::Scan { result, structure } => format!(
                "{} style package(s), {} content module(s), {} external, {} structure warning(s)",
                result.style_packages.len(),
                result.content_modules.len(),
                result.external_packages.len(),
                structure.len()
            ),
            StageData::Resolve(resolution) => format!(
                "{} reference(s), {} missing, {} from the distribution",
                resolution.records.len(),
                resolution.missing.len(),
                resolution.provided.len()
            ),
            StageData::Stub { created, failed } => {
                format!("{} created, {} failed", created.len(), failed.len())
            }
            StageData::Build(check) => {
                if check.vacuous {
                    "skipped, compiler not found".to_string()
                } else {
                    match check.artifact_size {
                        Some(size) => format!("artifact {} bytes in {} ms", size, check.duration_ms),
                        None => format!("no artifact, {} ms", check.duration_ms),
                    }
                }
            }
            StageData::None => String::new(),
        }
    }
}

/// Ordered collection of stage results
///
/// Stages can only be appended, and only in pipeline order; a stage already
/// recorded is never replaced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildReport {
    stages: Vec<StageResult>,
}

impl BuildReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage result
    ///
    /// Returns false (and drops the result) when the stage would break the
    /// pipeline order.
    pub fn push(&mut self, result: StageResult) -> bool {
        if let Some(last) = self.stages.last() {
            if result.stage.position() <= last.stage.position() {
                return false;
            }
        }
        self.stages.push(result);
        true
    }

    pub fn stages(&self) -> &[StageResult] {
        &self.stages
    }

    pub fn stage(&self, stage: BuildStage) -> Option<&StageResult> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.stage.name()).collect()
    }

    /// Success requires scanning, resolving and both build checks to have passed
    pub fn passed(&self) -> bool {
        [
            BuildStage::Scanning,
            BuildStage::Resolving,
            BuildStage::BasicBuildTest,
            BuildStage::FullBuildTest,
        ]
        .iter()
        .all(|stage| self.stage(*stage).is_some_and(|s| s.passed))
    }

    /// Process exit code for this report
    pub fn exit_code(&self) -> i32 {
        if self.passed() { 0 } else { 1 }
    }

    /// Human-readable summary: one line per stage
    pub fn summary(&self, verbose: bool) -> String {
        let mut lines = Vec::new();

        for stage in &self.stages {
            let marker = if stage.passed { "PASS" } else { "FAIL" };
            let mut line = format!("[{}] {:<15} {}", marker, stage.stage.name(), stage.counts());
            if !stage.passed {
                if let Some(first) = stage.errors.first() {
                    line.push_str(&format!(" | {}", first));
                }
            }
            lines.push(line.trim_end().to_string());

            if verbose {
                for error in &stage.errors {
                    lines.push(format!("    error: {}", error));
                }
                for warning in &stage.warnings {
                    lines.push(format!("    warning: {}", warning));
                }
                if let StageData::Build(check) = &stage.data {
                    if !check.log_tail.is_empty() {
                        lines.push("    compiler output (tail):".to_string());
                        for log_line in &check.log_tail {
                            lines.push(format!("      {}", log_line));
                        }
                    }
                }
            }
        }

        let verdict = if self.passed() { "PASSED" } else { "FAILED" };
        lines.push(format!("Build check {}", verdict));
        lines.join("\n")
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
