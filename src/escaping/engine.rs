/*!
 * Fixed-point repair engine for over-escaped markup.
 *
 * One pass applies every rule of the pattern table in order. Passes repeat
 * until a pass makes no replacement (fixed point) or the pass bound is hit.
 * Nested escaping needs more than one pass: an outer escaped wrapper only
 * matches once the commands inside it are active again.
 */

use std::collections::BTreeMap;

use log::{debug, warn};
use regex::Captures;
use serde::{Deserialize, Serialize};

use crate::validation::{StructureIssue, StructureValidator};

use super::patterns::{PatternCategory, PatternTable};

/// Configuration for the repair engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of passes before giving up on convergence
    pub max_passes: usize,

    /// Run structural checks on the repaired text
    pub validate_output: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_passes: 6,
            validate_output: true,
        }
    }
}

impl From<&crate::app_config::EscapingConfig> for EngineConfig {
    fn from(config: &crate::app_config::EscapingConfig) -> Self {
        Self {
            max_passes: config.max_passes,
            validate_output: config.validate_after_fix,
        }
    }
}

/// Non-fatal findings attached to a repair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PatternEngineWarning {
    /// The pass bound was reached while rules were still matching
    PassBoundExhausted { max_passes: usize },
    /// Post-fix structural validation found a problem
    Structure(StructureIssue),
}

impl std::fmt::Display for PatternEngineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternEngineWarning::PassBoundExhausted { max_passes } => {
                write!(f, "Escaping repair did not converge within {} passes", max_passes)
            }
            PatternEngineWarning::Structure(issue) => write!(f, "{}", issue),
        }
    }
}

/// Result of repairing one text
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    /// Repaired text (the input unchanged when nothing matched)
    pub text: String,
    /// Total replacements across all passes
    pub replacement_count: usize,
    /// Passes executed, including the final pass that found nothing
    /// (which may run once beyond the bound to confirm a fixed point)
    pub passes_used: usize,
    /// Whether a pass with no replacements was reached
    pub converged: bool,
    /// Replacements per rule category
    pub by_category: BTreeMap<PatternCategory, usize>,
    pub warnings: Vec<PatternEngineWarning>,
}

impl RepairOutcome {
    pub fn changed(&self) -> bool {
        self.replacement_count > 0
    }
}

/// Repair engine applying a pattern table to a fixed point.
pub struct EscapingRepairEngine {
    table: &'static PatternTable,
    config: EngineConfig,
}

impl EscapingRepairEngine {
    /// Create a new engine with the standard table and default config.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create with custom config.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            table: PatternTable::standard(),
            config,
        }
    }

    /// Create with a custom table.
    pub fn with_table(table: &'static PatternTable, config: EngineConfig) -> Self {
        Self { table, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Apply every rule once, in table order
    ///
    /// Returns the rewritten text and the replacement count per category.
    pub fn apply_pass(&self, text: &str) -> (String, BTreeMap<PatternCategory, usize>) {
        let mut current = text.to_string();
        let mut counts = BTreeMap::new();

        for rule in self.table.rules() {
            let mut hits = 0usize;
            let rewritten = rule.regex.replace_all(&current, |caps: &Captures| {
                let mut expanded = String::new();
                caps.expand(rule.replacement, &mut expanded);
                if expanded != caps[0] {
                    hits += 1;
                }
                expanded
            });

            if hits > 0 {
                let rewritten = rewritten.into_owned();
                *counts.entry(rule.category).or_insert(0) += hits;
                current = rewritten;
            }
        }

        (current, counts)
    }

    /// Repair `text` until no rule matches or the pass bound is reached
    pub fn repair(&self, text: &str) -> RepairOutcome {
        let mut current = text.to_string();
        let mut by_category: BTreeMap<PatternCategory, usize> = BTreeMap::new();
        let mut replacement_count = 0;
        let mut passes_used = 0;
        let mut converged = false;

        while passes_used < self.config.max_passes {
            passes_used += 1;
            let (candidate, counts) = self.apply_pass(&current);
            let pass_total: usize = counts.values().sum();

            if pass_total == 0 {
                converged = true;
                break;
            }

            debug!("Escaping pass {}: {} replacement(s)", passes_used, pass_total);
            replacement_count += pass_total;
            for (category, count) in counts {
                *by_category.entry(category).or_insert(0) += count;
            }
            current = candidate;
        }

        // The bound caps changing passes; a text that needed exactly that many
        // is confirmed with one more pass before it counts as unconverged.
        if !converged {
            let (_, counts) = self.apply_pass(&current);
            if counts.values().sum::<usize>() == 0 {
                passes_used += 1;
                converged = true;
            }
        }

        let mut warnings = Vec::new();
        if !converged {
            warn!(
                "Escaping repair stopped after {} passes without reaching a fixed point",
                self.config.max_passes
            );
            warnings.push(PatternEngineWarning::PassBoundExhausted {
                max_passes: self.config.max_passes,
            });
        }

        if self.config.validate_output && replacement_count > 0 {
            warnings.extend(
                StructureValidator::new()
                    .validate(&current)
                    .into_iter()
                    .map(PatternEngineWarning::Structure),
            );
        }

        RepairOutcome {
            text: current,
            replacement_count,
            passes_used,
            converged,
            by_category,
            warnings,
        }
    }
}

impl Default for EscapingRepairEngine {
    fn default() -> Self {
        Self::new()
    }
}
