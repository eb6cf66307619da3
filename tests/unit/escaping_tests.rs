/*!
 * Tests for the escaping repair engine
 */

use texprep::escaping::{EngineConfig, EscapingRepairEngine, PatternCategory, PatternEngineWarning};
use crate::common;

/// Test that every corpus entry is repaired to its expected form
#[test]
fn test_repair_withMalformedCorpus_shouldRestoreMarkup() {
    let engine = EscapingRepairEngine::new();

    for (input, expected) in common::malformed_corpus() {
        let outcome = engine.repair(input);
        assert_eq!(outcome.text, expected, "input: {}", input);
    }
}

/// Test that every corpus entry converges within six passes
#[test]
fn test_repair_withPassBoundSix_shouldConverge() {
    let engine = EscapingRepairEngine::with_config(EngineConfig {
        max_passes: 6,
        validate_output: false,
    });

    for (input, _) in common::malformed_corpus() {
        let outcome = engine.repair(input);
        assert!(outcome.converged, "did not converge: {}", input);
        assert!(outcome.passes_used <= 6);
        assert!(!outcome
            .warnings
            .iter()
            .any(|w| matches!(w, PatternEngineWarning::PassBoundExhausted { .. })));
    }
}

/// Test that repairing already repaired output changes nothing
#[test]
fn test_repair_onOwnOutput_shouldMakeNoReplacements() {
    let engine = EscapingRepairEngine::new();
    let mut inputs: Vec<String> = common::malformed_corpus().iter().map(|(i, _)| i.to_string()).collect();
    inputs.push(common::malformed_corpus().iter().map(|(i, _)| *i).collect::<Vec<_>>().join("\n"));

    for input in inputs {
        let first = engine.repair(&input);
        let second = engine.repair(&first.text);
        assert_eq!(second.replacement_count, 0, "not idempotent: {}", input);
        assert_eq!(second.text, first.text);
    }
}

/// Test that clean markup is returned byte-identical
#[test]
fn test_repair_withCleanDocument_shouldNotChange() {
    let engine = EscapingRepairEngine::new();
    let text = r"\documentclass{article}
\usepackage{themeA}
\begin{document}
\section{Results}
We measured 50\% improvement (see \ref{tab:one}).
\begin{tabular}{ll}
\hline
a & b \\
\end{tabular}
Literal \textbackslash{} in prose stays.
\end{document}
";

    let outcome = engine.repair(text);

    assert!(!outcome.changed());
    assert_eq!(outcome.text, text);
    assert!(outcome.converged);
}

/// Test that the escaped-section case is one basic command replacement
#[test]
fn test_repair_withEscapedSectionMarker_shouldCountBasicCommand() {
    let outcome = EscapingRepairEngine::new().repair(r"\textbackslash{}section\textbackslash{}{Title}");

    assert_eq!(outcome.text, r"\section{Title}");
    assert_eq!(outcome.replacement_count, 1);
    assert_eq!(outcome.by_category.get(&PatternCategory::BasicCommand), Some(&1));
    assert_eq!(PatternCategory::BasicCommand.label(), "basic command escaping");
}
