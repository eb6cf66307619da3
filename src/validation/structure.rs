/*!
 * Structural well-formedness checks for document markup.
 *
 * These checks are advisory: they produce issues, never errors. They are
 * shared by the escaping repair pipeline (post-fix validation) and the build
 * pipeline (root document sanity check).
 *
 * - Grouping braces balance (escaped `\{` / `\}` are ignored)
 * - `\begin{..}` / `\end{..}` pairs match
 * - No residual escape markers (`\textbackslash{}name`) remain
 * - Commands do not mix active and escaped braces (`\cmd{x\}`)
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::scanning::scanner::strip_comment;

/// Regex for escape markers still followed by a command name
static RESIDUAL_ESCAPE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\textbackslash\{\}[a-zA-Z]+").expect("Invalid residual escape regex")
});

/// Regex for a command opened with `{` and closed with `\}`
static OPEN_ACTIVE_CLOSE_ESCAPED_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\([a-zA-Z]+)\{[^{}\n]*\\\}").expect("Invalid mixed delimiter regex")
});

/// Regex for a command opened with `\{` and closed with `}`
static OPEN_ESCAPED_CLOSE_ACTIVE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\([a-zA-Z]+)\\\{[^{}\n]*\}").expect("Invalid mixed delimiter regex")
});

/// Regex for environment delimiters
static ENVIRONMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(begin|end)\s*\{([^}]+)\}").expect("Invalid environment regex")
});

/// Commands that legitimately take escaped braces as delimiters
const DELIMITER_COMMANDS: &[&str] = &["left", "right", "big", "Big", "bigg", "Bigg", "bigl", "bigr", "Bigl", "Bigr"];

/// Types of structural issues
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructureIssue {
    /// A closing brace without a matching opening brace
    UnexpectedClosingBrace { line: usize },
    /// Opening braces left unclosed at end of text
    UnclosedBraces { count: usize },
    /// `\end{..}` that does not close the innermost open environment
    MismatchedEnvironment { line: usize, expected: Option<String>, found: String },
    /// Environments never closed
    UnclosedEnvironment { name: String, line: usize },
    /// An escape marker that was not rewritten
    ResidualEscapeMarker { line: usize, snippet: String },
    /// A command whose delimiters mix active and escaped braces
    MixedDelimiters { line: usize, command: String },
}

impl std::fmt::Display for StructureIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StructureIssue::UnexpectedClosingBrace { line } => {
                write!(f, "Line {}: closing brace without matching opening brace", line)
            }
            StructureIssue::UnclosedBraces { count } => {
                write!(f, "{} opening brace(s) never closed", count)
            }
            StructureIssue::MismatchedEnvironment { line, expected, found } => match expected {
                Some(expected) => write!(
                    f,
                    "Line {}: \\end{{{}}} does not match open environment '{}'",
                    line, found, expected
                ),
                None => write!(f, "Line {}: \\end{{{}}} without \\begin", line, found),
            },
            StructureIssue::UnclosedEnvironment { name, line } => {
                write!(f, "Environment '{}' opened on line {} is never closed", name, line)
            }
            StructureIssue::ResidualEscapeMarker { line, snippet } => {
                write!(f, "Line {}: residual escape marker '{}'", line, snippet)
            }
            StructureIssue::MixedDelimiters { line, command } => {
                write!(f, "Line {}: command \\{} mixes active and escaped braces", line, command)
            }
        }
    }
}

/// Runs all structural checks over a text
#[derive(Debug, Clone, Default)]
pub struct StructureValidator;

impl StructureValidator {
    pub fn new() -> Self {
        Self
    }

    /// Run every check and return issues in check order
    pub fn validate(&self, text: &str) -> Vec<StructureIssue> {
        let mut issues = Self::check_braces(text);
        issues.extend(Self::check_environments(text));
        issues.extend(Self::check_residual_escapes(text));
        issues.extend(Self::check_command_delimiters(text));

        debug!("Structure validation found {} issue(s)", issues.len());
        issues
    }

    /// Brace balance, ignoring comments and backslash-escaped characters
    pub fn check_braces(text: &str) -> Vec<StructureIssue> {
        let mut issues = Vec::new();
        let mut depth: usize = 0;

        for (idx, line) in text.lines().enumerate() {
            let mut chars = strip_comment(line).chars();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        chars.next();
                    }
                    '{' => depth += 1,
                    '}' => {
                        if depth == 0 {
                            issues.push(StructureIssue::UnexpectedClosingBrace { line: idx + 1 });
                        } else {
                            depth -= 1;
                        }
                    }
                    _ => {}
                }
            }
        }

        if depth > 0 {
            issues.push(StructureIssue::UnclosedBraces { count: depth });
        }
        issues
    }

    /// `\begin` / `\end` nesting
    pub fn check_environments(text: &str) -> Vec<StructureIssue> {
        let mut issues = Vec::new();
        let mut stack: Vec<(String, usize)> = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            for caps in ENVIRONMENT_REGEX.captures_iter(strip_comment(line)) {
                let name = caps[2].trim().to_string();
                if &caps[1] == "begin" {
                    stack.push((name, idx + 1));
                    continue;
                }

                match stack.last() {
                    Some((open, _)) if *open == name => {
                        stack.pop();
                    }
                    other => issues.push(StructureIssue::MismatchedEnvironment {
                        line: idx + 1,
                        expected: other.map(|(open, _)| open.clone()),
                        found: name,
                    }),
                }
            }
        }

        issues.extend(
            stack
                .into_iter()
                .map(|(name, line)| StructureIssue::UnclosedEnvironment { name, line }),
        );
        issues
    }

    /// Escape markers that still precede a command name
    pub fn check_residual_escapes(text: &str) -> Vec<StructureIssue> {
        text.lines()
            .enumerate()
            .flat_map(|(idx, line)| {
                RESIDUAL_ESCAPE_REGEX
                    .find_iter(strip_comment(line))
                    .map(move |m| StructureIssue::ResidualEscapeMarker {
                        line: idx + 1,
                        snippet: m.as_str().to_string(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Commands whose argument is opened and closed with different brace kinds
    pub fn check_command_delimiters(text: &str) -> Vec<StructureIssue> {
        let mut issues = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            let line = strip_comment(line);
            let matches = OPEN_ACTIVE_CLOSE_ESCAPED_REGEX
                .captures_iter(line)
                .chain(OPEN_ESCAPED_CLOSE_ACTIVE_REGEX.captures_iter(line));

            for caps in matches {
                let command = &caps[1];
                if command == "textbackslash" || DELIMITER_COMMANDS.contains(&command) {
                    continue;
                }
                issues.push(StructureIssue::MixedDelimiters {
                    line: idx + 1,
                    command: command.to_string(),
                });
            }
        }

        issues
    }
}
