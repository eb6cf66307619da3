/*!
 * Common test utilities for the texprep test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Result;
use tempfile::TempDir;
use texprep::app_config::BuildConfig;

/// Routes library logging to the test output; safe to call more than once
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Root document referencing one local package and one content module
pub const SCENARIO_ROOT: &str = r"\documentclass{article}
\usepackage[utf8]{inputenc}
\usepackage{themeA}
\begin{document}
\input{intro}
\end{document}
";

/// Writes `main.tex` with `content` and returns a build config pointing at it
pub fn create_project(dir: &Path, content: &str) -> Result<BuildConfig> {
    let root = create_test_file(dir, "main.tex", content)?;
    Ok(BuildConfig {
        root_document: root,
        ..Default::default()
    })
}

/// Known-malformed inputs paired with their repaired form
pub fn malformed_corpus() -> Vec<(&'static str, &'static str)> {
    vec![
        (r"\textbackslash{}section\textbackslash{}{Title}", r"\section{Title}"),
        (r"\textbackslash{}section\{Intro\}", r"\section{Intro}"),
        (
            r"\textbackslash{}begin\{itemize\} \textbackslash{}item a \textbackslash{}end\{itemize\}",
            r"\begin{itemize} \item a \end{itemize}",
        ),
        (
            r"\textbackslash{}textbf\{bold\} and \textbackslash{}emph\{it\}",
            r"\textbf{bold} and \emph{it}",
        ),
        (r"see \textbackslash{}ref\{fig:one\}", r"see \ref{fig:one}"),
        (r"\textbackslash{}textcolor\{red\}\{warn\}", r"\textcolor{red}{warn}"),
        (r"a \textbackslash{}hline b", r"a \hline b"),
        (r"\textbackslash{}usepackage[utf8]\{inputenc\}", r"\usepackage[utf8]{inputenc}"),
        (r"50\textbackslash{}\% done", r"50\% done"),
        (
            r"\textbackslash{}fbox\{\textbackslash{}colorbox\{\textbackslash{}emph\{x\}\}\}",
            r"\fbox{\colorbox{\emph{x}}}",
        ),
    ]
}
