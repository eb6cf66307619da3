/*!
 * Tests for reference scanning, dependency resolution and stub generation
 */

use std::fs;
use anyhow::Result;
use texprep::app_config::BuildConfig;
use texprep::errors::StubGenerationError;
use texprep::scanning::{
    DependencyResolver, Reference, ReferenceKind, ReferenceScanner, TemplateGenerator, STUB_MARKER,
};
use crate::common;

fn scanner() -> ReferenceScanner {
    ReferenceScanner::with_external_packages(&BuildConfig::default().external_packages)
}

/// Test that package lists and includes are split into ordered references
#[test]
fn test_scan_withMixedDeclarations_shouldSeparateKinds() {
    let text = r"\documentclass{report}
\usepackage[margin=1in]{geometry}
\usepackage{styles/brand, themeA}
\RequirePackage{themeA}
% \usepackage{commented}
\begin{document}
\include{chapters/one}
\input{chapters/two} % \input{commented}
\subfile{appendix}
\end{document}
";

    let result = scanner().scan(text);

    assert_eq!(result.style_packages, vec!["styles/brand", "themeA"]);
    assert_eq!(result.content_modules, vec!["chapters/one", "chapters/two", "appendix"]);
    assert_eq!(result.external_packages, vec!["geometry"]);
    assert_eq!(result.total(), 5);
}

/// Test that escaped percent signs do not start a comment
#[test]
fn test_scan_withEscapedPercent_shouldKeepDeclaration() {
    let result = scanner().scan(r"50\% done \input{results}");

    assert_eq!(result.content_modules, vec!["results"]);
}

/// Test that an unreadable root document is a scan error
#[test]
fn test_scan_file_withMissingDocument_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    assert!(scanner().scan_file(temp_dir.path().join("absent.tex")).is_err());

    Ok(())
}

/// Test that resolution yields exactly the absent files, in order, once each
#[test]
fn test_resolve_withFilesystemSnapshot_shouldReturnExactMissingSet() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "present.sty", "")?;
    common::create_test_file(temp_dir.path(), "chapters/one.tex", "")?;
    fs::create_dir(temp_dir.path().join("dirlike.tex"))?;

    let references = vec![
        Reference::new("present", ReferenceKind::StylePackage),
        Reference::new("absent", ReferenceKind::StylePackage),
        Reference::new("chapters/one", ReferenceKind::ContentModule),
        Reference::new("chapters/two", ReferenceKind::ContentModule),
        Reference::new("absent", ReferenceKind::StylePackage),
        Reference::new("dirlike", ReferenceKind::ContentModule),
    ];

    let resolution = DependencyResolver::new(temp_dir.path()).resolve(&references);
    let missing: Vec<&str> = resolution.missing.iter().map(|m| m.reference.path.as_str()).collect();

    assert_eq!(missing, vec!["absent", "chapters/two", "dirlike"]);
    assert_eq!(resolution.records.len(), 5);

    Ok(())
}

/// Test that resolving again after generating stubs finds nothing missing
#[test]
fn test_generate_all_thenResolve_shouldLeaveNothingMissing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let references = vec![
        Reference::new("themeA", ReferenceKind::StylePackage),
        Reference::new("parts/intro", ReferenceKind::ContentModule),
    ];
    let resolver = DependencyResolver::new(temp_dir.path());

    let first = resolver.resolve(&references);
    let outcome = TemplateGenerator::new().generate_all(&first.missing);
    let second = resolver.resolve(&references);

    assert_eq!(outcome.created.len(), 2);
    assert!(outcome.failed.is_empty());
    assert!(second.is_complete());

    Ok(())
}

/// Test that stubs carry the marker and the expected shape
#[test]
fn test_generate_withBothKinds_shouldWriteMarkedStubs() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let references = vec![
        Reference::new("themeA", ReferenceKind::StylePackage),
        Reference::new("my_first-part", ReferenceKind::ContentModule),
    ];
    let resolution = DependencyResolver::new(temp_dir.path()).resolve(&references);

    TemplateGenerator::new().generate_all(&resolution.missing);

    let package = fs::read_to_string(temp_dir.path().join("themeA.sty"))?;
    let content = fs::read_to_string(temp_dir.path().join("my_first-part.tex"))?;

    assert!(package.contains(STUB_MARKER));
    assert!(package.contains(r"\ProvidesPackage{themeA}"));
    assert!(content.contains(STUB_MARKER));
    assert!(content.contains(r"\section{My First Part}"));

    Ok(())
}

/// Test that references escaping the project are refused
#[test]
fn test_generate_withParentPath_shouldRefuse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let project = temp_dir.path().join("project");
    fs::create_dir(&project)?;
    let references = vec![Reference::new("../outside", ReferenceKind::ContentModule)];
    let resolution = DependencyResolver::new(&project).resolve(&references);

    let outcome = TemplateGenerator::new().generate_all(&resolution.missing);

    assert!(outcome.created.is_empty());
    assert!(matches!(outcome.failed[0], StubGenerationError::UnsafePath(_)));
    assert!(!temp_dir.path().join("outside.tex").exists());

    Ok(())
}
