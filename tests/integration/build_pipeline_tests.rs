/*!
 * Integration tests for the build orchestrator
 */

use std::sync::Arc;
use anyhow::Result;
use texprep::build::{MockBehavior, MockCompiler, MockLocator};
use texprep::pipeline::{BuildOrchestrator, BuildStage, StageData};
use texprep::scanning::{DependencyResolver, ReferenceScanner};
use crate::common;

/// Test that missing references are stubbed and the run proceeds to the builds
#[tokio::test]
async fn test_run_withMissingPackageAndModule_shouldCreateTwoStubs() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let config = common::create_project(temp_dir.path(), common::SCENARIO_ROOT)?;

    let report = BuildOrchestrator::new(config, Arc::new(MockCompiler::working())).run().await;

    let resolving = report.stage(BuildStage::Resolving).unwrap();
    assert!(resolving.passed);

    let stubbing = report.stage(BuildStage::Stubbing).unwrap();
    assert!(stubbing.passed);
    match &stubbing.data {
        StageData::Stub { created, failed } => {
            assert_eq!(created.len(), 2);
            assert!(failed.is_empty());
        }
        other => panic!("unexpected stubbing data: {:?}", other),
    }

    assert!(temp_dir.path().join("themeA.sty").exists());
    assert!(temp_dir.path().join("intro.tex").exists());
    assert!(report.stage(BuildStage::BasicBuildTest).is_some());
    assert!(report.stage(BuildStage::FullBuildTest).is_some());
    assert_eq!(report.exit_code(), 0);

    Ok(())
}

/// Test that a second resolution after the run finds nothing missing
#[tokio::test]
async fn test_run_thenResolveAgain_shouldFindNothingMissing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::create_project(temp_dir.path(), common::SCENARIO_ROOT)?;

    BuildOrchestrator::new(config.clone(), Arc::new(MockCompiler::working())).run().await;

    let scan = ReferenceScanner::from_config(&config).scan_file(&config.root_document)?;
    let resolution = DependencyResolver::new(config.root_dir()).resolve(&scan.references());
    assert!(resolution.is_complete());

    Ok(())
}

/// Test that well-known distribution packages are never stubbed
#[tokio::test]
async fn test_run_withDistributionPackages_shouldNotStubThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::create_project(
        temp_dir.path(),
        "\\documentclass{article}\n\\usepackage{listings}\n\\usepackage{siunitx, natbib}\n\\usepackage{fontspec,etoolbox}\n\\begin{document}\n\\end{document}\n",
    )?;

    let report = BuildOrchestrator::new(config, Arc::new(MockCompiler::working()))
        .with_locator(Arc::new(MockLocator::unavailable()))
        .run()
        .await;

    for name in ["listings", "siunitx", "natbib", "fontspec", "etoolbox"] {
        assert!(!temp_dir.path().join(format!("{}.sty", name)).exists(), "stubbed {}", name);
    }
    match &report.stage(BuildStage::Scanning).unwrap().data {
        StageData::Scan { result, .. } => {
            assert!(result.style_packages.is_empty());
            assert_eq!(result.external_packages.len(), 5);
        }
        other => panic!("unexpected scanning data: {:?}", other),
    }
    assert_eq!(report.exit_code(), 0);

    Ok(())
}

/// Test that a package the distribution provides is dropped from the missing set
#[tokio::test]
async fn test_run_withInstalledUnlistedPackage_shouldOnlyStubProjectPackage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::create_project(
        temp_dir.path(),
        "\\documentclass{article}\n\\usepackage{obscurepkg}\n\\usepackage{themeA}\n\\begin{document}\n\\end{document}\n",
    )?;
    let locator = MockLocator::with_packages(&["obscurepkg"]);

    let report = BuildOrchestrator::new(config, Arc::new(MockCompiler::working()))
        .with_locator(Arc::new(locator.clone()))
        .run()
        .await;

    assert!(!temp_dir.path().join("obscurepkg.sty").exists());
    assert!(temp_dir.path().join("themeA.sty").exists());
    assert_eq!(locator.lookups(), vec!["obscurepkg", "themeA"]);
    match &report.stage(BuildStage::Resolving).unwrap().data {
        StageData::Resolve(resolution) => {
            assert_eq!(resolution.provided, vec!["obscurepkg"]);
            assert_eq!(resolution.missing.len(), 1);
        }
        other => panic!("unexpected resolving data: {:?}", other),
    }

    Ok(())
}

/// Test that path-like package names are never looked up in the distribution
#[tokio::test]
async fn test_run_withPathLikePackage_shouldStubWithoutLookup() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::create_project(
        temp_dir.path(),
        "\\usepackage{style/brand}\n\\begin{document}\n\\end{document}\n",
    )?;
    let locator = MockLocator::with_packages(&["style/brand"]);

    BuildOrchestrator::new(config, Arc::new(MockCompiler::working()))
        .with_locator(Arc::new(locator.clone()))
        .run()
        .await;

    assert!(locator.lookups().is_empty());
    assert!(temp_dir.path().join("style/brand.sty").exists());

    Ok(())
}

/// Test that an unreachable distribution lookup is reported on the resolving stage
#[tokio::test]
async fn test_run_withLookupUnavailable_shouldWarnAndStubUnknownPackage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::create_project(temp_dir.path(), common::SCENARIO_ROOT)?;

    let report = BuildOrchestrator::new(config, Arc::new(MockCompiler::working()))
        .with_locator(Arc::new(MockLocator::unavailable()))
        .run()
        .await;

    let resolving = report.stage(BuildStage::Resolving).unwrap();
    assert!(resolving.passed);
    assert!(resolving.warnings.iter().any(|w| w.contains("Package lookup unavailable")));
    assert!(temp_dir.path().join("themeA.sty").exists());

    Ok(())
}

/// Test that a zero-byte artifact fails the pipeline at the basic check
#[tokio::test]
async fn test_run_withZeroByteArtifact_shouldFailBasicBuild() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::create_project(temp_dir.path(), common::SCENARIO_ROOT)?;

    let report = BuildOrchestrator::new(config, Arc::new(MockCompiler::empty_artifact())).run().await;

    let basic = report.stage(BuildStage::BasicBuildTest).unwrap();
    assert!(!basic.passed);
    assert!(basic.errors[0].contains("0 bytes"));
    assert!(report.stage(BuildStage::FullBuildTest).is_none());
    assert_eq!(report.exit_code(), 1);

    Ok(())
}

/// Test that an absent compiler yields vacuous passes and overall success
#[tokio::test]
async fn test_run_withMissingCompiler_shouldPassWithWarnings() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::create_project(temp_dir.path(), common::SCENARIO_ROOT)?;

    let report = BuildOrchestrator::new(config, Arc::new(MockCompiler::missing())).run().await;

    for stage in [BuildStage::BasicBuildTest, BuildStage::FullBuildTest] {
        let result = report.stage(stage).unwrap();
        assert!(result.passed);
        assert!(!result.warnings.is_empty());
    }
    assert!(report.passed());
    assert_eq!(report.exit_code(), 0);

    Ok(())
}

/// Test the missing-compiler path through the real subprocess compiler
#[tokio::test]
async fn test_run_withUninstalledProgram_shouldPassWithWarnings() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = common::create_project(temp_dir.path(), common::SCENARIO_ROOT)?;
    config.compiler.program = "texprep-uninstalled-compiler".to_string();

    let report = BuildOrchestrator::from_config(config).run().await;

    assert_eq!(report.exit_code(), 0);
    assert!(report.summary(false).contains("compiler not found"));

    Ok(())
}

/// Test that the basic check runs before the full check
#[tokio::test]
async fn test_run_withWorkingCompiler_shouldCompileBasicThenFull() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::create_project(temp_dir.path(), common::SCENARIO_ROOT)?;
    let compiler = MockCompiler::working();

    BuildOrchestrator::new(config, Arc::new(compiler.clone())).run().await;

    let calls: Vec<String> = compiler.calls().iter().map(|p| p.to_string_lossy().to_string()).collect();
    assert_eq!(calls, vec!["main_basic_check.tex", "main.tex"]);

    Ok(())
}

/// Test that a failing full build still records every stage and fails overall
#[tokio::test]
async fn test_run_withFailingFullBuild_shouldReportAllStages() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let config = common::create_project(temp_dir.path(), common::SCENARIO_ROOT)?;
    let compiler = MockCompiler::failing().with_override("_basic_check", MockBehavior::Working { artifact_bytes: 4096 });

    let report = BuildOrchestrator::new(config, Arc::new(compiler)).run().await;

    assert_eq!(
        report.stage_names(),
        vec!["Scanning", "Resolving", "Stubbing", "BasicBuildTest", "FullBuildTest"]
    );
    assert!(report.stage(BuildStage::BasicBuildTest).unwrap().passed);
    assert!(!report.stage(BuildStage::FullBuildTest).unwrap().passed);
    assert_eq!(report.exit_code(), 1);

    Ok(())
}

/// Test that every outcome produces a prefix of the fixed stage order
#[tokio::test]
async fn test_run_withVariousOutcomes_shouldFollowPipelineOrder() -> Result<()> {
    let compilers = vec![
        MockCompiler::working(),
        MockCompiler::failing(),
        MockCompiler::empty_artifact(),
        MockCompiler::missing(),
        MockCompiler::new(MockBehavior::TimingOut),
    ];

    for compiler in compilers {
        let temp_dir = common::create_temp_dir()?;
        let config = common::create_project(temp_dir.path(), common::SCENARIO_ROOT)?;

        let report = BuildOrchestrator::new(config, Arc::new(compiler)).run().await;
        let stages: Vec<BuildStage> = report.stages().iter().map(|s| s.stage).collect();

        assert!(stages.len() >= 4);
        assert_eq!(stages[..], BuildStage::PIPELINE_ORDER[..stages.len()]);
    }

    Ok(())
}

/// Test that a stub that cannot be written is recorded but not fatal
#[tokio::test]
async fn test_run_withUnsafeReference_shouldRecordStubFailureAndContinue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let project = temp_dir.path().join("project");
    std::fs::create_dir(&project)?;
    let config = common::create_project(&project, "\\begin{document}\n\\input{../outside}\n\\end{document}\n")?;

    let report = BuildOrchestrator::new(config, Arc::new(MockCompiler::working())).run().await;

    let stubbing = report.stage(BuildStage::Stubbing).unwrap();
    assert!(!stubbing.passed);
    assert!(stubbing.errors[0].contains("outside"));
    assert!(report.stage(BuildStage::FullBuildTest).is_some());
    assert!(!temp_dir.path().join("outside.tex").exists());

    Ok(())
}

/// Test that structural problems in the root document surface as warnings
#[tokio::test]
async fn test_run_withUnbalancedRoot_shouldWarnDuringScanning() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::create_project(
        temp_dir.path(),
        "\\documentclass{article}\n\\begin{document}\n\\textbf{open\n\\end{document}\n",
    )?;

    let report = BuildOrchestrator::new(config, Arc::new(MockCompiler::working())).run().await;

    let scanning = report.stage(BuildStage::Scanning).unwrap();
    assert!(scanning.passed);
    assert!(!scanning.warnings.is_empty());

    Ok(())
}

/// Test that the JSON report lists the stages in pipeline order
#[tokio::test]
async fn test_report_toJson_shouldSerializeStages() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = common::create_project(temp_dir.path(), common::SCENARIO_ROOT)?;

    let report = BuildOrchestrator::new(config, Arc::new(MockCompiler::working())).run().await;
    let json: serde_json::Value = serde_json::from_str(&report.to_json()?)?;

    let names: Vec<&str> = json["stages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["stage"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Scanning", "Resolving", "Stubbing", "BasicBuildTest", "FullBuildTest"]);
    assert_eq!(json["stages"][2]["data"]["type"], "stub");

    Ok(())
}
