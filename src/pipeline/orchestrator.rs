/*!
 * Build orchestrator for dependency validation and incremental build checks.
 *
 * The orchestrator runs five stages in a fixed order:
 * 1. Scanning: Extract references from the root document (fatal on failure)
 * 2. Resolving: Find referenced files missing on disk
 * 3. Stubbing: Write placeholders for the missing files
 * 4. BasicBuildTest: Compile the style layer alone (fatal on failure)
 * 5. FullBuildTest: Compile the complete document
 *
 * Every stage appends exactly one result to the report. Non-fatal failures are
 * recorded and the run continues with whatever data the stage produced.
 */

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info, warn};

use crate::app_config::BuildConfig;
use crate::build::compiler::{DocumentCompiler, ProcessCompiler};
use crate::build::locator::{KpsewhichLocator, PackageLocator, PackageLookup};
use crate::build::tester::{BuildCheckResult, IncrementalBuildTester, TesterConfig};
use crate::scanning::resolver::{DependencyResolver, Resolution};
use crate::scanning::scanner::{read_document, ReferenceScanner, ScanResult};
use crate::scanning::templates::TemplateGenerator;
use crate::validation::structure::StructureValidator;

use super::report::{BuildReport, BuildStage, StageData, StageResult};

/// Runs the dependency and build pipeline for one root document
pub struct BuildOrchestrator {
    config: BuildConfig,
    scanner: ReferenceScanner,
    resolver: DependencyResolver,
    generator: TemplateGenerator,
    validator: StructureValidator,
    tester: IncrementalBuildTester,
    /// Distribution lookup for bare package names; None skips the lookup
    locator: Option<Arc<dyn PackageLocator>>,
}

impl BuildOrchestrator {
    /// Create an orchestrator with an explicit compiler
    pub fn new(config: BuildConfig, compiler: Arc<dyn DocumentCompiler>) -> Self {
        let scanner = ReferenceScanner::from_config(&config);
        let resolver = DependencyResolver::new(config.root_dir());
        let tester = IncrementalBuildTester::new(compiler, TesterConfig::from(&config));
        let locator = config
            .package_lookup
            .as_deref()
            .map(|program| Arc::new(KpsewhichLocator::new(program)) as Arc<dyn PackageLocator>);

        Self {
            config,
            scanner,
            resolver,
            generator: TemplateGenerator::new(),
            validator: StructureValidator::new(),
            tester,
            locator,
        }
    }

    /// Replace the distribution lookup
    pub fn with_locator(mut self, locator: Arc<dyn PackageLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Create an orchestrator that runs the configured compiler binary
    pub fn from_config(config: BuildConfig) -> Self {
        let compiler = Arc::new(ProcessCompiler::from_config(&config.compiler));
        Self::new(config, compiler)
    }

    pub fn root_document(&self) -> &Path {
        &self.config.root_document
    }

    /// Run every stage and return the report
    pub async fn run(&self) -> BuildReport {
        let mut report = BuildReport::new();
        info!(
            "Checking {:?} (artifacts in {:?})",
            self.config.root_document,
            self.config.artifact_dir()
        );

        // Stage 1: Scanning
        let (scan_stage, scan) = self.scan_stage();
        report.push(scan_stage);
        let scan = match scan {
            Some(scan) => scan,
            None => {
                error!("Scanning failed, stopping");
                return report;
            }
        };

        // Stage 2: Resolving
        let (resolve_stage, resolution) = self.resolve_stage(&scan).await;
        report.push(resolve_stage);

        // Stage 3: Stubbing
        report.push(self.stub_stage(&resolution));

        // Stage 4: Basic build
        let started = Instant::now();
        let basic = self.tester.run_basic(&self.config.root_document).await;
        let basic_stage = Self::build_stage(BuildStage::BasicBuildTest, basic).with_duration(started.elapsed());
        let basic_passed = basic_stage.passed;
        report.push(basic_stage);
        if !basic_passed {
            error!("Basic build check failed, skipping full build check");
            return report;
        }

        // Stage 5: Full build
        let started = Instant::now();
        let full = self.tester.run_full(&self.config.root_document).await;
        report.push(Self::build_stage(BuildStage::FullBuildTest, full).with_duration(started.elapsed()));

        if report.passed() {
            info!("Build check passed");
        } else {
            warn!("Build check failed");
        }
        report
    }

    fn scan_stage(&self) -> (StageResult, Option<ScanResult>) {
        let started = Instant::now();

        let text = match read_document(&self.config.root_document) {
            Ok(text) => text,
            Err(e) => {
                error!("{}", e);
                let stage = StageResult::failure(BuildStage::Scanning, e.to_string()).with_duration(started.elapsed());
                return (stage, None);
            }
        };

        let scan = self.scanner.scan(&text);
        let structure = self.validator.validate(&text);

        info!(
            "Found {} local reference(s) and {} external package(s)",
            scan.total(),
            scan.external_packages.len()
        );

        let mut stage = StageResult::new(
            BuildStage::Scanning,
            true,
            StageData::Scan {
                result: scan.clone(),
                structure: structure.clone(),
            },
        );
        for issue in &structure {
            warn!("{:?}: {}", self.config.root_document, issue);
            stage.warnings.push(issue.to_string());
        }

        (stage.with_duration(started.elapsed()), Some(scan))
    }

    async fn resolve_stage(&self, scan: &ScanResult) -> (StageResult, Resolution) {
        let started = Instant::now();
        let mut resolution = self.resolver.resolve(&scan.references());
        let lookup_warning = self.exclude_distribution_packages(&mut resolution).await;

        let mut stage = StageResult::new(BuildStage::Resolving, true, StageData::Resolve(resolution.clone()));
        stage.warnings.extend(lookup_warning);
        for missing in &resolution.missing {
            stage.warnings.push(format!(
                "Missing {} '{}' (expected at {:?})",
                missing.reference.kind, missing.reference.path, missing.expected_path
            ));
        }

        if resolution.is_complete() {
            info!("All {} reference(s) resolved", resolution.records.len());
        } else {
            warn!("{} referenced file(s) missing", resolution.missing.len());
        }

        (stage.with_duration(started.elapsed()), resolution)
    }

    /// Drop missing bare package names the distribution provides
    ///
    /// Returns a warning when the distribution could not be asked.
    async fn exclude_distribution_packages(&self, resolution: &mut Resolution) -> Option<String> {
        let locator = self.locator.as_ref()?;
        let candidates: Vec<String> = resolution
            .missing_packages()
            .filter(|name| !self.scanner.is_project_package(name))
            .map(str::to_string)
            .collect();

        for name in candidates {
            match locator.locate(&name).await {
                PackageLookup::Found(path) => {
                    info!("Package '{}' is provided by the distribution ({:?})", name, path);
                    resolution.mark_provided(&name);
                }
                PackageLookup::NotFound => debug!("Package '{}' is not installed", name),
                PackageLookup::Unavailable(reason) => {
                    warn!("Could not ask the distribution about packages: {}", reason);
                    return Some(format!(
                        "Package lookup unavailable ({}); unlisted packages treated as project files",
                        reason
                    ));
                }
            }
        }
        None
    }

    fn stub_stage(&self, resolution: &Resolution) -> StageResult {
        let started = Instant::now();

        if !self.config.generate_stubs {
            let mut stage = StageResult::new(
                BuildStage::Stubbing,
                true,
                StageData::Stub {
                    created: Vec::new(),
                    failed: Vec::new(),
                },
            );
            if !resolution.is_complete() {
                stage.warnings.push(format!(
                    "Stub generation disabled; {} missing file(s) left in place",
                    resolution.missing.len()
                ));
            }
            return stage.with_duration(started.elapsed());
        }

        let outcome = self.generator.generate_all(&resolution.missing);
        let failed: Vec<String> = outcome.failed.iter().map(|e| e.to_string()).collect();
        for failure in &failed {
            warn!("{}", failure);
        }
        if !outcome.created.is_empty() {
            info!("Created {} stub(s)", outcome.created.len());
        }

        let mut stage = StageResult::new(
            BuildStage::Stubbing,
            failed.is_empty(),
            StageData::Stub {
                created: outcome.created,
                failed: failed.clone(),
            },
        );
        stage.errors = failed;
        stage.with_duration(started.elapsed())
    }

    fn build_stage(stage: BuildStage, check: BuildCheckResult) -> StageResult {
        let mut result = StageResult::new(stage, check.passed, StageData::None);
        result.errors = check.errors.clone();
        result.warnings = check.warnings.clone();
        result.data = StageData::Build(check);
        result
    }
}
