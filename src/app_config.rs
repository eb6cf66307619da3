use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Dependency validation and build check settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Escaping repair settings
    #[serde(default)]
    pub escaping: EscapingConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Build pipeline configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BuildConfig {
    // @field: Root document of the project
    #[serde(default = "default_root_document")]
    pub root_document: PathBuf,

    // @field: Directory the compiler writes artifacts to (root dir when unset)
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    // @field: Write stubs for missing references
    #[serde(default = "default_true")]
    pub generate_stubs: bool,

    // @field: Smallest artifact accepted as a real build product
    #[serde(default = "default_min_artifact_bytes")]
    pub min_artifact_bytes: u64,

    // @field: Packages provided by the TeX distribution, never resolved on disk
    #[serde(default = "default_external_packages")]
    pub external_packages: Vec<String>,

    // @field: Package name prefixes that always denote project packages, e.g. "style/"
    #[serde(default)]
    pub local_package_prefixes: Vec<String>,

    // @field: Program asked whether the distribution provides a package (None disables the lookup)
    #[serde(default = "default_package_lookup")]
    pub package_lookup: Option<String>,

    // @field: Keep the generated basic-check document after the run
    #[serde(default)]
    pub keep_basic_document: bool,

    // @field: External compiler settings
    #[serde(default)]
    pub compiler: CompilerConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root_document: default_root_document(),
            output_dir: None,
            generate_stubs: true,
            min_artifact_bytes: default_min_artifact_bytes(),
            external_packages: default_external_packages(),
            local_package_prefixes: Vec::new(),
            package_lookup: default_package_lookup(),
            keep_basic_document: false,
            compiler: CompilerConfig::default(),
        }
    }
}

impl BuildConfig {
    /// Directory containing the root document
    pub fn root_dir(&self) -> PathBuf {
        match self.root_document.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Directory where build artifacts are expected; relative output dirs resolve from the root dir
    pub fn artifact_dir(&self) -> PathBuf {
        resolve_artifact_dir(&self.root_dir(), self.output_dir.as_deref())
    }
}

/// Artifact directory for documents compiled in `root_dir`
pub fn resolve_artifact_dir(root_dir: &Path, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) => root_dir.join(dir),
        None => root_dir.to_path_buf(),
    }
}

/// External document compiler configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CompilerConfig {
    /// Compiler executable name or path
    #[serde(default = "default_compiler_program")]
    pub program: String,

    /// Extra arguments passed before the document path
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Timeout for a single compiler invocation
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: default_compiler_program(),
            extra_args: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CompilerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Escaping repair configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EscapingConfig {
    /// Upper bound on fixed-point passes per file
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,

    /// Write a backup before overwriting a file
    #[serde(default = "default_true")]
    pub backup: bool,

    /// Suffix appended to the original file name for backups
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,

    /// File extensions scanned in a target directory
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Run structural checks on the repaired text
    #[serde(default = "default_true")]
    pub validate_after_fix: bool,
}

impl Default for EscapingConfig {
    fn default() -> Self {
        Self {
            max_passes: default_max_passes(),
            backup: true,
            backup_suffix: default_backup_suffix(),
            extensions: default_extensions(),
            validate_after_fix: true,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_root_document() -> PathBuf {
    PathBuf::from("main.tex")
}

fn default_min_artifact_bytes() -> u64 {
    1024
}

fn default_compiler_program() -> String {
    "pdflatex".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_passes() -> usize {
    6
}

fn default_backup_suffix() -> String {
    ".bak".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["tex".to_string(), "sty".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_package_lookup() -> Option<String> {
    Some("kpsewhich".to_string())
}

fn default_external_packages() -> Vec<String> {
    [
        // Core and AMS
        "alltt", "amsfonts", "amsmath", "amssymb", "amsthm", "array", "bm", "calc",
        "color", "dcolumn", "delarray", "fontenc", "graphics", "graphicx", "hhline",
        "ifthen", "inputenc", "latexsym", "longtable", "makeidx", "mathtools",
        "multicol", "showidx", "tabularx", "textcomp", "verbatim", "xspace",
        // Layout and typography
        "babel", "fancyhdr", "fontspec", "geometry", "lmodern", "microtype",
        "parskip", "polyglossia", "ragged2e", "setspace", "titlesec", "titling",
        "tocloft", "ulem", "xltxtra", "unicode-math", "newtxtext", "newtxmath",
        "mathptmx", "helvet", "courier", "times", "palatino", "libertine",
        // Floats, tables and figures
        "booktabs", "caption", "float", "multirow", "subcaption", "subfig",
        "threeparttable", "wrapfig", "placeins", "makecell", "colortbl", "tabu",
        "pdflscape", "rotating", "adjustbox", "pdfpages",
        // Boxes, colour and drawing
        "mdframed", "tcolorbox", "framed", "tikz", "pgf", "pgfplots", "xcolor",
        "eso-pic", "fontawesome", "fontawesome5", "tikzpagenodes",
        // References and bibliography
        "biblatex", "cite", "cleveref", "csquotes", "hyperref", "hyperxmp",
        "nameref", "natbib", "url", "varioref", "footmisc", "appendix",
        "glossaries", "imakeidx", "nomencl",
        // Code and algorithms
        "algorithm", "algorithm2e", "algorithmic", "algpseudocode", "fancyvrb",
        "listings", "minted",
        // Units, lists and forms
        "siunitx", "enumitem", "eforms", "insdljs", "comment", "lipsum", "blindtext",
        "todonotes", "marginnote", "chngcntr",
        // Programming layer
        "etoolbox", "expl3", "xparse", "keyval", "kvoptions", "xkeyval",
        "pgfkeys", "ifpdf", "ifxetex", "ifluatex", "iftex", "xstring", "fp",
        "atbegshi", "everypage", "zref", "refcount", "lastpage", "datetime2",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Config {
    /// Load the configuration from `path`, or create and save a default one
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {:?}", path))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.build.root_document.as_os_str().is_empty() {
            return Err(anyhow!("Root document path must not be empty"));
        }

        if self.build.compiler.program.trim().is_empty() {
            return Err(anyhow!("Compiler program must not be empty"));
        }

        if matches!(&self.build.package_lookup, Some(program) if program.trim().is_empty()) {
            return Err(anyhow!("Package lookup program must not be empty; use null to disable the lookup"));
        }

        if self.build.compiler.timeout_secs == 0 {
            return Err(anyhow!("Compiler timeout must be at least one second"));
        }

        if self.escaping.max_passes == 0 {
            return Err(anyhow!("Escaping repair needs at least one pass"));
        }

        if self.escaping.backup_suffix.is_empty() {
            return Err(anyhow!("Backup suffix must not be empty"));
        }

        if self.escaping.extensions.is_empty() {
            return Err(anyhow!("At least one file extension must be configured for escaping repair"));
        }

        Ok(())
    }
}
