/*!
 * Lookup of packages installed in the TeX distribution.
 *
 * A bare package name missing from the project is only stubbed when the
 * distribution does not provide it either. A stub with the same name as an
 * installed package would shadow it, since the compiler searches the working
 * directory first.
 */

use std::fmt::Debug;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

/// Timeout for a single lookup
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Answer to one package lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageLookup {
    /// Installed at the given path
    Found(PathBuf),
    /// The distribution does not know the package
    NotFound,
    /// The distribution could not be asked
    Unavailable(String),
}

/// Common trait for distribution package lookups
#[async_trait]
pub trait PackageLocator: Send + Sync + Debug {
    /// Look up `<name>.sty`
    async fn locate(&self, name: &str) -> PackageLookup;
}

/// Asks `kpsewhich` (or a compatible program) where a package file lives
#[derive(Debug, Clone)]
pub struct KpsewhichLocator {
    program: String,
}

impl KpsewhichLocator {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

#[async_trait]
impl PackageLocator for KpsewhichLocator {
    async fn locate(&self, name: &str) -> PackageLookup {
        let file = format!("{}.sty", name);
        let lookup = Command::new(&self.program)
            .arg(&file)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::select! {
            result = lookup => match result {
                Ok(output) => output,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return PackageLookup::Unavailable(format!("'{}' not found", self.program));
                }
                Err(e) => return PackageLookup::Unavailable(e.to_string()),
            },
            _ = tokio::time::sleep(LOOKUP_TIMEOUT) => {
                return PackageLookup::Unavailable(format!("'{}' timed out", self.program));
            }
        };

        let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("{} {} -> {:?}", self.program, file, found);
        if output.status.success() && !found.is_empty() {
            PackageLookup::Found(PathBuf::from(found))
        } else {
            PackageLookup::NotFound
        }
    }
}
