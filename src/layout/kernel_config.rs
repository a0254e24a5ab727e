//! Kernel configuration gate
//!
//! A layout may declare `requires_kernel_config CONFIG_NAME` lines. After a
//! successful parse every such option must be built in (`y`) or a module
//! (`m`) on the running kernel, otherwise the layout is not published.
//!
//! Where the configuration comes from is a [`KernelConfigProvider`]. Hosts
//! without one skip the gate entirely.

use flate2::read::GzDecoder;
use log::{debug, info};
use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Option name to value, e.g. `CONFIG_HID_PLAYSTATION` -> `m`
pub type KernelConfigSnapshot = HashMap<String, String>;

/// Location of the compressed config exposed by `CONFIG_IKCONFIG_PROC`
pub const PROC_CONFIG_GZ: &str = "/proc/config.gz";

#[derive(Debug, Error)]
pub enum KernelConfigError {
    #[error("Kernel configs could not be fetched from any of: {0}")]
    Unavailable(String),

    #[error("IO error reading kernel config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Supplies a snapshot of the running kernel's configuration
pub trait KernelConfigProvider {
    fn snapshot(&self) -> Result<KernelConfigSnapshot, KernelConfigError>;
}

/// A fixed snapshot, e.g. from a saved `.config` file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticKernelConfig {
    configs: KernelConfigSnapshot,
}

impl StaticKernelConfig {
    pub fn new(configs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            configs: configs.into_iter().collect(),
        }
    }

    /// Load a `NAME=value` file; `.gz` files are decompressed first
    pub fn from_file(path: &Path) -> Result<Self, KernelConfigError> {
        let text = read_config_file(path)?;
        Ok(Self {
            configs: parse_kernel_config(&text),
        })
    }
}

impl KernelConfigProvider for StaticKernelConfig {
    fn snapshot(&self) -> Result<KernelConfigSnapshot, KernelConfigError> {
        Ok(self.configs.clone())
    }
}

/// Reads the configuration of the kernel this process runs on.
///
/// Sources are tried in order: any extra paths, `/proc/config.gz`, then
/// `/boot/config-<release>`. The first readable one wins.
#[derive(Debug, Clone, Default)]
pub struct HostKernelConfig {
    extra_paths: Vec<PathBuf>,
}

impl HostKernelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try `paths` before the standard locations
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self { extra_paths: paths }
    }

    /// Every location that will be tried, in order
    pub fn candidate_paths(&self) -> Vec<PathBuf> {
        let mut paths = self.extra_paths.clone();
        paths.push(PathBuf::from(PROC_CONFIG_GZ));
        if let Some(release) = kernel_release() {
            paths.push(PathBuf::from(format!("/boot/config-{}", release)));
        }
        paths
    }
}

impl KernelConfigProvider for HostKernelConfig {
    fn snapshot(&self) -> Result<KernelConfigSnapshot, KernelConfigError> {
        let candidates = self.candidate_paths();
        for path in &candidates {
            match read_config_file(path) {
                Ok(text) => {
                    debug!("Read kernel config from {}", path.display());
                    return Ok(parse_kernel_config(&text));
                }
                Err(e) => debug!("Skipping kernel config source: {}", e),
            }
        }

        let tried: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
        Err(KernelConfigError::Unavailable(tried.join(", ")))
    }
}

#[cfg(unix)]
fn kernel_release() -> Option<String> {
    nix::sys::utsname::uname()
        .ok()
        .map(|uts| uts.release().to_string_lossy().into_owned())
}

#[cfg(not(unix))]
fn kernel_release() -> Option<String> {
    None
}

fn read_config_file(path: &Path) -> Result<String, KernelConfigError> {
    let io_err = |source| KernelConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if path.extension().is_some_and(|ext| ext == "gz") {
        let file = File::open(path).map_err(io_err)?;
        let mut text = String::new();
        GzDecoder::new(file)
            .read_to_string(&mut text)
            .map_err(io_err)?;
        Ok(text)
    } else {
        fs::read_to_string(path).map_err(io_err)
    }
}

/// Parse kernel `.config` syntax.
///
/// `NAME=value` lines are kept with the value verbatim (quotes included).
/// Comments, including `# CONFIG_FOO is not set`, and blank lines are
/// skipped, so unset options are simply absent.
pub fn parse_kernel_config(text: &str) -> KernelConfigSnapshot {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// True for `y` (built in) and `m` (module)
pub fn is_enabled(value: &str) -> bool {
    value == "y" || value == "m"
}

/// A required option that is absent or disabled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingConfig {
    pub name: String,
    /// Value found on the host, `None` if the option is absent
    pub value: Option<String>,
}

/// Check `required` against the provider's snapshot.
///
/// Returns the first option (in name order) that is not enabled. An empty
/// requirement set or a missing provider always passes, and in those cases
/// the provider is never asked for a snapshot.
pub fn find_missing_config(
    required: &BTreeSet<String>,
    provider: Option<&dyn KernelConfigProvider>,
) -> Result<Option<MissingConfig>, KernelConfigError> {
    if required.is_empty() {
        return Ok(None);
    }
    let Some(provider) = provider else {
        return Ok(None);
    };

    let snapshot = provider.snapshot()?;
    for name in required {
        match snapshot.get(name) {
            None => {
                info!("Required kernel config {} is not found", name);
                return Ok(Some(MissingConfig {
                    name: name.clone(),
                    value: None,
                }));
            }
            Some(value) if !is_enabled(value) => {
                info!("Required kernel config {} has option {}", name, value);
                return Ok(Some(MissingConfig {
                    name: name.clone(),
                    value: Some(value.clone()),
                }));
            }
            Some(_) => {}
        }
    }
    Ok(None)
}
