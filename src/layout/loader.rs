//! Loading entry points
//!
//! A load reads the file, parses it, runs the kernel configuration gate and
//! only then publishes the layout as a shared, immutable `Arc`. Any failure
//! discards the partially built map.

use super::error::LayoutError;
use super::kernel_config::{find_missing_config, HostKernelConfig, KernelConfigProvider};
use super::labels::{InputEventLabels, LabelResolver};
use super::map::KeyLayoutMap;
use super::parser::Parser;
use super::tokenizer::Tokenizer;
use crate::config::{Config, KernelGate};
use log::{debug, error, info};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Shared handle to a loaded layout
pub type SharedKeyLayoutMap = Arc<KeyLayoutMap>;

/// Loads key layout files with an injected label vocabulary and an
/// optional kernel configuration source
pub struct KeyLayoutLoader {
    labels: Box<dyn LabelResolver>,
    kernel_configs: Option<Box<dyn KernelConfigProvider>>,
}

impl Default for KeyLayoutLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyLayoutLoader {
    /// Loader with the built-in labels and the platform default gate
    pub fn new() -> Self {
        Self {
            labels: Box::new(InputEventLabels::new()),
            kernel_configs: default_kernel_config_provider(),
        }
    }

    /// Loader set up from the `[kernel]` section of a config file
    pub fn from_config(config: &Config) -> Self {
        let kernel_configs: Option<Box<dyn KernelConfigProvider>> = match config.kernel.gate {
            KernelGate::Auto => default_kernel_config_provider(),
            KernelGate::Always => Some(Box::new(HostKernelConfig::with_paths(
                config.kernel.config_paths.clone(),
            ))),
            KernelGate::Never => None,
        };
        Self {
            labels: Box::new(InputEventLabels::new()),
            kernel_configs,
        }
    }

    /// Replace the label vocabulary
    pub fn with_labels(mut self, labels: impl LabelResolver + 'static) -> Self {
        self.labels = Box::new(labels);
        self
    }

    /// Check `requires_kernel_config` lines against `provider`
    pub fn with_kernel_config_provider(
        mut self,
        provider: impl KernelConfigProvider + 'static,
    ) -> Self {
        self.kernel_configs = Some(Box::new(provider));
        self
    }

    /// Let every layout through regardless of its kernel requirements
    pub fn without_kernel_config_gate(mut self) -> Self {
        self.kernel_configs = None;
        self
    }

    pub fn has_kernel_config_gate(&self) -> bool {
        self.kernel_configs.is_some()
    }

    /// Load a layout file from disk
    pub fn load(&self, path: impl AsRef<Path>) -> Result<SharedKeyLayoutMap, LayoutError> {
        let path = path.as_ref();
        let tokenizer = Tokenizer::open(path).map_err(|source| {
            error!(
                "Error opening key layout map file {}: {}",
                path.display(),
                source
            );
            LayoutError::OpenFailed {
                path: path.to_path_buf(),
                source,
            }
        })?;
        self.load_tokenizer(tokenizer)
    }

    /// Load a layout from memory; `filename` is only used in diagnostics
    pub fn load_contents(
        &self,
        filename: &str,
        contents: &str,
    ) -> Result<SharedKeyLayoutMap, LayoutError> {
        self.load_tokenizer(Tokenizer::from_contents(filename, contents))
    }

    fn load_tokenizer(&self, mut tokenizer: Tokenizer) -> Result<SharedKeyLayoutMap, LayoutError> {
        let start = Instant::now();
        let mut map = KeyLayoutMap::new();
        Parser::new(&mut map, &mut tokenizer, self.labels.as_ref()).parse()?;
        debug!(
            target: "keylayout::parser",
            "Parsed key layout map file '{}' {} lines in {:.3}ms.",
            tokenizer.filename(),
            tokenizer.line_number(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        let filename = tokenizer.filename().to_string();
        let missing = find_missing_config(
            map.required_kernel_configs(),
            self.kernel_configs.as_deref(),
        )
        .map_err(|e| {
            error!("{}", e);
            LayoutError::Internal(e.to_string())
        })?;
        if let Some(missing) = missing {
            info!(
                "Not loading {} because the required kernel configs are not set",
                filename
            );
            return Err(LayoutError::MissingKernelConfig {
                filename,
                config: missing.name,
                value: missing.value,
            });
        }

        map.set_load_file_name(filename);
        Ok(Arc::new(map))
    }
}

/// Only device builds carry a kernel configuration worth checking
#[cfg(target_os = "android")]
fn default_kernel_config_provider() -> Option<Box<dyn KernelConfigProvider>> {
    Some(Box::new(HostKernelConfig::new()))
}

#[cfg(not(target_os = "android"))]
fn default_kernel_config_provider() -> Option<Box<dyn KernelConfigProvider>> {
    None
}

/// Load a file with the default loader
pub fn load(path: impl AsRef<Path>) -> Result<SharedKeyLayoutMap, LayoutError> {
    KeyLayoutLoader::new().load(path)
}

/// Load in-memory contents with the default loader
pub fn load_contents(filename: &str, contents: &str) -> Result<SharedKeyLayoutMap, LayoutError> {
    KeyLayoutLoader::new().load_contents(filename, contents)
}
