//! CLI configuration.
//!
//! Reads `coxerp.toml` (or the file given with `--config`):
//!
//! ```toml
//! [storage]
//! data_dir = "/var/lib/coxerp"
//!
//! [request]
//! models = ["MODEL-A (Standard)", "MODEL-B (Pro)", "MODEL-C (Lite)"]
//! lens_suppliers = ["자사", "공급사 A", "공급사 B"]
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use coxerp_core::ServiceConfig;
use coxerp_production::RequestConfig;
use serde::Deserialize;
use tracing::debug;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "coxerp.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: ServiceConfig,
    pub request: RequestConfig,
}

impl AppConfig {
    /// Load `path`, or the default file if present, or built-in defaults.
    /// An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !path.exists() {
            if required {
                anyhow::bail!("config file {} does not exist", path.display());
            }
            debug!("no {} found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// `--data-dir` wins over the file.
    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.storage.data_dir = Some(dir);
        }
        self
    }
}
