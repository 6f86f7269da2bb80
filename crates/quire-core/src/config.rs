//! Application configuration
//!
//! Stored as JSON. Every field has a default, so a partial file is valid.

use crate::error::{Error, Result};
use crate::sandbox::DEFAULT_SIDECAR_SUFFIX;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Which local image paths are read under scoped access
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScopePolicy {
    /// Every absolute and document-relative path
    Always,
    /// Never acquire scopes (unsandboxed builds)
    Never,
    /// Only paths under one of these roots
    UnderRoots { roots: Vec<PathBuf> },
}

impl Default for ScopePolicy {
    fn default() -> Self {
        Self::Always
    }
}

impl ScopePolicy {
    pub fn requires_scope(&self, path: &Path) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::UnderRoots { roots } => roots.iter().any(|root| path.starts_with(root)),
        }
    }
}

/// Resource loader settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub scope_policy: ScopePolicy,
    pub remote_timeout_secs: u64,
    /// Upper bound for a remote image body
    pub max_remote_bytes: u64,
    pub user_agent: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            scope_policy: ScopePolicy::default(),
            remote_timeout_secs: 30,
            max_remote_bytes: 25 * 1024 * 1024,
            user_agent: format!("Quire/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl LoaderConfig {
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }
}

/// Sidecar folder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidecarConfig {
    pub folder_suffix: String,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            folder_suffix: DEFAULT_SIDECAR_SUFFIX.to_string(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuireConfig {
    pub loader: LoaderConfig,
    pub sidecar: SidecarConfig,
    /// Directory for the recents database
    pub data_dir: PathBuf,
}

impl Default for QuireConfig {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            sidecar: SidecarConfig::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl QuireConfig {
    /// Default config file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quire")
            .join("config.json")
    }

    /// Read a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {:?}: {}", path, e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config {:?}: {}", path, e)))?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Read a config file, using defaults when it does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quire")
}
