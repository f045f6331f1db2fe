//! Configuration
//!
//! Layered settings for the store location, the text generation provider, the
//! message workflow and logging.

mod facade;
pub mod paths;
mod sources;

pub use facade::ConfigLoader;

use crate::conversation::WorkflowSettings;
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::provider::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Store configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Sled database directory; None means the platform data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    pub fn resolve_path(&self) -> Result<PathBuf, ApiError> {
        match &self.path {
            Some(path) if !path.as_os_str().is_empty() => Ok(path.clone()),
            _ => paths::xdg_root::default_store_path(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolarisConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub workflow: WorkflowSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}
