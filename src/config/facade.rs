//! ConfigLoader: composes sources and deserializes to PolarisConfig.

use super::paths::xdg_root;
use super::sources::{environment, file};
use super::PolarisConfig;
use crate::error::ApiError;
use config::Config;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration.
    ///
    /// Precedence (lowest to highest): built-in defaults, global file,
    /// explicit file, environment.
    pub fn load(explicit: Option<&Path>) -> Result<PolarisConfig, ApiError> {
        let global = xdg_root::global_config_path();
        Self::load_with(global.as_deref(), explicit)
    }

    /// Load with an explicit global file location.
    pub fn load_with(
        global: Option<&Path>,
        explicit: Option<&Path>,
    ) -> Result<PolarisConfig, ApiError> {
        let defaults = Config::try_from(&PolarisConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);
        builder = file::add_global(builder, global);
        if let Some(path) = explicit {
            builder = file::add_explicit(builder, path);
        }
        builder = environment::add_to_builder(builder);

        let config: PolarisConfig = builder.build()?.try_deserialize()?;
        config
            .provider
            .validate()
            .map_err(|e| ApiError::ConfigError(format!("Invalid provider config: {}", e)))?;
        Ok(config)
    }

    /// Create default configuration.
    pub fn default() -> PolarisConfig {
        PolarisConfig::default()
    }
}
