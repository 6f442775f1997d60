use std::path::Path;

use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};

/// Default TOML location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/wheel.toml";

/// JSON overrides, merged after the TOML file.
pub const DEFAULT_JSON_PATH: &str = "config/wheel.json";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file or variable cannot be parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Loads configuration by merging built-in defaults, a TOML file, the
    /// JSON overrides, and `WHEEL_`-prefixed environment variables
    /// (`WHEEL_BROKER__PORT=4002`). Missing files are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file or variable cannot be parsed.
    pub fn load_from(path: &Path) -> Result<AppConfig> {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Json::file(DEFAULT_JSON_PATH))
            .merge(Env::prefixed("WHEEL_").split("__"))
            .extract()?;

        Ok(config)
    }
}
