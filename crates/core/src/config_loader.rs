use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Toml},
    Figment,
};
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from `config/Autotrader.toml`, `AUTOTRADER_` env vars and
    /// `config/Autotrader.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config/Autotrader.toml")
    }

    /// Loads configuration rooted at a specific TOML file.
    ///
    /// Nested keys are overridden with `__`, e.g.
    /// `AUTOTRADER_SUPERVISOR__MAX_ALL_SYMBOLS=20`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();
        let json = path.with_extension("json");
        let config: AppConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("AUTOTRADER_").split("__"))
            .join(Json::file(json))
            .extract()?;

        Ok(config)
    }

    /// Parses configuration from TOML text without consulting the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed.
    pub fn from_toml_str(toml: &str) -> Result<AppConfig> {
        let config: AppConfig = Figment::new().merge(Toml::string(toml)).extract()?;
        Ok(config)
    }
}
