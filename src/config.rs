use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;

/// Environment variables override file values, e.g. `HOMESIM__INPUT__SERIES_PATH`.
pub const ENV_PREFIX: &str = "HOMESIM__";
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub input: InputConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Measured series (JSON)
    pub series_path: PathBuf,
    /// Simulation settings and tariff (TOML)
    pub settings_path: PathBuf,
    /// Hourly spot prices (JSON), required for spot tariffs
    pub spot_prices_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportConfig {
    /// Also write the report here; it is always printed to stdout
    pub output_path: Option<PathBuf>,
    /// Embed the simulated series in the report
    #[serde(default)]
    pub include_series: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(figment)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        Ok(figment.extract()?)
    }
}
