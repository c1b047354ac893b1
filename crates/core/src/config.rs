//! Application configuration.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::{CatalogSource, LocationFilter};

/// Directory under the user's config dir holding `config.toml`.
pub const CONFIG_DIR_NAME: &str = "instasports";
/// Prefix of environment overrides, e.g. `INSTASPORTS_CONFIRM_DELAY_MS=250`.
pub const ENV_PREFIX: &str = "INSTASPORTS";

/// Settings read at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Catalog JSON file; the built-in data set is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
    /// Simulated booking confirmation delay.
    #[serde(default = "default_confirm_delay_ms")]
    pub confirm_delay_ms: u64,
    /// How long the success notice stays visible.
    #[serde(default = "default_success_notice_ms")]
    pub success_notice_ms: u64,
    /// Location selector applied at startup.
    #[serde(default = "default_location")]
    pub default_location: String,
    /// Duration selector applied at startup, in hours.
    #[serde(default = "default_duration")]
    pub default_duration: String,
    /// Symbol prefixed to prices.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_confirm_delay_ms() -> u64 {
    1000
}

fn default_success_notice_ms() -> u64 {
    5000
}

fn default_location() -> String {
    "all".to_string()
}

fn default_duration() -> String {
    "1".to_string()
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            confirm_delay_ms: default_confirm_delay_ms(),
            success_notice_ms: default_success_notice_ms(),
            default_location: default_location(),
            default_duration: default_duration(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

impl AppConfig {
    /// Load from the default config file plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load from a specific file (optional) plus environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// `env` replaces the process environment when given.
    fn load_with_env(path: &Path, env: Option<HashMap<String, String>>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Catalog source selected by this configuration.
    pub fn catalog_source(&self) -> CatalogSource {
        CatalogSource::from_path(self.catalog_path.clone())
    }

    /// Parsed startup location selector.
    pub fn location(&self) -> LocationFilter {
        self.default_location
            .parse()
            .unwrap_or(LocationFilter::All)
    }
}

/// Path of the user's config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join("config.toml")
}

/// Write a default config file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    write_default_config(&config_path())
}

/// Write the default configuration to `path` unless it already exists.
pub fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let defaults = AppConfig::default();
    let contents = format!(
        "# Instasports storefront settings\n\
         # catalog_path = \"/path/to/catalog.json\"\n\
         confirm_delay_ms = {}\n\
         success_notice_ms = {}\n\
         default_location = \"{}\"\n\
         default_duration = \"{}\"\n\
         currency_symbol = \"{}\"\n",
        defaults.confirm_delay_ms,
        defaults.success_notice_ms,
        defaults.default_location,
        defaults.default_duration,
        defaults.currency_symbol,
    );
    fs::write(path, contents)
        .with_context(|| format!("failed to write config {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(&dir.path().join("config.toml"))?;
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.catalog_source(), CatalogSource::Builtin);
        assert_eq!(config.location(), LocationFilter::All);
        Ok(())
    }

    #[test]
    fn default_file_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("config.toml");
        write_default_config(&path)?;
        assert!(path.exists());
        assert_eq!(AppConfig::load_from(&path)?, AppConfig::default());
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "catalog_path = \"/tmp/catalog.json\"\nconfirm_delay_ms = 250\ndefault_location = \"Delhi\"\n",
        )?;
        write_default_config(&path)?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.confirm_delay_ms, 250);
        assert_eq!(config.success_notice_ms, 5000);
        assert_eq!(config.location(), LocationFilter::city("delhi"));
        assert_eq!(
            config.catalog_source(),
            CatalogSource::File(PathBuf::from("/tmp/catalog.json"))
        );
        Ok(())
    }

    #[test]
    fn prefixed_environment_overrides_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "confirm_delay_ms = 250\ncurrency_symbol = \"$\"\n")?;

        let env = HashMap::from([
            ("INSTASPORTS_CONFIRM_DELAY_MS".to_string(), "40".to_string()),
            ("INSTASPORTS_DEFAULT_LOCATION".to_string(), "Mumbai".to_string()),
            ("OTHERAPP_SUCCESS_NOTICE_MS".to_string(), "1".to_string()),
        ]);
        let config = AppConfig::load_with_env(&path, Some(env))?;
        assert_eq!(config.confirm_delay_ms, 40);
        assert_eq!(config.success_notice_ms, 5000);
        assert_eq!(config.currency_symbol, "$");
        assert_eq!(config.location(), LocationFilter::city("mumbai"));
        Ok(())
    }
}
