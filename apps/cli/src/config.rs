//! Layered configuration for the `fli` binary
//!
//! Sources, lowest priority first:
//! 1. built-in defaults
//! 2. a config file (`--config <path>`, or `fli.toml` / `fli.yaml` in the
//!    working directory when present)
//! 3. `FLI_` environment variables, `__` separating sections
//!    (`FLI_QUERY__LIMIT=50`, `FLI_LOGGING__JSON=true`)
//!
//! A `.env` file is loaded into the environment first.

use anyhow::{bail, Context};
use config::{Config, Environment, File};
use fli_querybuilder::vpc_flow_logs::DEFAULT_VERSION;
use serde::Deserialize;
use std::path::Path;

/// Row limit when neither the command line nor a collection entry sets one
pub const DEFAULT_LIMIT: i64 = 20;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FliConfig {
    #[serde(default)]
    pub query: QueryDefaults,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults applied to queries that do not set a value
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryDefaults {
    pub version: u32,
    pub limit: i64,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for the `fli` crates when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json: false,
        }
    }
}

impl FliConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = Config::builder()
            .set_default("query.version", i64::from(DEFAULT_VERSION))?
            .set_default("query.limit", DEFAULT_LIMIT)?
            .set_default("logging.level", DEFAULT_LOG_LEVEL)?
            .set_default("logging.json", false)?;

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("fli").required(false)),
        };

        builder
            .add_source(
                Environment::with_prefix("FLI")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read configuration sources")?
            .try_deserialize()
            .context("failed to deserialize configuration")
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.logging.level.trim().is_empty() {
            bail!("logging.level must not be empty");
        }
        if self.query.limit < 0 {
            bail!("query.limit must be non-negative, got {}", self.query.limit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_are_valid() {
        let config = FliConfig::default();
        assert_eq!(config.query.version, 2);
        assert_eq!(config.query.limit, DEFAULT_LIMIT);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_level() {
        let mut config = FliConfig::default();
        config.logging.level = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_yaml_file() {
        let path = std::env::temp_dir().join(format!("fli-config-{}.yaml", std::process::id()));
        fs::write(&path, "query:\n  version: 5\nlogging:\n  json: true\n").unwrap();

        let config = FliConfig::load(Some(&path)).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.query.version, 5);
        assert_eq!(config.query.limit, DEFAULT_LIMIT);
        assert!(config.logging.json);
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let path = std::env::temp_dir().join("fli-config-does-not-exist.toml");
        assert!(FliConfig::load(Some(&path)).is_err());
    }
}
