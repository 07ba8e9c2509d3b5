//! Process configuration.
//!
//! Sources, later overriding earlier:
//! 1. built-in defaults
//! 2. `credits.yaml` in the working directory (if present)
//! 3. the file named by `CREDITS_CONFIG` (if set)
//! 4. `CREDITS__*` environment variables (`CREDITS__DATABASE_URL`, `CREDITS__DEBUG`, ...)
//! 5. plain `DATABASE_URL`, if set

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use credits_ledger::{OperationValues, TenantConfig};

/// Environment variable naming an extra YAML config file.
pub const CONFIG_ENV_VAR: &str = "CREDITS_CONFIG";

/// Prefix for environment overrides.
pub const CONFIG_ENV_PREFIX: &str = "CREDITS";

const DEFAULT_CONFIG_FILE: &str = "credits";

#[derive(Debug, Error)]
#[error("configuration error: {0}")]
pub struct ConfigError(#[from] ::config::ConfigError);

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app_name: String,
    pub debug: bool,
    pub bind_addr: String,
    /// Postgres URL; without it every tenant gets an in-memory store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Create missing tenant tables at startup.
    pub auto_provision: bool,
    /// Deadline for each storage call; 0 disables it.
    pub storage_timeout_ms: u64,
    pub operation_values: OperationValues,
    pub tenants: Vec<TenantConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "Credits".to_string(),
            debug: false,
            bind_addr: "0.0.0.0:8080".to_string(),
            database_url: None,
            max_connections: 10,
            auto_provision: false,
            storage_timeout_ms: 5_000,
            operation_values: OperationValues::standard(),
            tenants: vec![TenantConfig::health_ai(), TenantConfig::travel_ai()],
        }
    }
}

impl Settings {
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config, Environment, File, FileFormat};

        let mut builder = Config::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }
        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let builder = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database_url", std::env::var("DATABASE_URL").ok())?;

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn storage_timeout(&self) -> Option<Duration> {
        (self.storage_timeout_ms > 0).then(|| Duration::from_millis(self.storage_timeout_ms))
    }
}
