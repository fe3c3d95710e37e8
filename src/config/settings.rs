use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

use crate::core::function::{DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub execution: ExecutionConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    pub default_timeout_ms: u64,
    pub max_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// Load settings from an optional config file plus `APP__`-prefixed
    /// environment overrides (e.g. `APP__EXECUTION__DEFAULT_TIMEOUT_MS`).
    pub fn new() -> Result<Self, ConfigError> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());

        let config = Config::builder()
            .set_default("execution.default_timeout_ms", DEFAULT_TIMEOUT_MS)?
            .set_default("execution.max_timeout_ms", MAX_TIMEOUT_MS)?
            .set_default("storage.dir", "./functions")?
            .set_default("logging.level", "info")?
            .add_source(File::with_name(&format!("config/{}", config_env)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
