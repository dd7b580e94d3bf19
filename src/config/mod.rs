//! Configuration layer: typed settings with layered precedence (file → env → CLI).

#[cfg(test)]
mod tests;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::catalog::CatalogSettings;
use crate::resilience::{BreakerSettings, GuardSettings};

const LOCAL_CONFIG_BASENAME: &str = "mercato";
const ENV_PREFIX: &str = "MERCATO";

/// Command-line arguments for the Mercato binary.
#[derive(Debug, Parser)]
#[command(name = "mercato", version, about = "Mercato catalog server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "MERCATO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Override the listen host.
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Override the listen port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Override the Postgres connection URL.
    #[arg(long = "database-url", env = "MERCATO_DATABASE__URL")]
    pub database_url: Option<String>,

    /// Serve from in-memory repositories instead of Postgres.
    #[arg(long = "in-memory", default_value_t = false)]
    pub in_memory: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
    #[error("configuration error: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: LogLevel,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: IpAddr,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub page_ttl_secs: u64,
    pub detail_ttl_secs: u64,
    pub counter_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResilienceSettings {
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub failure_threshold: u32,
    pub cooldown_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogTuning {
    pub allowed_page_sizes: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub resilience: ResilienceSettings,
    pub catalog: CatalogTuning,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings: built-in defaults, then an optional config file,
    /// then `MERCATO_*` environment variables, then CLI overrides.
    pub fn load(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080_i64)?
            .set_default("server.graceful_shutdown_secs", 30_i64)?
            .set_default("database.url", "postgres://localhost/mercato")?
            .set_default("database.max_connections", 8_i64)?
            .set_default("database.run_migrations", true)?
            .set_default("cache.page_ttl_secs", 60_i64)?
            .set_default("cache.detail_ttl_secs", 600_i64)?
            .set_default("cache.counter_ttl_secs", 300_i64)?
            .set_default("resilience.timeout_ms", 2000_i64)?
            .set_default("resilience.max_attempts", 3_i64)?
            .set_default("resilience.backoff_base_ms", 50_i64)?
            .set_default("resilience.failure_threshold", 5_i64)?
            .set_default("resilience.cooldown_secs", 30_i64)?
            .set_default("catalog.allowed_page_sizes", vec![10_i64, 20, 50])?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "compact")?;

        builder = match &args.config_file {
            Some(path) => builder.add_source(File::from(path.as_path())),
            None => builder.add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false)),
        };

        let mut settings: Settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        if let Some(host) = args.host {
            settings.server.host = host;
        }
        if let Some(port) = args.port {
            settings.server.port = port;
        }
        if let Some(url) = &args.database_url {
            settings.database.url = url.clone();
        }

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.allowed_page_sizes.is_empty() {
            return Err(ConfigError::Invalid(
                "catalog.allowed_page_sizes must not be empty".to_string(),
            ));
        }
        if self.resilience.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "resilience.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.resilience.failure_threshold == 0 {
            return Err(ConfigError::Invalid(
                "resilience.failure_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn catalog_settings(&self) -> CatalogSettings {
        CatalogSettings {
            page_ttl: Duration::from_secs(self.cache.page_ttl_secs),
            detail_ttl: Duration::from_secs(self.cache.detail_ttl_secs),
            counter_ttl: Duration::from_secs(self.cache.counter_ttl_secs),
            allowed_page_sizes: self.catalog.allowed_page_sizes.clone(),
        }
    }

    pub fn guard_settings(&self) -> GuardSettings {
        GuardSettings {
            timeout: Duration::from_millis(self.resilience.timeout_ms),
            max_attempts: self.resilience.max_attempts,
            backoff_base: Duration::from_millis(self.resilience.backoff_base_ms),
            breaker: BreakerSettings {
                failure_threshold: self.resilience.failure_threshold,
                cooldown: Duration::from_secs(self.resilience.cooldown_secs),
            },
        }
    }
}
