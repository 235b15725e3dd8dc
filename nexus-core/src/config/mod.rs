//! Configuration management

pub mod validation;

pub use validation::{Validate, ValidationError};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub execution: ExecutionConfig,
    pub queue: QueueConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub plugins: PluginsConfig,
}

/// How accepted jobs are executed
///
/// Selected per deployment, never per job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Jobs are handed to an external task queue and run by worker processes
    #[serde(alias = "celery", alias = "queue")]
    Distributed,
    /// Jobs run as deferred background tasks inside the accepting process
    #[default]
    Inline,
}

impl ExecutionMode {
    /// Parse the values accepted by the `NEXUS_TASK_MODE` override
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "distributed" | "celery" | "queue" => Some(Self::Distributed),
            "inline" | "local" => Some(Self::Inline),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Distributed => write!(f, "distributed"),
            Self::Inline => write!(f, "inline"),
        }
    }
}

/// Job execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub mode: ExecutionMode,
    /// Upper bound on jobs a single worker process runs at once
    pub max_concurrent_jobs: usize,
    /// How long a worker blocks waiting for the next queued task
    pub poll_timeout_seconds: u64,
    /// Grace period for in-flight jobs on shutdown
    pub shutdown_timeout_seconds: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Inline,
            max_concurrent_jobs: 4,
            poll_timeout_seconds: 5,
            shutdown_timeout_seconds: 10,
        }
    }
}

impl ExecutionConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_seconds)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }
}

/// Task queue (Redis/Dragonfly) configuration, used in distributed mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Connection URL (e.g., "redis://127.0.0.1:6379/0")
    pub url: String,
    /// Prefix for every key the queue writes
    pub key_prefix: String,
    /// How long task states stay in the queue's result store
    pub result_ttl_seconds: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379/0".to_string(),
            key_prefix: "nexus".to_string(),
            result_ttl_seconds: 86_400,
        }
    }
}

impl QueueConfig {
    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.result_ttl_seconds)
    }
}

/// Report store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL, or `memory` for the in-process store
    /// (can also be set via DATABASE_URL env var)
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_seconds: u64,
    /// Apply bundled migrations at startup
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "memory".to_string(),
            max_connections: 5,
            connect_timeout_seconds: 30,
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    /// Whether reports live in process memory instead of PostgreSQL
    pub fn is_in_memory(&self) -> bool {
        self.url == "memory"
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

/// Analyzer plugin configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PluginsConfig {
    /// Factory ids that must not be loaded even though they are compiled in
    pub disabled: Vec<String>,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        // Add environment-specific config if ENV is set
        if let Ok(env) = std::env::var("ENV") {
            debug!(env = %env, "Layering environment-specific configuration");
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        // Add local config and environment variables last (highest priority)
        builder = builder
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("NEXUS").separator("__"));

        let mut config: Config = builder.build()?.try_deserialize()?;
        config.apply_conventional_overrides(|key| std::env::var(key).ok())?;

        // Validate the loaded configuration
        config.validate()?;

        Ok(config)
    }

    /// Honour the conventional single-underscore variables used by deployments
    fn apply_conventional_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ValidationError> {
        if let Some(database_url) = lookup("DATABASE_URL") {
            info!("Report store URL taken from DATABASE_URL");
            self.database.url = database_url;
        }

        if let Some(mode) = lookup("NEXUS_TASK_MODE") {
            self.execution.mode = ExecutionMode::parse(&mode).ok_or_else(|| {
                ValidationError::execution(format!("Unknown NEXUS_TASK_MODE value: {}", mode))
            })?;
            info!(mode = %self.execution.mode, "Execution mode set by NEXUS_TASK_MODE");
        }

        Ok(())
    }
}

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration file error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(#[from] ValidationError),
}
