use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::monitoring::prober::{QUICK_CHECK_TIMEOUT, SCHEDULED_CHECK_TIMEOUT};
use crate::version::default_user_agent;

/// Headroom the executor gives a check past the HTTP client's own timeout.
const CHECK_DEADLINE_GRACE: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("Failed to load config from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerConfig {
    pub database_url: String,
    pub tick_interval_secs: u64,
    pub worker_pool_size: usize,
    pub check_timeout_secs: u64,
    pub quick_check_timeout_secs: u64,
    pub max_checks_per_tick: Option<usize>,
    pub probe_location: String,
    pub user_agent: String,
    pub retention_interval_secs: u64,
    pub log_dir: String,
    pub create_schema: bool,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
pub struct PartialWorkerConfig {
    database_url: Option<String>,
    tick_interval_secs: Option<u64>,
    worker_pool_size: Option<usize>,
    check_timeout_secs: Option<u64>,
    quick_check_timeout_secs: Option<u64>,
    max_checks_per_tick: Option<usize>,
    probe_location: Option<String>,
    user_agent: Option<String>,
    retention_interval_secs: Option<u64>,
    log_dir: Option<String>,
    create_schema: Option<bool>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://uptimepro.db?mode=rwc".to_string(),
            tick_interval_secs: 60,
            worker_pool_size: 16,
            check_timeout_secs: SCHEDULED_CHECK_TIMEOUT.as_secs(),
            quick_check_timeout_secs: QUICK_CHECK_TIMEOUT.as_secs(),
            max_checks_per_tick: None,
            probe_location: "US-East".to_string(),
            user_agent: default_user_agent(),
            retention_interval_secs: 3600,
            log_dir: "logs".to_string(),
            create_schema: false,
        }
    }
}

impl PartialWorkerConfig {
    /// A missing file yields an empty layer.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_env_iter<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(vars)?)
    }
}

impl WorkerConfig {
    /// File, then environment (including `.env`), then defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let file_config = match config_path {
            Some(path) => PartialWorkerConfig::from_file(Path::new(path))?,
            None => PartialWorkerConfig::default(),
        };
        let env_config = PartialWorkerConfig::from_env_iter(std::env::vars())?;

        Self::merge(file_config, env_config)
    }

    /// Environment overrides file.
    pub fn merge(
        file: PartialWorkerConfig,
        env: PartialWorkerConfig,
    ) -> Result<Self, ConfigError> {
        let defaults = WorkerConfig::default();
        let config = WorkerConfig {
            database_url: env
                .database_url
                .or(file.database_url)
                .unwrap_or(defaults.database_url),
            tick_interval_secs: env
                .tick_interval_secs
                .or(file.tick_interval_secs)
                .unwrap_or(defaults.tick_interval_secs),
            worker_pool_size: env
                .worker_pool_size
                .or(file.worker_pool_size)
                .unwrap_or(defaults.worker_pool_size),
            check_timeout_secs: env
                .check_timeout_secs
                .or(file.check_timeout_secs)
                .unwrap_or(defaults.check_timeout_secs),
            quick_check_timeout_secs: env
                .quick_check_timeout_secs
                .or(file.quick_check_timeout_secs)
                .unwrap_or(defaults.quick_check_timeout_secs),
            max_checks_per_tick: env.max_checks_per_tick.or(file.max_checks_per_tick),
            probe_location: env
                .probe_location
                .or(file.probe_location)
                .unwrap_or(defaults.probe_location),
            user_agent: env
                .user_agent
                .or(file.user_agent)
                .unwrap_or(defaults.user_agent),
            retention_interval_secs: env
                .retention_interval_secs
                .or(file.retention_interval_secs)
                .unwrap_or(defaults.retention_interval_secs),
            log_dir: env.log_dir.or(file.log_dir).unwrap_or(defaults.log_dir),
            create_schema: env
                .create_schema
                .or(file.create_schema)
                .unwrap_or(defaults.create_schema),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("tick_interval_secs", self.tick_interval_secs),
            ("worker_pool_size", self.worker_pool_size as u64),
            ("check_timeout_secs", self.check_timeout_secs),
            ("quick_check_timeout_secs", self.quick_check_timeout_secs),
            ("retention_interval_secs", self.retention_interval_secs),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be greater than 0")));
            }
        }
        if self.max_checks_per_tick == Some(0) {
            return Err(ConfigError::Invalid(
                "max_checks_per_tick must be greater than 0 when set".to_string(),
            ));
        }
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Invalid("database_url must be set".to_string()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }

    /// Executor deadline for one scheduled check. The HTTP timeout fires
    /// first, so this one only catches a task that stopped making progress.
    pub fn check_deadline(&self) -> Duration {
        self.check_timeout() + CHECK_DEADLINE_GRACE
    }

    pub fn quick_check_timeout(&self) -> Duration {
        Duration::from_secs(self.quick_check_timeout_secs)
    }

    pub fn retention_interval(&self) -> Duration {
        Duration::from_secs(self.retention_interval_secs)
    }
}
