//! Lookback bound configuration
//!
//! The bound is the number of ancestor commits a single resolution may list
//! as interior candidates. 250 is the floor; an operator-configured commit
//! log cache size raises it, never lowers it.

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};

/// Default and minimum lookback bound
pub const DEFAULT_LOOKBACK_LIMIT: usize = 250;

/// Environment variable overriding `lookback.commit_log_cache_size`
pub const ENV_COMMIT_LOG_CACHE_SIZE: &str = "CODEGRAPH__LOOKBACK__COMMIT_LOG_CACHE_SIZE";

/// Where a configuration value came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Built-in default
    Default,

    /// From YAML file
    Yaml { path: String },

    /// From environment variable
    Env(String),

    /// From builder API
    Builder,
}

impl ConfigSource {
    pub fn describe(&self) -> String {
        match self {
            ConfigSource::Default => "default".to_string(),
            ConfigSource::Yaml { path } => format!("yaml:{}", path),
            ConfigSource::Env(var) => format!("env:{}", var),
            ConfigSource::Builder => "builder".to_string(),
        }
    }
}

/// Lookback section of the service configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LookbackConfig {
    /// Size of the history backend's commit log cache; raises the bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_log_cache_size: Option<usize>,
}

impl LookbackConfig {
    pub fn with_commit_log_cache_size(mut self, size: usize) -> Self {
        self.commit_log_cache_size = Some(size);
        self
    }

    /// Apply the environment override, if set
    pub fn apply_env(&mut self) -> ConfigResult<bool> {
        self.apply_env_value(std::env::var(ENV_COMMIT_LOG_CACHE_SIZE).ok())
    }

    fn apply_env_value(&mut self, value: Option<String>) -> ConfigResult<bool> {
        let Some(raw) = value else {
            return Ok(false);
        };
        let size = raw
            .trim()
            .parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnv {
                var: ENV_COMMIT_LOG_CACHE_SIZE.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            })?;
        self.commit_log_cache_size = Some(size);
        Ok(true)
    }

    /// Effective bound: `max(250, commit_log_cache_size)`
    pub fn lookback_limit(&self) -> usize {
        match self.commit_log_cache_size {
            Some(size) if size > DEFAULT_LOOKBACK_LIMIT => size,
            _ => DEFAULT_LOOKBACK_LIMIT,
        }
    }
}

/// Resolved lookback bound, injected into the resolver at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookbackPolicy {
    limit: usize,
    source: ConfigSource,
}

impl LookbackPolicy {
    /// Build from config, recording where the value came from
    pub fn from_config(config: &LookbackConfig, source: ConfigSource) -> Self {
        let limit = config.lookback_limit();
        let source = if limit == DEFAULT_LOOKBACK_LIMIT {
            ConfigSource::Default
        } else {
            source
        };
        Self { limit, source }
    }

    /// Explicit bound (tests, embedding callers)
    ///
    /// Unlike the operator setting this may go below 250; zero is clamped to 1.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            source: ConfigSource::Builder,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }
}

impl Default for LookbackPolicy {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LOOKBACK_LIMIT,
            source: ConfigSource::Default,
        }
    }
}
