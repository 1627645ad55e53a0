//! Configuration I/O (YAML/Env loading)
//!
//! ```yaml
//! version: 1
//! lookback:
//!   commit_log_cache_size: 500
//! store:
//!   sqlite_path: versions.db
//! repositories:
//!   my-repo: /srv/git/my-repo
//! access:
//!   public_repos: [my-repo]
//!   grants:
//!     alice: [private-repo]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, ConfigResult};
use super::lookback::{ConfigSource, LookbackConfig, LookbackPolicy};

pub const SUPPORTED_VERSIONS: &[u32] = &[1];

/// Version record store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    pub sqlite_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("analysis_versions.db"),
        }
    }
}

/// Read-access allow-list; absent means every principal may read everything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    pub public_repos: Vec<String>,
    pub grants: BTreeMap<String, Vec<String>>,
}

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServiceConfigV1 {
    version: Option<u32>,

    #[serde(default)]
    lookback: LookbackConfig,

    #[serde(default)]
    store: StoreConfig,

    #[serde(default)]
    repositories: BTreeMap<String, PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    access: Option<AccessConfig>,
}

/// Service configuration, validated
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub lookback: LookbackConfig,
    pub store: StoreConfig,
    pub repositories: BTreeMap<String, PathBuf>,
    pub access: Option<AccessConfig>,
    lookback_source: ConfigSource,
}

impl ServiceConfig {
    /// Load from a YAML file, then apply environment overrides
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml_str(&content, &path.display().to_string())?;

        // Relative store/repository paths are relative to the config file
        if let Some(dir) = path.parent() {
            config.rebase_paths(dir);
        }

        if config.lookback.apply_env()? {
            config.lookback_source =
                ConfigSource::Env(super::lookback::ENV_COMMIT_LOG_CACHE_SIZE.to_string());
        }
        Ok(config)
    }

    /// Parse YAML text; `origin` is recorded as the value source
    pub fn from_yaml_str(content: &str, origin: &str) -> ConfigResult<Self> {
        let raw: ServiceConfigV1 = serde_yaml::from_str(content)?;

        let version = raw.version.ok_or(ConfigError::MissingVersion)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        Ok(Self {
            lookback: raw.lookback,
            store: raw.store,
            repositories: raw.repositories,
            access: raw.access,
            lookback_source: ConfigSource::Yaml {
                path: origin.to_string(),
            },
        })
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ServiceConfigV1 {
            version: Some(1),
            lookback: self.lookback.clone(),
            store: self.store.clone(),
            repositories: self.repositories.clone(),
            access: self.access.clone(),
        };
        Ok(serde_yaml::to_string(&export)?)
    }

    pub fn lookback_policy(&self) -> LookbackPolicy {
        LookbackPolicy::from_config(&self.lookback, self.lookback_source.clone())
    }

    pub fn repository_path(&self, repo: &str) -> ConfigResult<&Path> {
        self.repositories
            .get(repo)
            .map(PathBuf::as_path)
            .ok_or_else(|| ConfigError::UnknownRepository(repo.to_string()))
    }

    fn rebase_paths(&mut self, dir: &Path) {
        if self.store.sqlite_path.is_relative() {
            self.store.sqlite_path = dir.join(&self.store.sqlite_path);
        }
        for path in self.repositories.values_mut() {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
    }
}
