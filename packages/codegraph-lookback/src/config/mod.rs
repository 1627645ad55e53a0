//! Configuration
//!
//! - `LookbackConfig` / `LookbackPolicy`: the lookback bound and its provenance
//! - `ServiceConfig`: YAML v1 file for the CLI (store, repositories, access)
//!
//! Resolvers take a `LookbackPolicy` value at construction and never read
//! the environment themselves.

pub mod error;
pub mod io;
pub mod lookback;

pub use error::{ConfigError, ConfigResult};
pub use io::{AccessConfig, ServiceConfig, StoreConfig};
pub use lookback::{
    ConfigSource, LookbackConfig, LookbackPolicy, DEFAULT_LOOKBACK_LIMIT,
    ENV_COMMIT_LOG_CACHE_SIZE,
};
