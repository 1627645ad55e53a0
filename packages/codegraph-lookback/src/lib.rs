//! codegraph-lookback - Nearest reusable analysis version
//!
//! Given a request for data at (repository, commit, path), answers with the
//! commit whose precomputed analysis data can stand in for it.
//!
//! ## Core Principles
//!
//! 1. **Exact first**: a record at the requested commit always wins
//! 2. **Content-equivalence window**: lookback only inspects commits between
//!    the last commit touching `path` and the requested head
//! 3. **Nearest wins**: the candidate closest to head is chosen
//! 4. **Root never looks back**: `""`/`"."` is served only by an exact match
//!
//! ## Usage
//!
//! ```rust,ignore
//! use codegraph_lookback::{
//!     GitHistoryProvider, LookbackPolicy, ResolveContext, SqliteVersionStore,
//!     StaticAccessControl, VersionLookupUseCase, VersionService,
//! };
//! use std::sync::Arc;
//!
//! let service = VersionService::new(
//!     Arc::new(GitHistoryProvider::new().with_repository("my-repo", "/srv/git/my-repo")),
//!     Arc::new(SqliteVersionStore::new("versions.db")?),
//!     Arc::new(StaticAccessControl::new().public("my-repo")),
//!     LookbackPolicy::default(),
//! );
//!
//! let ctx = ResolveContext::new().with_timeout(std::time::Duration::from_secs(5));
//! let version = service
//!     .resolve_version("alice", "my-repo", "main", "src/lib.rs", &ctx)
//!     .await?;
//! println!("{} ({} commits back)", version.commit_id, version.distance);
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::{
    ErrorKind, NotFoundReason, PortResult, ResolveError, Result, UpstreamError, UpstreamKind,
};

pub use domain::{
    AccessControl, AccessDecision, AnalysisVersion, CommitId, DataVersion, HistoryProvider,
    RepoId, RepoRevision, Resolution, TreeEntry, VersionStore,
};

pub use application::{
    LookbackResolver, ResolveContext, VersionLookupUseCase, VersionResolver, VersionService,
};

pub use config::{ConfigError, LookbackConfig, LookbackPolicy, ServiceConfig};

pub use infrastructure::{AllowAllAccess, InMemoryHistory, InMemoryVersionStore, StaticAccessControl};

#[cfg(feature = "git")]
pub use infrastructure::GitHistoryProvider;
#[cfg(feature = "sqlite")]
pub use infrastructure::SqliteVersionStore;
