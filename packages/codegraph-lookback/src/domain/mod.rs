//! Domain layer
//!
//! # Domain Models
//!
//! - `RepoRevision`: repository pinned to a commit
//! - `TreeEntry`: path inside a `RepoRevision` (root is `""`/`"."`)
//! - `AnalysisVersion`: immutable "analysis data exists" record
//! - `Resolution`: `Exact` or `LookbackHit { distance }`
//! - `DataVersion`: `{ commit_id, distance }` for the request layer
//!
//! # Port Traits
//!
//! - `HistoryProvider`: ancestry queries
//! - `VersionStore`: record existence queries
//! - `AccessControl`: read-access checks

pub mod models;
pub mod ports;

pub use models::{
    is_root_path, normalize_path, AnalysisVersion, CommitId, DataVersion, RepoId, RepoRevision,
    Resolution, TreeEntry,
};
pub use ports::{AccessControl, AccessDecision, HistoryProvider, VersionStore};
