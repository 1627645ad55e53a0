//! Domain models
//!
//! All of these are immutable values. Commit ids are opaque strings
//! (full hex hashes for git-backed repositories).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type RepoId = String;
pub type CommitId = String;

/// A repository pinned to a commit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRevision {
    pub repo: RepoId,
    pub commit_id: CommitId,
}

impl RepoRevision {
    pub fn new(repo: impl Into<String>, commit_id: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            commit_id: commit_id.into(),
        }
    }
}

impl fmt::Display for RepoRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.repo, self.commit_id)
    }
}

/// A path inside a pinned repository
///
/// The path is normalized on construction: `"./src/"` becomes `"src"`,
/// and `"."`, `"./"` and `""` all denote the repository root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeEntry {
    pub rev: RepoRevision,
    pub path: String,
}

impl TreeEntry {
    pub fn new(rev: RepoRevision, path: impl AsRef<str>) -> Self {
        Self {
            rev,
            path: normalize_path(path.as_ref()),
        }
    }

    /// Every commit modifies the root, so the root never looks back
    pub fn is_root(&self) -> bool {
        is_root_path(&self.path)
    }

    pub fn repo(&self) -> &str {
        &self.rev.repo
    }

    pub fn commit_id(&self) -> &str {
        &self.rev.commit_id
    }
}

impl fmt::Display for TreeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.is_root() { "." } else { &self.path };
        write!(f, "{}:{}", self.rev, path)
    }
}

pub fn is_root_path(path: &str) -> bool {
    path.is_empty() || path == "."
}

/// Strip `./` prefixes and trailing slashes; the root normalizes to `""`
pub fn normalize_path(path: &str) -> String {
    let mut p = path.trim();
    while let Some(rest) = p.strip_prefix("./") {
        p = rest;
    }
    let p = p.trim_end_matches('/');
    if p == "." {
        String::new()
    } else {
        p.to_string()
    }
}

/// Record asserting analysis data exists for (repo, commit)
///
/// Written once by the analysis pipeline, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisVersion {
    pub repo: RepoId,
    pub commit_id: CommitId,
    pub created_at: DateTime<Utc>,
}

impl AnalysisVersion {
    pub fn new(repo: impl Into<String>, commit_id: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            commit_id: commit_id.into(),
            created_at: Utc::now(),
        }
    }
}

/// Successful resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    /// A record exists at the requested head
    Exact { commit_id: CommitId },
    /// A record exists `distance` commits behind head
    LookbackHit { commit_id: CommitId, distance: u32 },
}

impl Resolution {
    pub fn commit_id(&self) -> &str {
        match self {
            Resolution::Exact { commit_id } | Resolution::LookbackHit { commit_id, .. } => {
                commit_id
            }
        }
    }

    pub fn distance(&self) -> u32 {
        match self {
            Resolution::Exact { .. } => 0,
            Resolution::LookbackHit { distance, .. } => *distance,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Resolution::Exact { .. })
    }
}

/// Shape handed back to the request layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataVersion {
    pub commit_id: CommitId,
    pub distance: u32,
}

impl From<Resolution> for DataVersion {
    fn from(resolution: Resolution) -> Self {
        let distance = resolution.distance();
        match resolution {
            Resolution::Exact { commit_id } | Resolution::LookbackHit { commit_id, .. } => {
                DataVersion {
                    commit_id,
                    distance,
                }
            }
        }
    }
}
