//! Collaborator ports
//!
//! Adapters:
//! - History: git2 (`GitHistoryProvider`), in-memory DAG (`InMemoryHistory`)
//! - Versions: SQLite (`SqliteVersionStore`), in-memory (`InMemoryVersionStore`)
//! - Access: `AllowAllAccess`, `StaticAccessControl`

use async_trait::async_trait;
use std::collections::HashSet;

use super::models::CommitId;
use crate::error::PortResult;

/// Commit history backend
///
/// Owns all ancestry knowledge. The resolvers never cache or mutate it.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Resolve a revision (branch, tag, `HEAD~2`, full hash) to a commit id
    ///
    /// Returns `None` when the revision names nothing.
    async fn resolve_revision(&self, repo: &str, rev: &str) -> PortResult<Option<CommitId>>;

    /// Most recent commit at or before `head` that modified `path`
    ///
    /// `head` itself counts. Returns `None` when no commit touches `path`.
    async fn last_commit_touching(
        &self,
        repo: &str,
        head: &str,
        path: &str,
    ) -> PortResult<Option<CommitId>>;

    /// Commits reachable from `head`, newest first, at most `limit` entries
    ///
    /// When `base` is given the listing is the ancestry path `base..head`:
    /// only commits that descend from `base` are listed, and `base` itself is
    /// excluded. Callers that want `base` in their candidate set must add it
    /// back themselves.
    async fn list_commits(
        &self,
        repo: &str,
        head: &str,
        base: Option<&str>,
        limit: usize,
    ) -> PortResult<Vec<CommitId>>;

    /// Number of commits on the ancestry path `base..head`
    ///
    /// On a linear history this is the distance of `base` from `head`.
    async fn count_commits(&self, repo: &str, head: &str, base: &str) -> PortResult<usize> {
        Ok(self
            .list_commits(repo, head, Some(base), usize::MAX)
            .await?
            .len())
    }
}

/// Analysis-version record store (read side)
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Does a record exist exactly at (repo, commit)?
    async fn has_version(&self, repo: &str, commit_id: &str) -> PortResult<bool>;

    /// Subset of `commit_ids` that have a record for `repo`
    async fn has_versions(
        &self,
        repo: &str,
        commit_ids: &[CommitId],
    ) -> PortResult<HashSet<CommitId>>;
}

/// Read-access decision for a principal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied(String),
}

/// Access-control backend, consulted by the service layer only
#[async_trait]
pub trait AccessControl: Send + Sync {
    async fn verify_read_access(&self, principal: &str, repo: &str) -> PortResult<AccessDecision>;
}
