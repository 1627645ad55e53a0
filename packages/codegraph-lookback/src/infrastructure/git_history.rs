//! git2-backed History Provider
//!
//! Maps repository ids to local repositories. Each call opens the repository
//! on a blocking worker thread (`git2::Repository` is not `Sync`).
//!
//! # Semantics
//! - `last_commit_touching`: `git log -1 -- <path>` with default history
//!   simplification. From head, a commit whose entry at `path` equals some
//!   parent's (TREESAME) is skipped and only that parent is followed; the
//!   first commit that differs from every parent is the answer (a root
//!   commit touches `path` if the entry exists).
//! - `list_commits` / `count_commits`: `git rev-list --ancestry-path base..head`,
//!   newest first.

use async_trait::async_trait;
use git2::{ErrorCode, Oid, Repository, Revwalk, Sort, Tree};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::domain::{is_root_path, normalize_path, CommitId, HistoryProvider};
use crate::error::{PortResult, UpstreamError};

#[derive(Debug, Clone, Default)]
pub struct GitHistoryProvider {
    repositories: HashMap<String, PathBuf>,
}

impl GitHistoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a local repository under `repo_id`
    pub fn with_repository(mut self, repo_id: impl Into<String>, path: impl AsRef<Path>) -> Self {
        self.repositories
            .insert(repo_id.into(), path.as_ref().to_path_buf());
        self
    }

    fn repository_path(&self, repo: &str) -> PortResult<PathBuf> {
        self.repositories
            .get(repo)
            .cloned()
            .ok_or_else(|| UpstreamError::history(format!("unknown repository: {}", repo)))
    }

    /// Run `f` against the opened repository on the blocking pool
    async fn with_repo<T, F>(&self, repo: &str, f: F) -> PortResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Repository) -> PortResult<T> + Send + 'static,
    {
        let path = self.repository_path(repo)?;
        tokio::task::spawn_blocking(move || {
            let repository = Repository::open(&path).map_err(|e| {
                UpstreamError::history(format!(
                    "failed to open repository {}: {}",
                    path.display(),
                    e.message()
                ))
                .with_source(e)
            })?;
            f(&repository)
        })
        .await
        .map_err(|e| UpstreamError::history(format!("git worker failed: {}", e)).with_source(e))?
    }
}

#[async_trait]
impl HistoryProvider for GitHistoryProvider {
    async fn resolve_revision(&self, repo: &str, rev: &str) -> PortResult<Option<CommitId>> {
        let rev = rev.to_string();
        self.with_repo(repo, move |repository| resolve_revision(repository, &rev))
            .await
    }

    async fn last_commit_touching(
        &self,
        repo: &str,
        head: &str,
        path: &str,
    ) -> PortResult<Option<CommitId>> {
        let head = head.to_string();
        let path = normalize_path(path);
        self.with_repo(repo, move |repository| {
            last_commit_touching(repository, &head, &path)
        })
        .await
    }

    async fn list_commits(
        &self,
        repo: &str,
        head: &str,
        base: Option<&str>,
        limit: usize,
    ) -> PortResult<Vec<CommitId>> {
        let head = head.to_string();
        let base = base.map(str::to_string);
        self.with_repo(repo, move |repository| match base {
            None => list_reachable(repository, &head, limit),
            Some(base) => Ok(ancestry_path(repository, &head, &base)?
                .into_iter()
                .take(limit)
                .map(|oid| oid.to_string())
                .collect()),
        })
        .await
    }

    async fn count_commits(&self, repo: &str, head: &str, base: &str) -> PortResult<usize> {
        let head = head.to_string();
        let base = base.to_string();
        self.with_repo(repo, move |repository| {
            Ok(ancestry_path(repository, &head, &base)?.len())
        })
        .await
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Blocking helpers
// ═══════════════════════════════════════════════════════════════════════════

fn resolve_revision(repo: &Repository, rev: &str) -> PortResult<Option<CommitId>> {
    let object = match repo.revparse_single(rev) {
        Ok(object) => object,
        Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec) => {
            return Ok(None)
        }
        Err(e) => return Err(e.into()),
    };
    // Trees and blobs are not revisions of the repository
    Ok(object.peel_to_commit().ok().map(|c| c.id().to_string()))
}

fn parse_commit(repo: &Repository, id: &str) -> PortResult<Oid> {
    let oid = Oid::from_str(id)
        .map_err(|e| UpstreamError::history(format!("invalid commit id '{}'", id)).with_source(e))?;
    // Confirms the object exists and is a commit
    repo.find_commit(oid)?;
    Ok(oid)
}

fn last_commit_touching(repo: &Repository, head: &str, path: &str) -> PortResult<Option<CommitId>> {
    let head = parse_commit(repo, head)?;
    if is_root_path(path) {
        return Ok(Some(head.to_string()));
    }
    let path = Path::new(path);

    // Simplified history is a single chain: each step either stops or
    // follows exactly one TREESAME parent
    let mut current = repo.find_commit(head)?;
    loop {
        let entry = entry_id(&current.tree()?, path)?;

        if current.parent_count() == 0 {
            return Ok(entry.is_some().then(|| current.id().to_string()));
        }

        let mut same_parent = None;
        for parent in current.parents() {
            if entry_id(&parent.tree()?, path)? == entry {
                same_parent = Some(parent);
                break;
            }
        }

        match same_parent {
            Some(parent) => current = parent,
            None => return Ok(Some(current.id().to_string())),
        }
    }
}

fn entry_id(tree: &Tree<'_>, path: &Path) -> PortResult<Option<Oid>> {
    match tree.get_path(path) {
        Ok(entry) => Ok(Some(entry.id())),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn revwalk<'r>(repo: &'r Repository, head: Oid, base: Option<Oid>) -> PortResult<Revwalk<'r>> {
    let mut walk = repo.revwalk()?;
    walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    walk.push(head)?;
    if let Some(base) = base {
        walk.hide(base)?;
    }
    Ok(walk)
}

/// First `limit` commits reachable from `head`, newest first
fn list_reachable(repo: &Repository, head: &str, limit: usize) -> PortResult<Vec<CommitId>> {
    let head = parse_commit(repo, head)?;
    let mut commits = Vec::new();
    for oid in revwalk(repo, head, None)?.take(limit) {
        commits.push(oid?.to_string());
    }
    Ok(commits)
}

/// `--ancestry-path base..head`, newest first
///
/// One pass over `base..head` in reverse topological order marks the
/// commits with a parent that is `base` or already marked.
fn ancestry_path(repo: &Repository, head: &str, base: &str) -> PortResult<Vec<Oid>> {
    let head = parse_commit(repo, head)?;
    let base = parse_commit(repo, base)?;

    let mut range = Vec::new();
    for oid in revwalk(repo, head, Some(base))? {
        range.push(oid?);
    }

    let mut descendants: HashSet<Oid> = HashSet::with_capacity(range.len());
    for oid in range.iter().rev() {
        let commit = repo.find_commit(*oid)?;
        if commit
            .parent_ids()
            .any(|p| p == base || descendants.contains(&p))
        {
            descendants.insert(*oid);
        }
    }

    range.retain(|oid| descendants.contains(oid));
    Ok(range)
}
