//! In-memory commit DAG (for testing)
//!
//! Commits are added parents-first; insertion order doubles as commit time,
//! so "newest first" means "highest insertion index first".
//! NOT for production use.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use crate::domain::{is_root_path, normalize_path, CommitId, HistoryProvider};
use crate::error::{PortResult, UpstreamError};

#[derive(Debug, Clone)]
struct CommitNode {
    seq: usize,
    parents: Vec<CommitId>,
    changed_paths: Vec<String>,
}

/// Per-method call counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryCalls {
    pub resolve_revision: usize,
    pub last_commit_touching: usize,
    pub list_commits: usize,
    pub count_commits: usize,
}

#[derive(Default)]
struct State {
    commits: HashMap<CommitId, CommitNode>,
    refs: HashMap<String, CommitId>,
    calls: HistoryCalls,
    failure: Option<String>,
}

pub struct InMemoryHistory {
    repo: String,
    state: RwLock<State>,
}

impl InMemoryHistory {
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            state: RwLock::new(State::default()),
        }
    }

    /// Linear history `c0 <- c1 <- ... <- c{n-1}`
    ///
    /// `touches` lists `(index, path)` pairs: commit `c{index}` modifies `path`.
    pub fn linear(repo: impl Into<String>, commits: usize, touches: &[(usize, &str)]) -> Self {
        let history = Self::new(repo);
        for i in 0..commits {
            let id = format!("c{}", i);
            let parent = (i > 0).then(|| format!("c{}", i - 1));
            let paths: Vec<&str> = touches
                .iter()
                .filter(|(at, _)| *at == i)
                .map(|(_, path)| *path)
                .collect();
            let parents: Vec<&str> = parent.as_deref().into_iter().collect();
            history.add_commit(&id, &parents, &paths);
        }
        if commits > 0 {
            history.set_ref("HEAD", &format!("c{}", commits - 1));
        }
        history
    }

    /// Add a commit; parents must already exist
    pub fn add_commit(&self, id: &str, parents: &[&str], changed_paths: &[&str]) {
        let mut state = self.state.write();
        let seq = state.commits.len();
        state.commits.insert(
            id.to_string(),
            CommitNode {
                seq,
                parents: parents.iter().map(|p| p.to_string()).collect(),
                changed_paths: changed_paths.iter().map(|p| normalize_path(p)).collect(),
            },
        );
    }

    pub fn set_ref(&self, name: &str, commit_id: &str) {
        self.state
            .write()
            .refs
            .insert(name.to_string(), commit_id.to_string());
    }

    /// Make every subsequent call fail with an upstream error
    pub fn fail_with(&self, message: &str) {
        self.state.write().failure = Some(message.to_string());
    }

    pub fn calls(&self) -> HistoryCalls {
        self.state.read().calls.clone()
    }

    fn check(&self, state: &State, repo: &str) -> PortResult<()> {
        if let Some(message) = &state.failure {
            return Err(UpstreamError::history(message.clone()));
        }
        if repo != self.repo {
            return Err(UpstreamError::history(format!("unknown repository: {}", repo)));
        }
        Ok(())
    }

    /// Commits reachable from `head` (inclusive), newest first
    fn ancestry(state: &State, head: &str) -> PortResult<Vec<CommitId>> {
        if !state.commits.contains_key(head) {
            return Err(UpstreamError::history(format!("unknown commit: {}", head)));
        }
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack = vec![head];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = state.commits.get(id) {
                stack.extend(node.parents.iter().map(String::as_str));
            }
        }
        let mut ordered: Vec<&str> = seen.into_iter().collect();
        ordered.sort_by_key(|id| std::cmp::Reverse(state.commits[*id].seq));
        Ok(ordered.into_iter().map(str::to_string).collect())
    }

    fn touches(node: &CommitNode, path: &str) -> bool {
        is_root_path(path)
            || node.changed_paths.iter().any(|changed| {
                changed == path
                    || changed
                        .strip_prefix(path)
                        .is_some_and(|rest| rest.starts_with('/'))
            })
    }

    /// Ancestry path `base..head`: ancestors of `head` that descend from `base`
    fn range(state: &State, head: &str, base: Option<&str>) -> PortResult<Vec<CommitId>> {
        let mut commits = Self::ancestry(state, head)?;
        if let Some(base) = base {
            let hidden: HashSet<CommitId> = Self::ancestry(state, base)?.into_iter().collect();
            commits.retain(|c| !hidden.contains(c));
            let mut descends = Vec::with_capacity(commits.len());
            for commit in &commits {
                descends.push(Self::ancestry(state, commit)?.iter().any(|a| a == base));
            }
            let mut keep = descends.into_iter();
            commits.retain(|_| keep.next().unwrap_or(false));
        }
        Ok(commits)
    }
}

#[async_trait]
impl HistoryProvider for InMemoryHistory {
    async fn resolve_revision(&self, repo: &str, rev: &str) -> PortResult<Option<CommitId>> {
        let mut state = self.state.write();
        state.calls.resolve_revision += 1;
        self.check(&state, repo)?;

        if let Some(id) = state.refs.get(rev) {
            return Ok(Some(id.clone()));
        }
        Ok(state.commits.contains_key(rev).then(|| rev.to_string()))
    }

    async fn last_commit_touching(
        &self,
        repo: &str,
        head: &str,
        path: &str,
    ) -> PortResult<Option<CommitId>> {
        let mut state = self.state.write();
        state.calls.last_commit_touching += 1;
        self.check(&state, repo)?;

        let path = normalize_path(path);
        let found = Self::ancestry(&state, head)?
            .into_iter()
            .find(|id| Self::touches(&state.commits[id], &path));
        Ok(found)
    }

    async fn list_commits(
        &self,
        repo: &str,
        head: &str,
        base: Option<&str>,
        limit: usize,
    ) -> PortResult<Vec<CommitId>> {
        let mut state = self.state.write();
        state.calls.list_commits += 1;
        self.check(&state, repo)?;

        let mut commits = Self::range(&state, head, base)?;
        commits.truncate(limit);
        Ok(commits)
    }

    async fn count_commits(&self, repo: &str, head: &str, base: &str) -> PortResult<usize> {
        let mut state = self.state.write();
        state.calls.count_commits += 1;
        self.check(&state, repo)?;

        Ok(Self::range(&state, head, Some(base))?.len())
    }
}
