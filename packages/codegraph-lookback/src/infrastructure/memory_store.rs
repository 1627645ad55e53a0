//! In-Memory Version Store (for testing)
//!
//! HashSet-based implementation for unit tests, with call counters and
//! failure/stall injection. NOT for production use.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashSet;

use crate::domain::{CommitId, VersionStore};
use crate::error::{PortResult, UpstreamError};

/// Per-method call counters plus the last batch queried
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub has_version: usize,
    pub has_versions: usize,
    pub last_batch: Vec<CommitId>,
}

#[derive(Default)]
struct State {
    records: HashSet<(String, CommitId)>,
    calls: StoreCalls,
    failure: Option<String>,
    stall_batches: bool,
}

#[derive(Default)]
pub struct InMemoryVersionStore {
    state: RwLock<State>,
}

impl InMemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, repo: &str, commit_id: &str) {
        self.state
            .write()
            .records
            .insert((repo.to_string(), commit_id.to_string()));
    }

    pub fn fail_with(&self, message: &str) {
        self.state.write().failure = Some(message.to_string());
    }

    /// `has_versions` never completes (simulates a hung backend)
    pub fn stall_batches(&self) {
        self.state.write().stall_batches = true;
    }

    pub fn calls(&self) -> StoreCalls {
        self.state.read().calls.clone()
    }
}

#[async_trait]
impl VersionStore for InMemoryVersionStore {
    async fn has_version(&self, repo: &str, commit_id: &str) -> PortResult<bool> {
        let mut state = self.state.write();
        state.calls.has_version += 1;
        if let Some(message) = &state.failure {
            return Err(UpstreamError::version_store(message.clone()));
        }
        Ok(state
            .records
            .contains(&(repo.to_string(), commit_id.to_string())))
    }

    async fn has_versions(
        &self,
        repo: &str,
        commit_ids: &[CommitId],
    ) -> PortResult<HashSet<CommitId>> {
        let stall = {
            let mut state = self.state.write();
            state.calls.has_versions += 1;
            state.calls.last_batch = commit_ids.to_vec();
            if let Some(message) = &state.failure {
                return Err(UpstreamError::version_store(message.clone()));
            }
            state.stall_batches
        };
        if stall {
            std::future::pending::<()>().await;
        }

        let state = self.state.read();
        Ok(commit_ids
            .iter()
            .filter(|c| state.records.contains(&(repo.to_string(), (*c).clone())))
            .cloned()
            .collect())
    }
}
