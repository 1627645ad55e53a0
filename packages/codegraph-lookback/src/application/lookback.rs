//! Lookback search
//!
//! Finds the nearest commit at or behind `head` that has an analysis version
//! and still sees the requested path exactly as `head` does.
//!
//! # Algorithm
//! 1. Boundary `M`: last commit at or before `head` touching `path`
//! 2. Candidates: `M..head` newest first, truncated to the lookback bound,
//!    then `M` appended (the range excludes it, the bound never drops it)
//! 3. One batch existence query for all candidates
//! 4. First candidate with a record wins; its index is the distance, except
//!    for `M` behind a truncated listing, whose distance is counted

use std::sync::Arc;

use tracing::debug;

use super::context::ResolveContext;
use crate::config::LookbackPolicy;
use crate::domain::{HistoryProvider, Resolution, TreeEntry, VersionStore};
use crate::error::{NotFoundReason, ResolveError, Result};

pub struct LookbackResolver {
    history: Arc<dyn HistoryProvider>,
    versions: Arc<dyn VersionStore>,
    policy: LookbackPolicy,
}

impl LookbackResolver {
    pub fn new(
        history: Arc<dyn HistoryProvider>,
        versions: Arc<dyn VersionStore>,
        policy: LookbackPolicy,
    ) -> Self {
        Self {
            history,
            versions,
            policy,
        }
    }

    pub fn policy(&self) -> &LookbackPolicy {
        &self.policy
    }

    /// Search backwards from `entry.rev` for a reusable analysis version
    ///
    /// Assumes the exact match at head was already checked and missed.
    pub async fn resolve(&self, entry: &TreeEntry, ctx: &ResolveContext) -> Result<Resolution> {
        let repo = entry.repo();
        let head = entry.commit_id();

        let boundary = ctx
            .guard(
                entry,
                self.history.last_commit_touching(repo, head, &entry.path),
            )
            .await?
            .ok_or_else(|| ResolveError::not_found(entry, NotFoundReason::NoHistoryForPath))?;

        if boundary == head {
            return Err(ResolveError::not_found(
                entry,
                NotFoundReason::BoundaryIsHead,
            ));
        }

        let limit = self.policy.limit();
        let mut candidates = ctx
            .guard(
                entry,
                self.history.list_commits(repo, head, Some(&boundary), limit),
            )
            .await?;
        candidates.truncate(limit);
        let truncated = candidates.len() == limit;

        // `M..head` excludes M itself
        candidates.push(boundary.clone());

        debug!(
            %entry,
            boundary = %boundary,
            candidates = candidates.len(),
            truncated,
            "lookback candidates listed"
        );

        let present = ctx
            .guard(entry, self.versions.has_versions(repo, &candidates))
            .await?;

        let Some(index) = candidates.iter().position(|c| present.contains(c)) else {
            return Err(ResolveError::not_found(
                entry,
                NotFoundReason::NoVersionInWindow {
                    candidates: candidates.len(),
                    versions: present.len(),
                },
            ));
        };

        let is_boundary = index == candidates.len() - 1;
        let distance = if is_boundary && truncated {
            // Interior listing stopped at the bound; report M's real distance
            ctx.guard(entry, self.history.count_commits(repo, head, &boundary))
                .await?
        } else {
            index
        };

        let commit_id = candidates.swap_remove(index);
        debug!(%entry, commit = %commit_id, distance, is_boundary, "lookback match");

        Ok(Resolution::LookbackHit {
            commit_id,
            distance: u32::try_from(distance).unwrap_or(u32::MAX),
        })
    }
}
