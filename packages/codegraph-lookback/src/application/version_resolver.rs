//! Version resolution: exact match first, then lookback

use std::sync::Arc;

use tracing::{debug, warn};

use super::context::ResolveContext;
use super::lookback::LookbackResolver;
use crate::config::LookbackPolicy;
use crate::domain::{HistoryProvider, Resolution, TreeEntry, VersionStore};
use crate::error::{NotFoundReason, ResolveError, Result};

pub struct VersionResolver {
    versions: Arc<dyn VersionStore>,
    lookback: LookbackResolver,
}

impl VersionResolver {
    pub fn new(
        history: Arc<dyn HistoryProvider>,
        versions: Arc<dyn VersionStore>,
        policy: LookbackPolicy,
    ) -> Self {
        Self {
            lookback: LookbackResolver::new(history, versions.clone(), policy),
            versions,
        }
    }

    pub fn policy(&self) -> &LookbackPolicy {
        self.lookback.policy()
    }

    /// Resolve the analysis version usable for `entry`
    ///
    /// 1. Exact record at head → `Exact`
    /// 2. Root path without exact record → `NotFound` (every commit touches root)
    /// 3. Otherwise the lookback search
    pub async fn resolve_version(
        &self,
        entry: &TreeEntry,
        ctx: &ResolveContext,
    ) -> Result<Resolution> {
        let exact = ctx
            .guard(
                entry,
                self.versions.has_version(entry.repo(), entry.commit_id()),
            )
            .await;

        match exact {
            Ok(true) => {
                debug!(%entry, result = "exact match", "resolve_version");
                return Ok(Resolution::Exact {
                    commit_id: entry.commit_id().to_string(),
                });
            }
            Ok(false) => {}
            Err(err) => return Err(log_failure(entry, err)),
        }

        if entry.is_root() {
            debug!(%entry, result = "no version for root", "resolve_version");
            return Err(ResolveError::not_found(
                entry,
                NotFoundReason::NoVersionForRoot,
            ));
        }

        match self.lookback.resolve(entry, ctx).await {
            Ok(resolution) => {
                debug!(
                    %entry,
                    result = "lookback match",
                    commit = resolution.commit_id(),
                    distance = resolution.distance(),
                    "resolve_version"
                );
                Ok(resolution)
            }
            Err(err) => Err(log_failure(entry, err)),
        }
    }
}

fn log_failure(entry: &TreeEntry, err: ResolveError) -> ResolveError {
    match &err {
        ResolveError::Upstream { .. } => {
            warn!(%entry, error = %err, "resolve_version upstream failure")
        }
        _ => debug!(%entry, result = err.kind().as_str(), reason = %err, "resolve_version"),
    }
    err
}
