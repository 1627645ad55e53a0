//! Request-facing entry point
//!
//! Adds the steps a request handler performs around the resolver:
//! read-access verification and head revision resolution.

use async_trait::async_trait;
use std::sync::Arc;

use tracing::debug;

use super::context::ResolveContext;
use super::version_resolver::VersionResolver;
use crate::config::LookbackPolicy;
use crate::domain::{
    AccessControl, AccessDecision, DataVersion, HistoryProvider, RepoRevision, TreeEntry,
    VersionStore,
};
use crate::error::{NotFoundReason, ResolveError, Result};

/// Version lookup UseCase Trait
#[async_trait]
pub trait VersionLookupUseCase: Send + Sync {
    /// `head_rev` may be any revision the history backend understands (branch, tag, hash)
    async fn resolve_version(
        &self,
        principal: &str,
        repo: &str,
        head_rev: &str,
        path: &str,
        ctx: &ResolveContext,
    ) -> Result<DataVersion>;
}

pub struct VersionService {
    history: Arc<dyn HistoryProvider>,
    access: Arc<dyn AccessControl>,
    resolver: VersionResolver,
}

impl VersionService {
    pub fn new(
        history: Arc<dyn HistoryProvider>,
        versions: Arc<dyn VersionStore>,
        access: Arc<dyn AccessControl>,
        policy: LookbackPolicy,
    ) -> Self {
        Self {
            resolver: VersionResolver::new(history.clone(), versions, policy),
            history,
            access,
        }
    }

    pub fn resolver(&self) -> &VersionResolver {
        &self.resolver
    }

    /// Resolve a revision name to a commit id
    pub async fn resolve_revision(
        &self,
        repo: &str,
        rev: &str,
        ctx: &ResolveContext,
    ) -> Result<RepoRevision> {
        let unresolved = RepoRevision::new(repo, rev);
        let commit_id = ctx
            .guard(&unresolved, self.history.resolve_revision(repo, rev))
            .await?
            .ok_or_else(|| ResolveError::not_found(&unresolved, NotFoundReason::RevisionNotFound))?;
        Ok(RepoRevision::new(repo, commit_id))
    }

    async fn verify_read_access(
        &self,
        principal: &str,
        repo: &str,
        ctx: &ResolveContext,
    ) -> Result<()> {
        let decision = ctx
            .guard(&repo, self.access.verify_read_access(principal, repo))
            .await?;
        match decision {
            AccessDecision::Allowed => Ok(()),
            AccessDecision::Denied(reason) => {
                debug!(principal, repo, %reason, "read access denied");
                Err(ResolveError::PermissionDenied(format!(
                    "{} may not read {}: {}",
                    principal, repo, reason
                )))
            }
        }
    }
}

#[async_trait]
impl VersionLookupUseCase for VersionService {
    async fn resolve_version(
        &self,
        principal: &str,
        repo: &str,
        head_rev: &str,
        path: &str,
        ctx: &ResolveContext,
    ) -> Result<DataVersion> {
        self.verify_read_access(principal, repo, ctx).await?;

        let rev = self.resolve_revision(repo, head_rev, ctx).await?;
        let entry = TreeEntry::new(rev, path);

        let resolution = self.resolver.resolve_version(&entry, ctx).await?;
        Ok(resolution.into())
    }
}
