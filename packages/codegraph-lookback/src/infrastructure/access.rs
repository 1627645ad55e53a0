//! Access-control adapters

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

use crate::config::AccessConfig;
use crate::domain::{AccessControl, AccessDecision};
use crate::error::PortResult;

/// Every principal may read every repository
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllAccess;

#[async_trait]
impl AccessControl for AllowAllAccess {
    async fn verify_read_access(&self, _principal: &str, _repo: &str) -> PortResult<AccessDecision> {
        Ok(AccessDecision::Allowed)
    }
}

/// Static allow-list: public repositories plus per-principal grants
#[derive(Debug, Clone, Default)]
pub struct StaticAccessControl {
    public_repos: HashSet<String>,
    grants: HashMap<String, HashSet<String>>,
}

impl StaticAccessControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AccessConfig) -> Self {
        let mut access = Self::new();
        for repo in &config.public_repos {
            access = access.public(repo);
        }
        for (principal, repos) in &config.grants {
            for repo in repos {
                access = access.grant(principal, repo);
            }
        }
        access
    }

    pub fn public(mut self, repo: &str) -> Self {
        self.public_repos.insert(repo.to_string());
        self
    }

    pub fn grant(mut self, principal: &str, repo: &str) -> Self {
        self.grants
            .entry(principal.to_string())
            .or_default()
            .insert(repo.to_string());
        self
    }
}

#[async_trait]
impl AccessControl for StaticAccessControl {
    async fn verify_read_access(&self, principal: &str, repo: &str) -> PortResult<AccessDecision> {
        if self.public_repos.contains(repo)
            || self
                .grants
                .get(principal)
                .is_some_and(|repos| repos.contains(repo))
        {
            Ok(AccessDecision::Allowed)
        } else {
            Ok(AccessDecision::Denied("no read grant".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_static_grants() {
        let access = StaticAccessControl::new()
            .public("open")
            .grant("alice", "private");

        assert_eq!(
            access.verify_read_access("anyone", "open").await.unwrap(),
            AccessDecision::Allowed
        );
        assert_eq!(
            access.verify_read_access("alice", "private").await.unwrap(),
            AccessDecision::Allowed
        );
        assert!(matches!(
            access.verify_read_access("bob", "private").await.unwrap(),
            AccessDecision::Denied(_)
        ));
    }

    #[tokio::test]
    async fn test_from_config() {
        let config = AccessConfig {
            public_repos: vec!["open".into()],
            grants: BTreeMap::from([("alice".to_string(), vec!["private".to_string()])]),
        };
        let access = StaticAccessControl::from_config(&config);
        assert_eq!(
            access.verify_read_access("alice", "private").await.unwrap(),
            AccessDecision::Allowed
        );
        assert!(matches!(
            access.verify_read_access("alice", "secret").await.unwrap(),
            AccessDecision::Denied(_)
        ));
    }
}
