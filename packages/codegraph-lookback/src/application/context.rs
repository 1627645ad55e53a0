//! Per-request cancellation and deadline
//!
//! Every collaborator call made during a resolution is raced against the
//! caller's cancellation token and deadline. A fired signal surfaces as
//! `Cancelled` / `DeadlineExceeded`, never as `NotFound`.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{PortResult, ResolveError, Result};

#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl ResolveContext {
    /// No cancellation source, no deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// Tie the resolution to a caller-owned token
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail fast if a signal already fired
    pub fn check(&self, entry: &(dyn fmt::Display + Sync)) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(ResolveError::Cancelled(entry.to_string()));
        }
        if matches!(self.deadline, Some(deadline) if Instant::now() >= deadline) {
            return Err(ResolveError::DeadlineExceeded(entry.to_string()));
        }
        Ok(())
    }

    /// Run one collaborator call under this context
    ///
    /// Port errors are wrapped as `Upstream` with `entry` as context.
    pub async fn guard<T, F>(&self, entry: &(dyn fmt::Display + Sync), call: F) -> Result<T>
    where
        F: Future<Output = PortResult<T>>,
    {
        self.check(entry)?;

        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ResolveError::Cancelled(entry.to_string())),
            _ = expired => Err(ResolveError::DeadlineExceeded(entry.to_string())),
            result = call => result.map_err(|e| ResolveError::upstream(entry, e)),
        }
    }
}
