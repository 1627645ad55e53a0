//! Error types for codegraph-lookback
//!
//! Two layers:
//!
//! - [`UpstreamError`]: a collaborator (history provider, version store,
//!   access control backend) failed. Ports return it directly.
//! - [`ResolveError`]: the closed outcome taxonomy of a resolution. Upstream
//!   failures are wrapped with the request they happened in, never
//!   reclassified as `NotFound`.

use std::fmt;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════
// Upstream (collaborator) errors
// ═══════════════════════════════════════════════════════════════════════════

/// Which collaborator failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    /// Commit history backend (git, VCS service)
    History,
    /// Analysis-version record store
    VersionStore,
    /// Access-control backend
    AccessControl,
}

impl UpstreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamKind::History => "history",
            UpstreamKind::VersionStore => "version_store",
            UpstreamKind::AccessControl => "access_control",
        }
    }
}

impl fmt::Display for UpstreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Collaborator failure with the original cause attached
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct UpstreamError {
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub kind: UpstreamKind,
    pub message: String,
}

impl UpstreamError {
    pub fn new(kind: UpstreamKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn history(message: impl Into<String>) -> Self {
        Self::new(UpstreamKind::History, message)
    }

    pub fn version_store(message: impl Into<String>) -> Self {
        Self::new(UpstreamKind::VersionStore, message)
    }

    pub fn access_control(message: impl Into<String>) -> Self {
        Self::new(UpstreamKind::AccessControl, message)
    }
}

#[cfg(feature = "git")]
impl From<git2::Error> for UpstreamError {
    fn from(err: git2::Error) -> Self {
        UpstreamError::history(format!("git error: {}", err.message())).with_source(err)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for UpstreamError {
    fn from(err: rusqlite::Error) -> Self {
        UpstreamError::version_store(format!("SQLite error: {}", err)).with_source(err)
    }
}

/// Result type for port (collaborator) calls
pub type PortResult<T> = std::result::Result<T, UpstreamError>;

// ═══════════════════════════════════════════════════════════════════════════
// Resolution errors
// ═══════════════════════════════════════════════════════════════════════════

/// Why no analysis version could be substituted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundReason {
    /// The requested head revision does not name a commit
    RevisionNotFound,
    /// No exact record and the path is the repository root
    NoVersionForRoot,
    /// No commit at or before head touches the path
    NoHistoryForPath,
    /// The path was last modified by head itself
    BoundaryIsHead,
    /// The candidate window was scanned without a match
    NoVersionInWindow { candidates: usize, versions: usize },
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::RevisionNotFound => write!(f, "revision not found"),
            NotFoundReason::NoVersionForRoot => {
                write!(f, "can't look back because path is root")
            }
            NotFoundReason::NoHistoryForPath => write!(f, "no history for path"),
            NotFoundReason::BoundaryIsHead => {
                write!(f, "can't look back because path was last modified by head commit")
            }
            NotFoundReason::NoVersionInWindow {
                candidates,
                versions,
            } => write!(
                f,
                "{} candidate commits, {} analysis versions",
                candidates, versions
            ),
        }
    }
}

/// Outcome kinds, stable names for logs and wire mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    Upstream,
    Cancelled,
    DeadlineExceeded,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolution failure
///
/// `entry` fields carry a `repo@commit:path` description of the request.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no analysis version found for {entry} ({reason})")]
    NotFound {
        entry: String,
        reason: NotFoundReason,
    },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("upstream failure while resolving {entry}: {source}")]
    Upstream {
        entry: String,
        #[source]
        source: UpstreamError,
    },

    #[error("resolution of {0} was cancelled")]
    Cancelled(String),

    #[error("deadline exceeded while resolving {0}")]
    DeadlineExceeded(String),
}

impl ResolveError {
    pub fn not_found(entry: impl fmt::Display, reason: NotFoundReason) -> Self {
        Self::NotFound {
            entry: entry.to_string(),
            reason,
        }
    }

    pub fn upstream(entry: impl fmt::Display, source: UpstreamError) -> Self {
        Self::Upstream {
            entry: entry.to_string(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::NotFound { .. } => ErrorKind::NotFound,
            ResolveError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            ResolveError::Upstream { .. } => ErrorKind::Upstream,
            ResolveError::Cancelled(_) => ErrorKind::Cancelled,
            ResolveError::DeadlineExceeded(_) => ErrorKind::DeadlineExceeded,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// `NotFound` reason, if this is a `NotFound`
    pub fn not_found_reason(&self) -> Option<&NotFoundReason> {
        match self {
            ResolveError::NotFound { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ResolveError>;
