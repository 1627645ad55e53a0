//! Infrastructure layer - port adapters
//!
//! - History: `GitHistoryProvider` (git2), `InMemoryHistory`
//! - Versions: `SqliteVersionStore` (rusqlite), `InMemoryVersionStore`
//! - Access: `AllowAllAccess`, `StaticAccessControl`

pub mod access;
pub mod memory_history;
pub mod memory_store;

#[cfg(feature = "git")]
pub mod git_history;
#[cfg(feature = "sqlite")]
pub mod sqlite_store;

pub use access::{AllowAllAccess, StaticAccessControl};
pub use memory_history::{HistoryCalls, InMemoryHistory};
pub use memory_store::{InMemoryVersionStore, StoreCalls};

#[cfg(feature = "git")]
pub use git_history::GitHistoryProvider;
#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteVersionStore;
