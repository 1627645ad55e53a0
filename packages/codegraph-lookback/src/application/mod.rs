//! Application layer
//!
//! ```text
//! VersionService (access check, revision resolution)
//!       ↓
//! VersionResolver (exact match, root restriction)
//!       ↓
//! LookbackResolver (boundary, candidates, batch check, nearest match)
//! ```

pub mod context;
pub mod lookback;
pub mod service;
pub mod version_resolver;

pub use context::ResolveContext;
pub use lookback::LookbackResolver;
pub use service::{VersionLookupUseCase, VersionService};
pub use version_resolver::VersionResolver;
