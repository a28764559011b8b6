//! Known-state persistence.
//!
//! The state file is the only durable memory of what has been announced:
//!
//! ```text
//! data/
//! └── knownCoins.json    # { "<relative link>": { "availability": "in_stock" } }
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::PersistError;
use crate::models::KnownState;

// Re-export for convenience
pub use local::LocalStateStore;

/// Trait for known-state backends.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the last saved state.
    ///
    /// A missing or unreadable record yields an empty state, never an error.
    async fn load(&self) -> KnownState;

    /// Fully replace the saved state.
    async fn save(&self, state: &KnownState) -> Result<(), PersistError>;
}
