//! Persisted observability surface
//!
//! Successful mutations leave a per-asset state record behind so the enabled
//! flag, share supply, exchange rate and held balance can be audited without
//! holding a live pool handle (`flashpool status`). Persistence is advisory;
//! the accounting path never depends on it.

pub mod disk;
pub mod memory;

use crate::core::types::AssetId;
use crate::pool::AssetState;
use anyhow::Result;

pub use disk::FjallStore;
pub use memory::MemoryStore;

pub trait StateStore: Send + Sync {
    fn put(&self, state: &AssetState) -> Result<()>;

    fn get(&self, asset: &AssetId) -> Result<Option<AssetState>>;

    /// All persisted records, ordered by asset id.
    fn list(&self) -> Result<Vec<AssetState>>;
}
