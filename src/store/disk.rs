use crate::core::types::AssetId;
use crate::pool::AssetState;
use crate::store::StateStore;
use anyhow::Result;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use std::path::Path;
use tracing::debug;

/// Disk-backed state store on a fjall keyspace.
pub struct FjallStore {
    _keyspace: Keyspace,
    assets: PartitionHandle,
}

impl FjallStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let keyspace = fjall::Config::new(path).open()?;
        let assets = keyspace.open_partition("assets", PartitionCreateOptions::default())?;
        Ok(Self {
            _keyspace: keyspace,
            assets,
        })
    }
}

impl StateStore for FjallStore {
    fn put(&self, state: &AssetState) -> Result<()> {
        self.assets
            .insert(state.asset.as_str(), serde_json::to_vec(state)?)?;
        debug!(asset = %state.asset, "persisted asset state");
        Ok(())
    }

    fn get(&self, asset: &AssetId) -> Result<Option<AssetState>> {
        match self.assets.get(asset.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn list(&self) -> Result<Vec<AssetState>> {
        let mut states = Vec::new();
        for kv in self.assets.iter() {
            let (_key, value) = kv?;
            states.push(serde_json::from_slice(&value)?);
        }
        states.sort_by(|a: &AssetState, b: &AssetState| a.asset.cmp(&b.asset));
        Ok(states)
    }
}
