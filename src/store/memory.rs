use crate::core::types::AssetId;
use crate::pool::AssetState;
use crate::store::StateStore;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory state store, used when no data directory is available.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<AssetId, AssetState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn put(&self, state: &AssetState) -> Result<()> {
        self.records
            .write()
            .unwrap()
            .insert(state.asset.clone(), state.clone());
        Ok(())
    }

    fn get(&self, asset: &AssetId) -> Result<Option<AssetState>> {
        Ok(self.records.read().unwrap().get(asset).cloned())
    }

    fn list(&self) -> Result<Vec<AssetState>> {
        let mut states: Vec<_> = self.records.read().unwrap().values().cloned().collect();
        states.sort_by(|a, b| a.asset.cmp(&b.asset));
        Ok(states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SCALE;
    use chrono::Utc;

    fn state(asset: &str, total_shares: u128) -> AssetState {
        AssetState {
            asset: AssetId::from(asset),
            enabled: true,
            total_shares,
            exchange_rate: SCALE,
            held_balance: total_shares,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_put_get_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get(&AssetId::from("USDX")).unwrap().is_none());

        store.put(&state("USDX", 10_000)).unwrap();
        let record = store.get(&AssetId::from("USDX")).unwrap().unwrap();
        assert_eq!(record.total_shares, 10_000);
    }

    #[test]
    fn test_put_overwrites_previous_record() {
        let store = MemoryStore::new();
        store.put(&state("USDX", 10_000)).unwrap();
        store.put(&state("USDX", 12_000)).unwrap();

        let record = store.get(&AssetId::from("USDX")).unwrap().unwrap();
        assert_eq!(record.total_shares, 12_000);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_list_is_ordered_by_asset() {
        let store = MemoryStore::new();
        store.put(&state("WBTX", 1)).unwrap();
        store.put(&state("USDX", 2)).unwrap();

        let assets: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|s| s.asset.to_string())
            .collect();
        assert_eq!(assets, vec!["USDX", "WBTX"]);
    }
}
