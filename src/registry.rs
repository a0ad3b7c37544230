//! Supported-asset registry
//!
//! Gates every other operation: an asset must be registered and enabled before
//! the pool will touch it. Registration is privileged through an unforgeable
//! [`AdminCap`] minted once at construction — possession of the capability is
//! the authorization, there is no ambient caller identity.

use crate::core::error::PoolError;
use crate::core::token::FungibleToken;
use crate::core::types::{AccountId, AssetId};
use crate::engine::LoanRecord;
use crate::ledger::ShareLedger;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Capability credential for registry administration. Cannot be constructed
/// outside this module and is deliberately not `Clone`; the single value
/// minted by [`AssetRegistry::new`] is the whole privileged role.
pub struct AdminCap {
    _private: (),
}

/// One registered asset: its enabled flag, bound token handle, vault account
/// and share ledger, plus the slot for the loan currently in flight.
pub struct AssetEntry {
    pub id: AssetId,
    enabled: AtomicBool,
    pub token: Arc<dyn FungibleToken>,
    pub vault: AccountId,
    pub ledger: tokio::sync::Mutex<ShareLedger>,
    pub(crate) active_loan: std::sync::Mutex<Option<LoanRecord>>,
}

impl std::fmt::Debug for AssetEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetEntry")
            .field("id", &self.id)
            .field("enabled", &self.is_enabled())
            .field("vault", &self.vault)
            .finish_non_exhaustive()
    }
}

impl AssetEntry {
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn ensure_enabled(&self) -> Result<(), PoolError> {
        if self.is_enabled() {
            Ok(())
        } else {
            Err(PoolError::AssetDisabled(self.id.clone()))
        }
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}

pub struct AssetRegistry {
    assets: RwLock<HashMap<AssetId, Arc<AssetEntry>>>,
}

impl AssetRegistry {
    /// Creates an empty registry and mints its administrative capability.
    pub fn new() -> (Self, AdminCap) {
        (
            Self {
                assets: RwLock::new(HashMap::new()),
            },
            AdminCap { _private: () },
        )
    }

    /// Registers or re-flags an asset. The first call for an id allocates a
    /// fresh ledger (zero shares, rate 1.0) and vault account and binds the
    /// token handle; later calls only flip the enabled flag and keep the
    /// existing ledger, so disabling never destroys depositor claims.
    pub fn set_asset(
        &self,
        _admin: &AdminCap,
        asset: AssetId,
        token: Arc<dyn FungibleToken>,
        enabled: bool,
    ) -> Result<Arc<AssetEntry>, PoolError> {
        let mut assets = self.assets.write().unwrap();
        if let Some(entry) = assets.get(&asset) {
            entry.set_enabled(enabled);
            debug!(asset = %asset, enabled, "updated asset flag");
            return Ok(Arc::clone(entry));
        }

        let vault = AccountId::new(format!("vault::{asset}"));
        let entry = Arc::new(AssetEntry {
            id: asset.clone(),
            enabled: AtomicBool::new(enabled),
            token,
            vault,
            ledger: tokio::sync::Mutex::new(ShareLedger::new(asset.clone())),
            active_loan: std::sync::Mutex::new(None),
        });
        assets.insert(asset.clone(), Arc::clone(&entry));
        info!(asset = %asset, enabled, "registered asset");
        Ok(entry)
    }

    pub fn is_enabled(&self, asset: &AssetId) -> bool {
        self.assets
            .read()
            .unwrap()
            .get(asset)
            .is_some_and(|entry| entry.is_enabled())
    }

    /// Looks up a registered asset, enabled or not.
    pub fn entry(&self, asset: &AssetId) -> Result<Arc<AssetEntry>, PoolError> {
        self.assets
            .read()
            .unwrap()
            .get(asset)
            .cloned()
            .ok_or_else(|| PoolError::UnknownAsset(asset.clone()))
    }

    pub fn entries(&self) -> Vec<Arc<AssetEntry>> {
        let mut entries: Vec<_> = self.assets.read().unwrap().values().cloned().collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::memory_token::InMemoryToken;

    fn token() -> Arc<InMemoryToken> {
        Arc::new(InMemoryToken::new())
    }

    #[tokio::test]
    async fn test_unknown_asset_is_rejected() {
        let (registry, _admin) = AssetRegistry::new();
        let err = registry.entry(&AssetId::from("USDX")).unwrap_err();
        assert!(matches!(err, PoolError::UnknownAsset(_)));
        assert!(!registry.is_enabled(&AssetId::from("USDX")));
    }

    #[tokio::test]
    async fn test_first_enable_allocates_fresh_ledger() {
        let (registry, admin) = AssetRegistry::new();
        let entry = registry
            .set_asset(&admin, AssetId::from("USDX"), token(), true)
            .unwrap();

        assert!(entry.is_enabled());
        let ledger = entry.ledger.lock().await;
        assert_eq!(ledger.total_shares(), 0);
        assert_eq!(ledger.exchange_rate(), crate::core::types::SCALE);
        assert_eq!(entry.vault.as_str(), "vault::USDX");
    }

    #[tokio::test]
    async fn test_disabled_asset_fails_before_any_mutation() {
        let (registry, admin) = AssetRegistry::new();
        registry
            .set_asset(&admin, AssetId::from("USDX"), token(), true)
            .unwrap();
        registry
            .set_asset(&admin, AssetId::from("USDX"), token(), false)
            .unwrap();

        let entry = registry.entry(&AssetId::from("USDX")).unwrap();
        let err = entry.ensure_enabled().unwrap_err();
        assert!(matches!(err, PoolError::AssetDisabled(_)));
    }

    #[tokio::test]
    async fn test_re_enable_reuses_existing_ledger() {
        let (registry, admin) = AssetRegistry::new();
        let asset = AssetId::from("USDX");
        let entry = registry
            .set_asset(&admin, asset.clone(), token(), true)
            .unwrap();
        {
            let mut ledger = entry.ledger.lock().await;
            ledger.mint(&AccountId::from("alice"), 10_000).unwrap();
            ledger.realize_fee(3).unwrap();
        }
        let rate = entry.ledger.lock().await.exchange_rate();

        registry
            .set_asset(&admin, asset.clone(), token(), false)
            .unwrap();
        let entry = registry
            .set_asset(&admin, asset.clone(), token(), true)
            .unwrap();

        let ledger = entry.ledger.lock().await;
        assert_eq!(ledger.total_shares(), 10_000);
        assert_eq!(ledger.exchange_rate(), rate);
    }
}
