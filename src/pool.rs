//! Pool facade
//!
//! Wires the registry, the loan engine and the fee calculator together behind
//! one handle and layers the observability surface (state queries, advisory
//! persistence) on top. All monetary operations go through here.

use crate::config::AppConfig;
use crate::core::error::PoolError;
use crate::core::oracle::PriceOracle;
use crate::core::receiver::FlashBorrower;
use crate::core::types::{AccountId, Amount, AssetId};
use crate::engine::{LoanEngine, SettlementPolicy};
use crate::fees::FeeCalculator;
use crate::registry::{AdminCap, AssetEntry, AssetRegistry};
use crate::store::StateStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub fee_fraction_bps: u32,
    pub settlement_policy: SettlementPolicy,
    pub callback_deadline: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            fee_fraction_bps: 30,
            settlement_policy: SettlementPolicy::default(),
            callback_deadline: Duration::from_secs(30),
        }
    }
}

impl PoolSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            fee_fraction_bps: config.fee_fraction_bps,
            settlement_policy: config.settlement_policy,
            callback_deadline: Duration::from_secs(config.callback_deadline_secs),
        }
    }
}

/// Queryable per-asset state, also the persisted audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetState {
    pub asset: AssetId,
    pub enabled: bool,
    pub total_shares: Amount,
    pub exchange_rate: u128,
    pub held_balance: Amount,
    pub updated_at: DateTime<Utc>,
}

pub struct FlashPool {
    registry: AssetRegistry,
    engine: LoanEngine,
    store: Option<Arc<dyn StateStore>>,
}

impl FlashPool {
    /// Builds a pool and mints its administrative capability. The capability
    /// is returned exactly once; whoever holds it is the operator.
    pub fn new(
        settings: PoolSettings,
        oracle: Arc<dyn PriceOracle>,
        store: Option<Arc<dyn StateStore>>,
    ) -> (Self, AdminCap) {
        let (registry, admin) = AssetRegistry::new();
        let fees = FeeCalculator::new(oracle, settings.fee_fraction_bps);
        let engine = LoanEngine::new(fees, settings.settlement_policy, settings.callback_deadline);
        (
            Self {
                registry,
                engine,
                store,
            },
            admin,
        )
    }

    pub fn settlement_policy(&self) -> SettlementPolicy {
        self.engine.policy()
    }

    /// Privileged: registers an asset or flips its enabled flag. First
    /// registration binds the token handle and allocates the ledger.
    pub async fn set_asset(
        &self,
        admin: &AdminCap,
        asset: AssetId,
        token: Arc<dyn crate::core::token::FungibleToken>,
        enabled: bool,
    ) -> Result<(), PoolError> {
        let entry = self.registry.set_asset(admin, asset, token, enabled)?;
        self.persist(&entry).await;
        Ok(())
    }

    pub fn is_enabled(&self, asset: &AssetId) -> bool {
        self.registry.is_enabled(asset)
    }

    pub fn assets(&self) -> Vec<AssetId> {
        self.registry
            .entries()
            .into_iter()
            .map(|entry| entry.id.clone())
            .collect()
    }

    /// The ledger's holding account for an asset. Public information: this is
    /// where repayments land.
    pub fn vault_account(&self, asset: &AssetId) -> Result<AccountId, PoolError> {
        Ok(self.registry.entry(asset)?.vault.clone())
    }

    /// Deposits `amount` of the underlying asset and mints shares at the
    /// current exchange rate. Returns the shares minted.
    pub async fn deposit(
        &self,
        asset: &AssetId,
        depositor: &AccountId,
        amount: Amount,
    ) -> Result<Amount, PoolError> {
        let entry = self.registry.entry(asset)?;
        entry.ensure_enabled()?;
        if amount == 0 {
            return Err(PoolError::ZeroAmount);
        }

        let mut ledger = entry
            .ledger
            .try_lock()
            .map_err(|_| PoolError::Reentrant(entry.id.clone()))?;

        // Quote the shares from the current rate before anything mutates.
        let shares = ledger.shares_for_deposit(amount)?;
        entry
            .token
            .transfer(depositor, &entry.vault, amount)
            .await
            .map_err(PoolError::token)?;
        ledger.mint(depositor, shares)?;
        debug!(asset = %entry.id, depositor = %depositor, amount, shares, "deposit");
        drop(ledger);

        self.persist(&entry).await;
        Ok(shares)
    }

    /// Burns `shares` and pays out the underlying at the current exchange
    /// rate. Returns the amount paid out.
    pub async fn redeem(
        &self,
        asset: &AssetId,
        holder: &AccountId,
        shares: Amount,
    ) -> Result<Amount, PoolError> {
        let entry = self.registry.entry(asset)?;
        entry.ensure_enabled()?;
        if shares == 0 {
            return Err(PoolError::ZeroAmount);
        }

        let mut ledger = entry
            .ledger
            .try_lock()
            .map_err(|_| PoolError::Reentrant(entry.id.clone()))?;

        let held = ledger.shares_of(holder);
        if shares > held {
            return Err(PoolError::InsufficientShares {
                asset: entry.id.clone(),
                requested: shares,
                held,
            });
        }
        let owed = ledger.amount_for_shares(shares)?;
        let available = entry
            .token
            .balance_of(&entry.vault)
            .await
            .map_err(PoolError::token)?;
        if owed > available {
            return Err(PoolError::InsufficientLiquidity {
                asset: entry.id.clone(),
                requested: owed,
                available,
            });
        }

        entry
            .token
            .transfer(&entry.vault, holder, owed)
            .await
            .map_err(PoolError::token)?;
        ledger.burn(holder, shares)?;
        debug!(asset = %entry.id, holder = %holder, shares, owed, "redeem");
        drop(ledger);

        self.persist(&entry).await;
        Ok(owed)
    }

    /// Issues and settles a flash loan in one call. Returns the collected fee.
    pub async fn flashloan(
        &self,
        asset: &AssetId,
        receiver: &dyn FlashBorrower,
        amount: Amount,
        initiator: &AccountId,
        data: &[u8],
    ) -> Result<Amount, PoolError> {
        let entry = self.registry.entry(asset)?;
        let fee = self
            .engine
            .flashloan(&entry, receiver, amount, initiator, data)
            .await?;
        self.persist(&entry).await;
        Ok(fee)
    }

    /// Authorized repay path for the loan currently in flight.
    pub async fn repay(
        &self,
        asset: &AssetId,
        payer: &AccountId,
        amount: Amount,
    ) -> Result<(), PoolError> {
        let entry = self.registry.entry(asset)?;
        entry.ensure_enabled()?;
        self.engine.repay(&entry, payer, amount).await
    }

    /// Quotes the current fee for borrowing `amount`, reading the oracle
    /// price fresh.
    pub async fn quote_fee(&self, asset: &AssetId, amount: Amount) -> Result<Amount, PoolError> {
        let entry = self.registry.entry(asset)?;
        entry.ensure_enabled()?;
        self.engine.fees().quote(asset, amount).await
    }

    pub async fn asset_state(&self, asset: &AssetId) -> Result<AssetState, PoolError> {
        let entry = self.registry.entry(asset)?;
        self.state_of(&entry).await
    }

    pub async fn share_balance(
        &self,
        asset: &AssetId,
        account: &AccountId,
    ) -> Result<Amount, PoolError> {
        let entry = self.registry.entry(asset)?;
        let ledger = entry
            .ledger
            .try_lock()
            .map_err(|_| PoolError::Reentrant(entry.id.clone()))?;
        Ok(ledger.shares_of(account))
    }

    async fn state_of(&self, entry: &Arc<AssetEntry>) -> Result<AssetState, PoolError> {
        let ledger = entry
            .ledger
            .try_lock()
            .map_err(|_| PoolError::Reentrant(entry.id.clone()))?;
        let held_balance = entry
            .token
            .balance_of(&entry.vault)
            .await
            .map_err(PoolError::token)?;
        Ok(AssetState {
            asset: entry.id.clone(),
            enabled: entry.is_enabled(),
            total_shares: ledger.total_shares(),
            exchange_rate: ledger.exchange_rate(),
            held_balance,
            updated_at: Utc::now(),
        })
    }

    /// Persists the asset's state for the audit surface. Advisory: a failing
    /// store is logged and never fails the accounting operation.
    async fn persist(&self, entry: &Arc<AssetEntry>) {
        let Some(store) = &self.store else {
            return;
        };
        match self.state_of(entry).await {
            Ok(state) => {
                if let Err(e) = store.put(&state) {
                    warn!(asset = %entry.id, "failed to persist asset state: {e:#}");
                }
            }
            Err(e) => warn!(asset = %entry.id, "failed to capture asset state: {e}"),
        }
    }
}
