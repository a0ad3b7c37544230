//! Reference borrower
//!
//! A well-behaved receiver that settles its loan from its own balance. Used by
//! the `simulate` command and as the honest counterparty in tests; real
//! borrowers implement [`FlashBorrower`] themselves.

use crate::core::receiver::FlashBorrower;
use crate::core::token::FungibleToken;
use crate::core::types::{AccountId, Amount, AssetId};
use crate::pool::FlashPool;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// How the receiver returns the funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepayMode {
    /// Transfer principal + fee straight into the vault, bypassing the
    /// protocol. Settles under the balance-delta policy only.
    RawTransfer,
    /// Transfer the principal but withhold the fee. Never settles.
    RawTransferPrincipalOnly,
    /// Go through the authorized [`FlashPool::repay`] path.
    RepayPath,
}

pub struct RepayingReceiver {
    pool: Arc<FlashPool>,
    token: Arc<dyn FungibleToken>,
    account: AccountId,
    mode: RepayMode,
}

impl RepayingReceiver {
    pub fn new(
        pool: Arc<FlashPool>,
        token: Arc<dyn FungibleToken>,
        account: AccountId,
        mode: RepayMode,
    ) -> Self {
        Self {
            pool,
            token,
            account,
            mode,
        }
    }
}

#[async_trait]
impl FlashBorrower for RepayingReceiver {
    fn account(&self) -> AccountId {
        self.account.clone()
    }

    async fn execute_operation(
        &self,
        asset: &AssetId,
        amount: Amount,
        fee: Amount,
        _initiator: &AccountId,
        _data: &[u8],
    ) -> Result<bool> {
        match self.mode {
            RepayMode::RawTransfer => {
                let vault = self.pool.vault_account(asset)?;
                self.token
                    .transfer(&self.account, &vault, amount + fee)
                    .await?;
            }
            RepayMode::RawTransferPrincipalOnly => {
                let vault = self.pool.vault_account(asset)?;
                self.token.transfer(&self.account, &vault, amount).await?;
            }
            RepayMode::RepayPath => {
                self.pool.repay(asset, &self.account, amount + fee).await?;
            }
        }
        Ok(true)
    }
}
