//! Borrower-side callback contract

use crate::core::types::{AccountId, Amount, AssetId};
use anyhow::Result;
use async_trait::async_trait;

/// Implemented by any borrower. The engine transfers the principal to
/// [`account`](FlashBorrower::account), invokes
/// [`execute_operation`](FlashBorrower::execute_operation) synchronously, and
/// treats any error or `false` as settlement failure. The callback may call
/// back into the protocol; same-asset calls fail fast with `Reentrant`.
#[async_trait]
pub trait FlashBorrower: Send + Sync {
    /// Account that receives the principal and funds the repayment.
    fn account(&self) -> AccountId;

    async fn execute_operation(
        &self,
        asset: &AssetId,
        amount: Amount,
        fee: Amount,
        initiator: &AccountId,
        data: &[u8],
    ) -> Result<bool>;
}
