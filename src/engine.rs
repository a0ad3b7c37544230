//! Flash-loan issuance and settlement
//!
//! One loan is one pass through `Idle -> Issuing -> AwaitingSettlement ->
//! Settling -> {Completed | Reverted}`. The whole pass runs inside the asset's
//! exclusive section: the ledger lock is taken with `try_lock` and held until
//! the terminal phase, so a reentrant same-asset call from the borrower
//! callback fails fast with `Reentrant` instead of deadlocking. Nothing about
//! a loan survives the invocation; a failed pass restores the ledger
//! checkpoint and the token snapshot, leaving the asset exactly as it was.

use crate::core::error::PoolError;
use crate::core::receiver::FlashBorrower;
use crate::core::types::{AccountId, Amount};
use crate::fees::FeeCalculator;
use crate::ledger::ShareLedger;
use crate::registry::AssetEntry;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Per-invocation loan lifecycle, tracked for logging and the repay path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanPhase {
    Idle,
    Issuing,
    AwaitingSettlement,
    Settling,
    Completed,
    Reverted,
}

/// Ephemeral record of the loan currently in flight on an asset. Created at
/// issuance, consumed by the settlement check, never persisted.
#[derive(Debug, Clone)]
pub struct LoanRecord {
    pub amount: Amount,
    pub fee: Amount,
    pub pre_loan_balance: Amount,
    /// Amount received through the authorized repay path.
    pub repaid: Amount,
    pub phase: LoanPhase,
}

/// How the engine decides that a loan was repaid.
///
/// `BalanceDelta` reproduces the historical policy: any sequence of operations
/// that leaves the vault balance at `pre_loan + fee` or above counts as
/// repayment, with no proof that an authorized repayment occurred. This is a
/// documented-vulnerable policy kept for compatibility. `RepaymentLedger` only
/// counts funds received through [`LoanEngine::repay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettlementPolicy {
    #[default]
    BalanceDelta,
    RepaymentLedger,
}

pub struct LoanEngine {
    fees: FeeCalculator,
    policy: SettlementPolicy,
    callback_deadline: Duration,
}

impl LoanEngine {
    pub fn new(fees: FeeCalculator, policy: SettlementPolicy, callback_deadline: Duration) -> Self {
        Self {
            fees,
            policy,
            callback_deadline,
        }
    }

    pub fn policy(&self) -> SettlementPolicy {
        self.policy
    }

    pub fn fees(&self) -> &FeeCalculator {
        &self.fees
    }

    /// Issues a loan of `amount` to `receiver` and settles it within the same
    /// call. Returns the collected fee on success.
    pub async fn flashloan(
        &self,
        entry: &AssetEntry,
        receiver: &dyn FlashBorrower,
        amount: Amount,
        initiator: &AccountId,
        data: &[u8],
    ) -> Result<Amount, PoolError> {
        entry.ensure_enabled()?;
        if amount == 0 {
            return Err(PoolError::ZeroAmount);
        }

        // Exclusive section for this asset; held until the terminal phase.
        let mut ledger = entry
            .ledger
            .try_lock()
            .map_err(|_| PoolError::Reentrant(entry.id.clone()))?;

        let pre_loan_balance = entry
            .token
            .balance_of(&entry.vault)
            .await
            .map_err(PoolError::token)?;
        if amount > pre_loan_balance {
            return Err(PoolError::InsufficientLiquidity {
                asset: entry.id.clone(),
                requested: amount,
                available: pre_loan_balance,
            });
        }

        let fee = self.fees.quote(&entry.id, amount).await?;

        let checkpoint = ledger.clone();
        let snapshot = entry.token.snapshot().await.map_err(PoolError::token)?;
        set_record(
            entry,
            Some(LoanRecord {
                amount,
                fee,
                pre_loan_balance,
                repaid: 0,
                phase: LoanPhase::Issuing,
            }),
        );
        debug!(asset = %entry.id, amount, fee, pre_loan_balance, "issuing flash loan");

        let outcome = self
            .settle(
                entry,
                &mut ledger,
                receiver,
                amount,
                fee,
                pre_loan_balance,
                initiator,
                data,
            )
            .await;

        match outcome {
            Ok(()) => {
                set_phase(entry, LoanPhase::Completed);
                set_record(entry, None);
                if let Err(e) = entry.token.discard(snapshot).await {
                    warn!(asset = %entry.id, "failed to discard token snapshot: {e:#}");
                }
                info!(
                    asset = %entry.id,
                    amount,
                    fee,
                    exchange_rate = ledger.exchange_rate(),
                    "flash loan settled"
                );
                Ok(fee)
            }
            Err(e) => {
                *ledger = checkpoint;
                set_phase(entry, LoanPhase::Reverted);
                set_record(entry, None);
                if let Err(restore_err) = entry.token.restore(snapshot).await {
                    error!(asset = %entry.id, "token rollback failed: {restore_err:#}");
                    return Err(PoolError::Token(format!(
                        "rollback after `{e}` failed: {restore_err:#}"
                    )));
                }
                debug!(asset = %entry.id, amount, "flash loan reverted: {e}");
                Err(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn settle(
        &self,
        entry: &AssetEntry,
        ledger: &mut ShareLedger,
        receiver: &dyn FlashBorrower,
        amount: Amount,
        fee: Amount,
        pre_loan_balance: Amount,
        initiator: &AccountId,
        data: &[u8],
    ) -> Result<(), PoolError> {
        entry
            .token
            .transfer(&entry.vault, &receiver.account(), amount)
            .await
            .map_err(PoolError::token)?;
        set_phase(entry, LoanPhase::AwaitingSettlement);

        let callback = receiver.execute_operation(&entry.id, amount, fee, initiator, data);
        match tokio::time::timeout(self.callback_deadline, callback).await {
            Err(_) => {
                return Err(PoolError::CallbackRejected(format!(
                    "callback did not return within {:?}",
                    self.callback_deadline
                )));
            }
            Ok(Err(e)) => return Err(PoolError::CallbackRejected(format!("{e:#}"))),
            Ok(Ok(false)) => {
                return Err(PoolError::CallbackRejected(
                    "receiver returned failure".to_string(),
                ));
            }
            Ok(Ok(true)) => {}
        }
        set_phase(entry, LoanPhase::Settling);

        let required = match self.policy {
            SettlementPolicy::BalanceDelta => {
                let required = pre_loan_balance
                    .checked_add(fee)
                    .ok_or(PoolError::AmountOverflow)?;
                let observed = entry
                    .token
                    .balance_of(&entry.vault)
                    .await
                    .map_err(PoolError::token)?;
                if observed < required {
                    return Err(PoolError::SettlementFailed {
                        asset: entry.id.clone(),
                        required,
                        observed,
                    });
                }
                required
            }
            SettlementPolicy::RepaymentLedger => {
                let required = amount.checked_add(fee).ok_or(PoolError::AmountOverflow)?;
                let repaid = repaid_so_far(entry);
                if repaid < required {
                    return Err(PoolError::SettlementFailed {
                        asset: entry.id.clone(),
                        required,
                        observed: repaid,
                    });
                }
                required
            }
        };
        debug!(asset = %entry.id, required, "settlement check passed");

        ledger.realize_fee(fee)?;
        Ok(())
    }

    /// Authorized repay path: transfers `amount` from `payer` into the vault
    /// and credits it against the loan in flight. Valid only while a loan is
    /// active on the asset, and deliberately takes no ledger lock so the
    /// borrower callback can call it.
    pub async fn repay(
        &self,
        entry: &AssetEntry,
        payer: &AccountId,
        amount: Amount,
    ) -> Result<(), PoolError> {
        if amount == 0 {
            return Err(PoolError::ZeroAmount);
        }
        if entry.active_loan.lock().unwrap().is_none() {
            return Err(PoolError::NoActiveLoan(entry.id.clone()));
        }

        entry
            .token
            .transfer(payer, &entry.vault, amount)
            .await
            .map_err(PoolError::token)?;

        let mut guard = entry.active_loan.lock().unwrap();
        match guard.as_mut() {
            Some(record) => {
                record.repaid = record
                    .repaid
                    .checked_add(amount)
                    .ok_or(PoolError::AmountOverflow)?;
                debug!(asset = %entry.id, amount, repaid = record.repaid, "loan repayment received");
                Ok(())
            }
            // The loan resolved while the transfer was in flight; the funds
            // stay in the vault, but they no longer count toward settlement.
            None => Err(PoolError::NoActiveLoan(entry.id.clone())),
        }
    }
}

fn set_phase(entry: &AssetEntry, phase: LoanPhase) {
    if let Some(record) = entry.active_loan.lock().unwrap().as_mut() {
        debug!(asset = %entry.id, ?phase, "loan phase transition");
        record.phase = phase;
    }
}

fn set_record(entry: &AssetEntry, record: Option<LoanRecord>) {
    *entry.active_loan.lock().unwrap() = record;
}

fn repaid_so_far(entry: &AssetEntry) -> Amount {
    entry
        .active_loan
        .lock()
        .unwrap()
        .as_ref()
        .map(|record| record.repaid)
        .unwrap_or(0)
}
