//! Share-based claim accounting for a single asset
//!
//! One ledger per enabled asset. Depositors hold shares; a share is a claim on
//! the pooled asset at the current exchange rate. The rate starts at 1.0 and
//! only moves through [`ShareLedger::realize_fee`], which converts a collected
//! loan fee into a rate increase benefiting all current shareholders.

use crate::core::error::PoolError;
use crate::core::types::{AccountId, Amount, AssetId, SCALE};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ShareLedger {
    asset: AssetId,
    total_shares: Amount,
    exchange_rate: u128,
    holdings: HashMap<AccountId, Amount>,
}

impl ShareLedger {
    pub fn new(asset: AssetId) -> Self {
        Self {
            asset,
            total_shares: 0,
            exchange_rate: SCALE,
            holdings: HashMap::new(),
        }
    }

    pub fn asset(&self) -> &AssetId {
        &self.asset
    }

    pub fn total_shares(&self) -> Amount {
        self.total_shares
    }

    pub fn exchange_rate(&self) -> u128 {
        self.exchange_rate
    }

    pub fn shares_of(&self, holder: &AccountId) -> Amount {
        self.holdings.get(holder).copied().unwrap_or(0)
    }

    /// Shares a deposit of `amount` mints at the current rate, rounded down.
    /// Computed before any state mutation so a partially updated rate can
    /// never leak into the quote.
    pub fn shares_for_deposit(&self, amount: Amount) -> Result<Amount, PoolError> {
        amount
            .checked_mul(SCALE)
            .map(|scaled| scaled / self.exchange_rate)
            .ok_or(PoolError::AmountOverflow)
    }

    /// Underlying amount owed for redeeming `shares` at the current rate.
    pub fn amount_for_shares(&self, shares: Amount) -> Result<Amount, PoolError> {
        shares
            .checked_mul(self.exchange_rate)
            .map(|scaled| scaled / SCALE)
            .ok_or(PoolError::AmountOverflow)
    }

    pub fn mint(&mut self, holder: &AccountId, shares: Amount) -> Result<(), PoolError> {
        self.total_shares = self
            .total_shares
            .checked_add(shares)
            .ok_or(PoolError::AmountOverflow)?;
        let balance = self.holdings.entry(holder.clone()).or_insert(0);
        *balance += shares;
        Ok(())
    }

    pub fn burn(&mut self, holder: &AccountId, shares: Amount) -> Result<(), PoolError> {
        let held = self.shares_of(holder);
        if shares > held {
            return Err(PoolError::InsufficientShares {
                asset: self.asset.clone(),
                requested: shares,
                held,
            });
        }
        self.total_shares -= shares;
        match held - shares {
            0 => {
                self.holdings.remove(holder);
            }
            rest => {
                self.holdings.insert(holder.clone(), rest);
            }
        }
        Ok(())
    }

    /// Grows the exchange rate by the collected fee:
    /// `new_rate = old_rate * (total_shares + fee) / total_shares`.
    ///
    /// The rate must strictly increase; a fee small enough to round the rate
    /// to its previous value is rejected as `ExchangeRateRegression`, and an
    /// empty share supply is rejected as `ZeroShareSupply` since the fee would
    /// have no beneficiary.
    pub fn realize_fee(&mut self, fee: Amount) -> Result<u128, PoolError> {
        if self.total_shares == 0 {
            return Err(PoolError::ZeroShareSupply(self.asset.clone()));
        }
        let grown = self
            .total_shares
            .checked_add(fee)
            .ok_or(PoolError::AmountOverflow)?;
        let new_rate = self
            .exchange_rate
            .checked_mul(grown)
            .ok_or(PoolError::AmountOverflow)?
            / self.total_shares;
        if new_rate <= self.exchange_rate {
            return Err(PoolError::ExchangeRateRegression {
                old_rate: self.exchange_rate,
                new_rate,
            });
        }
        self.exchange_rate = new_rate;
        Ok(new_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> ShareLedger {
        ShareLedger::new(AssetId::from("USDX"))
    }

    #[test]
    fn test_deposit_mints_one_to_one_at_initial_rate() {
        let mut ledger = ledger();
        let depositor = AccountId::from("alice");

        let shares = ledger.shares_for_deposit(10_000).unwrap();
        assert_eq!(shares, 10_000);

        ledger.mint(&depositor, shares).unwrap();
        assert_eq!(ledger.total_shares(), 10_000);
        assert_eq!(ledger.shares_of(&depositor), 10_000);
    }

    #[test]
    fn test_deposit_redeem_round_trip_at_unchanged_rate() {
        let mut ledger = ledger();
        let depositor = AccountId::from("alice");

        let shares = ledger.shares_for_deposit(1_234).unwrap();
        ledger.mint(&depositor, shares).unwrap();

        let owed = ledger.amount_for_shares(shares).unwrap();
        assert_eq!(owed, 1_234);

        ledger.burn(&depositor, shares).unwrap();
        assert_eq!(ledger.total_shares(), 0);
        assert_eq!(ledger.shares_of(&depositor), 0);
    }

    #[test]
    fn test_deposit_after_rate_growth_mints_fewer_shares() {
        let mut ledger = ledger();
        ledger.mint(&AccountId::from("alice"), 10_000).unwrap();
        ledger.realize_fee(3).unwrap();

        // Rate is now 1.0003, so 10_000 units buy slightly fewer shares.
        let shares = ledger.shares_for_deposit(10_000).unwrap();
        assert!(shares < 10_000);
        assert_eq!(shares, 10_000 * SCALE / ledger.exchange_rate());
    }

    #[test]
    fn test_burn_more_than_held_fails() {
        let mut ledger = ledger();
        let holder = AccountId::from("alice");
        ledger.mint(&holder, 50).unwrap();

        let err = ledger.burn(&holder, 51).unwrap_err();
        assert!(matches!(
            err,
            PoolError::InsufficientShares {
                requested: 51,
                held: 50,
                ..
            }
        ));
        // Failed burn mutates nothing.
        assert_eq!(ledger.shares_of(&holder), 50);
        assert_eq!(ledger.total_shares(), 50);
    }

    #[test]
    fn test_realize_fee_grows_rate_proportionally() {
        let mut ledger = ledger();
        ledger.mint(&AccountId::from("alice"), 10_000).unwrap();

        let new_rate = ledger.realize_fee(3).unwrap();
        assert_eq!(new_rate, SCALE * 10_003 / 10_000);
        assert_eq!(ledger.exchange_rate(), 1_000_300_000);

        // A full redemption now pays out principal plus the realized fee.
        let owed = ledger.amount_for_shares(10_000).unwrap();
        assert_eq!(owed, 10_003);
    }

    #[test]
    fn test_rate_is_non_decreasing_across_realizations() {
        let mut ledger = ledger();
        ledger.mint(&AccountId::from("alice"), 10_000).unwrap();

        let mut last = ledger.exchange_rate();
        for fee in [3, 7, 1, 42] {
            let rate = ledger.realize_fee(fee).unwrap();
            assert!(rate > last);
            last = rate;
        }
    }

    #[test]
    fn test_realize_fee_rejects_zero_fee() {
        let mut ledger = ledger();
        ledger.mint(&AccountId::from("alice"), 10_000).unwrap();

        let err = ledger.realize_fee(0).unwrap_err();
        assert!(matches!(err, PoolError::ExchangeRateRegression { .. }));
    }

    #[test]
    fn test_realize_fee_rejects_fee_lost_to_rounding() {
        let mut ledger = ledger();
        // Supply so large that old_rate * (shares + 1) / shares rounds back
        // down to old_rate.
        ledger
            .mint(&AccountId::from("whale"), 100 * SCALE)
            .unwrap();

        let err = ledger.realize_fee(1).unwrap_err();
        assert!(matches!(err, PoolError::ExchangeRateRegression { .. }));
        assert_eq!(ledger.exchange_rate(), SCALE);
    }

    #[test]
    fn test_realize_fee_on_empty_supply_is_a_defined_error() {
        let mut ledger = ledger();
        let err = ledger.realize_fee(3).unwrap_err();
        assert!(matches!(err, PoolError::ZeroShareSupply(_)));

        // Also after a full redemption, not just on a fresh ledger.
        let holder = AccountId::from("alice");
        ledger.mint(&holder, 500).unwrap();
        ledger.realize_fee(5).unwrap();
        ledger.burn(&holder, 500).unwrap();
        let err = ledger.realize_fee(3).unwrap_err();
        assert!(matches!(err, PoolError::ZeroShareSupply(_)));
    }

    #[test]
    fn test_rate_survives_full_redemption() {
        let mut ledger = ledger();
        let holder = AccountId::from("alice");
        ledger.mint(&holder, 10_000).unwrap();
        ledger.realize_fee(3).unwrap();
        let rate = ledger.exchange_rate();

        ledger.burn(&holder, 10_000).unwrap();
        assert_eq!(ledger.exchange_rate(), rate);

        // A later deposit buys in at the preserved rate.
        let shares = ledger.shares_for_deposit(10_003).unwrap();
        assert_eq!(shares, 10_003 * SCALE / rate);
    }
}
