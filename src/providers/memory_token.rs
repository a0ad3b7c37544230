//! In-process fungible token
//!
//! Backs tests and the `simulate` command. Transfers carry no authorization —
//! this is a simulation of token custody, not of token security — but the
//! snapshot surface is fully implemented so engine rollbacks behave exactly
//! as they would against a transactional token environment.

use crate::core::token::{FungibleToken, TokenSnapshot};
use crate::core::types::{AccountId, Amount};
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct TokenState {
    balances: HashMap<AccountId, Amount>,
    snapshots: HashMap<u64, HashMap<AccountId, Amount>>,
    next_snapshot: u64,
}

#[derive(Default)]
pub struct InMemoryToken {
    state: Mutex<TokenState>,
}

impl InMemoryToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `amount` to an account out of thin air. Setup helper.
    pub fn mint(&self, account: &AccountId, amount: Amount) {
        let mut state = self.state.lock().unwrap();
        *state.balances.entry(account.clone()).or_insert(0) += amount;
    }

    /// Current balance, without going through the async trait.
    pub fn balance(&self, account: &AccountId) -> Amount {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(account)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl FungibleToken for InMemoryToken {
    async fn balance_of(&self, account: &AccountId) -> Result<Amount> {
        Ok(self.balance(account))
    }

    async fn transfer(&self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let from_balance = state.balances.get(from).copied().unwrap_or(0);
        if from_balance < amount {
            bail!("insufficient balance on {from}: has {from_balance}, needs {amount}");
        }
        state.balances.insert(from.clone(), from_balance - amount);
        *state.balances.entry(to.clone()).or_insert(0) += amount;
        Ok(())
    }

    async fn snapshot(&self) -> Result<TokenSnapshot> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_snapshot;
        state.next_snapshot += 1;
        let balances = state.balances.clone();
        state.snapshots.insert(id, balances);
        Ok(TokenSnapshot(id))
    }

    async fn restore(&self, snapshot: TokenSnapshot) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.snapshots.remove(&snapshot.0) {
            Some(balances) => {
                state.balances = balances;
                Ok(())
            }
            None => bail!("unknown token snapshot {}", snapshot.0),
        }
    }

    async fn discard(&self, snapshot: TokenSnapshot) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.snapshots.remove(&snapshot.0).is_none() {
            bail!("unknown token snapshot {}", snapshot.0);
        }
        Ok(())
    }
}
