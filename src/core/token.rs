//! External fungible-token abstraction
//!
//! Standard transfer/balance semantics plus a transactional snapshot surface.
//! Settlement is all-or-nothing: the engine snapshots the token before issuing
//! a loan and restores the snapshot if anything in the sequence fails, so a
//! reverted loan leaves every balance the receiver touched exactly as it was.

use crate::core::types::{AccountId, Amount};
use anyhow::Result;
use async_trait::async_trait;

/// Opaque handle to a point-in-time token state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenSnapshot(pub u64);

#[async_trait]
pub trait FungibleToken: Send + Sync {
    async fn balance_of(&self, account: &AccountId) -> Result<Amount>;

    async fn transfer(&self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<()>;

    /// Captures the current state for a possible rollback.
    async fn snapshot(&self) -> Result<TokenSnapshot>;

    /// Restores a previously captured state, discarding it.
    async fn restore(&self, snapshot: TokenSnapshot) -> Result<()>;

    /// Drops a snapshot that is no longer needed.
    async fn discard(&self, snapshot: TokenSnapshot) -> Result<()>;
}
