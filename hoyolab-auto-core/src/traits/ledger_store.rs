//! Ledger persistence abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::RedeemLedger;

/// Durable storage for the redemption ledger.
///
/// A run loads one consistent snapshot at start and never re-reads mid-run;
/// it writes back exactly once, after the attempt phase. Saves must be
/// crash-atomic: the on-disk state either fully lands or stays untouched.
/// Concurrent runs are not supported, so no cross-process locking is needed.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load the ledger. A missing backing file is the empty ledger.
    async fn load(&self) -> CoreResult<RedeemLedger>;

    /// Persist the ledger atomically.
    async fn save(&self, ledger: &RedeemLedger) -> CoreResult<()>;
}
