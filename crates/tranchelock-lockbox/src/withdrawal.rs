//! Result of one withdraw call.

use serde::{Deserialize, Serialize};
use tranchelock_types::{Address, Amount, SettlementRecord, Timestamp};

/// A tranche that was unlocked but whose transfer the ledger rejected.
/// The tranche stays locked and may be retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTransfer {
    pub tranche_index: usize,
    pub amount: Amount,
    pub reason: String,
}

/// Per-call outcome. An outcome with no settlements is still a success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub lockbox: Address,
    pub asset: Address,
    /// The clock reading every unlock check in this call used.
    pub now: Timestamp,
    /// Tranches that settled, in index order.
    pub settled: Vec<SettlementRecord>,
    /// Unlocked tranches whose transfer failed, in index order.
    pub failed: Vec<FailedTransfer>,
    /// Locked tranches not yet at their unlock time.
    pub still_locked: usize,
}

impl Withdrawal {
    pub(crate) fn new(lockbox: Address, asset: Address, now: Timestamp) -> Self {
        Self {
            lockbox,
            asset,
            now,
            settled: Vec::new(),
            failed: Vec::new(),
            still_locked: 0,
        }
    }

    /// Total moved to the beneficiary in this call.
    #[must_use]
    pub fn total_settled(&self) -> Amount {
        self.settled
            .iter()
            .fold(0, |acc, r| acc.saturating_add(r.amount))
    }

    #[must_use]
    pub fn settled_indices(&self) -> Vec<usize> {
        self.settled.iter().map(|r| r.tranche_index).collect()
    }

    /// Nothing settled in this call.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settled.is_empty()
    }
}
