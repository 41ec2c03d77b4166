//! Read-only lockbox snapshot.

use serde::{Deserialize, Serialize};
use tranchelock_types::{Address, Amount, Timestamp, Tranche};

/// Point-in-time copy of a lockbox, taken between mutating calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockboxInfo {
    pub address: Address,
    pub creator: Address,
    pub beneficiary: Address,
    pub created_at: Timestamp,
    /// In created-then-appended order.
    pub tranches: Vec<Tranche>,
}

impl LockboxInfo {
    #[must_use]
    pub fn unlock_times(&self) -> Vec<Timestamp> {
        self.tranches.iter().map(|t| t.unlock_time).collect()
    }

    #[must_use]
    pub fn amounts(&self) -> Vec<Amount> {
        self.tranches.iter().map(|t| t.amount).collect()
    }

    #[must_use]
    pub fn settled_flags(&self) -> Vec<bool> {
        self.tranches.iter().map(Tranche::is_settled).collect()
    }

    /// Sum still owed (locked tranches, unlocked or not).
    #[must_use]
    pub fn total_locked(&self) -> Amount {
        self.tranches
            .iter()
            .filter(|t| !t.is_settled())
            .fold(0, |acc, t| acc.saturating_add(t.amount))
    }

    #[must_use]
    pub fn total_settled(&self) -> Amount {
        self.tranches
            .iter()
            .filter(|t| t.is_settled())
            .fold(0, |acc, t| acc.saturating_add(t.amount))
    }

    /// What a withdraw at `now` would pay if every transfer succeeded.
    #[must_use]
    pub fn claimable_at(&self, now: Timestamp) -> Amount {
        self.tranches
            .iter()
            .filter(|t| t.is_claimable_at(now))
            .fold(0, |acc, t| acc.saturating_add(t.amount))
    }

    /// Earliest unlock strictly after `now` among locked tranches.
    #[must_use]
    pub fn next_unlock_after(&self, now: Timestamp) -> Option<Timestamp> {
        self.tranches
            .iter()
            .filter(|t| !t.is_settled() && t.unlock_time > now)
            .map(|t| t.unlock_time)
            .min()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tranches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tranches.is_empty()
    }
}
