//! # Tranche: one scheduled, fixed-amount payment
//!
//! A lockbox holds an append-only sequence of tranches. A tranche's index
//! in that sequence is its identity; it is never reused or removed.
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐  now >= unlock_time AND transfer ok   ┌─────────┐
//!   │ LOCKED ├──────────────────────────────────────▶│ SETTLED │
//!   └────────┘                                       └─────────┘
//! ```
//!
//! `Settled` is terminal. A tranche that has paid out can never pay out
//! again, which is what prevents double-spend across repeated withdrawals.

use serde::{Deserialize, Serialize};

use crate::{Amount, Result, Timestamp, TranchelockError};

/// Lifecycle state of a tranche. Transitions are monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrancheState {
    /// Funds are owed but have not been paid.
    Locked,
    /// Funds were transferred to the beneficiary. **Irreversible.**
    Settled,
}

impl TrancheState {
    /// Can this tranche transition to the given target state?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Locked, Self::Settled))
    }
}

impl std::fmt::Display for TrancheState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locked => write!(f, "LOCKED"),
            Self::Settled => write!(f, "SETTLED"),
        }
    }
}

/// One entry of a lockbox schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tranche {
    /// Earliest time (unix seconds, inclusive) this tranche may settle.
    pub unlock_time: Timestamp,
    /// Amount paid to the beneficiary on settlement.
    pub amount: Amount,
    /// Current lifecycle state.
    pub state: TrancheState,
}

impl Tranche {
    /// A new tranche in the `Locked` state.
    #[must_use]
    pub fn new(unlock_time: Timestamp, amount: Amount) -> Self {
        Self {
            unlock_time,
            amount,
            state: TrancheState::Locked,
        }
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.state == TrancheState::Settled
    }

    /// The unlock boundary is inclusive: `now == unlock_time` unlocks.
    #[must_use]
    pub fn is_unlocked_at(&self, now: Timestamp) -> bool {
        now >= self.unlock_time
    }

    /// Locked and past its unlock time.
    #[must_use]
    pub fn is_claimable_at(&self, now: Timestamp) -> bool {
        !self.is_settled() && self.is_unlocked_at(now)
    }

    /// Transition to `Settled`.
    ///
    /// # Errors
    /// Returns [`TranchelockError::TrancheAlreadySettled`] if the tranche
    /// is not `Locked`. `index` is used only for the error.
    pub fn mark_settled(&mut self, index: usize) -> Result<()> {
        if !self.state.can_transition_to(TrancheState::Settled) {
            return Err(TranchelockError::TrancheAlreadySettled { index });
        }
        self.state = TrancheState::Settled;
        Ok(())
    }
}
