//! Observable records for off-system indexers.
//!
//! The core writes these to an event sink and never reads them back.
//! Every record names the lockbox it came from.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, Timestamp};

/// Emitted once per successful `Registry::create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationRecord {
    pub lockbox: Address,
    pub creator: Address,
    pub beneficiary: Address,
    pub unlock_times: Vec<Timestamp>,
    pub amounts: Vec<Amount>,
}

/// Emitted once per successful `append_tranche`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrancheAppendedRecord {
    pub lockbox: Address,
    pub tranche_index: usize,
    pub unlock_time: Timestamp,
    pub amount: Amount,
}

/// Emitted once per tranche that settles during `withdraw`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub lockbox: Address,
    /// The asset contract the payment was made in.
    pub asset: Address,
    pub beneficiary: Address,
    pub amount: Amount,
    pub tranche_index: usize,
}

/// Discriminant of a [`LockboxEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Created,
    TrancheAppended,
    Withdrew,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "CREATED"),
            Self::TrancheAppended => write!(f, "TRANCHE_APPENDED"),
            Self::Withdrew => write!(f, "WITHDREW"),
        }
    }
}

/// Any record the engine emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockboxEvent {
    Created(CreationRecord),
    TrancheAppended(TrancheAppendedRecord),
    Withdrew(SettlementRecord),
}

impl LockboxEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Created(_) => EventKind::Created,
            Self::TrancheAppended(_) => EventKind::TrancheAppended,
            Self::Withdrew(_) => EventKind::Withdrew,
        }
    }

    /// The lockbox this record belongs to.
    #[must_use]
    pub fn lockbox(&self) -> Address {
        match self {
            Self::Created(r) => r.lockbox,
            Self::TrancheAppended(r) => r.lockbox,
            Self::Withdrew(r) => r.lockbox,
        }
    }

    #[must_use]
    pub fn as_settlement(&self) -> Option<&SettlementRecord> {
        match self {
            Self::Withdrew(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_creation(&self) -> Option<&CreationRecord> {
        match self {
            Self::Created(r) => Some(r),
            _ => None,
        }
    }
}
