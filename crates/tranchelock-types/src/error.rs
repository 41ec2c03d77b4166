//! Error types for the Tranchelock custody engine.
//!
//! All errors use the `TL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Authorization errors
//! - 2xx: Construction / schedule errors
//! - 3xx: Ledger / transfer errors
//! - 4xx: Registry errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{Address, Amount};

/// Which privileged role an operation requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The address that created the lockbox and may extend its schedule.
    Creator,
    /// The address that receives settled funds and may trigger withdrawal.
    Beneficiary,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Creator => write!(f, "creator"),
            Self::Beneficiary => write!(f, "beneficiary"),
        }
    }
}

/// Central error enum for all Tranchelock operations.
#[derive(Debug, Error)]
pub enum TranchelockError {
    // =================================================================
    // Authorization Errors (1xx)
    // =================================================================
    /// The caller does not hold the role the operation requires.
    #[error("TL_ERR_100: Caller {caller} is not {role}")]
    NotAuthorized { caller: Address, role: Role },

    // =================================================================
    // Construction / Schedule Errors (2xx)
    // =================================================================
    /// Unlock times and amounts have different lengths.
    #[error("TL_ERR_200: Arity mismatch: {unlock_times} unlock times vs {amounts} amounts")]
    ArityMismatch { unlock_times: usize, amounts: usize },

    /// The beneficiary is the zero address.
    #[error("TL_ERR_201: Invalid beneficiary: {0}")]
    InvalidBeneficiary(Address),

    /// A tranche with zero amount was rejected by policy.
    #[error("TL_ERR_202: Zero-amount tranche at index {index}")]
    ZeroAmountTranche { index: usize },

    /// The lockbox would exceed its configured tranche cap.
    #[error("TL_ERR_203: Tranche limit exceeded: {requested} > {limit}")]
    TrancheLimitExceeded { requested: usize, limit: usize },

    /// A settled tranche cannot transition again.
    #[error("TL_ERR_204: Tranche {index} already settled")]
    TrancheAlreadySettled { index: usize },

    /// An address string could not be parsed.
    #[error("TL_ERR_205: Invalid address {input:?}: {reason}")]
    InvalidAddress { input: String, reason: String },

    // =================================================================
    // Ledger / Transfer Errors (3xx)
    // =================================================================
    /// The holder does not have enough of the asset.
    #[error("TL_ERR_300: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Amount, available: Amount },

    /// No asset contract exists at this address.
    #[error("TL_ERR_301: Unknown asset contract: {0}")]
    UnknownAsset(Address),

    /// A credit would overflow the recipient's balance.
    #[error("TL_ERR_302: Balance overflow")]
    BalanceOverflow,

    /// The asset ledger rejected the transfer for another reason.
    #[error("TL_ERR_303: Transfer failed: {reason}")]
    TransferFailed { reason: String },

    /// Total of balances does not match total issued. Critical.
    #[error("TL_ERR_304: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // Registry Errors (4xx)
    // =================================================================
    /// No live lockbox is known at this address.
    #[error("TL_ERR_400: Lockbox not found: {0}")]
    LockboxNotFound(Address),

    // =================================================================
    // General (9xx)
    // =================================================================
    /// Serialization / deserialization error.
    #[error("TL_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, bad values, etc.).
    #[error("TL_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("TL_ERR_903: I/O error: {0}")]
    Io(String),
}

impl TranchelockError {
    /// Whether this is one of the ledger's own transfer rejections.
    /// Withdraw contains every error per tranche; anything else coming out
    /// of a ledger is logged as unexpected.
    #[must_use]
    pub fn is_transfer_failure(&self) -> bool {
        matches!(
            self,
            Self::InsufficientBalance { .. }
                | Self::UnknownAsset(_)
                | Self::BalanceOverflow
                | Self::TransferFailed { .. }
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, TranchelockError>;

impl From<std::io::Error> for TranchelockError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TranchelockError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
