//! # tranchelock-lockbox
//!
//! **Custody plane**: one beneficiary's tranche schedule, its authorization
//! rules, and the settlement algorithm that pays it out.
//!
//! ## Guarantees
//!
//! - No tranche pays out before its unlock time (boundary inclusive)
//! - No tranche pays out twice (`Locked → Settled` is terminal)
//! - A transfer the ledger rejects leaves its tranche `Locked` and never
//!   aborts sibling tranches
//! - Appending never disturbs existing tranches
//!
//! ## Flow
//!
//! ```text
//! creator     → append_tranche() → schedule grows by one
//! beneficiary → withdraw(asset)  → for each unlocked tranche:
//!                                    ledger.transfer() ok  → SETTLED + record
//!                                    ledger.transfer() err → stays LOCKED
//! ```

pub mod handle;
pub mod info;
pub mod lockbox;
pub mod sink;
pub mod withdrawal;

pub use handle::{LockboxHandle, WeakLockboxHandle};
pub use info::LockboxInfo;
pub use lockbox::{Lockbox, LockboxParams};
pub use sink::{ChannelSink, EventLog, EventSink, NullSink, RecordedEvent};
pub use withdrawal::{FailedTransfer, Withdrawal};
