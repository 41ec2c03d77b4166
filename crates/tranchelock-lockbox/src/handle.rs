//! Shared, thread-safe access to a lockbox.
//!
//! Every operation on a lockbox, reads included, goes through one mutex.
//! Each call runs to completion before the next one observes the lockbox,
//! and a snapshot never shows a tranche mid-settlement.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tranchelock_ledger::AssetLedger;
use tranchelock_types::{Address, Amount, Result, Timestamp};

use crate::info::LockboxInfo;
use crate::lockbox::Lockbox;
use crate::withdrawal::Withdrawal;

/// Cloneable handle to a lockbox. Clones refer to the same lockbox.
#[derive(Debug, Clone)]
pub struct LockboxHandle {
    address: Address,
    creator: Address,
    beneficiary: Address,
    inner: Arc<Mutex<Lockbox>>,
}

impl LockboxHandle {
    #[must_use]
    pub fn new(lockbox: Lockbox) -> Self {
        Self {
            address: lockbox.address(),
            creator: lockbox.creator(),
            beneficiary: lockbox.beneficiary(),
            inner: Arc::new(Mutex::new(lockbox)),
        }
    }

    /// Immutable after construction, so readable without the lock.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn creator(&self) -> Address {
        self.creator
    }

    #[must_use]
    pub fn beneficiary(&self) -> Address {
        self.beneficiary
    }

    /// See [`Lockbox::append_tranche`].
    pub fn append_tranche(
        &self,
        caller: Address,
        unlock_time: Timestamp,
        amount: Amount,
    ) -> Result<usize> {
        self.inner.lock().append_tranche(caller, unlock_time, amount)
    }

    /// See [`Lockbox::withdraw`]. The ledger call happens under the lock.
    pub fn withdraw<L: AssetLedger + ?Sized>(
        &self,
        caller: Address,
        asset: Address,
        ledger: &mut L,
    ) -> Result<Withdrawal> {
        self.inner.lock().withdraw(caller, asset, ledger)
    }

    #[must_use]
    pub fn info(&self) -> LockboxInfo {
        self.inner.lock().info()
    }

    /// Non-owning reference for indexes that must not keep the lockbox alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakLockboxHandle {
        WeakLockboxHandle {
            address: self.address,
            creator: self.creator,
            beneficiary: self.beneficiary,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether two handles refer to the same lockbox.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Weak counterpart of [`LockboxHandle`].
#[derive(Debug, Clone)]
pub struct WeakLockboxHandle {
    address: Address,
    creator: Address,
    beneficiary: Address,
    inner: Weak<Mutex<Lockbox>>,
}

impl WeakLockboxHandle {
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Whether any strong handle still exists.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// `None` once every strong handle has been dropped.
    #[must_use]
    pub fn upgrade(&self) -> Option<LockboxHandle> {
        self.inner.upgrade().map(|inner| LockboxHandle {
            address: self.address,
            creator: self.creator,
            beneficiary: self.beneficiary,
            inner,
        })
    }
}
