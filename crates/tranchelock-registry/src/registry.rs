//! Lockbox factory and creator index.
//!
//! The registry builds lockboxes, announces them, and remembers which
//! creator made which. It keeps only weak references: the host that holds
//! the returned [`LockboxHandle`] owns the lockbox's lifetime.
//!
//! A registry lives from process start to shutdown. Its creator index is
//! append-only; lockbox addresses are derived from the registry's own
//! address and a creation nonce, so they are unique per registry and
//! reproducible across replicas that see the same create calls.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};
use tranchelock_lockbox::{EventSink, Lockbox, LockboxHandle, LockboxParams, WeakLockboxHandle};
use tranchelock_types::{
    Address, Amount, Clock, CreationRecord, LockboxEvent, Result, Timestamp, TranchelockConfig,
    TranchelockError, constants,
};

#[derive(Debug, Default)]
struct RegistryState {
    /// Creator → lockbox addresses in creation order.
    by_creator: HashMap<Address, Vec<Address>>,
    /// Lockbox address → weak handle, for resolution. Dead entries are
    /// pruned; `by_creator` is not.
    directory: HashMap<Address, WeakLockboxHandle>,
    /// Successful creations so far. Only consumed on success.
    nonce: u64,
}

/// Creates lockboxes and indexes them by creator.
pub struct Registry {
    address: Address,
    config: TranchelockConfig,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
    state: RwLock<RegistryState>,
}

impl Registry {
    /// # Errors
    /// Returns `Configuration` if `config` fails validation.
    pub fn new(
        address: Address,
        config: TranchelockConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        config.validate()?;
        info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            registry = %address,
            max_tranches = config.policy.max_tranches_per_lockbox,
            allow_zero_amount = config.policy.allow_zero_amount,
            "Registry started"
        );
        Ok(Self {
            address,
            config,
            clock,
            sink,
            state: RwLock::new(RegistryState::default()),
        })
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn config(&self) -> &TranchelockConfig {
        &self.config
    }

    /// Create a lockbox owned by `beneficiary` and extendable by `caller`.
    ///
    /// Tranche `i` is `(unlock_times[i], amounts[i])`, all `Locked`, in
    /// input order. On success the lockbox is indexed under `caller` and a
    /// [`CreationRecord`] is emitted. Identical arguments still produce a
    /// distinct lockbox.
    ///
    /// # Errors
    /// `ArityMismatch`, `InvalidBeneficiary`, `TrancheLimitExceeded`, or
    /// `ZeroAmountTranche`. Nothing is created, indexed or emitted on error.
    pub fn create(
        &self,
        caller: Address,
        beneficiary: Address,
        unlock_times: &[Timestamp],
        amounts: &[Amount],
    ) -> Result<LockboxHandle> {
        let mut state = self.state.write();
        let address = self.derive_address(state.nonce);

        let lockbox = Lockbox::new(
            LockboxParams {
                address,
                creator: caller,
                beneficiary,
                unlock_times,
                amounts,
            },
            self.config.policy.clone(),
            Arc::clone(&self.clock),
            Arc::clone(&self.sink),
        )
        .inspect_err(|err| {
            warn!(registry = %self.address, creator = %caller, error = %err, "Lockbox creation rejected");
        })?;

        state.nonce += 1;
        let handle = LockboxHandle::new(lockbox);
        state.by_creator.entry(caller).or_default().push(address);
        state.directory.insert(address, handle.downgrade());

        // Emitted under the write lock so record order matches creation order.
        self.sink.emit(LockboxEvent::Created(CreationRecord {
            lockbox: address,
            creator: caller,
            beneficiary,
            unlock_times: unlock_times.to_vec(),
            amounts: amounts.to_vec(),
        }));
        info!(
            registry = %self.address,
            lockbox = %address,
            creator = %caller,
            beneficiary = %beneficiary,
            tranches = amounts.len(),
            "Lockbox created"
        );
        Ok(handle)
    }

    /// The address the next successful `create` will assign.
    #[must_use]
    pub fn preview_address(&self) -> Address {
        self.derive_address(self.state.read().nonce)
    }

    /// Lockboxes created by `creator`, oldest first. Empty if none.
    #[must_use]
    pub fn get_lockboxes(&self, creator: Address) -> Vec<Address> {
        self.state
            .read()
            .by_creator
            .get(&creator)
            .cloned()
            .unwrap_or_default()
    }

    /// A live handle to a lockbox this registry created, if the host still
    /// holds one. A dead entry found here is dropped from the directory.
    #[must_use]
    pub fn resolve(&self, lockbox: Address) -> Option<LockboxHandle> {
        let found = {
            let state = self.state.read();
            state.directory.get(&lockbox)?.upgrade()
        };
        if found.is_none() {
            // Dead stays dead: no strong handle can reappear.
            self.state.write().directory.remove(&lockbox);
            debug!(registry = %self.address, lockbox = %lockbox, "Pruned dropped lockbox");
        }
        found
    }

    /// Drop every directory entry whose lockbox is no longer held.
    /// Returns how many were removed. The creator index is untouched.
    pub fn prune_dropped(&self) -> usize {
        let mut state = self.state.write();
        let before = state.directory.len();
        state.directory.retain(|_, weak| weak.is_alive());
        let pruned = before - state.directory.len();
        if pruned > 0 {
            debug!(registry = %self.address, pruned, "Pruned dropped lockboxes");
        }
        pruned
    }

    /// Like [`Self::resolve`], as an error.
    ///
    /// # Errors
    /// Returns `LockboxNotFound` if unknown or no longer held.
    pub fn lockbox(&self, lockbox: Address) -> Result<LockboxHandle> {
        self.resolve(lockbox)
            .ok_or(TranchelockError::LockboxNotFound(lockbox))
    }

    fn derive_address(&self, nonce: u64) -> Address {
        Address::derive(
            constants::LOCKBOX_ADDRESS_DOMAIN,
            &[self.address.as_bytes().as_slice(), nonce.to_le_bytes().as_slice()],
        )
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("address", &self.address)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
