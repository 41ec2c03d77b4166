//! The lockbox: one beneficiary's tranche schedule and its settlement logic.
//!
//! Authorization is checked before anything else; a rejected caller never
//! changes state. Inside `withdraw` each unlocked tranche is an independent
//! settlement attempt:
//! 1. Skip if already `Settled` or not yet unlocked
//! 2. Transfer `amount` of the named asset from the lockbox to the beneficiary
//!    (a zero-amount tranche needs a nonzero custodied balance of that asset
//!    when the call starts)
//! 3. On success flip the tranche to `Settled` and emit a settlement record
//! 4. On failure leave it `Locked`, note the reason, continue
//!
//! The flag flip happens only after the ledger reports success, so a
//! failed transfer leaves no partial state behind.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use tranchelock_ledger::AssetLedger;
use tranchelock_types::{
    Address, Amount, Clock, LockboxEvent, Result, Role, SettlementRecord, Timestamp, Tranche,
    TrancheAppendedRecord, TranchePolicy, TranchelockError, format_timestamp,
};

use crate::info::LockboxInfo;
use crate::sink::EventSink;
use crate::withdrawal::{FailedTransfer, Withdrawal};

/// Construction parameters. Unlock times and amounts pair up by index.
#[derive(Debug, Clone, Copy)]
pub struct LockboxParams<'a> {
    pub address: Address,
    pub creator: Address,
    pub beneficiary: Address,
    pub unlock_times: &'a [Timestamp],
    pub amounts: &'a [Amount],
}

impl LockboxParams<'_> {
    /// Check construction input against `policy` without building anything.
    ///
    /// # Errors
    /// `ArityMismatch`, `InvalidBeneficiary`, `TrancheLimitExceeded`, or
    /// `ZeroAmountTranche`, checked in that order.
    pub fn validate(&self, policy: &TranchePolicy) -> Result<()> {
        if self.unlock_times.len() != self.amounts.len() {
            return Err(TranchelockError::ArityMismatch {
                unlock_times: self.unlock_times.len(),
                amounts: self.amounts.len(),
            });
        }
        if self.beneficiary.is_zero() {
            return Err(TranchelockError::InvalidBeneficiary(self.beneficiary));
        }
        policy.check_count(self.amounts.len())?;
        for (index, amount) in self.amounts.iter().enumerate() {
            policy.check_amount(index, *amount)?;
        }
        Ok(())
    }
}

/// Custody account holding an ordered, append-only tranche schedule.
pub struct Lockbox {
    address: Address,
    creator: Address,
    beneficiary: Address,
    created_at: Timestamp,
    tranches: Vec<Tranche>,
    policy: TranchePolicy,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
}

impl Lockbox {
    /// Build a lockbox with every initial tranche `Locked`, in input order.
    ///
    /// Emits nothing; announcing the lockbox is the factory's job.
    ///
    /// # Errors
    /// See [`LockboxParams::validate`].
    pub fn new(
        params: LockboxParams<'_>,
        policy: TranchePolicy,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        params.validate(&policy)?;
        let tranches = params
            .unlock_times
            .iter()
            .zip(params.amounts)
            .map(|(t, a)| Tranche::new(*t, *a))
            .collect();
        Ok(Self {
            address: params.address,
            creator: params.creator,
            beneficiary: params.beneficiary,
            created_at: clock.now(),
            tranches,
            policy,
            clock,
            sink,
        })
    }

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

    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    #[must_use]
    pub fn tranches(&self) -> &[Tranche] {
        &self.tranches
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn info(&self) -> LockboxInfo {
        LockboxInfo {
            address: self.address,
            creator: self.creator,
            beneficiary: self.beneficiary,
            created_at: self.created_at,
            tranches: self.tranches.clone(),
        }
    }

    /// Append one tranche to the end of the schedule. Creator only.
    ///
    /// No reordering: a tranche appended with an earlier unlock time than
    /// existing ones still lands last. Returns the new tranche's index.
    ///
    /// # Errors
    /// `NotAuthorized`, `TrancheLimitExceeded`, or `ZeroAmountTranche`;
    /// the schedule is unchanged on error.
    pub fn append_tranche(
        &mut self,
        caller: Address,
        unlock_time: Timestamp,
        amount: Amount,
    ) -> Result<usize> {
        self.require(caller, Role::Creator)?;

        let index = self.tranches.len();
        self.policy.check_count(index + 1)?;
        self.policy.check_amount(index, amount)?;

        self.tranches.push(Tranche::new(unlock_time, amount));
        debug!(
            lockbox = %self.address,
            index,
            unlock_time = %format_timestamp(unlock_time),
            amount,
            "Tranche appended"
        );
        self.sink
            .emit(LockboxEvent::TrancheAppended(TrancheAppendedRecord {
                lockbox: self.address,
                tranche_index: index,
                unlock_time,
                amount,
            }));
        Ok(index)
    }

    /// Pay out every unlocked, unsettled tranche in `asset`. Beneficiary only.
    ///
    /// Walks the schedule once in index order against a single clock
    /// reading. Transfer failures are contained to their tranche and
    /// reported in [`Withdrawal::failed`]; they never fail the call.
    ///
    /// # Errors
    /// Only `NotAuthorized`. Nothing moves and nothing changes on error.
    pub fn withdraw<L: AssetLedger + ?Sized>(
        &mut self,
        caller: Address,
        asset: Address,
        ledger: &mut L,
    ) -> Result<Withdrawal> {
        self.require(caller, Role::Beneficiary)?;

        let now = self.clock.now();
        // A zero transfer succeeds for any deployed asset, so zero tranches
        // only settle when the lockbox custodies the asset at call start.
        let custodies_asset = ledger.balance_of(asset, self.address) > 0;
        let mut outcome = Withdrawal::new(self.address, asset, now);

        for (index, tranche) in self.tranches.iter_mut().enumerate() {
            if tranche.is_settled() {
                continue;
            }
            if !tranche.is_unlocked_at(now) {
                debug!(
                    lockbox = %self.address,
                    index,
                    unlock_time = %format_timestamp(tranche.unlock_time),
                    "Tranche still locked"
                );
                outcome.still_locked += 1;
                continue;
            }

            let attempt = if tranche.amount == 0 && !custodies_asset {
                Err(TranchelockError::TransferFailed {
                    reason: format!("lockbox holds none of {asset}"),
                })
            } else {
                ledger.transfer(asset, self.address, self.beneficiary, tranche.amount)
            };

            match attempt {
                Ok(()) => {
                    // Locked was checked above, so this cannot fail.
                    tranche.mark_settled(index)?;
                    let record = SettlementRecord {
                        lockbox: self.address,
                        asset,
                        beneficiary: self.beneficiary,
                        amount: tranche.amount,
                        tranche_index: index,
                    };
                    info!(
                        lockbox = %self.address,
                        asset = %asset,
                        beneficiary = %self.beneficiary,
                        index,
                        amount = tranche.amount,
                        "Tranche settled"
                    );
                    self.sink.emit(LockboxEvent::Withdrew(record.clone()));
                    outcome.settled.push(record);
                }
                Err(err) => {
                    if err.is_transfer_failure() {
                        warn!(
                            lockbox = %self.address,
                            asset = %asset,
                            index,
                            amount = tranche.amount,
                            error = %err,
                            "Tranche transfer failed; tranche stays locked"
                        );
                    } else {
                        error!(
                            lockbox = %self.address,
                            asset = %asset,
                            index,
                            amount = tranche.amount,
                            error = %err,
                            "Unexpected ledger error; tranche stays locked"
                        );
                    }
                    outcome.failed.push(FailedTransfer {
                        tranche_index: index,
                        amount: tranche.amount,
                        reason: err.to_string(),
                    });
                }
            }
        }

        debug!(
            lockbox = %self.address,
            asset = %asset,
            now = %format_timestamp(now),
            settled = outcome.settled.len(),
            failed = outcome.failed.len(),
            still_locked = outcome.still_locked,
            total = outcome.total_settled(),
            "Withdraw complete"
        );
        Ok(outcome)
    }

    fn require(&self, caller: Address, role: Role) -> Result<()> {
        let expected = match role {
            Role::Creator => self.creator,
            Role::Beneficiary => self.beneficiary,
        };
        if caller == expected {
            return Ok(());
        }
        warn!(lockbox = %self.address, caller = %caller, role = %role, "Unauthorized call rejected");
        Err(TranchelockError::NotAuthorized { caller, role })
    }
}

impl std::fmt::Debug for Lockbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lockbox")
            .field("address", &self.address)
            .field("creator", &self.creator)
            .field("beneficiary", &self.beneficiary)
            .field("created_at", &self.created_at)
            .field("tranches", &self.tranches)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tranchelock_ledger::InMemoryLedger;
    use tranchelock_types::ManualClock;

    use crate::sink::EventLog;

    struct Fixture {
        lockbox: Lockbox,
        ledger: InMemoryLedger,
        token: Address,
        clock: Arc<ManualClock>,
        log: Arc<EventLog>,
        creator: Address,
        beneficiary: Address,
    }

    fn fixture(unlock_times: &[Timestamp], amounts: &[Amount]) -> Fixture {
        let clock = Arc::new(ManualClock::new(1_000));
        let log = Arc::new(EventLog::new());
        let creator = Address::random();
        let beneficiary = Address::random();
        let lockbox = Lockbox::new(
            LockboxParams {
                address: Address::random(),
                creator,
                beneficiary,
                unlock_times,
                amounts,
            },
            TranchePolicy::default(),
            clock.clone(),
            log.clone(),
        )
        .unwrap();
        let mut ledger = InMemoryLedger::new();
        let token = ledger.deploy_asset("Token", "TKN");
        let total: Amount = amounts.iter().sum();
        ledger.mint(token, lockbox.address(), total).unwrap();
        Fixture {
            lockbox,
            ledger,
            token,
            clock,
            log,
            creator,
            beneficiary,
        }
    }

    #[test]
    fn new_preserves_input_order() {
        let f = fixture(&[300, 100, 200], &[3, 1, 2]);
        let info = f.lockbox.info();
        assert_eq!(info.unlock_times(), vec![300, 100, 200]);
        assert_eq!(info.amounts(), vec![3, 1, 2]);
        assert_eq!(info.settled_flags(), vec![false; 3]);
        assert_eq!(info.created_at, 1_000);
        assert_eq!(info.creator, f.creator);
        assert_eq!(info.beneficiary, f.beneficiary);
    }

    #[test]
    fn new_rejects_arity_mismatch() {
        let err = Lockbox::new(
            LockboxParams {
                address: Address::random(),
                creator: Address::random(),
                beneficiary: Address::random(),
                unlock_times: &[1, 2],
                amounts: &[1],
            },
            TranchePolicy::default(),
            Arc::new(ManualClock::new(0)),
            Arc::new(EventLog::new()),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TranchelockError::ArityMismatch {
                unlock_times: 2,
                amounts: 1
            }
        ));
    }

    #[test]
    fn new_rejects_zero_beneficiary() {
        let err = Lockbox::new(
            LockboxParams {
                address: Address::random(),
                creator: Address::random(),
                beneficiary: Address::ZERO,
                unlock_times: &[],
                amounts: &[],
            },
            TranchePolicy::default(),
            Arc::new(ManualClock::new(0)),
            Arc::new(EventLog::new()),
        )
        .unwrap_err();
        assert!(matches!(err, TranchelockError::InvalidBeneficiary(_)));
    }

    #[test]
    fn empty_schedule_is_allowed() {
        let mut f = fixture(&[], &[]);
        assert!(f.lockbox.info().is_empty());
        let out = f
            .lockbox
            .withdraw(f.beneficiary, f.token, &mut f.ledger)
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn append_by_creator() {
        let mut f = fixture(&[2_000], &[10]);
        let idx = f.lockbox.append_tranche(f.creator, 1_500, 20).unwrap();
        assert_eq!(idx, 1);
        // No sorting by unlock time.
        assert_eq!(f.lockbox.info().unlock_times(), vec![2_000, 1_500]);
        assert_eq!(f.log.len(), 1);
    }

    #[test]
    fn append_by_non_creator_rejected() {
        let mut f = fixture(&[2_000], &[10]);
        let before = f.lockbox.info();
        for caller in [f.beneficiary, Address::random()] {
            let err = f.lockbox.append_tranche(caller, 3_000, 5).unwrap_err();
            assert!(matches!(
                err,
                TranchelockError::NotAuthorized {
                    role: Role::Creator,
                    ..
                }
            ));
        }
        assert_eq!(f.lockbox.info(), before);
        assert!(f.log.is_empty());
    }

    #[test]
    fn append_zero_amount_rejected() {
        let mut f = fixture(&[], &[]);
        let err = f.lockbox.append_tranche(f.creator, 0, 0).unwrap_err();
        assert!(matches!(err, TranchelockError::ZeroAmountTranche { index: 0 }));
        assert!(f.lockbox.info().is_empty());
    }

    #[test]
    fn append_respects_cap() {
        let clock = Arc::new(ManualClock::new(0));
        let creator = Address::random();
        let mut lockbox = Lockbox::new(
            LockboxParams {
                address: Address::random(),
                creator,
                beneficiary: Address::random(),
                unlock_times: &[1],
                amounts: &[1],
            },
            TranchePolicy {
                max_tranches_per_lockbox: 2,
                ..TranchePolicy::default()
            },
            clock,
            Arc::new(EventLog::new()),
        )
        .unwrap();
        lockbox.append_tranche(creator, 2, 1).unwrap();
        let err = lockbox.append_tranche(creator, 3, 1).unwrap_err();
        assert!(matches!(err, TranchelockError::TrancheLimitExceeded { .. }));
        assert_eq!(lockbox.tranches().len(), 2);
    }

    #[test]
    fn withdraw_by_non_beneficiary_rejected() {
        let mut f = fixture(&[500], &[10]);
        let err = f
            .lockbox
            .withdraw(f.creator, f.token, &mut f.ledger)
            .unwrap_err();
        assert!(matches!(
            err,
            TranchelockError::NotAuthorized {
                role: Role::Beneficiary,
                ..
            }
        ));
        assert_eq!(f.ledger.balance_of(f.token, f.lockbox.address()), 10);
        assert!(!f.lockbox.tranches()[0].is_settled());
    }

    #[test]
    fn withdraw_before_unlock_pays_nothing() {
        let mut f = fixture(&[5_000, 6_000], &[10, 20]);
        let out = f
            .lockbox
            .withdraw(f.beneficiary, f.token, &mut f.ledger)
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(out.still_locked, 2);
        assert_eq!(f.ledger.balance_of(f.token, f.beneficiary), 0);
        assert!(f.log.is_empty());
    }

    #[test]
    fn withdraw_unlocks_at_exact_boundary() {
        let mut f = fixture(&[5_000], &[10]);
        f.clock.set(4_999);
        assert!(
            f.lockbox
                .withdraw(f.beneficiary, f.token, &mut f.ledger)
                .unwrap()
                .is_empty()
        );
        f.clock.set(5_000);
        let out = f
            .lockbox
            .withdraw(f.beneficiary, f.token, &mut f.ledger)
            .unwrap();
        assert_eq!(out.settled_indices(), vec![0]);
        assert_eq!(f.ledger.balance_of(f.token, f.beneficiary), 10);
    }

    #[test]
    fn withdraw_settles_each_tranche_once() {
        let mut f = fixture(&[1_000, 1_000], &[10, 20]);
        let first = f
            .lockbox
            .withdraw(f.beneficiary, f.token, &mut f.ledger)
            .unwrap();
        assert_eq!(first.total_settled(), 30);
        f.clock.advance(1_000_000);
        let second = f
            .lockbox
            .withdraw(f.beneficiary, f.token, &mut f.ledger)
            .unwrap();
        assert!(second.is_empty());
        assert_eq!(f.ledger.balance_of(f.token, f.beneficiary), 30);
        assert_eq!(f.log.settlements().len(), 2);
    }

    #[test]
    fn withdraw_wrong_asset_is_noop() {
        let mut f = fixture(&[0, 500], &[10, 20]);
        let other = f.ledger.deploy_asset("Another Token", "AT20");
        let out = f
            .lockbox
            .withdraw(f.beneficiary, other, &mut f.ledger)
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(out.failed.len(), 2);
        assert_eq!(f.lockbox.info().settled_flags(), vec![false, false]);
        assert!(f.log.is_empty());
        assert_eq!(f.ledger.balance_of(f.token, f.lockbox.address()), 30);
    }

    #[test]
    fn withdraw_partial_funding_settles_what_fits() {
        let clock = Arc::new(ManualClock::new(10));
        let beneficiary = Address::random();
        let mut lockbox = Lockbox::new(
            LockboxParams {
                address: Address::random(),
                creator: Address::random(),
                beneficiary,
                unlock_times: &[1, 2, 3],
                amounts: &[50, 80, 30],
            },
            TranchePolicy::default(),
            clock,
            Arc::new(EventLog::new()),
        )
        .unwrap();
        let mut ledger = InMemoryLedger::new();
        let token = ledger.deploy_asset("Token", "TKN");
        ledger.mint(token, lockbox.address(), 100).unwrap();

        // 50 fits, 80 does not, 30 still fits after skipping.
        let out = lockbox.withdraw(beneficiary, token, &mut ledger).unwrap();
        assert_eq!(out.settled_indices(), vec![0, 2]);
        assert_eq!(out.failed.len(), 1);
        assert_eq!(out.failed[0].tranche_index, 1);
        assert_eq!(ledger.balance_of(token, beneficiary), 80);
        assert_eq!(ledger.balance_of(token, lockbox.address()), 20);

        // Top up and retry: the skipped tranche settles.
        ledger.mint(token, lockbox.address(), 60).unwrap();
        let retry = lockbox.withdraw(beneficiary, token, &mut ledger).unwrap();
        assert_eq!(retry.settled_indices(), vec![1]);
        assert_eq!(lockbox.info().settled_flags(), vec![true, true, true]);
    }

    #[test]
    fn append_after_settlement_keeps_existing_state() {
        let mut f = fixture(&[1_000], &[10]);
        f.lockbox
            .withdraw(f.beneficiary, f.token, &mut f.ledger)
            .unwrap();
        f.lockbox.append_tranche(f.creator, 900, 5).unwrap();
        let info = f.lockbox.info();
        assert_eq!(info.settled_flags(), vec![true, false]);
        assert_eq!(info.unlock_times(), vec![1_000, 900]);
        assert_eq!(info.amounts(), vec![10, 5]);
    }

    fn zero_friendly(unlock_times: &[Timestamp], amounts: &[Amount]) -> (Lockbox, Arc<EventLog>) {
        let log = Arc::new(EventLog::new());
        let policy = TranchePolicy {
            allow_zero_amount: true,
            ..TranchePolicy::default()
        };
        let lockbox = Lockbox::new(
            LockboxParams {
                address: Address::random(),
                creator: Address::random(),
                beneficiary: Address::random(),
                unlock_times,
                amounts,
            },
            policy,
            Arc::new(ManualClock::new(100)),
            log.clone(),
        )
        .unwrap();
        (lockbox, log)
    }

    #[test]
    fn zero_tranche_ignores_unheld_asset() {
        let (mut lockbox, log) = zero_friendly(&[0], &[0]);
        let beneficiary = lockbox.beneficiary();
        let mut ledger = InMemoryLedger::new();
        let other = ledger.deploy_asset("Another Token", "AT20");

        let out = lockbox.withdraw(beneficiary, other, &mut ledger).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.failed.len(), 1);
        assert_eq!(out.failed[0].tranche_index, 0);
        assert_eq!(lockbox.info().settled_flags(), vec![false]);
        assert!(log.is_empty());
    }

    #[test]
    fn zero_tranche_settles_against_custodied_asset() {
        let (mut lockbox, log) = zero_friendly(&[0, 50], &[0, 5]);
        let beneficiary = lockbox.beneficiary();
        let mut ledger = InMemoryLedger::new();
        let token = ledger.deploy_asset("Token", "TKN");
        let other = ledger.deploy_asset("Another Token", "AT20");
        ledger.mint(token, lockbox.address(), 5).unwrap();

        assert!(lockbox.withdraw(beneficiary, other, &mut ledger).unwrap().is_empty());
        let out = lockbox.withdraw(beneficiary, token, &mut ledger).unwrap();
        assert_eq!(out.settled_indices(), vec![0, 1]);
        assert_eq!(out.total_settled(), 5);
        assert_eq!(log.settlements().len(), 2);
    }

    /// Ledger that fails every transfer with a non-ledger error.
    struct BrokenLedger;

    impl AssetLedger for BrokenLedger {
        fn balance_of(&self, _asset: Address, _owner: Address) -> Amount {
            u128::MAX
        }

        fn transfer(
            &mut self,
            _asset: Address,
            _from: Address,
            _to: Address,
            _amount: Amount,
        ) -> Result<()> {
            Err(TranchelockError::Configuration("ledger offline".into()))
        }
    }

    #[test]
    fn unexpected_ledger_error_is_contained() {
        let mut f = fixture(&[0, 10], &[1, 2]);
        let out = f
            .lockbox
            .withdraw(f.beneficiary, f.token, &mut BrokenLedger)
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(out.failed.len(), 2);
        assert!(out.failed[0].reason.contains("ledger offline"));
        assert_eq!(f.lockbox.info().settled_flags(), vec![false, false]);

        // The real ledger still settles both afterwards.
        let out = f
            .lockbox
            .withdraw(f.beneficiary, f.token, &mut f.ledger)
            .unwrap();
        assert_eq!(out.settled_indices(), vec![0, 1]);
    }
}
