//! Supply conservation invariant checker.
//!
//! Invariant enforced by the in-memory ledger:
//! ```text
//! ∀ asset: Σ(balances) == Σ(minted)
//! ```
//!
//! Transfers only move value between holders, so any drift between the two
//! sides means value was created or destroyed.

use std::collections::HashMap;

use tranchelock_types::{Address, Amount, Result, TranchelockError};

/// Tracks per-asset issuance and validates it against observed balances.
#[derive(Debug, Default)]
pub struct SupplyConservation {
    /// Total minted per asset since deployment.
    minted: HashMap<Address, Amount>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self {
            minted: HashMap::new(),
        }
    }

    /// Record an issuance.
    ///
    /// # Errors
    /// Returns `BalanceOverflow` if total issuance would exceed `u128::MAX`.
    pub fn record_mint(&mut self, asset: Address, amount: Amount) -> Result<()> {
        let total = self.minted.entry(asset).or_insert(0);
        *total = total
            .checked_add(amount)
            .ok_or(TranchelockError::BalanceOverflow)?;
        Ok(())
    }

    /// Expected total supply for an asset.
    #[must_use]
    pub fn expected_supply(&self, asset: Address) -> Amount {
        self.minted.get(&asset).copied().unwrap_or(0)
    }

    /// Verify that observed supply matches issuance.
    ///
    /// # Errors
    /// Returns [`TranchelockError::SupplyInvariantViolation`] if they differ.
    pub fn verify(&self, asset: Address, actual_supply: Amount) -> Result<()> {
        let expected = self.expected_supply(asset);
        if actual_supply != expected {
            return Err(TranchelockError::SupplyInvariantViolation {
                reason: format!("Asset {asset}: actual supply {actual_supply} != minted {expected}"),
            });
        }
        Ok(())
    }

    /// All assets with recorded issuance.
    #[must_use]
    pub fn tracked_assets(&self) -> Vec<Address> {
        let mut assets: Vec<Address> = self.minted.keys().copied().collect();
        assets.sort_unstable();
        assets
    }
}
