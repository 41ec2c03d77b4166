//! In-memory fungible asset ledger.
//!
//! Hosts any number of asset contracts, each with its own balance table.
//! Used as the ledger collaborator in tests and local setups. Every
//! mutation is atomic: either the whole operation succeeds or no balance
//! changes.

use std::collections::{HashMap, HashSet};

use tracing::debug;
use tranchelock_types::{Address, Amount, Result, TranchelockError, constants};

use crate::ledger::AssetLedger;
use crate::supply_conservation::SupplyConservation;

/// Metadata of a deployed asset contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
    pub address: Address,
    pub name: String,
    pub symbol: String,
}

/// Per-(asset, owner) balance table with issuance tracking.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    /// Deployed asset contracts by address.
    assets: HashMap<Address, AssetInfo>,
    /// Per-(asset, owner) balances.
    balances: HashMap<(Address, Address), Amount>,
    /// Assets whose transfers are currently rejected.
    halted: HashSet<Address>,
    /// Issuance tracker.
    supply: SupplyConservation,
    /// Deployment counter, mixed into derived asset addresses.
    deployments: u64,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy a new asset contract and return its address.
    pub fn deploy_asset(&mut self, name: &str, symbol: &str) -> Address {
        let address = Address::derive(
            constants::ASSET_ADDRESS_DOMAIN,
            &[symbol.as_bytes(), self.deployments.to_le_bytes().as_slice()],
        );
        self.deployments += 1;
        self.assets.insert(
            address,
            AssetInfo {
                address,
                name: name.to_string(),
                symbol: symbol.to_string(),
            },
        );
        debug!(asset = %address, name, symbol, "Asset deployed");
        address
    }

    /// Issue new units of `asset` to `to`.
    ///
    /// # Errors
    /// `UnknownAsset` if `asset` was never deployed, `BalanceOverflow` if
    /// the balance or total issuance would overflow.
    pub fn mint(&mut self, asset: Address, to: Address, amount: Amount) -> Result<()> {
        self.ensure_asset(asset)?;
        let current = self.balance_of(asset, to);
        let next = current
            .checked_add(amount)
            .ok_or(TranchelockError::BalanceOverflow)?;
        self.supply.record_mint(asset, amount)?;
        self.balances.insert((asset, to), next);
        debug!(asset = %asset, to = %to, amount, "Minted");
        Ok(())
    }

    /// Reject (`true`) or accept (`false`) all transfers of `asset`.
    pub fn set_transfers_halted(&mut self, asset: Address, halted: bool) {
        if halted {
            self.halted.insert(asset);
        } else {
            self.halted.remove(&asset);
        }
    }

    #[must_use]
    pub fn asset_info(&self, asset: Address) -> Option<&AssetInfo> {
        self.assets.get(&asset)
    }

    /// Sum of all holders' balances of `asset`.
    #[must_use]
    pub fn total_supply(&self, asset: Address) -> Amount {
        self.balances
            .iter()
            .filter(|((a, _), _)| *a == asset)
            .fold(0, |acc, (_, bal)| acc.saturating_add(*bal))
    }

    /// Verify supply conservation for `asset`.
    ///
    /// # Errors
    /// Returns `SupplyInvariantViolation` if balances don't add up to issuance.
    pub fn verify_supply(&self, asset: Address) -> Result<()> {
        self.supply.verify(asset, self.total_supply(asset))
    }

    /// Verify supply conservation for every asset ever minted.
    ///
    /// # Errors
    /// The first violation found.
    pub fn verify_all_supply(&self) -> Result<()> {
        self.supply
            .tracked_assets()
            .into_iter()
            .try_for_each(|asset| self.verify_supply(asset))
    }

    fn ensure_asset(&self, asset: Address) -> Result<()> {
        if self.assets.contains_key(&asset) {
            Ok(())
        } else {
            Err(TranchelockError::UnknownAsset(asset))
        }
    }
}

impl AssetLedger for InMemoryLedger {
    fn balance_of(&self, asset: Address, owner: Address) -> Amount {
        self.balances.get(&(asset, owner)).copied().unwrap_or(0)
    }

    fn transfer(
        &mut self,
        asset: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        self.ensure_asset(asset)?;
        if self.halted.contains(&asset) {
            return Err(TranchelockError::TransferFailed {
                reason: format!("transfers of {asset} are halted"),
            });
        }

        let from_balance = self.balance_of(asset, from);
        if from_balance < amount {
            return Err(TranchelockError::InsufficientBalance {
                needed: amount,
                available: from_balance,
            });
        }
        if from == to {
            return Ok(());
        }
        let to_balance = self
            .balance_of(asset, to)
            .checked_add(amount)
            .ok_or(TranchelockError::BalanceOverflow)?;

        // All checks passed; apply both sides.
        self.balances.insert((asset, from), from_balance - amount);
        self.balances.insert((asset, to), to_balance);
        Ok(())
    }
}
