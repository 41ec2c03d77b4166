//! The asset ledger collaborator interface.
//!
//! The lockbox depends on exactly one capability of the ledger: moving an
//! amount of one asset from its own address to the beneficiary, with a
//! success or failure signal. It never inspects *why* a transfer failed.

use tranchelock_types::{Address, Amount, Result};

/// Fungible-asset ledger covering any number of asset contracts.
///
/// Implementations must make `transfer` all-or-nothing: on `Err` no
/// balance may have changed.
pub trait AssetLedger {
    /// Balance of `owner` in `asset`. Unknown assets and owners read as zero.
    fn balance_of(&self, asset: Address, owner: Address) -> Amount;

    /// Move `amount` of `asset` from `from` to `to`.
    ///
    /// # Errors
    /// Any error means nothing moved. Callers inside the custody core treat
    /// every variant the same way.
    fn transfer(&mut self, asset: Address, from: Address, to: Address, amount: Amount)
    -> Result<()>;
}

impl<L: AssetLedger + ?Sized> AssetLedger for &mut L {
    fn balance_of(&self, asset: Address, owner: Address) -> Amount {
        (**self).balance_of(asset, owner)
    }

    fn transfer(
        &mut self,
        asset: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        (**self).transfer(asset, from, to, amount)
    }
}
