//! # tranchelock-ledger
//!
//! The **asset ledger collaborator** seen from the custody core.
//!
//! - [`AssetLedger`]: the transfer/balance interface a lockbox settles against
//! - [`InMemoryLedger`]: a multi-asset fungible ledger for tests and local hosts
//! - [`SupplyConservation`]: issuance tracking, `Σ balances == Σ minted`
//!
//! The core never mints; issuance exists only for setup collaborators.

pub mod ledger;
pub mod memory;
pub mod supply_conservation;

pub use ledger::AssetLedger;
pub use memory::{AssetInfo, InMemoryLedger};
pub use supply_conservation::SupplyConservation;
