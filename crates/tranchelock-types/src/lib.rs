//! # tranchelock-types
//!
//! Shared types, errors, and configuration for the **Tranchelock** custody
//! engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`Timestamp`], [`Amount`]
//! - **Schedule model**: [`Tranche`], [`TrancheState`]
//! - **Records**: [`LockboxEvent`], [`CreationRecord`], [`SettlementRecord`], [`TrancheAppendedRecord`]
//! - **Time**: [`Clock`], [`SystemClock`], [`ManualClock`]
//! - **Configuration**: [`TranchelockConfig`], [`TranchePolicy`]
//! - **Errors**: [`TranchelockError`] with `TL_ERR_` prefix codes
//! - **Constants**: domain separators and defaults

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod tranche;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use tranche::*;

// Constants are accessed via `tranchelock_types::constants::FOO`.
