//! # tranchelock-registry
//!
//! **Factory plane**: creates lockboxes, assigns their addresses, and keeps
//! the per-creator index that hosts query to find them.
//!
//! ```text
//! caller → Registry::create(beneficiary, times, amounts)
//!            → validate schedule (nothing consumed on error)
//!            → derive address (registry address + nonce)
//!            → index under caller
//!            → emit CREATED
//!            → LockboxHandle
//! ```

pub mod registry;

pub use registry::Registry;
