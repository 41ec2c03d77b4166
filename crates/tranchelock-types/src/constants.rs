//! System-wide constants for the Tranchelock custody engine.

/// Domain separator for lockbox address derivation.
pub const LOCKBOX_ADDRESS_DOMAIN: &[u8] = b"tranchelock:lockbox:v1:";

/// Domain separator for asset contract address derivation.
pub const ASSET_ADDRESS_DOMAIN: &[u8] = b"tranchelock:asset:v1:";

/// Default cap on tranches per lockbox. Bounds the withdraw loop.
pub const DEFAULT_MAX_TRANCHES_PER_LOCKBOX: usize = 1024;

/// Zero-amount tranches are rejected unless configured otherwise.
pub const DEFAULT_ALLOW_ZERO_AMOUNT: bool = false;

/// Seconds in one day.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Tranchelock";
