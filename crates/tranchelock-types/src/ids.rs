//! Account and contract addresses used throughout Tranchelock.
//!
//! Every participant (creator, beneficiary, lockbox, asset contract, the
//! registry itself) is identified by a 20-byte [`Address`]. Lockbox and
//! asset addresses are derived deterministically with SHA-256 so every
//! replica of the registry assigns the same address to the same creation.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Token amount in the asset's smallest unit.
pub type Amount = u128;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account or contract address.
///
/// The all-zero address is reserved and never names a valid beneficiary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The reserved zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    #[must_use]
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Deterministic address from a domain separator and a sequence of parts.
    ///
    /// `SHA-256(domain || part_0 || part_1 || ...)`, keeping the last 20 bytes.
    #[must_use]
    pub fn derive(domain: &[u8], parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        for part in parts {
            hasher.update(part);
        }
        let hash = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[12..]);
        Self(bytes)
    }

    /// Parse a `0x`-prefixed (or bare) 40-character hex string.
    ///
    /// # Errors
    /// Returns [`crate::TranchelockError::InvalidAddress`] on bad length or
    /// non-hex characters.
    pub fn parse_hex(s: &str) -> crate::Result<Self> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let decoded = hex::decode(raw).map_err(|e| crate::TranchelockError::InvalidAddress {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        let bytes: [u8; 20] =
            decoded
                .try_into()
                .map_err(|v: Vec<u8>| crate::TranchelockError::InvalidAddress {
                    input: s.to_string(),
                    reason: format!("expected 20 bytes, got {}", v.len()),
                })?;
        Ok(Self(bytes))
    }
}

/// Random address for unit tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Address {
    #[must_use]
    pub fn random() -> Self {
        Self(rand::random::<[u8; 20]>())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl std::str::FromStr for Address {
    type Err = crate::TranchelockError;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse_hex(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
