//! Configuration types for a Tranchelock registry and its lockboxes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Amount, Result, TranchelockError, constants};

/// Top-level configuration, usually loaded from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranchelockConfig {
    /// Rules every tranche must satisfy at create and append time.
    #[serde(default)]
    pub policy: TranchePolicy,
}

impl TranchelockConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    /// `Serialization` on malformed JSON, `Configuration` on bad values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    ///
    /// # Errors
    /// `Io` if the file cannot be read, otherwise as [`Self::from_json_str`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// # Errors
    /// Returns `Configuration` if any value is out of range.
    pub fn validate(&self) -> Result<()> {
        self.policy.validate()
    }
}

/// Tranche admission rules.
///
/// Past or zero unlock times are always accepted; such tranches are
/// immediately eligible for settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranchePolicy {
    /// Accept tranches whose amount is zero.
    pub allow_zero_amount: bool,
    /// Maximum number of tranches a single lockbox may hold.
    pub max_tranches_per_lockbox: usize,
}

impl Default for TranchePolicy {
    fn default() -> Self {
        Self {
            allow_zero_amount: constants::DEFAULT_ALLOW_ZERO_AMOUNT,
            max_tranches_per_lockbox: constants::DEFAULT_MAX_TRANCHES_PER_LOCKBOX,
        }
    }
}

impl TranchePolicy {
    /// # Errors
    /// Returns `Configuration` if `max_tranches_per_lockbox` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_tranches_per_lockbox == 0 {
            return Err(TranchelockError::Configuration(
                "max_tranches_per_lockbox must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Check a single tranche amount.
    ///
    /// # Errors
    /// Returns `ZeroAmountTranche` if `amount` is zero and the policy
    /// forbids it.
    pub fn check_amount(&self, index: usize, amount: Amount) -> Result<()> {
        if amount == 0 && !self.allow_zero_amount {
            return Err(TranchelockError::ZeroAmountTranche { index });
        }
        Ok(())
    }

    /// Check that a lockbox may hold `count` tranches.
    ///
    /// # Errors
    /// Returns `TrancheLimitExceeded` if `count` is over the cap.
    pub fn check_count(&self, count: usize) -> Result<()> {
        if count > self.max_tranches_per_lockbox {
            return Err(TranchelockError::TrancheLimitExceeded {
                requested: count,
                limit: self.max_tranches_per_lockbox,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_defaults() {
        let policy = TranchePolicy::default();
        assert!(!policy.allow_zero_amount);
        assert_eq!(policy.max_tranches_per_lockbox, 1024);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn zero_amount_rejected_by_default() {
        let policy = TranchePolicy::default();
        let err = policy.check_amount(7, 0).unwrap_err();
        assert!(matches!(err, TranchelockError::ZeroAmountTranche { index: 7 }));
        assert!(policy.check_amount(0, 1).is_ok());
    }

    #[test]
    fn zero_amount_allowed_when_configured() {
        let policy = TranchePolicy {
            allow_zero_amount: true,
            ..TranchePolicy::default()
        };
        assert!(policy.check_amount(0, 0).is_ok());
    }

    #[test]
    fn count_cap_enforced() {
        let policy = TranchePolicy {
            max_tranches_per_lockbox: 2,
            ..TranchePolicy::default()
        };
        assert!(policy.check_count(2).is_ok());
        let err = policy.check_count(3).unwrap_err();
        assert!(matches!(
            err,
            TranchelockError::TrancheLimitExceeded {
                requested: 3,
                limit: 2
            }
        ));
    }

    #[test]
    fn from_json_partial_uses_defaults() {
        let cfg = TranchelockConfig::from_json_str(r#"{"policy":{"allow_zero_amount":true}}"#)
            .unwrap();
        assert!(cfg.policy.allow_zero_amount);
        assert_eq!(
            cfg.policy.max_tranches_per_lockbox,
            constants::DEFAULT_MAX_TRANCHES_PER_LOCKBOX
        );

        let empty = TranchelockConfig::from_json_str("{}").unwrap();
        assert_eq!(empty, TranchelockConfig::default());
    }

    #[test]
    fn from_json_rejects_zero_cap() {
        let err = TranchelockConfig::from_json_str(r#"{"policy":{"max_tranches_per_lockbox":0}}"#)
            .unwrap_err();
        assert!(matches!(err, TranchelockError::Configuration(_)));
    }

    #[test]
    fn from_json_rejects_garbage() {
        let err = TranchelockConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, TranchelockError::Serialization(_)));
    }

    #[test]
    fn from_json_file_missing_is_io() {
        let err = TranchelockConfig::from_json_file("/nonexistent/tranchelock.json").unwrap_err();
        assert!(matches!(err, TranchelockError::Io(_)));
    }

    #[test]
    fn from_json_file_reads_config() {
        let path = std::env::temp_dir().join(format!(
            "tranchelock-config-{}.json",
            rand::random::<u64>()
        ));
        std::fs::write(&path, r#"{"policy":{"max_tranches_per_lockbox":16}}"#).unwrap();
        let cfg = TranchelockConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(cfg.policy.max_tranches_per_lockbox, 16);
    }
}
