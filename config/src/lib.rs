//! Serde/TOML-loadable configuration for `pack` and `tower`.
//!
//! Mirrors the way `ckb-app-config`/`ckb-chain-spec` expose `serde`-derived,
//! `Default`-backed configuration structs that are loaded from a TOML file
//! and then validated once at startup, rather than re-checked on every call.
use vld_error::prelude::*;

/// Errors raised while validating a loaded configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("pack_depth must be >= 4, got {0}")]
    PackDepthTooSmall(u64),
    #[error("bank_tile_cnt must be in [1, {max}], got {got}", max = PackLimits::MAX_BANK_TILE_CNT)]
    BankTileCntOutOfRange(u64),
    #[error("max_txn_per_microblock must be <= 2^24, got {0}")]
    MaxTxnPerMicroblockOutOfRange(u64),
    #[error("max_microblocks_per_block must be < 10^12, got {0}")]
    MaxMicroblocksPerBlockOutOfRange(u64),
    #[error("max_vote_cost_per_block ({vote}) must be <= max_cost_per_block ({block})")]
    VoteCostExceedsBlockCost { vote: u64, block: u64 },
    #[error("max_write_cost_per_acct ({acct}) must be <= max_cost_per_block ({block})")]
    WriteCostExceedsBlockCost { acct: u64, block: u64 },
}

/// Resource limits enforced by `pack`.
///
/// `max_cost_per_block`, `max_vote_cost_per_block`, `max_write_cost_per_acct`,
/// and `fee_per_signature` are consensus-critical: every validator on the
/// cluster must agree on these values, and [`Default`] reproduces the
/// network's current values rather than leaving them to guesswork.
/// `max_data_bytes_per_block`, `max_txn_per_microblock`,
/// `max_microblocks_per_block`, `pack_depth`, and `bank_tile_cnt` are
/// operational limits a validator operator may tune (subject to the ranges
/// enforced by [`PackLimits::validate`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PackLimits {
    pub max_cost_per_block: u64,
    pub max_vote_cost_per_block: u64,
    pub max_write_cost_per_acct: u64,
    pub fee_per_signature: u64,
    pub max_data_bytes_per_block: u64,
    pub max_txn_per_microblock: u64,
    pub max_microblocks_per_block: u64,
    pub pack_depth: u64,
    pub bank_tile_cnt: u64,
}

impl PackLimits {
    /// `floor((32*1024 - 17) / 31) * 25871 + 48`, see spec for derivation.
    pub const MAX_DATA_BYTES_PER_BLOCK: u64 = ((32 * 1024 - 17) / 31) * 25871 + 48;
    pub const MAX_TXN_PER_MICROBLOCK: u64 = 1 << 24;
    pub const MAX_MICROBLOCKS_PER_BLOCK: u64 = 1_000_000_000_000;
    pub const MIN_PACK_DEPTH: u64 = 4;
    pub const MAX_BANK_TILE_CNT: u64 = 62;

    /// Checks every field is within the range the spec allows. Should be
    /// called once, at construction time, by any binary that loads these
    /// limits from an operator-controlled config file; library code that
    /// constructs `PackLimits` programmatically (e.g. in tests) may skip
    /// this if it already knows the values are in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pack_depth < Self::MIN_PACK_DEPTH {
            return Err(ConfigError::PackDepthTooSmall(self.pack_depth));
        }
        if self.bank_tile_cnt == 0 || self.bank_tile_cnt > Self::MAX_BANK_TILE_CNT {
            return Err(ConfigError::BankTileCntOutOfRange(self.bank_tile_cnt));
        }
        if self.max_txn_per_microblock > Self::MAX_TXN_PER_MICROBLOCK {
            return Err(ConfigError::MaxTxnPerMicroblockOutOfRange(
                self.max_txn_per_microblock,
            ));
        }
        if self.max_microblocks_per_block >= Self::MAX_MICROBLOCKS_PER_BLOCK {
            return Err(ConfigError::MaxMicroblocksPerBlockOutOfRange(
                self.max_microblocks_per_block,
            ));
        }
        if self.max_vote_cost_per_block > self.max_cost_per_block {
            return Err(ConfigError::VoteCostExceedsBlockCost {
                vote: self.max_vote_cost_per_block,
                block: self.max_cost_per_block,
            });
        }
        if self.max_write_cost_per_acct > self.max_cost_per_block {
            return Err(ConfigError::WriteCostExceedsBlockCost {
                acct: self.max_write_cost_per_acct,
                block: self.max_cost_per_block,
            });
        }
        Ok(())
    }

    /// Parses and validates a `PackLimits` from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, LoadError> {
        let limits: Self = toml::from_str(s)?;
        limits.validate()?;
        Ok(limits)
    }
}

impl Default for PackLimits {
    fn default() -> Self {
        Self {
            max_cost_per_block: 48_000_000,
            max_vote_cost_per_block: 36_000_000,
            max_write_cost_per_acct: 12_000_000,
            fee_per_signature: 5_000,
            max_data_bytes_per_block: Self::MAX_DATA_BYTES_PER_BLOCK,
            max_txn_per_microblock: 8192,
            max_microblocks_per_block: 512,
            pack_depth: 1 << 14,
            bank_tile_cnt: 4,
        }
    }
}

/// Errors while loading a [`PackLimits`] from TOML.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Tower's fixed consensus constants (never operator-tunable, hence plain
/// `const`s rather than a config struct field).
pub mod tower {
    pub const THRESHOLD_DEPTH: usize = 8;
    pub const THRESHOLD_PCT: f64 = 2.0 / 3.0;
    /// Named in the original implementation's source alongside
    /// `THRESHOLD_DEPTH`/`THRESHOLD_PCT` but never read by
    /// `fd_tower_threshold_check`, which returns early below
    /// `THRESHOLD_DEPTH` rather than falling back to a shallower variant;
    /// kept here for the same reason, not wired into any check.
    pub const SHALLOW_THRESHOLD_DEPTH: usize = 4;
    pub const SHALLOW_THRESHOLD_PCT: f64 = 0.38;
    pub const SWITCH_PCT: f64 = 0.38;
    /// Maximum depth of the vote stack; the oldest vote is rooted out once
    /// a vote would grow the stack past this.
    pub const MAX_LOCKOUT_HISTORY: usize = 31;
}

/// Tower's operator-tunable knobs (currently none are spec'd beyond the
/// fixed constants above, but the struct exists so a future operational
/// knob, e.g. a cluster-tower read timeout, has somewhere to live without
/// another crate-wide plumbing change).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TowerConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_match_consensus_constants() {
        let limits = PackLimits::default();
        assert_eq!(limits.max_cost_per_block, 48_000_000);
        assert_eq!(limits.max_vote_cost_per_block, 36_000_000);
        assert_eq!(limits.max_write_cost_per_acct, 12_000_000);
        assert_eq!(limits.fee_per_signature, 5_000);
        assert_eq!(limits.max_data_bytes_per_block, 27_319_824);
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn rejects_too_small_pack_depth() {
        let mut limits = PackLimits::default();
        limits.pack_depth = 3;
        assert_eq!(
            limits.validate(),
            Err(ConfigError::PackDepthTooSmall(3))
        );
    }

    #[test]
    fn rejects_out_of_range_bank_tile_cnt() {
        let mut limits = PackLimits::default();
        limits.bank_tile_cnt = 63;
        assert!(limits.validate().is_err());
        limits.bank_tile_cnt = 0;
        assert!(limits.validate().is_err());
    }

    #[test]
    fn round_trips_through_toml() {
        let limits = PackLimits::default();
        let s = toml::to_string(&limits).unwrap();
        let parsed = PackLimits::from_toml_str(&s).unwrap();
        assert_eq!(parsed, limits);
    }
}
