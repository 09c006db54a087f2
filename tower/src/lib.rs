//! Tower-BFT lockout and fork-choice state machine.
//!
//! [`Tower`] holds a validator's vote stack and the exponential lockouts
//! each entry imposes on competing forks. It exposes the three safety
//! checks a candidate vote must pass (`lockout_check`, `switch_check`,
//! `threshold_check`), the fork-selection functions that decide what to
//! vote for and what to reset local state to, and the wire-level
//! `TowerSync` encoding used to publish and recover tower state.
//!
//! Collaborating subsystems — the fork graph, stake-weighted fork choice,
//! the accounts database, and the block store — are reached through the
//! narrow traits in [`traits`] rather than through direct references, so
//! this crate owns no knowledge of how any of them are actually stored.
//!
//! Grounded on the original implementation's `fd_tower.c`; module layout
//! follows the way `ckb`'s consensus-adjacent crates split a single
//! subsystem into one file per concern (state, checks, selection, wire
//! sync) rather than one large module.
pub mod checks;
pub mod select;
pub mod sync;
pub mod traits;
pub mod types;
pub mod vote;

pub use sync::{cluster_query, LockoutOffset, TowerSync};
pub use traits::{AccountsView, BlockstoreView, ForkStore, GhostView, GhostWriter, ValidatorVotes};
pub use types::{Lockout, Slot, ValidatorId};
pub use vote::Tower;
