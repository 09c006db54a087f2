//! Narrow, synchronous collaborator traits standing in for the raw
//! cross-module pointers the original implementation's tower code reaches
//! through (into the fork graph, the accounts database, the block store,
//! and its own stake-weighted fork-choice state). Each is deliberately
//! small: `Tower` only ever needs a handful of read-only queries out of
//! any one of these subsystems.
use smallvec::SmallVec;

use crate::types::{Lockout, Slot, ValidatorId};

/// The ancestor/descendant relationships between ledger slots.
pub trait ForkStore {
    fn parent(&self, slot: Slot) -> Option<Slot>;

    fn children(&self, slot: Slot) -> SmallVec<[Slot; 4]>;

    /// Whether `descendant` is `ancestor` or a descendant of it. The
    /// default implementation walks `parent()`, which is correct but
    /// O(depth); implementations that keep a slot-to-ancestor index
    /// should override it.
    fn is_ancestor(&self, ancestor: Slot, descendant: Slot) -> bool {
        let mut cur = descendant;
        loop {
            if cur == ancestor {
                return true;
            }
            match self.parent(cur) {
                Some(p) if p < cur => cur = p,
                _ => return false,
            }
        }
    }
}

/// Stake-weighted fork-choice state: which fork the cluster's observed
/// votes currently favor.
pub trait GhostView {
    /// Total stake-weight voting for `slot` or any of its descendants.
    fn fork_weight(&self, slot: Slot) -> u64;

    /// The tip of the heaviest observed fork in the whole tree.
    fn heaviest_leaf(&self) -> Slot;

    /// The tip of the heaviest observed fork that descends from `ancestor`.
    fn heaviest_fork_from(&self, ancestor: Slot) -> Slot;

    /// The slot below which lockouts have already been finalized. Ancestry
    /// checks against a vote at or below this slot are assumed satisfied
    /// without walking the fork tree.
    fn root(&self) -> Slot;
}

/// Write access to the ghost fork-weight tree, used by
/// [`crate::vote::Tower::fork_update`] to register a newly-replayed fork
/// head and credit landed votes to it.
pub trait GhostWriter: GhostView {
    /// Registers `slot` as a child of `parent` in the fork-weight tree.
    fn insert_fork(&mut self, slot: Slot, parent: Slot);

    /// Credits `stake` to `slot` on behalf of `voter`, replacing any
    /// credit that same voter previously contributed elsewhere in the
    /// tree (a voter only ever backs its single most recently landed
    /// vote).
    fn upsert_vote(&mut self, slot: Slot, voter: ValidatorId, stake: u64);
}

/// A validator's stake and currently-published vote stack, as read from
/// the accounts database.
pub struct ValidatorVotes {
    pub validator: ValidatorId,
    pub stake: u64,
    pub votes: Vec<Lockout>,
}

/// Read access to validator stake and published vote state.
pub trait AccountsView {
    fn total_stake(&self) -> u64;

    fn stake(&self, validator: &ValidatorId) -> u64;

    /// Every validator's stake and currently-published vote stack, for
    /// threshold-check stake aggregation.
    fn iter_validators(&self) -> Box<dyn Iterator<Item = ValidatorVotes> + '_>;
}

/// Read access to which slots the block store actually holds data for.
pub trait BlockstoreView {
    fn slot_exists(&self, slot: Slot) -> bool;

    fn is_full(&self, slot: Slot) -> bool;
}
