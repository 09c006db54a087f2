//! Wire-level tower synchronization: encoding a vote stack as the
//! compact, offset-based `TowerSync` message gossiped to the cluster, and
//! reconciling a freshly (re)started validator's tower against whatever
//! it last published on-chain.
//!
//! Grounded on the original implementation's `fd_tower_to_tower_sync` and
//! `fd_tower_cluster_cmp`/`fd_tower_cluster_sync`/`fd_tower_cluster_query`.
use std::cmp::Ordering;

use crate::traits::{AccountsView, BlockstoreView, GhostWriter};
use crate::types::{BlockHash, Lockout, Slot, ValidatorId};
use crate::vote::Tower;

/// One lockout in a [`TowerSync`], encoded relative to the slot of the
/// entry just below it rather than as an absolute slot number: the first
/// entry's offset is taken from the root, and every entry after that from
/// the previous entry's own slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockoutOffset {
    pub offset_from_prev_slot: u64,
    pub confirmation_count: u32,
}

/// The compact wire form of a vote stack, as published to the cluster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TowerSync {
    pub vote_slot: Slot,
    pub root: Option<Slot>,
    pub timestamp: u64,
    pub hash: BlockHash,
    pub lockouts: Vec<LockoutOffset>,
}

impl Tower {
    /// Restores a freshly-started validator's tower from whatever it last
    /// published on-chain, then primes its epoch-scoped state. Composes
    /// [`cluster_query`], [`Tower::cluster_sync`], and
    /// [`Tower::epoch_update`], mirroring the original implementation's
    /// `fd_tower_init`. Logs a warning and starts from an empty tower if
    /// no prior published state is found for `vote_acc`, rather than
    /// treating that as fatal: a validator's very first vote account has
    /// nothing to restore.
    pub fn init(vote_acc: &ValidatorId, accounts: &impl AccountsView) -> Self {
        let mut tower = Self::new();
        match cluster_query(accounts, vote_acc) {
            Some(observed) => tower.cluster_sync(&observed),
            None => vld_logger::warn!("init: no published vote state found for vote account"),
        }
        tower.epoch_update(accounts);
        tower
    }

    /// Refreshes cached epoch-scoped state (currently just total stake,
    /// used by [`Tower::switch_check`]) at an epoch boundary.
    pub fn epoch_update(&mut self, accounts: &impl AccountsView) {
        self.epoch_total_stake = accounts.total_stake();
    }

    /// Records a newly-confirmed root, e.g. once a slot has accumulated
    /// the supermajority lockout that makes it unrollable.
    pub fn set_root(&mut self, confirmed_root: Slot) {
        self.root = Some(confirmed_root);
    }

    /// Registers a freshly-replayed fork head with the ghost fork-weight
    /// tree and credits every staked vote account's most recent landed
    /// vote to it. Does nothing (beyond a logged warning) if the fork's
    /// parent hasn't been replayed into the blockstore yet — inserting a
    /// node with a dangling parent would corrupt the tree.
    pub fn fork_update(
        &self,
        fork_head: Slot,
        parent_slot: Slot,
        blockstore: &impl BlockstoreView,
        accounts: &impl AccountsView,
        ghost: &mut impl GhostWriter,
    ) {
        if !blockstore.slot_exists(parent_slot) {
            vld_logger::warn!(
                "fork_update: parent slot {parent_slot} of fork head {fork_head} missing from blockstore"
            );
            return;
        }
        ghost.insert_fork(fork_head, parent_slot);

        let local_root = self.root.unwrap_or(0);
        for validator in accounts.iter_validators() {
            if validator.stake == 0 {
                continue;
            }
            let Some(tail) = validator.votes.last() else {
                continue;
            };
            if tail.slot >= local_root {
                ghost.upsert_vote(tail.slot, validator.validator, validator.stake);
            }
        }
    }

    /// Encodes the current vote stack as a `TowerSync` message stamped
    /// with `bank_hash` (the hash of the block the vote is cast against)
    /// and `timestamp` (the wall-clock time of the vote, supplied by the
    /// caller rather than read from an internal clock this crate does not
    /// own). Each lockout's offset is taken from the slot immediately
    /// below it in the stack, walking up from the root, rather than from
    /// the tip: a peer decodes by walking the same accumulation forward.
    pub fn to_tower_sync(&self, bank_hash: BlockHash, timestamp: u64) -> TowerSync {
        let vote_slot = self.last_vote().map(|v| v.slot).unwrap_or(0);
        let mut curr_slot = self.root.unwrap_or(0);
        let lockouts = self
            .votes()
            .map(|v| {
                let offset = v.slot - curr_slot;
                curr_slot = v.slot;
                LockoutOffset {
                    offset_from_prev_slot: offset,
                    confirmation_count: v.confirmation_count,
                }
            })
            .collect();
        TowerSync {
            vote_slot,
            root: self.root,
            timestamp,
            hash: bank_hash,
            lockouts,
        }
    }

    /// Compares this tower's most recent vote against an observed
    /// `TowerSync`'s, for deciding which of two candidate towers for the
    /// same validator identity is more recent.
    pub fn cluster_cmp(&self, observed: &TowerSync) -> Ordering {
        self.last_vote().map(|v| v.slot).unwrap_or(0).cmp(&observed.vote_slot)
    }

    /// Adopts `observed` wholesale if it is strictly ahead of this tower's
    /// own state. Used on startup: a validator's in-memory tower is empty,
    /// so it must resynchronize from whatever it last published on-chain
    /// before it can safely vote again.
    pub fn cluster_sync(&mut self, observed: &TowerSync) {
        if self.cluster_cmp(observed) == Ordering::Less {
            vld_logger::info!(
                "adopting cluster-observed tower at slot {} ({} lockouts)",
                observed.vote_slot,
                observed.lockouts.len()
            );
            let mut curr_slot = observed.root.unwrap_or(0);
            self.votes = observed
                .lockouts
                .iter()
                .map(|lo| {
                    let slot = curr_slot + lo.offset_from_prev_slot;
                    curr_slot = slot;
                    Lockout {
                        slot,
                        confirmation_count: lo.confirmation_count,
                    }
                })
                .collect();
            self.root = observed.root;
        }
    }
}

/// Looks up a validator's last-published `TowerSync`, for feeding into
/// [`Tower::cluster_sync`] after a restart. `AccountsView` only tracks
/// stake and vote slots, not the bank hash or timestamp a validator
/// originally published alongside them, so those fields come back zeroed;
/// [`Tower::cluster_sync`] never reads them.
pub fn cluster_query(accounts: &impl AccountsView, validator: &ValidatorId) -> Option<TowerSync> {
    accounts
        .iter_validators()
        .find(|v| &v.validator == validator)
        .map(|v| {
            let vote_slot = v.votes.last().map(|l| l.slot).unwrap_or(0);
            let mut curr_slot = 0;
            TowerSync {
                vote_slot,
                root: None,
                timestamp: 0,
                hash: [0u8; 32],
                lockouts: v
                    .votes
                    .iter()
                    .map(|l| {
                        let offset = l.slot - curr_slot;
                        curr_slot = l.slot;
                        LockoutOffset {
                            offset_from_prev_slot: offset,
                            confirmation_count: l.confirmation_count,
                        }
                    })
                    .collect(),
            }
        })
}
