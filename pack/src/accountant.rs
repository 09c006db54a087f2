//! Tracks cumulative resource usage for the block currently being packed:
//! total cost, vote cost, per-account write cost, and data bytes, each
//! checked against a ceiling before a candidate transaction is admitted
//! into a microblock.
//!
//! Grounded on `fd_pack_limits_t`'s consensus fields in `fd_pack.h` and on
//! `fd_pack_end_block`/`fd_pack_set_block_limits`, which reset the running
//! sums without touching the limits struct itself.
use rustc_hash::FxHashMap;
use vld_config::PackLimits;

use crate::types::Address;

/// The constant byte overhead charged once per non-empty microblock,
/// matching the original implementation's fixed microblock header size.
pub const MICROBLOCK_HEADER_BYTES: u64 = 48;

#[derive(Debug)]
pub struct BlockAccountant {
    limits: PackLimits,
    cost: u64,
    vote_cost: u64,
    write_cost: FxHashMap<Address, u64>,
    data_bytes: u64,
    microblocks: u64,
}

impl BlockAccountant {
    pub fn new(limits: PackLimits) -> Self {
        Self {
            limits,
            cost: 0,
            vote_cost: 0,
            write_cost: FxHashMap::default(),
            data_bytes: 0,
            microblocks: 0,
        }
    }

    pub fn limits(&self) -> &PackLimits {
        &self.limits
    }

    pub fn microblocks_remaining(&self) -> bool {
        self.microblocks < self.limits.max_microblocks_per_block
    }

    /// Returns true if admitting a transaction with this cost, vote flag,
    /// and write-set would keep every running sum within its ceiling.
    pub fn can_afford(&self, is_vote: bool, cost: u64, writes: &[Address]) -> bool {
        if self.cost + cost > self.limits.max_cost_per_block {
            return false;
        }
        if is_vote && self.vote_cost + cost > self.limits.max_vote_cost_per_block {
            return false;
        }
        for w in writes {
            let used = self.write_cost.get(w).copied().unwrap_or(0);
            if used + cost > self.limits.max_write_cost_per_acct {
                return false;
            }
        }
        true
    }

    pub fn commit(&mut self, is_vote: bool, cost: u64, writes: &[Address]) {
        self.cost += cost;
        if is_vote {
            self.vote_cost += cost;
        }
        for w in writes {
            *self.write_cost.entry(*w).or_insert(0) += cost;
        }
    }

    pub fn can_afford_data_bytes(&self, bytes: u64) -> bool {
        self.data_bytes + bytes <= self.limits.max_data_bytes_per_block
    }

    pub fn commit_microblock(&mut self, data_bytes: u64) {
        self.data_bytes += data_bytes + MICROBLOCK_HEADER_BYTES;
        self.microblocks += 1;
    }

    /// Resets every running sum at a block boundary. Limits and per-worker
    /// in-flight state are untouched: the latter is the scheduler's job.
    pub fn end_block(&mut self) {
        self.cost = 0;
        self.vote_cost = 0;
        self.write_cost.clear();
        self.data_bytes = 0;
        self.microblocks = 0;
    }

    pub fn set_block_limits(&mut self, max_microblocks_per_block: u64, max_data_bytes_per_block: u64) {
        self.limits.max_microblocks_per_block = max_microblocks_per_block;
        self.limits.max_data_bytes_per_block = max_data_bytes_per_block;
    }
}
