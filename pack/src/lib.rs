//! A priority- and conflict-aware transaction scheduler.
//!
//! [`Pack`] admits sanitized transactions (`insert_init`/`insert_fini`/
//! `insert_cancel`), holds them ranked by fee-per-cost-unit priority, and
//! assembles them into account-conflict-free microblocks
//! (`schedule_next_microblock`) under a block's consensus-critical cost
//! ceilings, tracking which accounts are locked by microblocks still
//! in-flight to other workers.
//!
//! Grounded on `fd_pack.h`'s public operation surface; module layout
//! follows the way `ckb`'s `tx-pool`/`pool` crates split a transaction
//! pool into a cost/fee model, a priority-ordered resident set, a
//! conflict graph, and pending-state bookkeeping, each in its own module.
pub mod accountant;
pub mod cost;
pub mod expiry;
pub mod locks;
pub mod pool;
pub mod types;

use rustc_hash::FxHashSet;
use vld_config::PackLimits;

pub use types::{
    AccountMeta, Address, ComputeBudget, Handle, InsertionOutcome, Instruction, PendingHandle,
    Signature, TxnInput, TxnP, WorkerId,
};

use accountant::BlockAccountant;
use expiry::ExpiryIndex;
use locks::{AccountGraph, InFlight};
use pool::Pool;

/// The scheduler. Owns every resident transaction, the account-conflict
/// indexes over them, the per-worker in-flight lock state, and the running
/// cost sums for the block currently being packed.
#[derive(Debug)]
pub struct Pack {
    pool: Pool,
    account_graph: AccountGraph,
    expiry: ExpiryIndex,
    in_flight: InFlight,
    accountant: BlockAccountant,
    limits: PackLimits,
}

impl Pack {
    pub fn new(limits: PackLimits) -> Self {
        Self {
            pool: Pool::new(limits.pack_depth as usize),
            account_graph: AccountGraph::default(),
            expiry: ExpiryIndex::default(),
            in_flight: InFlight::default(),
            accountant: BlockAccountant::new(limits),
            limits,
        }
    }

    /// Reserves a staging slot for a new transaction. The caller must fill
    /// it via [`Pack::pending_mut`] and then call exactly one of
    /// [`Pack::insert_fini`] or [`Pack::insert_cancel`].
    pub fn insert_init(&mut self) -> PendingHandle {
        self.pool.stage(TxnInput::default())
    }

    pub fn pending_mut(&mut self, handle: PendingHandle) -> &mut TxnInput {
        self.pool.pending_mut(handle)
    }

    pub fn insert_cancel(&mut self, handle: PendingHandle) {
        self.pool.cancel(handle);
    }

    /// Costs, validates, and (if resources allow) admits the transaction
    /// staged at `handle`, evicting the current lowest-priority resident if
    /// the pool is full and the new transaction outranks it.
    pub fn insert_fini(&mut self, handle: PendingHandle, expires_at: u64) -> InsertionOutcome {
        let input = self.pool.take_staged(handle);
        let mut txn = match cost::compute(input, &self.limits) {
            Ok(txn) => txn,
            Err(code) => return code,
        };
        txn.expires_at = expires_at;

        if self.pool.contains_signature(&txn.first_signature()) {
            return InsertionOutcome::RejectDuplicate;
        }
        if self.expiry.is_expired(expires_at) {
            return InsertionOutcome::RejectExpired;
        }

        let is_vote = txn.is_simple_vote;

        if !self.pool.is_full() {
            self.admit(txn);
            return if is_vote {
                InsertionOutcome::VoteAdd
            } else {
                InsertionOutcome::NonVoteAdd
            };
        }

        let candidate_key = types::RankKey {
            priority: txn.priority,
            signature: txn.first_signature(),
        };
        let (min_key, min_handle) = self
            .pool
            .min_rank()
            .expect("pool reports full but has no resident transaction");
        if candidate_key <= min_key {
            return InsertionOutcome::RejectPriority;
        }

        let evicted = self.pool.remove(min_handle);
        self.expiry.remove(min_handle, evicted.expires_at);
        let evicted_writes: Vec<_> = evicted.writes().copied().collect();
        let evicted_reads: Vec<_> = evicted.reads().copied().collect();
        self.account_graph
            .remove(min_handle, evicted_writes.iter(), evicted_reads.iter());

        self.admit(txn);
        if is_vote {
            InsertionOutcome::VoteReplace
        } else {
            InsertionOutcome::NonVoteReplace
        }
    }

    fn admit(&mut self, txn: TxnP) {
        let expires_at = txn.expires_at;
        let writes: Vec<_> = txn.writes().copied().collect();
        let reads: Vec<_> = txn.reads().copied().collect();
        let handle = self.pool.admit(txn);
        self.expiry.insert(handle, expires_at);
        self.account_graph.insert(handle, writes.iter(), reads.iter());
    }

    /// Removes the resident transaction identified by `signature`, if any.
    /// Returns whether one was found and removed.
    pub fn delete_transaction(&mut self, signature: &Signature) -> bool {
        let Some(handle) = self.pool.handle_of(signature) else {
            return false;
        };
        let txn = self.pool.remove(handle);
        self.expiry.remove(handle, txn.expires_at);
        let writes: Vec<_> = txn.writes().copied().collect();
        let reads: Vec<_> = txn.reads().copied().collect();
        self.account_graph.remove(handle, writes.iter(), reads.iter());
        true
    }

    /// Raises the expiry watermark to `slot` and drops every resident
    /// transaction whose deadline is at or before it. Returns how many
    /// were dropped.
    pub fn expire_before(&mut self, slot: u64) -> usize {
        let handles = self.expiry.expire_before(slot);
        for handle in &handles {
            let txn = self.pool.remove(*handle);
            let writes: Vec<_> = txn.writes().copied().collect();
            let reads: Vec<_> = txn.reads().copied().collect();
            self.account_graph.remove(*handle, writes.iter(), reads.iter());
        }
        handles.len()
    }

    pub fn avail_txn_cnt(&self) -> usize {
        self.pool.len()
    }

    /// Drops every resident transaction and resets both the block
    /// accountant and per-worker in-flight state, for a hard fork-switch
    /// reset rather than an ordinary block boundary (see [`Pack::end_block`]).
    pub fn clear_all(&mut self) {
        vld_logger::warn!("clearing {} resident transactions", self.pool.len());
        self.pool.clear();
        self.account_graph.clear();
        self.expiry.clear();
        self.in_flight.clear();
        self.accountant.end_block();
    }

    /// Resets the running cost sums for a new block, keeping resident
    /// transactions, the expiry watermark, and in-flight worker locks.
    pub fn end_block(&mut self) {
        self.accountant.end_block();
    }

    pub fn set_block_limits(&mut self, max_microblocks_per_block: u64, max_data_bytes_per_block: u64) {
        self.accountant
            .set_block_limits(max_microblocks_per_block, max_data_bytes_per_block);
    }

    pub fn microblock_complete(&mut self, worker: WorkerId) {
        self.in_flight.complete(worker);
    }

    /// Assembles the next microblock for `worker`: the highest-priority
    /// resident transactions that together fit within `total_cus` compute
    /// units, respect the vote-transaction fraction `vote_fraction`, and do
    /// not conflict with each other or with any microblock still in-flight
    /// to another worker. Selected transactions are removed from the
    /// resident set and their accounts marked locked for `worker` until
    /// [`Pack::microblock_complete`] is called.
    pub fn schedule_next_microblock(
        &mut self,
        worker: WorkerId,
        total_cus: u64,
        vote_fraction: f64,
    ) -> Vec<TxnP> {
        if !self.accountant.microblocks_remaining() {
            return Vec::new();
        }

        let max_txn = self.limits.max_txn_per_microblock as usize;
        let vote_txn_limit = (vote_fraction * max_txn as f64).floor() as usize;
        let vote_cost_limit = (vote_fraction * total_cus as f64).floor() as u64;

        let candidates = self.pool.ranked_handles();

        let mut selected: Vec<Handle> = Vec::new();
        let mut mb_writes: FxHashSet<Address> = FxHashSet::default();
        let mut mb_reads: FxHashSet<Address> = FxHashSet::default();
        let mut mb_cost = 0u64;
        let mut mb_vote_cost = 0u64;
        let mut mb_vote_count = 0usize;
        let mut mb_data_bytes = 0u64;

        for handle in candidates {
            if selected.len() >= max_txn {
                break;
            }
            let txn = self.pool.get(handle);

            if txn.is_simple_vote
                && (mb_vote_count >= vote_txn_limit || mb_vote_cost + txn.cost_units > vote_cost_limit)
            {
                continue;
            }
            if mb_cost + txn.cost_units > total_cus {
                continue;
            }

            let writes: Vec<Address> = txn.writes().copied().collect();
            let reads: Vec<Address> = txn.reads().copied().collect();
            let data_bytes = txn.data_bytes();
            let cost_units = txn.cost_units;
            let is_vote = txn.is_simple_vote;

            if writes
                .iter()
                .any(|a| self.in_flight.is_blocked(a, true) || mb_writes.contains(a) || mb_reads.contains(a))
            {
                continue;
            }
            if reads
                .iter()
                .any(|a| self.in_flight.is_blocked(a, false) || mb_writes.contains(a))
            {
                continue;
            }
            if !self.accountant.can_afford(is_vote, cost_units, &writes) {
                continue;
            }
            if !self.accountant.can_afford_data_bytes(mb_data_bytes + data_bytes) {
                continue;
            }

            mb_cost += cost_units;
            if is_vote {
                mb_vote_cost += cost_units;
                mb_vote_count += 1;
            }
            mb_data_bytes += data_bytes;
            self.accountant.commit(is_vote, cost_units, &writes);
            mb_writes.extend(writes);
            mb_reads.extend(reads);
            selected.push(handle);
        }

        if selected.is_empty() {
            return Vec::new();
        }

        vld_logger::debug!(
            "worker {worker}: scheduled {} txns ({} votes), cost {mb_cost}",
            selected.len(),
            mb_vote_count
        );

        self.accountant.commit_microblock(mb_data_bytes);
        self.in_flight.stage(worker, mb_writes, mb_reads);

        let mut out = Vec::with_capacity(selected.len());
        for handle in selected {
            let txn = self.pool.remove(handle);
            self.expiry.remove(handle, txn.expires_at);
            let writes: Vec<_> = txn.writes().copied().collect();
            let reads: Vec<_> = txn.reads().copied().collect();
            self.account_graph.remove(handle, writes.iter(), reads.iter());
            out.push(txn);
        }
        out
    }
}
