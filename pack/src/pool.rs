//! The resident-transaction arena: a slab of fully-costed [`TxnP`] values
//! addressed by stable [`Handle`]s, a priority-ordered index over them, an
//! identity index by first signature, and a staging arena for transactions
//! that are mid-insertion (between `insert_init` and `insert_fini`/
//! `insert_cancel`).
use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use slab::Slab;

use crate::types::{Handle, PendingHandle, RankKey, Signature, TxnInput, TxnP};

#[derive(Debug)]
pub struct Pool {
    arena: Slab<TxnP>,
    staging: Slab<TxnInput>,
    by_rank: BTreeMap<RankKey, Handle>,
    by_signature: FxHashMap<Signature, Handle>,
    capacity: usize,
}

impl Pool {
    pub fn new(capacity: usize) -> Self {
        Self {
            arena: Slab::with_capacity(capacity),
            staging: Slab::new(),
            by_rank: BTreeMap::new(),
            by_signature: FxHashMap::default(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.arena.len() >= self.capacity
    }

    pub fn contains_signature(&self, sig: &Signature) -> bool {
        self.by_signature.contains_key(sig)
    }

    pub fn handle_of(&self, sig: &Signature) -> Option<Handle> {
        self.by_signature.get(sig).copied()
    }

    pub fn get(&self, handle: Handle) -> &TxnP {
        &self.arena[handle]
    }

    pub fn min_rank(&self) -> Option<(RankKey, Handle)> {
        self.by_rank.iter().next().map(|(k, v)| (*k, *v))
    }

    /// Reserves a staging slot for a transaction being built up by the
    /// caller between `insert_init` and `insert_fini`/`insert_cancel`.
    pub fn stage(&mut self, input: TxnInput) -> PendingHandle {
        PendingHandle(self.staging.insert(input))
    }

    pub fn pending_mut(&mut self, handle: PendingHandle) -> &mut TxnInput {
        &mut self.staging[handle.0]
    }

    pub fn cancel(&mut self, handle: PendingHandle) {
        self.staging.remove(handle.0);
    }

    pub fn take_staged(&mut self, handle: PendingHandle) -> TxnInput {
        self.staging.remove(handle.0)
    }

    /// Admits a fully-costed transaction into the resident set. Callers
    /// must already have checked capacity and uniqueness.
    pub fn admit(&mut self, txn: TxnP) -> Handle {
        let key = RankKey {
            priority: txn.priority,
            signature: txn.first_signature(),
        };
        let sig = txn.first_signature();
        let handle = self.arena.insert(txn);
        self.by_rank.insert(key, handle);
        self.by_signature.insert(sig, handle);
        handle
    }

    pub fn remove(&mut self, handle: Handle) -> TxnP {
        let txn = self.arena.remove(handle);
        let key = RankKey {
            priority: txn.priority,
            signature: txn.first_signature(),
        };
        self.by_rank.remove(&key);
        self.by_signature.remove(&txn.first_signature());
        txn
    }

    /// Resident handles in descending-priority order, highest priority
    /// first. A fresh snapshot each call: scheduling a microblock mutates
    /// the pool as it goes, so this must not alias a live index.
    pub fn ranked_handles(&self) -> Vec<Handle> {
        self.by_rank.values().rev().copied().collect()
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.staging.clear();
        self.by_rank.clear();
        self.by_signature.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ComputeBudget;

    fn txn(sig: u8, priority: u128) -> TxnP {
        TxnP {
            input: TxnInput {
                first_signature: [sig; 64],
                signature_count: 1,
                accounts: Default::default(),
                instructions: Default::default(),
                compute_budget: ComputeBudget::Default,
                loaded_data_bytes: 0,
                uses_address_lookup_table: false,
            },
            cost_units: 1000,
            fee: 5000,
            priority,
            expires_at: 100,
            is_simple_vote: false,
        }
    }

    #[test]
    fn ranked_handles_are_highest_priority_first() {
        let mut pool = Pool::new(10);
        let low = pool.admit(txn(1, 10));
        let high = pool.admit(txn(2, 90));
        let mid = pool.admit(txn(3, 50));
        assert_eq!(pool.ranked_handles(), vec![high, mid, low]);
    }

    #[test]
    fn min_rank_is_the_lowest_priority_resident() {
        let mut pool = Pool::new(10);
        pool.admit(txn(1, 10));
        let low = pool.admit(txn(2, 5));
        pool.admit(txn(3, 50));
        let (key, handle) = pool.min_rank().unwrap();
        assert_eq!(handle, low);
        assert_eq!(key.priority, 5);
    }

    #[test]
    fn equal_priority_breaks_ties_by_lexicographically_lesser_signature() {
        let mut pool = Pool::new(10);
        let a = pool.admit(txn(9, 10));
        let b = pool.admit(txn(1, 10));
        // b's signature ([1; 64]) is lexicographically less than a's ([9; 64]),
        // so b ranks strictly higher despite equal priority.
        assert_eq!(pool.ranked_handles(), vec![b, a]);
    }
}
