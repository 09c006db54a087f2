//! Two layers of account-conflict bookkeeping:
//!
//! - [`AccountGraph`] indexes every *resident, pending* transaction's
//!   accounts, purely so a future extension (e.g. "why is this transaction
//!   not scheduling") can answer "who else touches this account" in O(1).
//!   It does not by itself forbid two pending transactions from both
//!   writing the same account — that's expected; only one of them will be
//!   selected into the current microblock.
//! - [`InFlight`] tracks, per worker, the accounts locked by microblocks
//!   that have been dispatched but not yet reported complete. These locks
//!   *do* forbid scheduling: no other transaction may touch an account any
//!   worker currently holds for writing, and none may write an account any
//!   worker currently holds for reading.
//!
//! Grounded on `fd_pack_microblock_complete`/the `bank_tile_cnt`-indexed
//! in-flight state described in `fd_pack.h`'s account-lock discussion.
use rustc_hash::{FxHashMap, FxHashSet};

use crate::types::{Address, Handle, WorkerId};

#[derive(Debug, Default)]
pub struct AccountGraph {
    writers: FxHashMap<Address, FxHashSet<Handle>>,
    readers: FxHashMap<Address, FxHashSet<Handle>>,
}

impl AccountGraph {
    pub fn insert<'a>(
        &mut self,
        handle: Handle,
        writes: impl Iterator<Item = &'a Address>,
        reads: impl Iterator<Item = &'a Address>,
    ) {
        for w in writes {
            self.writers.entry(*w).or_default().insert(handle);
        }
        for r in reads {
            self.readers.entry(*r).or_default().insert(handle);
        }
    }

    pub fn remove<'a>(
        &mut self,
        handle: Handle,
        writes: impl Iterator<Item = &'a Address>,
        reads: impl Iterator<Item = &'a Address>,
    ) {
        for w in writes {
            if let Some(set) = self.writers.get_mut(w) {
                set.remove(&handle);
                if set.is_empty() {
                    self.writers.remove(w);
                }
            }
        }
        for r in reads {
            if let Some(set) = self.readers.get_mut(r) {
                set.remove(&handle);
                if set.is_empty() {
                    self.readers.remove(r);
                }
            }
        }
    }

    pub fn writers_of(&self, addr: &Address) -> usize {
        self.writers.get(addr).map_or(0, |s| s.len())
    }

    pub fn readers_of(&self, addr: &Address) -> usize {
        self.readers.get(addr).map_or(0, |s| s.len())
    }

    pub fn clear(&mut self) {
        self.writers.clear();
        self.readers.clear();
    }
}

#[derive(Debug, Default, Clone)]
struct WorkerLocks {
    writes: FxHashSet<Address>,
    reads: FxHashSet<Address>,
}

#[derive(Debug, Default)]
pub struct InFlight {
    per_worker: FxHashMap<WorkerId, WorkerLocks>,
}

impl InFlight {
    /// True if `addr` may not currently be touched: some in-flight worker
    /// holds it for writing, or (when `for_write` is set) some worker
    /// holds it for reading.
    pub fn is_blocked(&self, addr: &Address, for_write: bool) -> bool {
        self.per_worker.values().any(|locks| {
            locks.writes.contains(addr) || (for_write && locks.reads.contains(addr))
        })
    }

    pub fn stage(&mut self, worker: WorkerId, writes: FxHashSet<Address>, reads: FxHashSet<Address>) {
        self.per_worker.insert(worker, WorkerLocks { writes, reads });
    }

    pub fn complete(&mut self, worker: WorkerId) {
        self.per_worker.remove(&worker);
    }

    pub fn clear(&mut self) {
        self.per_worker.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        let mut a = [0u8; 32];
        a[0] = b;
        a
    }

    #[test]
    fn in_flight_write_blocks_both_reads_and_writes_elsewhere() {
        let mut inflight = InFlight::default();
        let a = addr(1);
        let mut writes = FxHashSet::default();
        writes.insert(a);
        inflight.stage(0, writes, FxHashSet::default());

        assert!(inflight.is_blocked(&a, false));
        assert!(inflight.is_blocked(&a, true));

        inflight.complete(0);
        assert!(!inflight.is_blocked(&a, false));
    }

    #[test]
    fn in_flight_read_only_blocks_new_writes_not_new_reads() {
        let mut inflight = InFlight::default();
        let a = addr(2);
        let mut reads = FxHashSet::default();
        reads.insert(a);
        inflight.stage(0, FxHashSet::default(), reads);

        assert!(!inflight.is_blocked(&a, false));
        assert!(inflight.is_blocked(&a, true));
    }

    #[test]
    fn account_graph_tracks_and_clears_pending_writers() {
        let mut graph = AccountGraph::default();
        let a = addr(3);
        graph.insert(7, std::iter::once(&a), std::iter::empty());
        assert_eq!(graph.writers_of(&a), 1);
        graph.remove(7, std::iter::once(&a), std::iter::empty());
        assert_eq!(graph.writers_of(&a), 0);
    }
}
