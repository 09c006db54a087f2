//! Ordered index from expiry slot to resident handles, letting
//! `expire_before` evict every transaction whose deadline has passed in a
//! single ranged walk instead of a full scan.
//!
//! Grounded on `fd_pack_expire_before` in `fd_pack.h`, which walks expiring
//! transactions in slot order and halts at the first still-live entry;
//! `BTreeMap::range` gives the same result directly rather than emulating
//! the original's sequential halt-on-first-survivor loop.
use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::types::Handle;

#[derive(Debug, Default)]
pub struct ExpiryIndex {
    by_slot: BTreeMap<u64, SmallVec<[Handle; 2]>>,
    watermark: u64,
}

impl ExpiryIndex {
    pub fn watermark(&self) -> u64 {
        self.watermark
    }

    /// A transaction expiring strictly before the current watermark is
    /// already dead on arrival; one expiring exactly at the watermark is
    /// treated the same as a resident that survived the last
    /// `expire_before` sweep (which only deletes strictly-earlier entries).
    pub fn is_expired(&self, expires_at: u64) -> bool {
        expires_at < self.watermark
    }

    pub fn insert(&mut self, handle: Handle, expires_at: u64) {
        self.by_slot.entry(expires_at).or_default().push(handle);
    }

    pub fn remove(&mut self, handle: Handle, expires_at: u64) {
        if let Some(handles) = self.by_slot.get_mut(&expires_at) {
            handles.retain(|h| *h != handle);
            if handles.is_empty() {
                self.by_slot.remove(&expires_at);
            }
        }
    }

    /// Raises the watermark to `slot` and returns every handle whose
    /// expiry fell at or before it, removing them from the index. A no-op
    /// if `slot` does not move the watermark forward.
    pub fn expire_before(&mut self, slot: u64) -> Vec<Handle> {
        if slot <= self.watermark {
            return Vec::new();
        }
        self.watermark = slot;
        let stale_keys: Vec<u64> = self.by_slot.range(..slot).map(|(k, _)| *k).collect();
        let mut expired = Vec::new();
        for key in stale_keys {
            if let Some(handles) = self.by_slot.remove(&key) {
                expired.extend(handles);
            }
        }
        expired
    }

    pub fn clear(&mut self) {
        self.by_slot.clear();
        self.watermark = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expire_before_collects_and_removes_only_stale_entries() {
        let mut idx = ExpiryIndex::default();
        idx.insert(1, 10);
        idx.insert(2, 20);
        idx.insert(3, 30);

        let mut expired = idx.expire_before(20);
        expired.sort_unstable();
        assert_eq!(expired, vec![1]);
        assert_eq!(idx.watermark(), 20);

        let mut expired = idx.expire_before(31);
        expired.sort_unstable();
        assert_eq!(expired, vec![2, 3]);
    }

    #[test]
    fn watermark_never_moves_backward() {
        let mut idx = ExpiryIndex::default();
        idx.insert(1, 50);
        idx.expire_before(100);
        assert!(idx.expire_before(10).is_empty());
        assert_eq!(idx.watermark(), 100);
    }

    #[test]
    fn is_expired_uses_the_current_watermark() {
        let mut idx = ExpiryIndex::default();
        idx.expire_before(5);
        assert!(!idx.is_expired(5));
        assert!(idx.is_expired(1));
        assert!(!idx.is_expired(6));
    }
}
