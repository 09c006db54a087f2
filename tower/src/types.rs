//! Core vocabulary: slots, validator identities, and a single lockout
//! entry in a vote stack.

/// A ledger slot number.
pub type Slot = u64;

/// A validator's identity, used to index stake and published vote state.
pub type ValidatorId = [u8; 32];

/// A bank hash, as stamped into a [`crate::sync::TowerSync`] so a peer can
/// tell which fork the vote was actually cast against.
pub type BlockHash = [u8; 32];

/// One entry in a vote stack: the slot voted for, and how many times the
/// stack has "doubled" this lockout since.
///
/// Grounded on the original implementation's lockout bookkeeping: a vote's
/// exclusion zone grows exponentially in the number of subsequent votes
/// stacked on top of it, `2^confirmation_count` slots wide.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lockout {
    pub slot: Slot,
    pub confirmation_count: u32,
}

impl Lockout {
    pub fn new(slot: Slot) -> Self {
        Self {
            slot,
            confirmation_count: 1,
        }
    }

    /// Width of this vote's exclusion zone, in slots.
    pub fn lockout(&self) -> u64 {
        1u64 << self.confirmation_count
    }

    /// The last slot this vote still excludes competing forks from.
    pub fn expiration_slot(&self) -> Slot {
        self.slot.saturating_add(self.lockout())
    }

    /// Whether this vote's lockout is still in force as of `slot`: any
    /// vote for `slot` must descend from this vote's slot.
    pub fn is_locked_out_at_slot(&self, slot: Slot) -> bool {
        self.expiration_slot() >= slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lockout_doubles_with_confirmation_count() {
        let mut l = Lockout::new(10);
        assert_eq!(l.lockout(), 2);
        l.confirmation_count += 1;
        assert_eq!(l.lockout(), 4);
        l.confirmation_count += 1;
        assert_eq!(l.lockout(), 8);
    }

    #[test]
    fn expiration_slot_gates_lockout() {
        let l = Lockout::new(10); // expiration_slot = 12
        assert!(l.is_locked_out_at_slot(12));
        assert!(!l.is_locked_out_at_slot(13));
    }
}
