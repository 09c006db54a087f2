//! The vote stack itself: pushing a new vote, the "doubling walk" that
//! retires expired lockouts and deepens the ones that survive, and a pure
//! `simulate_vote` used by the threshold check to inspect what the stack
//! would look like after a candidate vote without committing to it.
//!
//! Grounded on the original implementation's `fd_tower_vote`: pop every
//! lockout that has expired as of the new slot (shallowest/most recent
//! first, since those expire soonest), double the confirmation count of
//! every lockout that survives and has accumulated enough stack depth to
//! earn another doubling, then push the new vote. Root-tracking (evicting
//! the oldest vote once the stack exceeds its maximum depth) is commented
//! out in the original pending a still-open design question there; this
//! implementation resolves that question by actually evicting (see
//! `DESIGN.md`), since leaving the stack unbounded would let it grow
//! without limit for a validator that never roots.
use std::collections::VecDeque;

use vld_config::tower::MAX_LOCKOUT_HISTORY;

use crate::types::{Lockout, Slot};

#[derive(Clone, Debug, Default)]
pub struct Tower {
    pub(crate) votes: VecDeque<Lockout>,
    pub(crate) root: Option<Slot>,
    pub(crate) epoch_total_stake: u64,
}

impl Tower {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn votes(&self) -> impl DoubleEndedIterator<Item = &Lockout> {
        self.votes.iter()
    }

    pub fn last_vote(&self) -> Option<&Lockout> {
        self.votes.back()
    }

    pub fn root(&self) -> Option<Slot> {
        self.root
    }

    pub fn depth(&self) -> usize {
        self.votes.len()
    }

    /// Applies the doubling walk to a cloned copy of the stack, without
    /// mutating `self`. Used to ask "if I voted for `slot`, would my own
    /// stack then satisfy the threshold check" before actually voting.
    ///
    /// Returns the simulated `Tower` itself rather than just its resulting
    /// depth: `lockout_check` and `threshold_check` (in [`crate::checks`])
    /// both need the simulated stack's *entries*, not only its depth, to
    /// find the still-locked slots or the threshold-depth vote.
    /// [`Tower::depth`] on the result recovers the depth named by the
    /// interface this is grounded on.
    pub fn simulate_vote(&self, slot: Slot) -> Tower {
        let mut next = self.clone();
        next.vote(slot);
        next
    }

    /// Commits a vote for `slot`: retires every lockout that has expired
    /// as of `slot`, doubles the ones that survive deeply enough, and
    /// pushes the new vote. If this grows the stack past
    /// [`MAX_LOCKOUT_HISTORY`], the oldest vote is rooted out.
    ///
    /// A no-op vote for the slot already on top is rejected outright
    /// (returns `false`, stack untouched) rather than pushing a duplicate.
    ///
    /// Callers are expected to have already run [`crate::Tower::lockout_check`],
    /// [`crate::Tower::switch_check`], and [`crate::Tower::threshold_check`]
    /// against `slot`; this method does not re-validate them.
    pub fn vote(&mut self, slot: Slot) -> bool {
        if self.last_vote().is_some_and(|v| v.slot == slot) {
            return false;
        }

        self.pop_expired_votes(slot);
        self.double_lockouts();

        if self.votes.len() == MAX_LOCKOUT_HISTORY {
            let rooted = self.votes.pop_front().expect("stack at max depth is non-empty");
            self.root = Some(rooted.slot);
        }

        self.votes.push_back(Lockout::new(slot));
        true
    }

    fn pop_expired_votes(&mut self, next_vote_slot: Slot) {
        while let Some(top) = self.votes.back() {
            if top.is_locked_out_at_slot(next_vote_slot) {
                break;
            }
            self.votes.pop_back();
        }
    }

    /// Walks the (already-pruned, not-yet-pushed) stack from the top
    /// downward. The top entry must show confirmation count 1, the next
    /// one down 2, and so on; each entry meeting its expected count is
    /// doubled, and the walk stops at the first entry that doesn't match.
    /// Mirrors the original implementation's `prev_conf` running counter,
    /// which is why the comparison is against the *pre-increment* value at
    /// every step rather than the just-doubled entry above it.
    fn double_lockouts(&mut self) {
        let mut expected_conf = 0u32;
        for vote in self.votes.iter_mut().rev() {
            expected_conf += 1;
            if vote.confirmation_count != expected_conf {
                break;
            }
            vote.confirmation_count += 1;
        }
    }
}
