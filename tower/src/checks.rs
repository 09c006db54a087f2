//! The three safety checks a candidate vote slot must pass before
//! [`Tower::vote`](crate::vote::Tower::vote) may be called on it:
//! lockout (does it honor every still-active lockout already on the
//! stack), switch (if it abandons the last vote's fork, has enough stake
//! already committed elsewhere to justify it), and threshold (would
//! casting this vote leave enough cluster stake still able to agree with
//! this validator's own recent history).
//!
//! Grounded on `fd_tower_lockout_check`, `fd_tower_switch_check`, and
//! `fd_tower_threshold_check` in the original implementation.
use vld_config::tower::{SWITCH_PCT, THRESHOLD_DEPTH, THRESHOLD_PCT};

use crate::traits::{AccountsView, ForkStore, GhostView};
use crate::types::Slot;
use crate::vote::Tower;

impl Tower {
    /// A candidate vote is lockout-safe if every entry `simulate_vote`
    /// would still leave on the stack is an ancestor of `candidate`. §4.8
    /// defines "still-locked" as the top `depth_after_simulate - 1`
    /// *remaining* entries, not every entry whose own lockout individually
    /// outlives `candidate`: `simulate_vote` only pops from the top while
    /// expired and stops at the first surviving entry, so a lower entry
    /// can be left on the stack (and thus still require ancestry) even if
    /// its own lockout window has technically elapsed, so long as a
    /// higher entry's has not.
    pub fn lockout_check(&self, candidate: Slot, ghost: &impl GhostView, forks: &impl ForkStore) -> bool {
        let root = ghost.root();
        let simulated = self.simulate_vote(candidate);
        let still_locked = simulated.depth().saturating_sub(1);
        self.votes()
            .take(still_locked)
            .all(|v| v.slot <= root || forks.is_ancestor(v.slot, candidate))
    }

    /// If `candidate` stays on the fork of the last vote, switching needs
    /// no justification. Otherwise, walks from `candidate` up to the ghost
    /// root, summing the stake weight of every sibling subtree along the
    /// way (every child of each ancestor other than the one just walked
    /// through), and requires that sum to outweigh the risk of abandoning
    /// the last vote's lockout.
    pub fn switch_check(&self, candidate: Slot, ghost: &impl GhostView, forks: &impl ForkStore) -> bool {
        let Some(last) = self.last_vote() else {
            return true;
        };
        if forks.is_ancestor(last.slot, candidate) {
            return true;
        }
        let root = ghost.root();
        let total_stake = self.epoch_total_stake.max(1);

        let mut switched_stake = 0u64;
        let mut came_from = candidate;
        while came_from > root {
            let Some(parent) = forks.parent(came_from) else {
                break;
            };
            for child in forks.children(parent) {
                if child != came_from {
                    switched_stake += ghost.fork_weight(child);
                }
            }
            came_from = parent;
        }

        switched_stake as f64 / total_stake as f64 > SWITCH_PCT
    }

    /// Simulates casting `candidate` on our own stack first, since the
    /// vote itself may pop expired lockouts before it lands — §4.10's
    /// `depth_after_simulate` is measured post-simulation, not against
    /// the stack as it stands now. Passes trivially if that simulated
    /// depth is shallower than [`THRESHOLD_DEPTH`]: there is no shallow
    /// fallback variant here (`fd_tower_threshold_check` returns `1`
    /// outright below that depth; its unused `SHALLOW_THRESHOLD_*`
    /// `#define`s belong to a different check entirely).
    pub fn threshold_check(&self, candidate: Slot, accounts: &impl AccountsView, _forks: &impl ForkStore) -> bool {
        let simulated = self.simulate_vote(candidate);
        let depth = simulated.depth();
        if depth < THRESHOLD_DEPTH {
            return true;
        }

        let our_threshold_vote = simulated.votes[depth - THRESHOLD_DEPTH];

        let mut agreeing_stake = 0u64;
        for validator in accounts.iter_validators() {
            let mut their_tower = Tower {
                votes: validator.votes.iter().copied().collect(),
                root: None,
                epoch_total_stake: 0,
            };
            their_tower.vote(candidate);
            if their_tower.depth() >= THRESHOLD_DEPTH {
                let their_vote = their_tower.votes[their_tower.depth() - THRESHOLD_DEPTH];
                if their_vote.slot >= our_threshold_vote.slot {
                    agreeing_stake += validator.stake;
                }
            }
        }

        let total_stake = accounts.total_stake().max(1);
        agreeing_stake as f64 / total_stake as f64 > THRESHOLD_PCT
    }
}
