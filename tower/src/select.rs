//! Fork selection: which fork to reset local state to, which fork is the
//! cluster's current best, and which fork (if any) this validator may
//! safely cast its next vote for.
//!
//! Grounded on `fd_tower_best_fork_select`, `fd_tower_reset_fork_select`,
//! `fd_tower_vote_fork_select`, and `is_stale` in the original
//! implementation.
use vld_error::FatalError;

use crate::traits::{AccountsView, ForkStore, GhostView};
use crate::types::Slot;
use crate::vote::Tower;

impl Tower {
    /// Whether this tower imposes no constraint on fork selection right
    /// now: either it has never voted, or its most recent vote has already
    /// been rooted over by the cluster (its slot is behind the ghost
    /// root), so there is nothing left for it to protect.
    pub fn is_stale(&self, ghost: &impl GhostView) -> bool {
        match self.last_vote() {
            None => true,
            Some(last) => last.slot < ghost.root(),
        }
    }

    /// The fork whose head is the cluster's current heaviest observed
    /// leaf. Fatal if that head is not among the caller-supplied replay
    /// `frontier` (the set of currently-replayed fork heads): the
    /// heaviest leaf must itself have been replayed to be weighed at all,
    /// so its absence from the frontier is an invariant violation rather
    /// than a condition any fork-selection function can route around.
    pub fn best_fork_select(&self, frontier: &[Slot], ghost: &impl GhostView) -> Result<Slot, FatalError> {
        let best = ghost.heaviest_leaf();
        if frontier.contains(&best) {
            Ok(best)
        } else {
            Err(FatalError::invariant(format!(
                "ghost's heaviest leaf {best} is not a current frontier fork head"
            )))
        }
    }

    /// The fork to reset local block-production state to: the best fork
    /// if the tower is empty or stale, otherwise any frontier fork
    /// descending from the latest vote (preferring the best fork when it
    /// qualifies). Fatal if the tower has a live vote but no frontier fork
    /// descends from it — there is then no slot this validator could ever
    /// build on without abandoning its own lockout.
    pub fn reset_fork_select(
        &self,
        frontier: &[Slot],
        ghost: &impl GhostView,
        forks: &impl ForkStore,
    ) -> Result<Slot, FatalError> {
        if self.is_stale(ghost) {
            return self.best_fork_select(frontier, ghost);
        }
        let last_vote = self.last_vote().expect("non-stale tower has a last vote").slot;

        if let Ok(best) = self.best_fork_select(frontier, ghost) {
            if forks.is_ancestor(last_vote, best) {
                return Ok(best);
            }
        }
        frontier
            .iter()
            .copied()
            .find(|&head| forks.is_ancestor(last_vote, head))
            .ok_or_else(|| {
                FatalError::invariant(format!(
                    "no frontier fork descends from the latest vote at slot {last_vote}"
                ))
            })
    }

    /// The fork this validator should actually cast its next vote for, if
    /// any. An empty or stale tower always votes the best fork. Otherwise,
    /// staying on the best fork (a descendant of the latest vote) needs
    /// only a passing threshold check; switching to a different fork
    /// needs both the lockout and switch checks to pass. Returns `None`
    /// if no vote can safely be cast right now.
    pub fn vote_fork_select(
        &self,
        frontier: &[Slot],
        ghost: &impl GhostView,
        accounts: &impl AccountsView,
        forks: &impl ForkStore,
    ) -> Option<Slot> {
        if self.is_stale(ghost) {
            return self.best_fork_select(frontier, ghost).ok();
        }
        let last_vote = self.last_vote().expect("non-stale tower has a last vote").slot;
        let candidate = self.best_fork_select(frontier, ghost).ok()?;

        if candidate == last_vote {
            return None;
        }

        if forks.is_ancestor(last_vote, candidate) {
            self.threshold_check(candidate, accounts, forks)
                .then_some(candidate)
        } else if self.lockout_check(candidate, ghost, forks) && self.switch_check(candidate, ghost, forks) {
            Some(candidate)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::{smallvec, SmallVec};
    use std::collections::HashMap;

    struct LinearForks;
    impl ForkStore for LinearForks {
        fn parent(&self, slot: Slot) -> Option<Slot> {
            slot.checked_sub(1)
        }
        fn children(&self, slot: Slot) -> SmallVec<[Slot; 4]> {
            smallvec![slot + 1]
        }
    }

    struct FixedGhost(HashMap<Slot, u64>, Slot);
    impl GhostView for FixedGhost {
        fn fork_weight(&self, slot: Slot) -> u64 {
            self.0.get(&slot).copied().unwrap_or(0)
        }
        fn heaviest_leaf(&self) -> Slot {
            self.1
        }
        fn heaviest_fork_from(&self, ancestor: Slot) -> Slot {
            self.1.max(ancestor)
        }
        fn root(&self) -> Slot {
            0
        }
    }

    struct NoValidators;
    impl AccountsView for NoValidators {
        fn total_stake(&self) -> u64 {
            1
        }
        fn stake(&self, _validator: &crate::types::ValidatorId) -> u64 {
            0
        }
        fn iter_validators(&self) -> Box<dyn Iterator<Item = crate::traits::ValidatorVotes> + '_> {
            Box::new(std::iter::empty())
        }
    }

    #[test]
    fn best_fork_select_is_the_heaviest_leaf() {
        let tower = Tower::new();
        let ghost = FixedGhost(HashMap::new(), 42);
        assert_eq!(tower.best_fork_select(&[42], &ghost), Ok(42));
    }

    #[test]
    fn best_fork_select_is_fatal_if_the_heaviest_leaf_is_not_in_the_frontier() {
        let tower = Tower::new();
        let ghost = FixedGhost(HashMap::new(), 42);
        assert!(tower.best_fork_select(&[7, 8], &ghost).is_err());
    }

    #[test]
    fn reset_fork_select_falls_back_to_best_fork_before_any_vote() {
        let tower = Tower::new();
        let ghost = FixedGhost(HashMap::new(), 42);
        assert_eq!(tower.reset_fork_select(&[42], &ghost, &LinearForks), Ok(42));
    }

    #[test]
    fn reset_fork_select_prefers_the_best_fork_when_it_descends_from_the_last_vote() {
        let mut tower = Tower::new();
        tower.vote(10);
        let ghost = FixedGhost(HashMap::new(), 11);
        assert_eq!(tower.reset_fork_select(&[11], &ghost, &LinearForks), Ok(11));
    }

    #[test]
    fn reset_fork_select_falls_back_to_any_descending_frontier_fork() {
        struct ForkedAt10;
        impl ForkStore for ForkedAt10 {
            fn parent(&self, slot: Slot) -> Option<Slot> {
                match slot {
                    11 => Some(10),
                    10 | 100 => None, // 100 is a disjoint root-level branch
                    _ => slot.checked_sub(1),
                }
            }
            fn children(&self, slot: Slot) -> SmallVec<[Slot; 4]> {
                if slot == 10 {
                    smallvec![11]
                } else {
                    SmallVec::new()
                }
            }
        }
        let mut tower = Tower::new();
        tower.vote(10);
        // Best fork (100) is a disjoint branch; 11 still descends from the
        // last vote.
        let ghost = FixedGhost(HashMap::new(), 100);
        assert_eq!(tower.reset_fork_select(&[100, 11], &ghost, &ForkedAt10), Ok(11));
    }

    #[test]
    fn reset_fork_select_is_fatal_when_no_frontier_fork_descends_from_the_last_vote() {
        struct Disjoint;
        impl ForkStore for Disjoint {
            fn parent(&self, _slot: Slot) -> Option<Slot> {
                None
            }
            fn children(&self, _slot: Slot) -> SmallVec<[Slot; 4]> {
                SmallVec::new()
            }
        }
        let mut tower = Tower::new();
        tower.vote(10);
        let ghost = FixedGhost(HashMap::new(), 999);
        assert!(tower.reset_fork_select(&[999], &ghost, &Disjoint).is_err());
    }

    #[test]
    fn vote_fork_select_returns_none_once_the_tower_already_sits_on_the_best_fork() {
        let mut tower = Tower::new();
        tower.vote(42);
        let ghost = FixedGhost(HashMap::new(), 42);
        assert_eq!(
            tower.vote_fork_select(&[42], &ghost, &NoValidators, &LinearForks),
            None
        );
    }

    #[test]
    fn vote_fork_select_advances_along_the_same_fork_with_enough_history() {
        let mut tower = Tower::new();
        tower.vote(10);
        let ghost = FixedGhost(HashMap::new(), 11);
        assert_eq!(
            tower.vote_fork_select(&[11], &ghost, &NoValidators, &LinearForks),
            Some(11)
        );
    }

    #[test]
    fn vote_fork_select_votes_the_best_fork_unconditionally_once_stale() {
        // last vote (5) is below the ghost root (50): the tower is stale
        // and defers entirely to the best fork, skipping every check.
        struct RootedGhost(Slot);
        impl GhostView for RootedGhost {
            fn fork_weight(&self, _slot: Slot) -> u64 {
                0
            }
            fn heaviest_leaf(&self) -> Slot {
                self.0
            }
            fn heaviest_fork_from(&self, ancestor: Slot) -> Slot {
                ancestor
            }
            fn root(&self) -> Slot {
                50
            }
        }
        let mut tower = Tower::new();
        tower.vote(5);
        let ghost = RootedGhost(200);
        assert_eq!(
            tower.vote_fork_select(&[200], &ghost, &NoValidators, &LinearForks),
            Some(200)
        );
    }
}
