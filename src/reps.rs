// src/reps.rs
use crate::action::{Action, RepCounts};

/// Counts one repetition per contiguous stretch of a stable action that starts from unknown.
#[derive(Debug, Clone, Default)]
pub struct RepCounter {
    previous_stable: Action,
    counts: RepCounts,
}

impl RepCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds this frame's stable label. Returns true when a repetition was counted.
    pub fn observe(&mut self, stable: Action) -> bool {
        let counted = self.previous_stable.is_unknown() && !stable.is_unknown();
        if counted {
            self.counts.increment(stable);
        }
        self.previous_stable = stable;
        counted
    }

    pub fn previous_stable(&self) -> Action {
        self.previous_stable
    }

    pub fn counts(&self) -> RepCounts {
        self.counts
    }

    /// Forget the last label but keep the totals.
    pub fn rearm(&mut self) {
        self.previous_stable = Action::Unknown;
    }
}
