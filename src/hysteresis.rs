// src/hysteresis.rs - Turns the flickering raw label into a stable one
use crate::action::Action;
use crate::arbiter::Verdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Stable label is unknown.
    Idle,
    /// Label shown with no hold left: the next quiet frame drops it.
    Active { action: Action },
    /// Label kept for `remaining_hold` more quiet frames (always > 0).
    Holding { action: Action, remaining_hold: u32 },
}

/// Per-track hold state. A firing rule (re)arms its hold; a quiet frame spends one
/// frame of hold, and once the hold is exhausted the label drops back to unknown.
#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    stable: Action,
    remaining_hold: u32,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&mut self, verdict: Verdict) -> Action {
        if !verdict.action.is_unknown() {
            self.stable = verdict.action;
            self.remaining_hold = verdict.hold_frames;
        } else if self.remaining_hold > 0 {
            self.remaining_hold -= 1;
        } else {
            self.stable = Action::Unknown;
        }
        self.stable
    }

    pub fn stable(&self) -> Action {
        self.stable
    }

    pub fn remaining_hold(&self) -> u32 {
        self.remaining_hold
    }

    /// True while a crouch or mountain climber hold is still running.
    pub fn holding_cooldown_action(&self) -> bool {
        self.remaining_hold > 0 && self.stable.triggers_cooldown()
    }

    pub fn phase(&self) -> Phase {
        match (self.stable, self.remaining_hold) {
            (Action::Unknown, _) => Phase::Idle,
            (action, 0) => Phase::Active { action },
            (action, remaining_hold) => Phase::Holding {
                action,
                remaining_hold,
            },
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fire(action: Action, hold_frames: u32) -> Verdict {
        Verdict {
            action,
            hold_frames,
        }
    }

    #[test]
    fn starts_idle() {
        let debouncer = Debouncer::new();
        assert_eq!(debouncer.phase(), Phase::Idle);
        assert_eq!(debouncer.stable(), Action::Unknown);
    }

    #[test]
    fn crouch_is_held_for_exactly_eight_quiet_frames() {
        let mut debouncer = Debouncer::new();
        assert_eq!(debouncer.step(fire(Action::Crouch, 8)), Action::Crouch);
        for _ in 0..8 {
            assert_eq!(debouncer.step(Verdict::UNKNOWN), Action::Crouch);
        }
        assert_eq!(debouncer.step(Verdict::UNKNOWN), Action::Unknown);
        assert_eq!(debouncer.phase(), Phase::Idle);
    }

    #[test]
    fn zero_hold_drops_on_the_next_quiet_frame() {
        let mut debouncer = Debouncer::new();
        assert_eq!(debouncer.step(fire(Action::Run, 0)), Action::Run);
        assert_eq!(debouncer.step(Verdict::UNKNOWN), Action::Unknown);
        assert_eq!(debouncer.step(fire(Action::Run, 0)), Action::Run);
    }

    #[test]
    fn spent_hold_is_active_not_holding() {
        let mut debouncer = Debouncer::new();
        debouncer.step(fire(Action::Jump, 0));
        assert_eq!(debouncer.phase(), Phase::Active { action: Action::Jump });

        debouncer.step(fire(Action::MountainClimber, 2));
        debouncer.step(Verdict::UNKNOWN);
        assert_eq!(
            debouncer.phase(),
            Phase::Holding {
                action: Action::MountainClimber,
                remaining_hold: 1
            }
        );
        debouncer.step(Verdict::UNKNOWN);
        assert_eq!(
            debouncer.phase(),
            Phase::Active {
                action: Action::MountainClimber
            }
        );
        debouncer.step(Verdict::UNKNOWN);
        assert_eq!(debouncer.phase(), Phase::Idle);
    }

    #[test]
    fn refiring_rearms_the_hold() {
        let mut debouncer = Debouncer::new();
        debouncer.step(fire(Action::MountainClimber, 2));
        debouncer.step(Verdict::UNKNOWN);
        assert_eq!(debouncer.remaining_hold(), 1);
        debouncer.step(fire(Action::MountainClimber, 2));
        assert_eq!(debouncer.remaining_hold(), 2);
        assert!(debouncer.holding_cooldown_action());
    }

    #[test]
    fn new_action_replaces_held_one() {
        let mut debouncer = Debouncer::new();
        debouncer.step(fire(Action::Crouch, 8));
        assert_eq!(debouncer.step(fire(Action::MountainClimber, 2)), Action::MountainClimber);
        assert_eq!(
            debouncer.phase(),
            Phase::Holding {
                action: Action::MountainClimber,
                remaining_hold: 2
            }
        );
    }
}
