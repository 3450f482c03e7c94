// src/action.rs
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[default]
    Unknown,
    Crouch,
    MountainClimber,
    Run,
    Jump,
}

impl Action {
    /// Every countable action, in arbitration priority order.
    pub const COUNTABLE: [Action; 4] = [
        Action::Crouch,
        Action::MountainClimber,
        Action::Run,
        Action::Jump,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Unknown => "unknown",
            Action::Crouch => "crouch",
            Action::MountainClimber => "mountain_climber",
            Action::Run => "run",
            Action::Jump => "jump",
        }
    }

    pub fn is_unknown(&self) -> bool {
        *self == Action::Unknown
    }

    /// Actions that put run and jump on cooldown while they are (or were just) stable.
    pub fn triggers_cooldown(&self) -> bool {
        matches!(self, Action::Crouch | Action::MountainClimber)
    }

    /// Nominal movement speed for the label, exported next to it.
    pub fn nominal_speed(&self) -> f64 {
        match self {
            Action::Run => 8.5,
            Action::MountainClimber => 6.0,
            Action::Jump => 5.0,
            Action::Crouch => 1.0,
            Action::Unknown => 0.0,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepCounts {
    pub crouch: u32,
    pub mountain_climber: u32,
    pub run: u32,
    pub jump: u32,
}

impl RepCounts {
    pub fn get(&self, action: Action) -> u32 {
        match action {
            Action::Crouch => self.crouch,
            Action::MountainClimber => self.mountain_climber,
            Action::Run => self.run,
            Action::Jump => self.jump,
            Action::Unknown => 0,
        }
    }

    /// Bumps the counter for `action`. Unknown is never counted.
    pub fn increment(&mut self, action: Action) {
        let slot = match action {
            Action::Crouch => &mut self.crouch,
            Action::MountainClimber => &mut self.mountain_climber,
            Action::Run => &mut self.run,
            Action::Jump => &mut self.jump,
            Action::Unknown => return,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn total(&self) -> u32 {
        Action::COUNTABLE.iter().map(|a| self.get(*a)).sum()
    }
}
