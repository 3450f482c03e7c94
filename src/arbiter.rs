// src/arbiter.rs - Priority table over the action rules
use crate::action::Action;
use crate::config::ClassifierConfig;
use crate::error::RuleError;
use crate::rules::{self, RuleContext, RuleFn, RuleOutcome};

#[derive(Clone, Copy)]
pub struct RuleEntry {
    /// Lower value wins.
    pub priority: u8,
    pub action: Action,
    pub evaluate: RuleFn,
    /// Frames the stable label is held after this rule stops firing.
    pub hold_frames: u32,
}

impl std::fmt::Debug for RuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEntry")
            .field("priority", &self.priority)
            .field("action", &self.action)
            .field("hold_frames", &self.hold_frames)
            .finish()
    }
}

/// The raw, pre-hysteresis decision for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub action: Action,
    pub hold_frames: u32,
}

impl Verdict {
    pub const UNKNOWN: Verdict = Verdict {
        action: Action::Unknown,
        hold_frames: 0,
    };
}

#[derive(Debug, Clone)]
pub struct Arbiter {
    table: Vec<RuleEntry>,
}

impl Arbiter {
    /// crouch > mountain_climber > run > jump, holds taken from the config.
    pub fn from_config(config: &ClassifierConfig) -> Self {
        let rules: [(Action, RuleFn); 4] = [
            (Action::Crouch, rules::crouch),
            (Action::MountainClimber, rules::mountain_climber),
            (Action::Run, rules::run),
            (Action::Jump, rules::jump),
        ];
        Self::with_table(
            rules
                .into_iter()
                .zip(0u8..)
                .map(|((action, evaluate), priority)| RuleEntry {
                    priority,
                    action,
                    evaluate,
                    hold_frames: config.holds.for_action(action),
                })
                .collect(),
        )
    }

    pub fn with_table(mut table: Vec<RuleEntry>) -> Self {
        table.sort_by_key(|entry| entry.priority);
        Self { table }
    }

    pub fn table(&self) -> &[RuleEntry] {
        &self.table
    }

    /// First rule in priority order that fires, or unknown.
    pub fn decide(&self, ctx: &RuleContext<'_>) -> Result<Verdict, RuleError> {
        for entry in &self.table {
            if (entry.evaluate)(ctx)?.fired {
                return Ok(Verdict {
                    action: entry.action,
                    hold_frames: entry.hold_frames,
                });
            }
        }
        Ok(Verdict::UNKNOWN)
    }

    /// Every rule's outcome, in priority order, for inspection.
    pub fn evaluate_all(&self, ctx: &RuleContext<'_>) -> Vec<(Action, Result<RuleOutcome, RuleError>)> {
        self.table
            .iter()
            .map(|entry| (entry.action, (entry.evaluate)(ctx)))
            .collect()
    }
}
