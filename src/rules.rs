// src/rules.rs - Geometric predicates, one per action
//
// Every rule reads the track's window and returns whether it fired together with the
// signals it looked at. A feature that is absent simply makes the rule not fire.
use crate::action::Action;
use crate::config::{ClassifierConfig, JumpConfig, MountainClimberConfig};
use crate::error::RuleError;
use crate::frame::{Feature, FeatureFrame};
use crate::history::HistoryBuffer;

/// What a rule gets to see for one evaluation.
pub struct RuleContext<'a> {
    pub history: &'a HistoryBuffer,
    pub config: &'a ClassifierConfig,
    /// Run and jump are suppressed while crouch or mountain climber is (or was just) stable.
    pub cooldown: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub name: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOutcome {
    pub fired: bool,
    pub signals: Vec<Signal>,
}

impl RuleOutcome {
    fn signal(&mut self, name: &'static str, value: f64) {
        self.signals.push(Signal { name, value });
    }

    fn flag(&mut self, name: &'static str, value: bool) {
        self.signal(name, if value { 1.0 } else { 0.0 });
    }

    fn fire(mut self, fired: bool) -> Self {
        self.fired = fired;
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.signals.iter().find(|s| s.name == name).map(|s| s.value)
    }
}

pub type RuleFn = fn(&RuleContext<'_>) -> Result<RuleOutcome, RuleError>;

/// Straight arms plus shoulders hunched forward: the plank part of a mountain climber.
pub fn is_mountain_climber_pose(frame: &FeatureFrame, cfg: &MountainClimberConfig) -> bool {
    let straight_arms = frame
        .pair(Feature::LeftElbowAngle, Feature::RightElbowAngle)
        .is_some_and(|(l, r)| l > cfg.elbow_min && r > cfg.elbow_min);
    let hunched = frame
        .pair(Feature::LeftShoulderAngle, Feature::RightShoulderAngle)
        .is_some_and(|(l, r)| l < cfg.shoulder_max && r < cfg.shoulder_max);
    straight_arms && hunched
}

fn both_knees_below(frame: &FeatureFrame, limit: f64) -> bool {
    frame
        .pair(Feature::LeftKneeAngle, Feature::RightKneeAngle)
        .is_some_and(|(l, r)| l < limit && r < limit)
}

pub fn crouch(ctx: &RuleContext<'_>) -> Result<RuleOutcome, RuleError> {
    let mut out = RuleOutcome::default();
    let Some(latest) = ctx.history.latest() else {
        return Ok(out);
    };

    let Some((left, right)) = latest.pair(Feature::LeftKneeAngle, Feature::RightKneeAngle) else {
        return Ok(out);
    };
    out.signal("left_knee", left);
    out.signal("right_knee", right);

    let bent = left < ctx.config.crouch.knee_max && right < ctx.config.crouch.knee_max;
    // a plank with bent knees must not read as a crouch
    let plank = is_mountain_climber_pose(latest, &ctx.config.mountain_climber);
    out.flag("plank_pose", plank);

    Ok(out.fire(bent && !plank))
}

fn range_and_trend(values: &[f64]) -> Option<(f64, f64)> {
    let (first, last) = (values.first()?, values.last()?);
    if values.len() < 2 {
        return None;
    }
    let max = values.iter().copied().fold(f64::MIN, f64::max);
    let min = values.iter().copied().fold(f64::MAX, f64::min);
    Some((max - min, last - first))
}

pub fn mountain_climber(ctx: &RuleContext<'_>) -> Result<RuleOutcome, RuleError> {
    let cfg = &ctx.config.mountain_climber;
    let mut out = RuleOutcome::default();
    let Some(latest) = ctx.history.latest() else {
        return Ok(out);
    };

    let pose = is_mountain_climber_pose(latest, cfg);
    out.flag("plank_pose", pose);
    if !pose {
        return Ok(out);
    }

    // not enough history to judge the legs yet: the pose alone counts
    if ctx.history.len() < cfg.grace_frames {
        out.flag("grace", true);
        return Ok(out.fire(true));
    }

    let Some((left_hip, right_hip)) = latest.pair(Feature::LeftHipAngle, Feature::RightHipAngle)
    else {
        return Ok(out);
    };
    let asymmetry = (left_hip - right_hip).abs();
    out.signal("hip_asymmetry", asymmetry);
    if asymmetry <= cfg.hip_asymmetry_min {
        return Ok(out);
    }

    let window: Vec<&FeatureFrame> = ctx.history.last_n(cfg.hip_window).collect();
    let lefts: Vec<f64> = window.iter().filter_map(|f| f.get(Feature::LeftHipAngle)).collect();
    let rights: Vec<f64> = window.iter().filter_map(|f| f.get(Feature::RightHipAngle)).collect();
    let (Some((left_range, left_trend)), Some((right_range, right_trend))) =
        (range_and_trend(&lefts), range_and_trend(&rights))
    else {
        return Ok(out);
    };
    out.signal("left_hip_range", left_range);
    out.signal("right_hip_range", right_range);
    out.signal("left_hip_trend", left_trend);
    out.signal("right_hip_trend", right_trend);

    let ranging = left_range > cfg.hip_range_min || right_range > cfg.hip_range_min;
    let opposing = left_trend * right_trend < 0.0
        && left_trend.abs() > cfg.hip_trend_min
        && right_trend.abs() > cfg.hip_trend_min;

    Ok(out.fire(ranging || opposing))
}

pub fn run(ctx: &RuleContext<'_>) -> Result<RuleOutcome, RuleError> {
    let cfg = &ctx.config.run;
    let mut out = RuleOutcome::default();
    out.flag("cooldown", ctx.cooldown);
    let Some(latest) = ctx.history.latest() else {
        return Ok(out);
    };

    let Some((left, right)) = latest.pair(Feature::LeftKneeAngle, Feature::RightKneeAngle) else {
        return Ok(out);
    };
    let knee_diff = (left - right).abs();
    out.signal("knee_diff", knee_diff);
    let alternating = knee_diff > cfg.knee_diff_min;

    let no_elbows = !latest.contains(Feature::LeftElbowAngle)
        && !latest.contains(Feature::RightElbowAngle);
    let mut arm_delta: f64 = 0.0;
    if let Some(previous) = ctx.history.previous() {
        for side in [Feature::LeftElbowAngle, Feature::RightElbowAngle] {
            if let (Some(now), Some(before)) = (latest.get(side), previous.get(side)) {
                arm_delta = arm_delta.max((now - before).abs());
            }
        }
    }
    out.signal("elbow_delta", arm_delta);
    let arms_moving = no_elbows || arm_delta > cfg.elbow_delta_min;

    let squatting = left < cfg.deep_squat_knee_max && right < cfg.deep_squat_knee_max;
    let one_leg_extended = left > cfg.extended_knee_min || right > cfg.extended_knee_min;
    let running_position = !squatting && one_leg_extended;
    out.flag("running_position", running_position);

    Ok(out.fire(alternating && arms_moving && running_position && !ctx.cooldown))
}

/// Hip travel over one run of landmark frames, scaled by body size.
struct Displacement {
    rise_ratio: f64,
    torso_variation: f64,
}

/// `samples` are (hip height, torso size), oldest first. None when there are too few
/// of them or the torso is too small to scale by (a body lying flat, say).
fn displacement(samples: &[(f64, f64)], cfg: &JumpConfig) -> Option<Displacement> {
    let (&(latest_hip, _), earlier) = samples.split_last()?;
    if samples.len() < cfg.min_frames || earlier.is_empty() {
        return None;
    }

    let avg_torso = samples.iter().map(|(_, t)| t).sum::<f64>() / samples.len() as f64;
    if avg_torso < cfg.min_torso_size {
        tracing::trace!(avg_torso, "torso too small to scale hip travel");
        return None;
    }
    let max_torso = samples.iter().map(|(_, t)| *t).fold(f64::MIN, f64::max);
    let min_torso = samples.iter().map(|(_, t)| *t).fold(f64::MAX, f64::min);

    // image y grows downward, so the lowest stance is the largest earlier hip_y
    let baseline = earlier.iter().map(|(h, _)| *h).fold(f64::MIN, f64::max);
    Some(Displacement {
        rise_ratio: (baseline - latest_hip) / avg_torso,
        torso_variation: (max_torso - min_torso) / avg_torso,
    })
}

/// Fires on the frame where upward hip travel first crosses the threshold, not on
/// every frame the body stays in the air.
pub fn jump(ctx: &RuleContext<'_>) -> Result<RuleOutcome, RuleError> {
    let cfg = &ctx.config.jump;
    let mut out = RuleOutcome::default();
    out.flag("cooldown", ctx.cooldown);
    if ctx.cooldown {
        return Ok(out);
    }
    let Some(latest) = ctx.history.latest() else {
        return Ok(out);
    };
    if latest.hip_height().is_none() || latest.torso_size().is_none() {
        return Ok(out);
    }

    let samples: Vec<(f64, f64)> = ctx
        .history
        .iter()
        .filter_map(|f| Some((f.hip_height()?, f.torso_size()?)))
        .collect();
    out.signal("landmark_frames", samples.len() as f64);

    let Some(now) = displacement(&samples, cfg) else {
        return Ok(out);
    };
    if !now.rise_ratio.is_finite() {
        return Err(RuleError::NonFiniteSignal {
            rule: Action::Jump,
            signal: "rise_ratio",
        });
    }
    out.signal("rise_ratio", now.rise_ratio);
    out.signal("torso_variation", now.torso_variation);

    // same measurement one frame ago: already past the line means this is the same jump
    let already_rising = displacement(&samples[..samples.len() - 1], cfg)
        .is_some_and(|before| before.rise_ratio > cfg.rise_ratio_min);
    out.flag("already_rising", already_rising);

    let deep_crouch = both_knees_below(latest, cfg.deep_crouch_knee_max);
    let plank = is_mountain_climber_pose(latest, &ctx.config.mountain_climber);
    out.flag("deep_crouch", deep_crouch);
    out.flag("plank_pose", plank);

    let fired = now.rise_ratio > cfg.rise_ratio_min
        && !already_rising
        && now.torso_variation < cfg.torso_variation_max
        && !deep_crouch
        && !plank;
    Ok(out.fire(fired))
}
