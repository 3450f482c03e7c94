// src/frame.rs - Per-frame joint angle record with presence-checked access
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    LeftKneeAngle,
    RightKneeAngle,
    LeftHipAngle,
    RightHipAngle,
    LeftElbowAngle,
    RightElbowAngle,
    LeftShoulderAngle,
    RightShoulderAngle,
    LeftAnkleAngle,
    RightAnkleAngle,
    LeftHipY,
    RightHipY,
    LeftShoulderY,
    RightShoulderY,
    /// Pitch: angle at the ear midpoint between the shoulder midpoint and the nose.
    HeadTiltAngle,
    /// Yaw relative to the shoulder line, positive toward the right shoulder.
    HeadTurnAngle,
    /// Roll: ear line against shoulder line, positive when the right ear drops.
    NeckAngle,
}

impl Feature {
    pub const ALL: [Feature; 17] = [
        Feature::LeftKneeAngle,
        Feature::RightKneeAngle,
        Feature::LeftHipAngle,
        Feature::RightHipAngle,
        Feature::LeftElbowAngle,
        Feature::RightElbowAngle,
        Feature::LeftShoulderAngle,
        Feature::RightShoulderAngle,
        Feature::LeftAnkleAngle,
        Feature::RightAnkleAngle,
        Feature::LeftHipY,
        Feature::RightHipY,
        Feature::LeftShoulderY,
        Feature::RightShoulderY,
        Feature::HeadTiltAngle,
        Feature::HeadTurnAngle,
        Feature::NeckAngle,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Feature::LeftKneeAngle => "left_knee_angle",
            Feature::RightKneeAngle => "right_knee_angle",
            Feature::LeftHipAngle => "left_hip_angle",
            Feature::RightHipAngle => "right_hip_angle",
            Feature::LeftElbowAngle => "left_elbow_angle",
            Feature::RightElbowAngle => "right_elbow_angle",
            Feature::LeftShoulderAngle => "left_shoulder_angle",
            Feature::RightShoulderAngle => "right_shoulder_angle",
            Feature::LeftAnkleAngle => "left_ankle_angle",
            Feature::RightAnkleAngle => "right_ankle_angle",
            Feature::LeftHipY => "left_hip_y",
            Feature::RightHipY => "right_hip_y",
            Feature::LeftShoulderY => "left_shoulder_y",
            Feature::RightShoulderY => "right_shoulder_y",
            Feature::HeadTiltAngle => "head_tilt_angle",
            Feature::HeadTurnAngle => "head_turn_angle",
            Feature::NeckAngle => "neck_angle",
        }
    }

    pub fn from_name(name: &str) -> Option<Feature> {
        Feature::ALL.iter().copied().find(|f| f.name() == name)
    }

    /// Inclusive range of physically meaningful values.
    pub fn valid_range(&self) -> (f64, f64) {
        match self {
            Feature::LeftHipY
            | Feature::RightHipY
            | Feature::LeftShoulderY
            | Feature::RightShoulderY => (0.0, 1.0),
            Feature::HeadTurnAngle => (-90.0, 90.0),
            Feature::NeckAngle => (-180.0, 180.0),
            _ => (0.0, 180.0),
        }
    }

    fn accepts(&self, value: f64) -> bool {
        let (lo, hi) = self.valid_range();
        value.is_finite() && value >= lo && value <= hi
    }
}

/// One frame of measurements for one track.
///
/// Values that are non-finite or outside [`Feature::valid_range`] are dropped on the
/// way in, so every value a rule reads through [`FeatureFrame::get`] is usable.
/// Unrecognised keys are discarded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, Option<f64>>", into = "HashMap<String, f64>")]
pub struct FeatureFrame {
    values: HashMap<Feature, f64>,
}

impl FeatureFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Malformed values leave the feature absent.
    pub fn with(mut self, feature: Feature, value: f64) -> Self {
        self.insert(feature, value);
        self
    }

    fn insert(&mut self, feature: Feature, value: f64) {
        if feature.accepts(value) {
            self.values.insert(feature, value);
        } else {
            self.values.remove(&feature);
            tracing::trace!(feature = feature.name(), value, "dropping malformed feature value");
        }
    }

    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.values.get(&feature).copied()
    }

    /// Both values, or None if either side is missing.
    pub fn pair(&self, left: Feature, right: Feature) -> Option<(f64, f64)> {
        Some((self.get(left)?, self.get(right)?))
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.values.contains_key(&feature)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mean of the hip heights that are present.
    pub fn hip_height(&self) -> Option<f64> {
        mean_of(self.get(Feature::LeftHipY), self.get(Feature::RightHipY))
    }

    pub fn shoulder_height(&self) -> Option<f64> {
        mean_of(self.get(Feature::LeftShoulderY), self.get(Feature::RightShoulderY))
    }

    /// Vertical shoulder-to-hip distance, used as the body-size reference.
    pub fn torso_size(&self) -> Option<f64> {
        Some((self.hip_height()? - self.shoulder_height()?).abs())
    }
}

fn mean_of(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some((a + b) / 2.0),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}

impl From<HashMap<String, Option<f64>>> for FeatureFrame {
    fn from(raw: HashMap<String, Option<f64>>) -> Self {
        let mut frame = FeatureFrame::new();
        for (name, value) in raw {
            match (Feature::from_name(&name), value) {
                (Some(feature), Some(value)) => frame.insert(feature, value),
                (None, _) => tracing::trace!(key = %name, "ignoring unrecognised feature"),
                (Some(_), None) => {}
            }
        }
        frame
    }
}

impl From<HashMap<String, f64>> for FeatureFrame {
    fn from(raw: HashMap<String, f64>) -> Self {
        raw.into_iter()
            .map(|(k, v)| (k, Some(v)))
            .collect::<HashMap<_, _>>()
            .into()
    }
}

impl From<FeatureFrame> for HashMap<String, f64> {
    fn from(frame: FeatureFrame) -> Self {
        frame
            .values
            .into_iter()
            .map(|(f, v)| (f.name().to_string(), v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_values_are_absent() {
        let frame = FeatureFrame::new()
            .with(Feature::LeftKneeAngle, f64::NAN)
            .with(Feature::RightKneeAngle, 200.0)
            .with(Feature::LeftHipY, 1.4)
            .with(Feature::LeftElbowAngle, 170.0);

        assert_eq!(frame.get(Feature::LeftKneeAngle), None);
        assert_eq!(frame.get(Feature::RightKneeAngle), None);
        assert_eq!(frame.get(Feature::LeftHipY), None);
        assert_eq!(frame.get(Feature::LeftElbowAngle), Some(170.0));
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn json_null_means_absent() {
        let frame: FeatureFrame = serde_json::from_str(
            r#"{"left_knee_angle": 100.0, "right_knee_angle": null, "nose_x": 0.4}"#,
        )
        .unwrap();
        assert_eq!(frame.get(Feature::LeftKneeAngle), Some(100.0));
        assert!(!frame.contains(Feature::RightKneeAngle));
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn torso_size_uses_available_sides() {
        let frame = FeatureFrame::new()
            .with(Feature::LeftHipY, 0.6)
            .with(Feature::LeftShoulderY, 0.3)
            .with(Feature::RightShoulderY, 0.32);
        assert!((frame.torso_size().unwrap() - 0.29).abs() < 1e-9);

        let no_hips = FeatureFrame::new().with(Feature::LeftShoulderY, 0.3);
        assert_eq!(no_hips.torso_size(), None);
    }

    #[test]
    fn signed_head_angles_keep_their_sign() {
        let frame: FeatureFrame =
            serde_json::from_str(r#"{"head_turn_angle": -30.0, "neck_angle": -200.0}"#).unwrap();
        assert_eq!(frame.get(Feature::HeadTurnAngle), Some(-30.0));
        assert_eq!(frame.get(Feature::NeckAngle), None);
    }

    #[test]
    fn malformed_value_clears_an_earlier_one() {
        let frame = FeatureFrame::new()
            .with(Feature::RightKneeAngle, 95.0)
            .with(Feature::RightKneeAngle, f64::INFINITY);
        assert!(!frame.contains(Feature::RightKneeAngle));
    }

    #[test]
    fn pair_requires_both_sides() {
        let frame = FeatureFrame::new().with(Feature::LeftKneeAngle, 90.0);
        assert_eq!(frame.pair(Feature::LeftKneeAngle, Feature::RightKneeAngle), None);
    }
}
