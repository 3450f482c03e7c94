// src/angles.rs - Joint angles from MediaPipe pose landmarks
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::frame::{Feature, FeatureFrame};

// MediaPipe pose landmark indices
const NOSE: usize = 0;
const LEFT_EAR: usize = 7;
const RIGHT_EAR: usize = 8;
const LEFT_SHOULDER: usize = 11;
const RIGHT_SHOULDER: usize = 12;
const LEFT_ELBOW: usize = 13;
const RIGHT_ELBOW: usize = 14;
const LEFT_WRIST: usize = 15;
const RIGHT_WRIST: usize = 16;
const LEFT_HIP: usize = 23;
const RIGHT_HIP: usize = 24;
const LEFT_KNEE: usize = 25;
const RIGHT_KNEE: usize = 26;
const LEFT_ANKLE: usize = 27;
const RIGHT_ANKLE: usize = 28;
const LEFT_FOOT_INDEX: usize = 31;
const RIGHT_FOOT_INDEX: usize = 32;

pub const POSE_LANDMARK_COUNT: usize = 33;

/// Landmarks the detector is less sure about than this are treated as missing.
pub const MIN_VISIBILITY: f64 = 0.3;

/// One normalized pose landmark; `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default = "full_visibility")]
    pub visibility: f64,
}

fn full_visibility() -> f64 {
    1.0
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            visibility: 1.0,
        }
    }

    fn usable(&self) -> Option<Vector2<f64>> {
        let ok = self.x.is_finite() && self.y.is_finite() && self.visibility >= MIN_VISIBILITY;
        ok.then(|| Vector2::new(self.x, self.y))
    }
}

/// (feature, first point, vertex, third point)
const ANGLE_TRIPLETS: [(Feature, usize, usize, usize); 10] = [
    (Feature::LeftKneeAngle, LEFT_HIP, LEFT_KNEE, LEFT_ANKLE),
    (Feature::RightKneeAngle, RIGHT_HIP, RIGHT_KNEE, RIGHT_ANKLE),
    (Feature::LeftHipAngle, LEFT_SHOULDER, LEFT_HIP, LEFT_KNEE),
    (Feature::RightHipAngle, RIGHT_SHOULDER, RIGHT_HIP, RIGHT_KNEE),
    (Feature::LeftElbowAngle, LEFT_SHOULDER, LEFT_ELBOW, LEFT_WRIST),
    (Feature::RightElbowAngle, RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_WRIST),
    (Feature::LeftShoulderAngle, LEFT_ELBOW, LEFT_SHOULDER, LEFT_HIP),
    (Feature::RightShoulderAngle, RIGHT_ELBOW, RIGHT_SHOULDER, RIGHT_HIP),
    (Feature::LeftAnkleAngle, LEFT_KNEE, LEFT_ANKLE, LEFT_FOOT_INDEX),
    (Feature::RightAnkleAngle, RIGHT_KNEE, RIGHT_ANKLE, RIGHT_FOOT_INDEX),
];

const HEIGHTS: [(Feature, usize); 4] = [
    (Feature::LeftHipY, LEFT_HIP),
    (Feature::RightHipY, RIGHT_HIP),
    (Feature::LeftShoulderY, LEFT_SHOULDER),
    (Feature::RightShoulderY, RIGHT_SHOULDER),
];

/// Angle at `b` in degrees, or None for a zero-length segment.
pub fn joint_angle(a: Vector2<f64>, b: Vector2<f64>, c: Vector2<f64>) -> Option<f64> {
    let ba = a - b;
    let bc = c - b;
    let (mag_ba, mag_bc) = (ba.norm(), bc.norm());
    if mag_ba == 0.0 || mag_bc == 0.0 {
        return None;
    }
    let cos_angle = (ba.dot(&bc) / (mag_ba * mag_bc)).clamp(-1.0, 1.0);
    Some(cos_angle.acos().to_degrees().min(180.0))
}

fn wrap_degrees(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Head pitch, yaw and roll, all measured against the shoulders so a body that is
/// turned to the camera reads as looking straight ahead.
fn head_features(
    mut frame: FeatureFrame,
    nose: Vector2<f64>,
    (left_ear, right_ear): (Vector2<f64>, Vector2<f64>),
    (left_shoulder, right_shoulder): (Vector2<f64>, Vector2<f64>),
) -> FeatureFrame {
    let ear_mid = (left_ear + right_ear) / 2.0;
    let shoulder_mid = (left_shoulder + right_shoulder) / 2.0;
    if let Some(tilt) = joint_angle(shoulder_mid, ear_mid, nose) {
        frame = frame.with(Feature::HeadTiltAngle, tilt);
    }

    let ear_line = right_ear - left_ear;
    let shoulder_line = right_shoulder - left_shoulder;
    let (ear_width, shoulder_width) = (ear_line.norm(), shoulder_line.norm());
    if ear_width == 0.0 || shoulder_width == 0.0 {
        return frame;
    }

    // nose offset from the ear midpoint along the shoulder axis; half an ear width is 90°
    let offset = (nose - ear_mid).dot(&(shoulder_line / shoulder_width));
    let turn = (2.0 * offset / ear_width).clamp(-1.0, 1.0).asin().to_degrees();
    let roll = ear_line.y.atan2(ear_line.x) - shoulder_line.y.atan2(shoulder_line.x);

    frame
        .with(Feature::HeadTurnAngle, turn)
        .with(Feature::NeckAngle, wrap_degrees(roll.to_degrees()))
}

/// Builds a feature frame from one body's landmarks. Anything that cannot be
/// computed (missing, low-visibility or degenerate points) is left absent.
pub fn extract_features(landmarks: &[Landmark]) -> FeatureFrame {
    let point = |idx: usize| landmarks.get(idx).and_then(Landmark::usable);
    let mut frame = FeatureFrame::new();

    for (feature, a, b, c) in ANGLE_TRIPLETS {
        if let (Some(a), Some(b), Some(c)) = (point(a), point(b), point(c)) {
            if let Some(angle) = joint_angle(a, b, c) {
                frame = frame.with(feature, angle);
            }
        }
    }

    for (feature, idx) in HEIGHTS {
        if let Some(p) = point(idx) {
            frame = frame.with(feature, p.y);
        }
    }

    let ears = point(LEFT_EAR).zip(point(RIGHT_EAR));
    let shoulders = point(LEFT_SHOULDER).zip(point(RIGHT_SHOULDER));
    if let (Some(nose), Some(ears), Some(shoulders)) = (point(NOSE), ears, shoulders) {
        frame = head_features(frame, nose, ears, shoulders);
    }

    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standing_pose() -> Vec<Landmark> {
        let mut pose = vec![Landmark::new(0.5, 0.5); POSE_LANDMARK_COUNT];
        for (idx, x) in [
            (LEFT_SHOULDER, 0.45),
            (LEFT_ELBOW, 0.45),
            (LEFT_WRIST, 0.45),
            (LEFT_HIP, 0.46),
            (LEFT_KNEE, 0.46),
            (LEFT_ANKLE, 0.46),
        ] {
            pose[idx].x = x;
        }
        pose[LEFT_SHOULDER].y = 0.30;
        pose[LEFT_ELBOW].y = 0.45;
        pose[LEFT_WRIST].y = 0.60;
        pose[LEFT_HIP].y = 0.60;
        pose[LEFT_KNEE].y = 0.75;
        pose[LEFT_ANKLE].y = 0.90;
        pose
    }

    #[test]
    fn right_angle() {
        let angle = joint_angle(
            Vector2::new(1.0, 0.0),
            Vector2::new(0.0, 0.0),
            Vector2::new(0.0, 1.0),
        )
        .unwrap();
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn zero_length_segment_is_absent() {
        let p = Vector2::new(0.3, 0.3);
        assert_eq!(joint_angle(p, p, Vector2::new(0.0, 1.0)), None);
    }

    #[test]
    fn straight_leg_and_arm_read_as_180() {
        let frame = extract_features(&standing_pose());
        assert!((frame.get(Feature::LeftKneeAngle).unwrap() - 180.0).abs() < 1e-4);
        assert!((frame.get(Feature::LeftElbowAngle).unwrap() - 180.0).abs() < 1e-4);
        assert_eq!(frame.get(Feature::LeftHipY), Some(0.60));
        assert_eq!(frame.get(Feature::LeftShoulderY), Some(0.30));
    }

    #[test]
    fn low_visibility_landmark_drops_dependent_angles() {
        let mut pose = standing_pose();
        pose[LEFT_KNEE].visibility = 0.1;
        let frame = extract_features(&pose);
        assert_eq!(frame.get(Feature::LeftKneeAngle), None);
        assert_eq!(frame.get(Feature::LeftHipAngle), None);
        assert_eq!(frame.get(Feature::LeftAnkleAngle), None);
        assert!(frame.get(Feature::LeftElbowAngle).is_some());
    }

    #[test]
    fn short_landmark_list_yields_partial_frame() {
        let frame = extract_features(&standing_pose()[..20]);
        assert!(frame.get(Feature::LeftElbowAngle).is_some());
        assert_eq!(frame.get(Feature::LeftKneeAngle), None);
        assert_eq!(frame.get(Feature::LeftHipY), None);
    }

    fn head(nose: (f64, f64), ears: [(f64, f64); 2], shoulders: [(f64, f64); 2]) -> FeatureFrame {
        let mut pose = vec![Landmark::new(0.5, 0.5); POSE_LANDMARK_COUNT];
        for (idx, (x, y)) in [
            (NOSE, nose),
            (LEFT_EAR, ears[0]),
            (RIGHT_EAR, ears[1]),
            (LEFT_SHOULDER, shoulders[0]),
            (RIGHT_SHOULDER, shoulders[1]),
        ] {
            pose[idx] = Landmark::new(x, y);
        }
        extract_features(&pose)
    }

    const EARS: [(f64, f64); 2] = [(0.4, 0.3), (0.6, 0.3)];
    const SHOULDERS: [(f64, f64); 2] = [(0.35, 0.5), (0.65, 0.5)];

    #[test]
    fn head_straight_ahead() {
        let frame = head((0.5, 0.25), EARS, SHOULDERS);
        assert!(frame.get(Feature::HeadTurnAngle).unwrap().abs() < 1e-9);
        assert!(frame.get(Feature::NeckAngle).unwrap().abs() < 1e-9);
        assert!((frame.get(Feature::HeadTiltAngle).unwrap() - 180.0).abs() < 1e-4);
    }

    #[test]
    fn head_turn_is_signed_toward_the_shoulders() {
        let right = head((0.55, 0.25), EARS, SHOULDERS);
        assert!((right.get(Feature::HeadTurnAngle).unwrap() - 30.0).abs() < 1e-6);

        let left = head((0.45, 0.25), EARS, SHOULDERS);
        assert!((left.get(Feature::HeadTurnAngle).unwrap() + 30.0).abs() < 1e-6);
    }

    #[test]
    fn turned_body_with_head_in_line_reads_straight() {
        let frame = head((0.55, 0.25), [(0.45, 0.3), (0.65, 0.3)], [(0.4, 0.5), (0.7, 0.5)]);
        assert!(frame.get(Feature::HeadTurnAngle).unwrap().abs() < 1e-9);
    }

    #[test]
    fn dropping_the_right_ear_is_positive_roll() {
        let frame = head((0.5, 0.25), [(0.4, 0.3), (0.6, 0.5)], SHOULDERS);
        let roll = frame.get(Feature::NeckAngle).unwrap();
        assert!((roll - 45.0).abs() < 1e-6);
    }

    #[test]
    fn missing_nose_leaves_head_absent() {
        let mut pose = standing_pose();
        pose[NOSE].visibility = 0.0;
        let frame = extract_features(&pose);
        assert_eq!(frame.get(Feature::HeadTurnAngle), None);
        assert_eq!(frame.get(Feature::HeadTiltAngle), None);
    }
}
