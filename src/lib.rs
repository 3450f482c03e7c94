// src/lib.rs
//! Per-track action classification over streams of skeletal joint angles.
//!
//! Each tracked body gets its own [`tracker::Track`]: frames go into a short history
//! window, a priority table of geometric rules picks a raw label, a hold/cooldown
//! debouncer stabilises it and a counter turns stable stretches into repetitions.
//!
//! ```
//! use action_tracker::{Action, ActionTracker, ClassifierConfig, Feature, FeatureFrame, TrackId};
//!
//! let mut tracker = ActionTracker::with_tracks(ClassifierConfig::default(), 2).unwrap();
//! let frame = FeatureFrame::new()
//!     .with(Feature::LeftKneeAngle, 100.0)
//!     .with(Feature::RightKneeAngle, 95.0);
//! let record = tracker.process(TrackId(1), frame).unwrap();
//! assert_eq!(record.action, Action::Crouch);
//! assert_eq!(record.rep_counts.crouch, 1);
//! ```

pub mod action;
pub mod angles;
pub mod arbiter;
pub mod config;
pub mod data;
pub mod error;
pub mod frame;
pub mod history;
pub mod hysteresis;
pub mod reps;
pub mod rules;
pub mod tracker;

pub use action::{Action, RepCounts};
pub use config::ClassifierConfig;
pub use error::{ConfigError, ExportError, RuleError, TrackerError};
pub use frame::{Feature, FeatureFrame};
pub use tracker::{ActionRecord, ActionTracker, Track, TrackId};
