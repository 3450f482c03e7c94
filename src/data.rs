// src/data.rs - Session recording and CSV / JSON export of classified frames
use chrono::Local;
use csv::Writer;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::action::{Action, RepCounts};
use crate::error::ExportError;
use crate::tracker::{ActionRecord, TrackId};

#[derive(Debug, Serialize)]
struct ActionRow {
    frame: u64,
    timestamp: f64,
    track_id: u32,
    action: &'static str,
    speed: f64,
    crouch_reps: u32,
    mountain_climber_reps: u32,
    run_reps: u32,
    jump_reps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSummary {
    pub track_id: TrackId,
    pub rep_counts: RepCounts,
    /// Frames spent in each stable label, keyed by label name.
    pub frames_per_action: BTreeMap<&'static str, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session: String,
    pub total_frames: u64,
    pub tracks: Vec<TrackSummary>,
}

struct Entry {
    frame: u64,
    timestamp: f64,
    record: ActionRecord,
}

pub struct SessionRecorder {
    output_dir: PathBuf,
    session_name: String,
    entries: Vec<Entry>,
}

impl SessionRecorder {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name.unwrap_or_else(|| {
            format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"))
        });

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            entries: Vec::new(),
        }
    }

    /// `~/Documents/ActionTracker`, or `./output` when there is no documents folder.
    pub fn default_output_dir() -> PathBuf {
        directories::UserDirs::new()
            .and_then(|dirs| dirs.document_dir().map(|p| p.join("ActionTracker")))
            .unwrap_or_else(|| PathBuf::from("./output"))
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn session_dir(&self) -> PathBuf {
        self.output_dir.join(&self.session_name)
    }

    pub fn add_frame(&mut self, frame: u64, timestamp: f64, records: &[ActionRecord]) {
        self.entries.extend(records.iter().map(|record| Entry {
            frame,
            timestamp,
            record: record.clone(),
        }));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn export_csv(&self) -> Result<PathBuf, ExportError> {
        if self.entries.is_empty() {
            return Err(ExportError::Empty);
        }
        let csv_path = self.session_dir().join("actions.csv");
        std::fs::create_dir_all(self.session_dir())?;

        let file = File::create(&csv_path)?;
        let mut writer = Writer::from_writer(file);
        for entry in &self.entries {
            let reps = entry.record.rep_counts;
            writer.serialize(ActionRow {
                frame: entry.frame,
                timestamp: entry.timestamp,
                track_id: entry.record.track_id.0,
                action: entry.record.action.as_str(),
                speed: entry.record.action.nominal_speed(),
                crouch_reps: reps.crouch,
                mountain_climber_reps: reps.mountain_climber,
                run_reps: reps.run,
                jump_reps: reps.jump,
            })?;
        }
        writer.flush()?;

        tracing::info!(path = %csv_path.display(), rows = self.entries.len(), "exported action CSV");
        Ok(csv_path)
    }

    pub fn summary(&self) -> SessionSummary {
        let mut tracks: BTreeMap<TrackId, TrackSummary> = BTreeMap::new();
        let mut frames = std::collections::BTreeSet::new();

        for entry in &self.entries {
            frames.insert(entry.frame);
            let summary = tracks
                .entry(entry.record.track_id)
                .or_insert_with(|| TrackSummary {
                    track_id: entry.record.track_id,
                    rep_counts: RepCounts::default(),
                    frames_per_action: BTreeMap::new(),
                });
            // counts only grow, so the latest record carries the totals
            summary.rep_counts = entry.record.rep_counts;
            *summary
                .frames_per_action
                .entry(entry.record.action.as_str())
                .or_insert(0) += 1;
        }

        SessionSummary {
            session: self.session_name.clone(),
            total_frames: frames.len() as u64,
            tracks: tracks.into_values().collect(),
        }
    }

    pub fn export_summary(&self) -> Result<PathBuf, ExportError> {
        if self.entries.is_empty() {
            return Err(ExportError::Empty);
        }
        let path = self.session_dir().join("summary.json");
        std::fs::create_dir_all(self.session_dir())?;
        std::fs::write(&path, serde_json::to_string_pretty(&self.summary())?)?;

        tracing::info!(path = %path.display(), "exported session summary");
        Ok(path)
    }
}

impl TrackSummary {
    pub fn frames_in(&self, action: Action) -> u64 {
        self.frames_per_action
            .get(action.as_str())
            .copied()
            .unwrap_or(0)
    }
}
