// src/tracker.rs - Independent per-body classification state and the orchestrator that owns it
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::time::Instant;

use crate::action::{Action, RepCounts};
use crate::arbiter::Arbiter;
use crate::config::ClassifierConfig;
use crate::error::TrackerError;
use crate::frame::FeatureFrame;
use crate::history::HistoryBuffer;
use crate::hysteresis::Debouncer;
use crate::reps::RepCounter;
use crate::rules::RuleContext;

const METRICS_WINDOW: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What downstream consumers get for one track on one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub track_id: TrackId,
    pub action: Action,
    pub rep_counts: RepCounts,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackDebugInfo {
    pub buffer_len: usize,
    pub raw_action: Action,
    pub stable_action: Action,
    pub previous_stable_action: Action,
    pub remaining_hold: u32,
    pub cooldown_active: bool,
    pub frames_processed: u64,
}

#[derive(Debug, Clone)]
pub struct Track {
    id: TrackId,
    history: HistoryBuffer,
    debouncer: Debouncer,
    reps: RepCounter,
    last_raw: Action,
    frames_processed: u64,
}

impl Track {
    pub fn new(id: TrackId, history_capacity: usize) -> Self {
        Self {
            id,
            history: HistoryBuffer::new(history_capacity),
            debouncer: Debouncer::new(),
            reps: RepCounter::new(),
            last_raw: Action::Unknown,
            frames_processed: 0,
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    /// Run and jump stay suppressed right after a crouch or mountain climber.
    /// Looks at the state left by the previous frame.
    pub fn cooldown_active(&self) -> bool {
        self.reps.previous_stable().triggers_cooldown() || self.debouncer.holding_cooldown_action()
    }

    pub fn process(
        &mut self,
        frame: FeatureFrame,
        arbiter: &Arbiter,
        config: &ClassifierConfig,
    ) -> ActionRecord {
        self.history.push(frame);
        self.frames_processed += 1;

        let ctx = RuleContext {
            history: &self.history,
            config,
            cooldown: self.cooldown_active(),
        };

        let verdict = match arbiter.decide(&ctx) {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(track = %self.id, error = %e, "rule evaluation failed, reporting unknown");
                self.last_raw = Action::Unknown;
                self.debouncer.reset();
                self.reps.observe(Action::Unknown);
                return self.record(Action::Unknown);
            }
        };
        self.last_raw = verdict.action;
        tracing::trace!(track = %self.id, raw = %verdict.action, "raw label");

        let before = self.debouncer.stable();
        let stable = self.debouncer.step(verdict);
        if stable != before {
            tracing::debug!(track = %self.id, from = %before, to = %stable, "stable label changed");
        }

        if self.reps.observe(stable) {
            tracing::info!(
                track = %self.id,
                action = %stable,
                reps = self.reps.counts().get(stable),
                "repetition counted"
            );
        }

        self.record(stable)
    }

    fn record(&self, action: Action) -> ActionRecord {
        ActionRecord {
            track_id: self.id,
            action,
            rep_counts: self.reps.counts(),
        }
    }

    /// Current output without consuming a frame.
    pub fn snapshot(&self) -> ActionRecord {
        self.record(self.debouncer.stable())
    }

    pub fn rep_counts(&self) -> RepCounts {
        self.reps.counts()
    }

    pub fn debug_info(&self) -> TrackDebugInfo {
        TrackDebugInfo {
            buffer_len: self.history.len(),
            raw_action: self.last_raw,
            stable_action: self.debouncer.stable(),
            previous_stable_action: self.reps.previous_stable(),
            remaining_hold: self.debouncer.remaining_hold(),
            cooldown_active: self.cooldown_active(),
            frames_processed: self.frames_processed,
        }
    }

    /// Drops the window and any hold, keeps the repetition totals.
    pub fn reset(&mut self) {
        self.history.clear();
        self.debouncer.reset();
        self.reps.rearm();
        self.last_raw = Action::Unknown;
    }
}

#[derive(Debug, Clone)]
pub struct PerformanceMetrics {
    pub avg_processing_ms: f64,
    pub max_processing_ms: f64,
    pub ticks_processed: u64,
    pub ticks_over_budget: u64,
    tick_times: VecDeque<f64>,
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self {
            avg_processing_ms: 0.0,
            max_processing_ms: 0.0,
            ticks_processed: 0,
            ticks_over_budget: 0,
            tick_times: VecDeque::with_capacity(METRICS_WINDOW),
        }
    }

    fn record(&mut self, elapsed_ms: f64, budget_ms: f64) {
        self.tick_times.push_back(elapsed_ms);
        if self.tick_times.len() > METRICS_WINDOW {
            self.tick_times.pop_front();
        }
        self.avg_processing_ms = self.tick_times.iter().sum::<f64>() / self.tick_times.len() as f64;
        self.max_processing_ms = self.max_processing_ms.max(elapsed_ms);
        self.ticks_processed += 1;
        if elapsed_ms > budget_ms {
            self.ticks_over_budget += 1;
        }
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns one [`Track`] per tracked body and routes each frame to its track.
///
/// Tracks never read each other's state; a rule failure on one track turns into an
/// `unknown` record for that track only.
#[derive(Debug)]
pub struct ActionTracker {
    tracks: BTreeMap<TrackId, Track>,
    arbiter: Arbiter,
    config: ClassifierConfig,
    metrics: PerformanceMetrics,
}

impl ActionTracker {
    pub fn new(config: ClassifierConfig) -> Result<Self, TrackerError> {
        config.validate()?;
        Ok(Self {
            tracks: BTreeMap::new(),
            arbiter: Arbiter::from_config(&config),
            config,
            metrics: PerformanceMetrics::new(),
        })
    }

    /// Convenience for the split-frame setup: tracks 1..=count.
    pub fn with_tracks(config: ClassifierConfig, count: u32) -> Result<Self, TrackerError> {
        let mut tracker = Self::new(config)?;
        for id in 1..=count {
            tracker.register(TrackId(id))?;
        }
        Ok(tracker)
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn register(&mut self, id: TrackId) -> Result<(), TrackerError> {
        if self.tracks.contains_key(&id) {
            return Err(TrackerError::DuplicateTrack(id));
        }
        tracing::debug!(track = %id, "track registered");
        self.tracks
            .insert(id, Track::new(id, self.config.history_capacity));
        Ok(())
    }

    /// Registers `id` if this is the first time it is seen.
    pub fn ensure_track(&mut self, id: TrackId) -> &mut Track {
        let capacity = self.config.history_capacity;
        self.tracks.entry(id).or_insert_with(|| {
            tracing::debug!(track = %id, "track registered");
            Track::new(id, capacity)
        })
    }

    /// Stops tracking `id`, handing back its final totals.
    pub fn end_track(&mut self, id: TrackId) -> Option<RepCounts> {
        let track = self.tracks.remove(&id)?;
        tracing::debug!(track = %id, "track ended");
        Some(track.rep_counts())
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn track_ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.tracks.keys().copied()
    }

    pub fn process(&mut self, id: TrackId, frame: FeatureFrame) -> Result<ActionRecord, TrackerError> {
        let track = self
            .tracks
            .get_mut(&id)
            .ok_or(TrackerError::UnknownTrack(id))?;
        Ok(track.process(frame, &self.arbiter, &self.config))
    }

    /// Processes one frame tick for every track present in `frames`.
    /// Frames for unregistered tracks are skipped.
    pub fn process_tick<I>(&mut self, frames: I) -> Vec<ActionRecord>
    where
        I: IntoIterator<Item = (TrackId, FeatureFrame)>,
    {
        let start = Instant::now();
        let mut records = Vec::new();

        for (id, frame) in frames {
            match self.process(id, frame) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(error = %e, "skipping frame"),
            }
        }

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.metrics.record(elapsed_ms, self.config.frame_budget_ms);
        if elapsed_ms > self.config.frame_budget_ms {
            tracing::warn!(
                elapsed_ms,
                budget_ms = self.config.frame_budget_ms,
                "frame tick exceeded its budget"
            );
        }

        records
    }

    pub fn snapshot(&self, id: TrackId) -> Option<ActionRecord> {
        self.tracks.get(&id).map(Track::snapshot)
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    pub fn reset(&mut self, id: TrackId) -> Result<(), TrackerError> {
        self.tracks
            .get_mut(&id)
            .ok_or(TrackerError::UnknownTrack(id))?
            .reset();
        Ok(())
    }
}
