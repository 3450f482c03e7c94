// src/main.rs - Replays recorded joint-angle frames through the classifier
use action_tracker::data::SessionRecorder;
use action_tracker::{ActionTracker, ClassifierConfig, FeatureFrame, TrackId};
use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "action_tracker", about = "Classify per-track joint angle frames into actions")]
struct Args {
    /// JSON Lines file, one frame tick per line; reads stdin when omitted
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,
    /// Classifier thresholds as JSON
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Write actions.csv and summary.json under DIR (default: ~/Documents/ActionTracker)
    #[arg(long, value_name = "DIR")]
    export: Option<Option<PathBuf>>,
    #[arg(long)]
    session: Option<String>,
    /// Frame rate used to timestamp lines that carry no timestamp of their own
    #[arg(long, default_value_t = 30.0)]
    fps: f64,
}

impl Args {
    fn export_dir(&self) -> Option<PathBuf> {
        self.export
            .clone()
            .map(|dir| dir.unwrap_or_else(SessionRecorder::default_output_dir))
    }
}

/// `{"frame": 12, "timestamp": 0.4, "tracks": {"1": {"left_knee_angle": 100.0, ...}, "2": {...}}}`
#[derive(Debug, Deserialize)]
struct TickLine {
    frame: Option<u64>,
    /// Capture time in seconds.
    timestamp: Option<f64>,
    tracks: BTreeMap<TrackId, FeatureFrame>,
}

impl TickLine {
    fn frame_index(&self, line_index: u64) -> u64 {
        self.frame.unwrap_or(line_index)
    }

    /// The line's own capture time, else the frame index at `fps`.
    fn capture_time(&self, line_index: u64, fps: f64) -> f64 {
        self.timestamp
            .unwrap_or_else(|| self.frame_index(line_index) as f64 / fps)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    anyhow::ensure!(
        args.fps.is_finite() && args.fps > 0.0,
        "--fps must be a positive number, got {}",
        args.fps
    );

    let config = match &args.config {
        Some(path) => ClassifierConfig::from_json_file(path)
            .with_context(|| format!("loading classifier config from {}", path.display()))?,
        None => ClassifierConfig::default(),
    };
    let mut tracker = ActionTracker::new(config).context("building action tracker")?;

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut recorder = args
        .export_dir()
        .map(|dir| SessionRecorder::new(dir, args.session.clone()));
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("reading input")?;
        if line.trim().is_empty() {
            continue;
        }
        let tick: TickLine = match serde_json::from_str(&line) {
            Ok(tick) => tick,
            Err(e) => {
                tracing::warn!(line = line_no + 1, error = %e, "skipping malformed line");
                continue;
            }
        };

        let frame = tick.frame_index(line_no as u64);
        let timestamp = tick.capture_time(line_no as u64, args.fps);

        for id in tick.tracks.keys() {
            tracker.ensure_track(*id);
        }
        let records = tracker.process_tick(tick.tracks);
        for record in &records {
            serde_json::to_writer(&mut out, record)?;
            writeln!(out)?;
        }

        if let Some(recorder) = recorder.as_mut() {
            recorder.add_frame(frame, timestamp, &records);
        }
    }
    out.flush()?;

    let metrics = tracker.metrics();
    tracing::info!(
        ticks = metrics.ticks_processed,
        avg_ms = metrics.avg_processing_ms,
        over_budget = metrics.ticks_over_budget,
        "replay finished"
    );

    if let Some(recorder) = recorder {
        if recorder.is_empty() {
            tracing::warn!("no frames classified, nothing exported");
        } else {
            let csv = recorder.export_csv().context("exporting action CSV")?;
            let summary = recorder.export_summary().context("exporting session summary")?;
            eprintln!("Exported {} and {}", csv.display(), summary.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("action_tracker").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn export_without_a_dir_uses_the_default_location() {
        let args = parse(&["--export"]);
        assert_eq!(args.export_dir(), Some(SessionRecorder::default_output_dir()));

        let args = parse(&["--export", "/tmp/replays"]);
        assert_eq!(args.export_dir(), Some(PathBuf::from("/tmp/replays")));

        assert_eq!(parse(&[]).export_dir(), None);
    }

    #[test]
    fn capture_time_prefers_the_line_timestamp() {
        let tick: TickLine =
            serde_json::from_str(r#"{"frame": 60, "timestamp": 12.5, "tracks": {}}"#).unwrap();
        assert_eq!(tick.capture_time(3, 30.0), 12.5);

        let tick: TickLine = serde_json::from_str(r#"{"frame": 60, "tracks": {}}"#).unwrap();
        assert_eq!(tick.capture_time(3, 30.0), 2.0);

        let tick: TickLine = serde_json::from_str(r#"{"tracks": {"1": {}}}"#).unwrap();
        assert_eq!(tick.frame_index(15), 15);
        assert_eq!(tick.capture_time(15, 30.0), 0.5);
    }
}
