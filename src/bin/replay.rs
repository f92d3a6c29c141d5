//! Replay a recorded detection log through the scene monitor.
//!
//! Input is JSON lines, one frame per line:
//!
//! ```text
//! {"frame_index": 0, "detections": [{"box": [x1, y1, x2, y2], "class_id": 0, "confidence": 0.91}]}
//! ```
//!
//! `frame_index` may be omitted, in which case lines are numbered in
//! order. Missing/New events are written to stdout as JSON lines by a
//! separate writer thread.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use serde::Deserialize;

use scenewatch_rs::integration::{DEFAULT_QUEUE_SIZE, Publish};
use scenewatch_rs::{DetectionBuilder, FrameReport, MonitorConfig, SceneMonitor, report_channel};

#[derive(Parser, Debug)]
#[command(name = "replay", about = "Detect missing and new objects in a recorded detection log")]
struct Args {
    /// JSON-lines detection log; stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,

    /// JSON file with a full or partial monitor configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to keep in memory (also the lost-track budget)
    #[arg(long)]
    memory_frames: Option<u32>,

    /// Minimum IoU for matching a detection to a track
    #[arg(long = "iou-thres")]
    iou_thres: Option<f32>,

    /// Matches needed to confirm a track
    #[arg(long)]
    min_hits: Option<u32>,

    #[arg(long)]
    frame_width: Option<f32>,

    #[arg(long)]
    frame_height: Option<f32>,

    /// Length of the queue between the tracker and the output writer
    #[arg(long, default_value_t = DEFAULT_QUEUE_SIZE)]
    queue_size: usize,

    /// Also write the live tracks of every frame
    #[arg(long)]
    tracks: bool,
}

#[derive(Debug, Deserialize)]
struct FrameRecord {
    frame_index: Option<u64>,
    #[serde(default)]
    detections: Vec<DetectionRecord>,
}

#[derive(Debug, Deserialize)]
struct DetectionRecord {
    #[serde(rename = "box")]
    bbox: [f32; 4],
    #[serde(default)]
    class_id: u32,
    confidence: f32,
}

fn load_config(args: &Args) -> Result<MonitorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening config {}", path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => MonitorConfig::default(),
    };

    if let Some(memory_frames) = args.memory_frames {
        config = config.with_memory_frames(memory_frames);
    }
    if let Some(iou_thres) = args.iou_thres {
        config.tracker.match_thresh = iou_thres;
    }
    if let Some(min_hits) = args.min_hits {
        config.tracker.min_hits = min_hits;
    }
    if let Some(width) = args.frame_width {
        config.memory.frame_width = width;
    }
    if let Some(height) = args.frame_height {
        config.memory.frame_height = height;
    }
    Ok(config)
}

fn write_report(out: &mut impl Write, report: &FrameReport, with_tracks: bool) -> io::Result<()> {
    for event in &report.events {
        serde_json::to_writer(&mut *out, event)?;
        out.write_all(b"\n")?;
    }
    if with_tracks {
        let line = serde_json::json!({
            "frame_index": report.frame_index,
            "tracks": report.tracks,
        });
        serde_json::to_writer(&mut *out, &line)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let mut monitor = SceneMonitor::new(config).context("invalid configuration")?;

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let (tx, rx) = report_channel(args.queue_size);
    let with_tracks = args.tracks;
    let writer = thread::spawn(move || -> io::Result<u64> {
        let mut out = BufWriter::new(io::stdout().lock());
        let mut events = 0u64;
        for report in rx {
            events += report.events.len() as u64;
            write_report(&mut out, &report, with_tracks)?;
        }
        out.flush()?;
        Ok(events)
    });

    let mut frames = 0u64;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("reading input")?;
        if line.trim().is_empty() {
            continue;
        }
        let record: FrameRecord = serde_json::from_str(&line)
            .with_context(|| format!("parsing line {}", line_no + 1))?;
        let frame_index = record.frame_index.unwrap_or(line_no as u64);
        let detections: Vec<_> = record
            .detections
            .iter()
            .map(|d| {
                let [x1, y1, x2, y2] = d.bbox;
                DetectionBuilder::new()
                    .tlbr(x1, y1, x2, y2)
                    .class_id(d.class_id)
                    .confidence(d.confidence)
                    .build()
            })
            .collect();

        let report = monitor
            .process_frame(frame_index, &detections)
            .with_context(|| format!("processing frame {frame_index}"))?;
        frames += 1;

        if tx.publish(report) == Publish::Disconnected {
            warn!("output writer stopped early");
            break;
        }
    }

    let dropped = tx.dropped();
    drop(tx);
    let events = writer
        .join()
        .map_err(|_| anyhow::anyhow!("output writer panicked"))?
        .context("writing output")?;

    info!("processed {frames} frames, {events} events written, {dropped} reports dropped");
    Ok(())
}
