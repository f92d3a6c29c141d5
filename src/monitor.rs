//! Per-frame entry point combining the tracker and scene memory.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::memory::{MemoryConfig, ObjectMemory, SceneEvent};
use crate::tracker::{Detection, IouTracker, RejectedDetection, Track, TrackerConfig};

/// Full configuration surface of the core.
///
/// When deserialized, a missing `tracker.max_lost_age` is taken from
/// `memory.memory_frames`, the same derivation as
/// [`MonitorConfig::with_memory_frames`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "MonitorConfigFile")]
pub struct MonitorConfig {
    pub tracker: TrackerConfig,
    pub memory: MemoryConfig,
}

impl MonitorConfig {
    /// Set the memory window and derive the lost-track budget from it.
    pub fn with_memory_frames(mut self, memory_frames: u32) -> Self {
        self.memory.memory_frames = memory_frames;
        self.tracker.max_lost_age = memory_frames;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.tracker.validate()?;
        self.memory.validate()
    }
}

/// On-disk shape of [`MonitorConfig`]; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MonitorConfigFile {
    tracker: TrackerSection,
    memory: MemoryConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TrackerSection {
    min_hits: u32,
    max_tentative_age: u32,
    max_lost_age: Option<u32>,
    match_thresh: f32,
    trajectory_len: usize,
}

impl Default for TrackerSection {
    fn default() -> Self {
        let defaults = TrackerConfig::default();
        Self {
            min_hits: defaults.min_hits,
            max_tentative_age: defaults.max_tentative_age,
            max_lost_age: None,
            match_thresh: defaults.match_thresh,
            trajectory_len: defaults.trajectory_len,
        }
    }
}

impl From<MonitorConfigFile> for MonitorConfig {
    fn from(file: MonitorConfigFile) -> Self {
        let MonitorConfigFile { tracker, memory } = file;
        Self {
            tracker: TrackerConfig {
                min_hits: tracker.min_hits,
                max_tentative_age: tracker.max_tentative_age,
                max_lost_age: tracker.max_lost_age.unwrap_or(memory.memory_frames),
                match_thresh: tracker.match_thresh,
                trajectory_len: tracker.trajectory_len,
            },
            memory,
        }
    }
}

/// Output of one processed frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub frame_index: u64,
    /// Live tracks in id order, for drawing
    pub tracks: Vec<Track>,
    /// Missing/New events raised by this frame
    pub events: Vec<SceneEvent>,
    /// Detections dropped as malformed
    pub rejected: Vec<RejectedDetection>,
}

/// Owns the tracker and memory for one video stream.
///
/// Call [`SceneMonitor::process_frame`] once per frame with strictly
/// increasing frame indices. Independent streams use independent
/// monitors; nothing is shared between instances.
#[derive(Debug, Clone)]
pub struct SceneMonitor {
    tracker: IouTracker,
    memory: ObjectMemory,
}

impl SceneMonitor {
    pub fn new(config: MonitorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tracker: IouTracker::new(config.tracker)?,
            memory: ObjectMemory::new(config.memory)?,
        })
    }

    pub fn process_frame(
        &mut self,
        frame_index: u64,
        detections: &[Detection],
    ) -> Result<FrameReport> {
        let output = self.tracker.update(frame_index, detections)?;
        let events = self.memory.process(frame_index, &output.events);
        Ok(FrameReport {
            frame_index,
            tracks: output.tracks,
            events,
            rejected: output.rejected,
        })
    }

    /// Measure box areas against a new frame size, e.g. when the source
    /// resolution is only known once frames arrive.
    pub fn set_frame_size(&mut self, width: f32, height: f32) -> Result<()> {
        Ok(self.memory.set_frame_size(width, height)?)
    }

    pub fn tracker(&self) -> &IouTracker {
        &self.tracker
    }

    pub fn memory(&self) -> &ObjectMemory {
        &self.memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_with_memory_frames_derives_lost_age() {
        let config = MonitorConfig::default().with_memory_frames(45);
        assert_eq!(config.memory.memory_frames, 45);
        assert_eq!(config.tracker.max_lost_age, 45);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut config = MonitorConfig::default();
        config.memory.min_confidence = 2.0;
        assert!(matches!(
            SceneMonitor::new(config),
            Err(Error::Config(ConfigError::OutOfUnitRange {
                name: "min_confidence",
                ..
            }))
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: MonitorConfig =
            serde_json::from_str(r#"{"tracker": {"min_hits": 3}, "memory": {"memory_frames": 50}}"#)
                .unwrap();
        assert_eq!(config.tracker.min_hits, 3);
        assert_eq!(config.tracker.match_thresh, 0.3);
        assert_eq!(config.memory.memory_frames, 50);
        assert_eq!(config.memory.min_persistence_frames, 10);
        assert_eq!(config.tracker.max_lost_age, 50);
    }

    #[test]
    fn test_explicit_max_lost_age_is_kept() {
        let config: MonitorConfig = serde_json::from_str(
            r#"{"tracker": {"max_lost_age": 12}, "memory": {"memory_frames": 50}}"#,
        )
        .unwrap();
        assert_eq!(config.tracker.max_lost_age, 12);

        let config: MonitorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = MonitorConfig::default().with_memory_frames(45);
        let json = serde_json::to_string(&config).unwrap();
        let back: MonitorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_empty_frames_are_fine() {
        let mut monitor = SceneMonitor::new(MonitorConfig::default()).unwrap();
        for frame in 0..5 {
            let report = monitor.process_frame(frame, &[]).unwrap();
            assert!(report.tracks.is_empty());
            assert!(report.events.is_empty());
        }
    }
}
