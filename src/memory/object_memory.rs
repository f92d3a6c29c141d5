//! Scene memory: turns tracker lifecycle churn into Missing/New events.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::memory::event::{EventKind, SceneEvent};
use crate::memory::record::{MemoryRecord, RecordStatus};
use crate::tracker::{LifecycleEvent, Rect, RemovalReason, Track};

/// Configuration for [`ObjectMemory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Look-back window in frames
    pub memory_frames: u32,
    /// Box area over frame area a track must exceed to be significant
    pub min_area_fraction: f32,
    /// Frames between first and last sighting a track must exceed
    /// before its loss counts as Missing
    pub min_persistence_frames: u64,
    /// Latest detection confidence required for significance
    pub min_confidence: f32,
    pub frame_width: f32,
    pub frame_height: f32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            memory_frames: 30,
            min_area_fraction: 0.001,
            min_persistence_frames: 10,
            min_confidence: 0.5,
            frame_width: 1920.0,
            frame_height: 1080.0,
        }
    }
}

impl MemoryConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.memory_frames == 0 {
            return Err(ConfigError::NonPositive {
                name: "memory_frames",
            });
        }
        for (name, value) in [
            ("min_area_fraction", self.min_area_fraction),
            ("min_confidence", self.min_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { name, value });
            }
        }
        let (width, height) = (self.frame_width, self.frame_height);
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ConfigError::InvalidFrameSize { width, height });
        }
        Ok(())
    }

    fn frame_area(&self) -> f32 {
        self.frame_width * self.frame_height
    }
}

/// Receiver of tracker lifecycle signals.
pub trait LifecycleObserver {
    fn on_track_confirmed(&mut self, track: &Track, frame_index: u64);

    fn on_track_updated(&mut self, track: &Track, frame_index: u64);

    fn on_track_removed(&mut self, track: &Track, frame_index: u64, reason: RemovalReason);

    /// Dispatch a single event to the matching handler.
    fn observe(&mut self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::Confirmed { track, frame_index } => {
                self.on_track_confirmed(track, *frame_index)
            }
            LifecycleEvent::Updated { track, frame_index } => {
                self.on_track_updated(track, *frame_index)
            }
            LifecycleEvent::Removed {
                track,
                frame_index,
                reason,
            } => self.on_track_removed(track, *frame_index, *reason),
        }
    }
}

/// Bounded look-back memory over confirmed tracks.
///
/// A New event fires the first time a record becomes significant. A
/// Missing event fires when a significant record that persisted long
/// enough loses its track to expiry. Everything else is treated as
/// detector or tracker churn and suppressed.
#[derive(Debug, Clone)]
pub struct ObjectMemory {
    records: BTreeMap<u64, MemoryRecord>,
    pending: Vec<SceneEvent>,
    config: MemoryConfig,
}

impl ObjectMemory {
    pub fn new(config: MemoryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            records: BTreeMap::new(),
            pending: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Replace the frame dimensions significance is measured against.
    /// Records already flagged significant stay significant.
    pub fn set_frame_size(
        &mut self,
        width: f32,
        height: f32,
    ) -> std::result::Result<(), ConfigError> {
        if width == self.config.frame_width && height == self.config.frame_height {
            return Ok(());
        }
        let config = MemoryConfig {
            frame_width: width,
            frame_height: height,
            ..self.config.clone()
        };
        config.validate()?;
        debug!(
            "frame size {}x{} -> {width}x{height}",
            self.config.frame_width, self.config.frame_height
        );
        self.config = config;
        Ok(())
    }

    pub fn record(&self, track_id: u64) -> Option<&MemoryRecord> {
        self.records.get(&track_id)
    }

    /// Records in track id order.
    pub fn records(&self) -> impl Iterator<Item = &MemoryRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Apply one frame's lifecycle events, evict stale records and
    /// return the scene events they produced.
    pub fn process(&mut self, frame_index: u64, events: &[LifecycleEvent]) -> Vec<SceneEvent> {
        for event in events {
            self.observe(event);
        }
        self.evict(frame_index);
        std::mem::take(&mut self.pending)
    }

    fn is_significant(&self, bbox: &Rect, confidence: f32) -> bool {
        bbox.area() / self.config.frame_area() > self.config.min_area_fraction
            && confidence >= self.config.min_confidence
    }

    fn capacity(&self) -> usize {
        self.config.memory_frames as usize
    }

    /// Flag the record significant if it now qualifies, emitting New on
    /// the first flip.
    fn refresh_significance(&mut self, track_id: u64, frame_index: u64) {
        let Some(record) = self.records.get(&track_id) else {
            return;
        };
        if record.confirmed_significant
            || !self.is_significant(&record.last_bbox, record.last_confidence)
        {
            return;
        }
        let Some(record) = self.records.get_mut(&track_id) else {
            return;
        };
        record.confirmed_significant = true;
        let event = SceneEvent {
            kind: EventKind::New,
            track_id,
            class_id: record.class_id,
            bbox: record.last_bbox,
            frame_index,
        };
        info!("new object: track {track_id} (class {}) at frame {frame_index}", event.class_id);
        self.pending.push(event);
    }

    /// Drop finalized records once `memory_frames` frames have passed
    /// since their track was removed.
    fn evict(&mut self, frame_index: u64) {
        let horizon = u64::from(self.config.memory_frames);
        let before = self.records.len();
        self.records.retain(|_, record| match record.finalized_frame {
            Some(finalized) => frame_index.saturating_sub(finalized) <= horizon,
            None => true,
        });
        let evicted = before - self.records.len();
        if evicted > 0 {
            debug!("evicted {evicted} finalized records at frame {frame_index}");
        }
    }
}

impl LifecycleObserver for ObjectMemory {
    fn on_track_confirmed(&mut self, track: &Track, frame_index: u64) {
        if self.records.contains_key(&track.id) {
            warn!("track {} confirmed twice; keeping the existing record", track.id);
            return;
        }
        let record = MemoryRecord::new(track, frame_index, self.capacity());
        self.records.insert(track.id, record);
        self.refresh_significance(track.id, frame_index);
    }

    fn on_track_updated(&mut self, track: &Track, frame_index: u64) {
        let capacity = self.capacity();
        let Some(record) = self.records.get_mut(&track.id) else {
            warn!("update for unknown track {} at frame {frame_index}", track.id);
            return;
        };
        record.observe(track, frame_index, capacity);
        self.refresh_significance(track.id, frame_index);
    }

    fn on_track_removed(&mut self, track: &Track, frame_index: u64, reason: RemovalReason) {
        if reason == RemovalReason::Discarded {
            // Tentative tracks never reach memory; drop anything stale just in case.
            self.records.remove(&track.id);
            debug!("track {} discarded as noise at frame {frame_index}", track.id);
            return;
        }

        let min_persistence = self.config.min_persistence_frames;
        let Some(record) = self.records.get_mut(&track.id) else {
            warn!("removal of unknown track {} at frame {frame_index}", track.id);
            return;
        };
        record.finalized_frame = Some(frame_index);

        if record.confirmed_significant && record.presence_frames() > min_persistence {
            record.status = RecordStatus::Missing;
            info!(
                "missing object: track {} (class {}) last seen at frame {}",
                record.track_id, record.class_id, record.last_seen_frame
            );
            self.pending.push(SceneEvent {
                kind: EventKind::Missing,
                track_id: record.track_id,
                class_id: record.class_id,
                bbox: record.last_bbox,
                frame_index,
            });
        } else {
            record.status = RecordStatus::Suppressed;
            debug!(
                "track {} vanished without qualifying as missing (significant={}, presence={})",
                record.track_id,
                record.confirmed_significant,
                record.presence_frames()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{Detection, IouTracker, TrackerConfig};

    fn config() -> MemoryConfig {
        MemoryConfig {
            frame_width: 100.0,
            frame_height: 100.0,
            min_area_fraction: 0.01,
            ..Default::default()
        }
    }

    /// Drive a tracker over `frames` and feed memory; returns every scene event.
    fn run(frames: &[Vec<Detection>], memory: &mut ObjectMemory) -> Vec<SceneEvent> {
        let mut tracker = IouTracker::new(TrackerConfig::default()).unwrap();
        let mut events = Vec::new();
        for (i, dets) in frames.iter().enumerate() {
            let frame = i as u64;
            let output = tracker.update(frame, dets).unwrap();
            events.extend(memory.process(frame, &output.events));
        }
        events
    }

    #[test]
    fn test_config_validation() {
        assert!(MemoryConfig::default().validate().is_ok());
        let bad = MemoryConfig {
            memory_frames: 0,
            ..Default::default()
        };
        assert_eq!(
            bad.validate(),
            Err(ConfigError::NonPositive {
                name: "memory_frames"
            })
        );
        let bad = MemoryConfig {
            min_area_fraction: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::OutOfUnitRange {
                name: "min_area_fraction",
                ..
            })
        ));
        let bad = MemoryConfig {
            frame_width: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::InvalidFrameSize { .. })
        ));
    }

    #[test]
    fn test_small_box_never_new() {
        let mut memory = ObjectMemory::new(config()).unwrap();
        // 5x5 in a 100x100 frame is 0.0025 of the frame, under 0.01.
        let frames = vec![vec![Detection::new(10.0, 10.0, 15.0, 15.0, 1, 0.9)]; 10];
        let events = run(&frames, &mut memory);
        assert!(events.is_empty());
        assert!(!memory.record(1).unwrap().confirmed_significant);
    }

    #[test]
    fn test_low_confidence_never_new() {
        let mut memory = ObjectMemory::new(config()).unwrap();
        let frames = vec![vec![Detection::new(10.0, 10.0, 40.0, 40.0, 1, 0.3)]; 10];
        assert!(run(&frames, &mut memory).is_empty());
    }

    #[test]
    fn test_new_fires_when_box_grows_past_threshold() {
        let mut memory = ObjectMemory::new(config()).unwrap();
        // Grows from 6x6 (0.0036) to 12x12 (0.0144) in one-pixel steps.
        let frames: Vec<Vec<Detection>> = (0..7)
            .map(|i| {
                let side = 6.0 + i as f32;
                vec![Detection::new(10.0, 10.0, 10.0 + side, 10.0 + side, 1, 0.9)]
            })
            .chain((0..3).map(|_| vec![Detection::new(10.0, 10.0, 22.0, 22.0, 1, 0.9)]))
            .collect();
        let events = run(&frames, &mut memory);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::New);
        // 10x10 = 0.01 does not exceed the threshold; 11x11 on frame 5 does.
        assert_eq!(events[0].frame_index, 5);
    }

    #[test]
    fn test_size_history_is_bounded() {
        let mut memory = ObjectMemory::new(MemoryConfig {
            memory_frames: 4,
            ..config()
        })
        .unwrap();
        let frames = vec![vec![Detection::new(10.0, 10.0, 40.0, 40.0, 1, 0.9)]; 12];
        run(&frames, &mut memory);
        let record = memory.record(1).unwrap();
        assert_eq!(record.size_history.len(), 4);
        assert!((record.mean_area() - 900.0).abs() < 1e-3);
    }

    #[test]
    fn test_short_lived_significant_track_is_suppressed() {
        let mut memory = ObjectMemory::new(config()).unwrap();
        let mut frames = vec![vec![Detection::new(10.0, 10.0, 40.0, 40.0, 1, 0.9)]; 5];
        frames.extend(vec![vec![]; 40]);
        let events = run(&frames, &mut memory);
        assert_eq!(events.iter().filter(|e| e.kind == EventKind::New).count(), 1);
        assert!(events.iter().all(|e| e.kind != EventKind::Missing));
    }

    #[test]
    fn test_missing_record_outlives_the_event() {
        let mut memory = ObjectMemory::new(config()).unwrap();
        let mut frames = vec![vec![Detection::new(10.0, 10.0, 40.0, 40.0, 1, 0.9)]; 20];
        // Removed at frame 50; still queryable through frame 80.
        frames.extend(vec![vec![]; 61]);
        let events = run(&frames, &mut memory);
        assert_eq!(
            events.iter().filter(|e| e.kind == EventKind::Missing).count(),
            1
        );
        let record = memory.record(1).unwrap();
        assert_eq!(record.status, RecordStatus::Missing);
        assert_eq!(record.finalized_frame, Some(50));
    }

    #[test]
    fn test_finalized_records_are_evicted() {
        let mut memory = ObjectMemory::new(config()).unwrap();
        let mut frames = vec![vec![Detection::new(10.0, 10.0, 40.0, 40.0, 1, 0.9)]; 20];
        frames.extend(vec![vec![]; 62]);
        run(&frames, &mut memory);
        // Frame 81 is 31 frames past the removal at frame 50.
        assert!(memory.is_empty());
    }

    #[test]
    fn test_frame_size_changes_significance() {
        // 30x30 is under 0.1% of 1920x1080 but well over it in 320x240.
        let frames = vec![vec![Detection::new(10.0, 10.0, 40.0, 40.0, 1, 0.9)]; 4];

        let mut full_hd = ObjectMemory::new(MemoryConfig::default()).unwrap();
        assert!(run(&frames, &mut full_hd).is_empty());

        let mut memory = ObjectMemory::new(MemoryConfig::default()).unwrap();
        memory.set_frame_size(320.0, 240.0).unwrap();
        let events = run(&frames, &mut memory);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::New);

        assert!(matches!(
            memory.set_frame_size(0.0, 240.0),
            Err(ConfigError::InvalidFrameSize { .. })
        ));
        assert_eq!(memory.config().frame_width, 320.0);
    }

    #[test]
    fn test_finalized_record_kept_within_window() {
        let mut memory = ObjectMemory::new(MemoryConfig {
            memory_frames: 60,
            ..config()
        })
        .unwrap();
        let mut frames = vec![vec![Detection::new(10.0, 10.0, 40.0, 40.0, 1, 0.9)]; 20];
        frames.extend(vec![vec![]; 31]);
        run(&frames, &mut memory);
        let record = memory.record(1).unwrap();
        assert_eq!(record.status, RecordStatus::Missing);
        assert_eq!(record.finalized_frame, Some(50));
    }
}
