use std::collections::VecDeque;

use serde::Serialize;

use crate::tracker::{Rect, Track};

/// What memory has concluded about a record so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordStatus {
    /// The track is still alive in the tracker.
    Present,
    /// The track expired and a Missing event was emitted.
    Missing,
    /// The track expired without qualifying as missing.
    Suppressed,
}

/// Memory's bookkeeping for one confirmed track.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryRecord {
    pub track_id: u64,
    pub class_id: u32,
    pub first_seen_frame: u64,
    pub last_seen_frame: u64,
    /// Box of the last matched detection
    pub last_bbox: Rect,
    pub last_confidence: f32,
    /// Sticky once true
    pub confirmed_significant: bool,
    /// Box areas, most recent last, bounded to the memory window
    pub size_history: VecDeque<f32>,
    pub status: RecordStatus,
    pub finalized_frame: Option<u64>,
}

impl MemoryRecord {
    pub(crate) fn new(track: &Track, frame_index: u64, capacity: usize) -> Self {
        let bbox = track.last_detected_bbox();
        let mut size_history = VecDeque::with_capacity(capacity);
        size_history.push_back(bbox.area());
        Self {
            track_id: track.id,
            class_id: track.class_id,
            first_seen_frame: frame_index,
            last_seen_frame: frame_index,
            last_bbox: bbox,
            last_confidence: track.confidence,
            confirmed_significant: false,
            size_history,
            status: RecordStatus::Present,
            finalized_frame: None,
        }
    }

    pub(crate) fn observe(&mut self, track: &Track, frame_index: u64, capacity: usize) {
        let bbox = track.last_detected_bbox();
        while self.size_history.len() >= capacity {
            self.size_history.pop_front();
        }
        self.size_history.push_back(bbox.area());
        self.last_seen_frame = frame_index;
        self.last_bbox = bbox;
        self.last_confidence = track.confidence;
    }

    /// Frames between first and last sighting.
    pub fn presence_frames(&self) -> u64 {
        self.last_seen_frame - self.first_seen_frame
    }

    pub fn mean_area(&self) -> f32 {
        if self.size_history.is_empty() {
            return 0.0;
        }
        self.size_history.iter().sum::<f32>() / self.size_history.len() as f32
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized_frame.is_some()
    }
}
