//! Single object track for multi-object tracking.

use std::collections::VecDeque;

use nalgebra::Vector2;
use serde::Serialize;

use crate::tracker::matching::Detection;
use crate::tracker::rect::Rect;
use crate::tracker::track_state::{RemovalReason, TrackState};

/// Persistent identity of one physical object.
///
/// Tracks are owned and mutated by [`IouTracker`](crate::tracker::IouTracker);
/// everything outside the tracker sees clones.
#[derive(Debug, Clone, Serialize)]
pub struct Track {
    /// Unique track identifier, never reused
    pub id: u64,
    /// Current lifecycle state
    pub state: TrackState,
    /// Current estimated box (predicted while unmatched)
    pub bbox: Rect,
    /// Per-frame displacement of the box center
    pub velocity: Vector2<f32>,
    /// Class of the detection that started the track
    pub class_id: u32,
    /// Confidence of the most recent matched detection
    pub confidence: f32,
    /// Frames since creation
    pub age: u32,
    /// Frames with a matched detection, creation included
    pub hits: u32,
    /// Frames since the last matched detection
    pub time_since_update: u32,
    pub start_frame: u64,
    pub last_update_frame: u64,
    /// Recent matched centers, oldest first
    pub trajectory: VecDeque<Vector2<f32>>,
    #[serde(skip)]
    last_matched: Rect,
    #[serde(skip)]
    trajectory_len: usize,
}

impl Track {
    pub(crate) fn new(id: u64, det: &Detection, frame_index: u64, trajectory_len: usize) -> Self {
        let mut trajectory = VecDeque::with_capacity(trajectory_len.min(64));
        if trajectory_len > 0 {
            trajectory.push_back(det.bbox.center());
        }
        Self {
            id,
            state: TrackState::Tentative,
            bbox: det.bbox,
            velocity: Vector2::zeros(),
            class_id: det.class_id,
            confidence: det.confidence,
            age: 0,
            hits: 1,
            time_since_update: 0,
            start_frame: frame_index,
            last_update_frame: frame_index,
            trajectory,
            last_matched: det.bbox,
            trajectory_len,
        }
    }

    /// Box of the most recent matched detection, unaffected by prediction.
    pub fn last_detected_bbox(&self) -> Rect {
        self.last_matched
    }

    pub fn is_confirmed(&self) -> bool {
        self.state == TrackState::Confirmed
    }

    /// Advance the box one frame along the current velocity estimate.
    pub fn predict(&mut self) {
        self.bbox = self.bbox.translate(&self.velocity);
    }

    /// Promote a tentative track once it has been seen `min_hits` times.
    /// Returns `true` on the transition.
    pub(crate) fn try_confirm(&mut self, min_hits: u32) -> bool {
        if self.state == TrackState::Tentative && self.hits >= min_hits {
            self.state = TrackState::Confirmed;
            true
        } else {
            false
        }
    }

    /// Apply a matched detection and return the state the track was in
    /// before the match.
    ///
    /// The box is replaced, not blended. Velocity is the center shift
    /// since the previous match divided by the frames in between, so a
    /// gap does not inflate the per-frame estimate.
    pub(crate) fn update(
        &mut self,
        det: &Detection,
        frame_index: u64,
        min_hits: u32,
    ) -> TrackState {
        let previous = self.state;
        let elapsed = frame_index.saturating_sub(self.last_update_frame).max(1) as f32;

        self.velocity = (det.bbox.center() - self.last_matched.center()) / elapsed;
        self.bbox = det.bbox;
        self.last_matched = det.bbox;
        self.confidence = det.confidence;
        self.last_update_frame = frame_index;
        self.time_since_update = 0;
        self.hits += 1;
        self.age += 1;

        if self.trajectory_len > 0 {
            if self.trajectory.len() == self.trajectory_len {
                self.trajectory.pop_front();
            }
            self.trajectory.push_back(det.bbox.center());
        }

        match self.state {
            TrackState::Lost => self.state = TrackState::Confirmed,
            TrackState::Tentative => {
                self.try_confirm(min_hits);
            }
            TrackState::Confirmed => {}
        }
        previous
    }

    /// Record a frame without a match. One miss is enough to move a
    /// confirmed track to `Lost`.
    pub(crate) fn mark_missed(&mut self) {
        self.time_since_update += 1;
        self.age += 1;
        if self.state == TrackState::Confirmed {
            self.state = TrackState::Lost;
        }
    }

    /// Whether the track has outlived its unmatched budget.
    pub(crate) fn removal_reason(
        &self,
        max_tentative_age: u32,
        max_lost_age: u32,
    ) -> Option<RemovalReason> {
        match self.state {
            TrackState::Tentative if self.time_since_update > max_tentative_age => {
                Some(RemovalReason::Discarded)
            }
            TrackState::Lost if self.time_since_update > max_lost_age => {
                Some(RemovalReason::Expired)
            }
            _ => None,
        }
    }
}
