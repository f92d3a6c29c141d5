//! IoU tracker: predict, match, update, create and expire tracks.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, DetectionError, Error, Result};
use crate::tracker::matching::{self, AssignmentResult, Detection};
use crate::tracker::rect::Rect;
use crate::tracker::track::Track;
use crate::tracker::track_state::{RemovalReason, TrackState};

/// Configuration for the IouTracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Matches needed before a tentative track is confirmed
    pub min_hits: u32,
    /// Unmatched frames a tentative track survives
    pub max_tentative_age: u32,
    /// Unmatched frames a lost track survives
    pub max_lost_age: u32,
    /// Minimum IoU for a match to be accepted, in (0, 1]
    pub match_thresh: f32,
    /// Matched centers kept per track; 0 disables the trajectory
    pub trajectory_len: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_hits: 2,
            max_tentative_age: 3,
            max_lost_age: 30,
            match_thresh: 0.3,
            trajectory_len: 30,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.min_hits == 0 {
            return Err(ConfigError::InvalidMinHits);
        }
        // Zero would let non-overlapping pairs through the gate.
        if !(self.match_thresh > 0.0 && self.match_thresh <= 1.0) {
            return Err(ConfigError::InvalidMatchThresh(self.match_thresh));
        }
        Ok(())
    }
}

/// Lifecycle signal emitted by the tracker for the memory layer.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// Tentative → Confirmed. Fires once per track.
    Confirmed { track: Track, frame_index: u64 },
    /// A confirmed track was matched, including recovery from `Lost`.
    Updated { track: Track, frame_index: u64 },
    /// The track left the live set; its id is retired.
    Removed {
        track: Track,
        frame_index: u64,
        reason: RemovalReason,
    },
}

/// A detection dropped before matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RejectedDetection {
    /// Position in the frame's input list
    pub index: usize,
    pub reason: DetectionError,
}

/// Everything one call to [`IouTracker::update`] produced.
#[derive(Debug, Clone, Default)]
pub struct TrackerOutput {
    pub frame_index: u64,
    /// Live tracks in id order
    pub tracks: Vec<Track>,
    pub events: Vec<LifecycleEvent>,
    pub rejected: Vec<RejectedDetection>,
}

/// Frame-over-frame IoU tracker.
///
/// Frames must be fed with strictly increasing indices; each index is
/// processed at most once.
#[derive(Debug, Clone)]
pub struct IouTracker {
    tracks: Vec<Track>,
    next_id: u64,
    last_frame: Option<u64>,
    config: TrackerConfig,
}

impl IouTracker {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tracks: Vec::new(),
            next_id: 1,
            last_frame: None,
            config,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Live tracks in id order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn last_frame(&self) -> Option<u64> {
        self.last_frame
    }

    pub fn update(&mut self, frame_index: u64, detections: &[Detection]) -> Result<TrackerOutput> {
        if let Some(previous) = self.last_frame {
            if frame_index <= previous {
                return Err(Error::FrameOrder {
                    previous,
                    got: frame_index,
                });
            }
        }

        // Step 1: Drop malformed detections
        let mut rejected = Vec::new();
        let mut valid = Vec::with_capacity(detections.len());
        for (index, det) in detections.iter().enumerate() {
            match det.validate() {
                Ok(()) => valid.push(det),
                Err(reason) => {
                    warn!("frame {frame_index}: rejecting detection {index}: {reason}");
                    rejected.push(RejectedDetection { index, reason });
                }
            }
        }

        // Step 2: Predict every live track one step
        let predicted: Vec<Rect> = self
            .tracks
            .iter()
            .map(|t| t.bbox.translate(&t.velocity))
            .collect();

        // Step 3: Associate predictions with detections
        let det_rects: Vec<Rect> = valid.iter().map(|d| d.bbox).collect();
        let affinity = matching::affinity_matrix(&predicted, &det_rects);

        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = matching::linear_assignment(&affinity, self.config.match_thresh)?;

        // Assignment succeeded; from here on the frame always completes.
        self.last_frame = Some(frame_index);
        for track in self.tracks.iter_mut() {
            track.predict();
        }
        let mut events = Vec::new();

        for (itrack, idet) in matches {
            let track = &mut self.tracks[itrack];
            let previous = track.update(valid[idet], frame_index, self.config.min_hits);
            match (previous, track.state) {
                (TrackState::Tentative, TrackState::Confirmed) => {
                    debug!("track {} confirmed at frame {frame_index}", track.id);
                    events.push(LifecycleEvent::Confirmed {
                        track: track.clone(),
                        frame_index,
                    });
                }
                (TrackState::Lost, _) | (TrackState::Confirmed, _) => {
                    if previous == TrackState::Lost {
                        debug!(
                            "track {} recovered at frame {frame_index} after occlusion",
                            track.id
                        );
                    }
                    events.push(LifecycleEvent::Updated {
                        track: track.clone(),
                        frame_index,
                    });
                }
                _ => {}
            }
        }

        for itrack in unmatched_tracks {
            self.tracks[itrack].mark_missed();
        }

        // Step 4: Retire tracks that ran out of unmatched budget
        let (max_tentative_age, max_lost_age) =
            (self.config.max_tentative_age, self.config.max_lost_age);
        let mut kept = Vec::with_capacity(self.tracks.len());
        for track in self.tracks.drain(..) {
            match track.removal_reason(max_tentative_age, max_lost_age) {
                Some(reason) => {
                    debug!("track {} removed at frame {frame_index} ({reason:?})", track.id);
                    events.push(LifecycleEvent::Removed {
                        track,
                        frame_index,
                        reason,
                    });
                }
                None => kept.push(track),
            }
        }
        self.tracks = kept;

        // Step 5: Init new tracks from unmatched detections
        for idet in unmatched_detections {
            let id = self.next_id;
            self.next_id += 1;
            let mut track = Track::new(id, valid[idet], frame_index, self.config.trajectory_len);
            debug!("track {id} created at frame {frame_index}");
            if track.try_confirm(self.config.min_hits) {
                debug!("track {id} confirmed at frame {frame_index}");
                events.push(LifecycleEvent::Confirmed {
                    track: track.clone(),
                    frame_index,
                });
            }
            self.tracks.push(track);
        }

        Ok(TrackerOutput {
            frame_index,
            tracks: self.tracks.clone(),
            events,
            rejected,
        })
    }
}
