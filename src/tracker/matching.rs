//! Geometric matching between predicted track boxes and detections.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{AssignmentError, DetectionError};
use crate::tracker::hungarian;
use crate::tracker::rect::Rect;

/// Detection input for the tracker. Only lives for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box
    pub bbox: Rect,
    /// Detector class id
    pub class_id: u32,
    /// Detection confidence score
    pub confidence: f32,
}

impl Detection {
    /// Create a detection from TLBR corners.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, class_id: u32, confidence: f32) -> Self {
        Self {
            bbox: Rect::from_tlbr(x1, y1, x2, y2),
            class_id,
            confidence,
        }
    }

    pub fn from_rect(bbox: Rect, class_id: u32, confidence: f32) -> Self {
        Self {
            bbox,
            class_id,
            confidence,
        }
    }

    /// Reject boxes that cannot be matched and nonsensical confidences.
    pub fn validate(&self) -> Result<(), DetectionError> {
        self.bbox.validate()?;
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(DetectionError::InvalidConfidence);
        }
        Ok(())
    }
}

/// Compute the IoU affinity matrix between track boxes (rows) and
/// detection boxes (columns).
///
/// An empty side yields a 0×N or N×0 matrix.
pub fn affinity_matrix(track_boxes: &[Rect], det_boxes: &[Rect]) -> Array2<f32> {
    let mut affinity = Array2::zeros((track_boxes.len(), det_boxes.len()));
    for (i, t) in track_boxes.iter().enumerate() {
        for (j, d) in det_boxes.iter().enumerate() {
            affinity[[i, j]] = t.iou(d);
        }
    }
    affinity
}

/// Outcome of one gated assignment. Indices refer to the rows and
/// columns of the affinity matrix; the three sets are disjoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentResult {
    /// Matched (row, column) pairs
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Optimal one-to-one assignment maximizing total affinity, followed by
/// a gate that drops every pair whose affinity is below `min_affinity`.
///
/// The gate runs after the global solve, so a pair the solver chose
/// for the sake of the total never survives if it is individually weak.
pub fn linear_assignment(
    affinity: &Array2<f32>,
    min_affinity: f32,
) -> Result<AssignmentResult, AssignmentError> {
    let (num_rows, num_cols) = affinity.dim();

    if num_rows == 0 || num_cols == 0 {
        return Ok(AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: (0..num_cols).collect(),
        });
    }

    let cost = affinity.mapv(|a| 1.0 - f64::from(a));
    let row_to_col = hungarian::minimize(cost.view())?;

    let mut matches = vec![];
    let mut unmatched_tracks = vec![];
    let mut unmatched_detections_mask = vec![true; num_cols];

    for (row_idx, col) in row_to_col.into_iter().enumerate() {
        match col {
            Some(col_idx) if affinity[[row_idx, col_idx]] >= min_affinity => {
                matches.push((row_idx, col_idx));
                unmatched_detections_mask[col_idx] = false;
            }
            _ => unmatched_tracks.push(row_idx),
        }
    }

    let unmatched_detections = unmatched_detections_mask
        .iter()
        .enumerate()
        .filter_map(|(i, &u)| u.then_some(i))
        .collect();

    Ok(AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    })
}
