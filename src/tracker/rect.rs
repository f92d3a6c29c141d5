use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::DetectionError;

/// Axis-aligned bounding box.
///
/// Stored as TLWH (top-left x, top-left y, width, height). Detectors
/// usually hand out TLBR corners (`x_min, y_min, x_max, y_max`), so
/// [`Rect::from_tlbr`] and [`Rect::to_tlbr`] are the common entry and
/// exit points. Coordinates may be pixels or normalized; nothing here
/// assumes either.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (x_min, y_min, x_max, y_max).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Convert to TLBR format: (x_min, y_min, x_max, y_max).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Convert to TLWH format: (x, y, width, height).
    #[inline]
    pub fn to_tlwh(&self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    #[inline]
    pub fn center(&self) -> Vector2<f32> {
        Vector2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Shift the box by a displacement, keeping its size.
    #[inline]
    pub fn translate(&self, delta: &Vector2<f32>) -> Self {
        Self {
            x: self.x + delta.x,
            y: self.y + delta.y,
            ..*self
        }
    }

    /// Check that the box can take part in matching.
    ///
    /// Non-finite coordinates, inverted corners and zero-area boxes are
    /// all rejected.
    pub fn validate(&self) -> Result<(), DetectionError> {
        if !self.to_tlwh().iter().all(|v| v.is_finite()) {
            return Err(DetectionError::NonFinite);
        }
        // Re-derive the far corner so overflow to infinity is caught too.
        if !(self.x + self.width).is_finite() || !(self.y + self.height).is_finite() {
            return Err(DetectionError::NonFinite);
        }
        if self.width < 0.0 || self.height < 0.0 {
            return Err(DetectionError::Inverted);
        }
        if self.width == 0.0 || self.height == 0.0 {
            return Err(DetectionError::Degenerate);
        }
        Ok(())
    }

    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.validate().is_ok()
    }

    /// Intersection over Union with another box.
    ///
    /// Returns 0 when the union area is not positive.
    pub fn iou(&self, other: &Rect) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let inter_area = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union_area = self.area() + other.area() - inter_area;

        if union_area > 0.0 {
            (inter_area / union_area).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
