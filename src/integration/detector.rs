//! Seam for object detection backends.

use crate::tracker::Detection;

/// Anything that turns a decoded frame into detections, such as a
/// model backend or a recorded log.
///
/// The monitor only ever sees the returned detections, so backends are
/// free to pick their own error type.
///
/// ```
/// use scenewatch_rs::{Detection, DetectionSource};
///
/// /// Plays back detections recorded from an earlier run.
/// struct Recorded {
///     frames: std::vec::IntoIter<Vec<Detection>>,
/// }
///
/// impl DetectionSource for Recorded {
///     type Error = std::convert::Infallible;
///
///     fn detect(
///         &mut self,
///         _input: &[u8],
///         _width: u32,
///         _height: u32,
///     ) -> Result<Vec<Detection>, Self::Error> {
///         Ok(self.frames.next().unwrap_or_default())
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error;

    /// Detect objects in one decoded frame of `width` x `height` pixels.
    /// The pixel layout of `input` is up to the implementation.
    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, Self::Error>;
}

/// Conversion from raw detector output.
pub trait IntoDetections {
    fn into_detections(self) -> Vec<Detection>;
}

impl IntoDetections for Vec<Detection> {
    fn into_detections(self) -> Vec<Detection> {
        self
    }
}

/// `(tlbr, class_id, confidence)` tuples, the shape most detector heads
/// decode to after NMS.
impl IntoDetections for Vec<([f32; 4], u32, f32)> {
    fn into_detections(self) -> Vec<Detection> {
        self.into_iter()
            .map(|([x1, y1, x2, y2], class_id, confidence)| {
                Detection::new(x1, y1, x2, y2, class_id, confidence)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_conversion() {
        let raw: Vec<([f32; 4], u32, f32)> = vec![([0.0, 0.0, 10.0, 10.0], 4, 0.8)];
        let dets = raw.into_detections();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 4);
        assert_eq!(dets[0].bbox.to_tlbr(), [0.0, 0.0, 10.0, 10.0]);
    }
}
