//! ScenePipeline for combining detection with tracking and memory.

use thiserror::Error;

use crate::error::Error;
use crate::monitor::{FrameReport, MonitorConfig, SceneMonitor};

use super::DetectionSource;

/// Failure of one pipeline step.
#[derive(Debug, Error)]
pub enum PipelineError<E> {
    #[error("detector failed: {0}")]
    Detector(E),

    #[error(transparent)]
    Core(#[from] Error),
}

/// Bundles any `DetectionSource` with a `SceneMonitor` and numbers
/// frames itself, so callers only hand over decoded images.
pub struct ScenePipeline<D: DetectionSource> {
    detector: D,
    monitor: SceneMonitor,
    next_frame: u64,
}

impl<D: DetectionSource> ScenePipeline<D> {
    pub fn new(detector: D, config: MonitorConfig) -> Result<Self, Error> {
        Ok(Self {
            detector,
            monitor: SceneMonitor::new(config)?,
            next_frame: 0,
        })
    }

    pub fn with_default_config(detector: D) -> Result<Self, Error> {
        Self::new(detector, MonitorConfig::default())
    }

    /// Run detection on one frame and push the result through the core.
    ///
    /// `width` and `height` also become the frame size memory measures
    /// box areas against. A detector failure consumes the frame index,
    /// so indices stay aligned with the source stream.
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<FrameReport, PipelineError<D::Error>> {
        let frame_index = self.next_frame;
        self.next_frame += 1;
        let detections = self
            .detector
            .detect(input, width, height)
            .map_err(PipelineError::Detector)?;
        self.monitor.set_frame_size(width as f32, height as f32)?;
        Ok(self.monitor.process_frame(frame_index, &detections)?)
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    pub fn monitor(&self) -> &SceneMonitor {
        &self.monitor
    }
}
