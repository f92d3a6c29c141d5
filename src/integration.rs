//! Integration module for connecting detection backends and output
//! writers with the scene monitor.
//!
//! Detection, decoding and rendering live outside this crate. This
//! module defines the seams they plug into: a detector trait on the
//! input side and a bounded, non-blocking report queue on the output
//! side.

mod builder;
mod detector;
mod pipeline;
mod sink;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections};
pub use pipeline::{PipelineError, ScenePipeline};
pub use sink::{DEFAULT_QUEUE_SIZE, Publish, ReportSender, report_channel};
