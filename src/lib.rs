//! IoU multi-object tracking with a temporal scene memory.
//!
//! Feed one list of detections per frame into a [`SceneMonitor`]. It
//! keeps stable identities for the objects in view and reports two kinds
//! of scene change: an established object went missing, or a new object
//! was placed and has stabilized.
//!
//! ```
//! use scenewatch_rs::{Detection, MonitorConfig, SceneMonitor};
//!
//! let mut monitor = SceneMonitor::new(MonitorConfig::default()).unwrap();
//! for frame in 0..3 {
//!     let detections = vec![Detection::new(100.0, 100.0, 300.0, 300.0, 0, 0.9)];
//!     let report = monitor.process_frame(frame, &detections).unwrap();
//!     for event in &report.events {
//!         println!("{:?} track {} at frame {}", event.kind, event.track_id, event.frame_index);
//!     }
//! }
//! ```

pub mod error;
pub mod integration;
pub mod memory;
pub mod monitor;
pub mod tracker;

pub use error::{ConfigError, DetectionError, Error, Result};
pub use integration::{DetectionBuilder, DetectionSource, ScenePipeline, report_channel};
pub use memory::{EventKind, MemoryConfig, ObjectMemory, SceneEvent};
pub use monitor::{FrameReport, MonitorConfig, SceneMonitor};
pub use tracker::{Detection, IouTracker, Rect, Track, TrackState, TrackerConfig};
