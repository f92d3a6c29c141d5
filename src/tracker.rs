mod hungarian;
mod iou_tracker;
mod matching;
mod rect;
mod track;
mod track_state;

pub use hungarian::{minimize, minimize_with_cost};
pub use iou_tracker::{IouTracker, LifecycleEvent, RejectedDetection, TrackerConfig, TrackerOutput};
pub use matching::{AssignmentResult, Detection, affinity_matrix, linear_assignment};
pub use rect::Rect;
pub use track::Track;
pub use track_state::{RemovalReason, TrackState};
