use serde::{Deserialize, Serialize};

use crate::tracker::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A significant, persistent object is gone.
    Missing,
    /// A new object has stabilized in the scene.
    New,
}

/// User-facing scene change. Emitted once per qualifying transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEvent {
    pub kind: EventKind,
    pub track_id: u64,
    pub class_id: u32,
    /// Box at the time of the event; for `Missing`, the last matched box
    pub bbox: Rect,
    pub frame_index: u64,
}
