use serde::{Deserialize, Serialize};

/// Track state enumeration for the object tracking lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackState {
    /// Newly created track, not yet re-detected often enough to be trusted
    #[default]
    Tentative,
    /// Actively tracked object
    Confirmed,
    /// Previously confirmed, currently unmatched
    Lost,
}

/// How a track left the live set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalReason {
    /// A lost track stayed unmatched past `max_lost_age`.
    Expired,
    /// A tentative track never reached `min_hits`.
    Discarded,
}
