//! Temporal memory over tracker lifecycle events.
//!
//! The tracker answers "which box is which object"; memory answers "did
//! the scene actually change". It keeps one record per confirmed track
//! over a bounded window and reports two kinds of [`SceneEvent`]: an
//! established object went missing, or a new object settled in.

mod event;
mod object_memory;
mod record;

pub use event::{EventKind, SceneEvent};
pub use object_memory::{LifecycleObserver, MemoryConfig, ObjectMemory};
pub use record::{MemoryRecord, RecordStatus};
