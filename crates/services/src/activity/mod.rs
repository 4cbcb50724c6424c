mod event_loop;
mod session;
mod sync;
mod view;

// Public API of the activity subsystem.
pub use crate::error::TrackerServiceError;
pub use event_loop::{TrackerCommand, TrackerEvent, TrackerHandle, spawn_tracker};
pub use session::{SampleOutcome, SyncStatus, TrackerSession};
pub use sync::RemoteSync;
pub use view::ActivityView;
