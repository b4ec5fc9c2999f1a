//! The cloud calendar seam.

use crate::error::SyncResult;
use crate::event::{RemoteEvent, TargetEvent};
use crate::window::SyncWindow;

/// Operations the sync needs from a cloud calendar.
///
/// The calendar id is fixed when the implementation is constructed.
#[allow(async_fn_in_trait)]
pub trait CalendarService {
    /// Existing events overlapping `window`.
    async fn list(&self, window: &SyncWindow) -> SyncResult<Vec<RemoteEvent>>;

    /// Create a new event; the service assigns its id.
    async fn insert(&self, event: &TargetEvent) -> SyncResult<RemoteEvent>;

    /// Overwrite the event with cloud id `event_id`.
    async fn update(&self, event_id: &str, event: &TargetEvent) -> SyncResult<RemoteEvent>;
}
