//! Local calendar store access.

mod ics;
mod recurrence;

pub use ics::IcsCalendarSource;

use crate::error::SyncResult;
use crate::event::SourceEvent;
use crate::window::SyncWindow;

/// Something that can list the local appointments of a window.
///
/// Implementations expand recurring appointments into instances, keep only
/// instances starting inside `window`, and return them sorted by start.
pub trait EventSource {
    fn fetch_window(&self, window: &SyncWindow) -> SyncResult<Vec<SourceEvent>>;
}

/// Sort by start time, ties broken by id so output is deterministic.
pub(crate) fn sort_by_start(events: &mut [SourceEvent]) {
    events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
}
