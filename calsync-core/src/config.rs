//! Sync behaviour configuration.

use chrono::format::{Item, StrftimeItems};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// Knobs for the source window and the event transformation.
///
/// Every component receives this struct at construction; nothing reads
/// global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Number of days (starting today at local midnight) to sync.
    pub window_days: u32,
    /// strftime pattern used when printing event times.
    pub date_format: String,
    /// Zone used to anchor the window and stamp target events.
    pub time_zone: Tz,
    /// Popup reminder lead time in minutes.
    pub reminder_minutes_before: i64,
    /// Prefix added to subjects that carry no exempt marker.
    pub meeting_prefix: String,
    /// Subject substrings that mark an event as cancelled.
    pub cancellation_markers: Vec<String>,
    /// Subject substrings that suppress the meeting prefix.
    pub exempt_subject_markers: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            window_days: 7,
            date_format: "%Y-%m-%dT%H:%M:%S".to_string(),
            time_zone: chrono_tz::Asia::Tokyo,
            reminder_minutes_before: 5,
            meeting_prefix: "[会議]".to_string(),
            cancellation_markers: vec!["キャンセル済".to_string(), "Canceled".to_string()],
            exempt_subject_markers: vec!["work".to_string(), "備忘録".to_string()],
        }
    }
}

impl SyncConfig {
    pub fn has_cancellation_marker(&self, subject: &str) -> bool {
        self.cancellation_markers
            .iter()
            .any(|marker| subject.contains(marker.as_str()))
    }

    pub fn has_exempt_marker(&self, subject: &str) -> bool {
        self.exempt_subject_markers
            .iter()
            .any(|marker| subject.contains(marker.as_str()))
    }

    /// Reject values that would make a run meaningless.
    pub fn validate(&self) -> SyncResult<()> {
        if self.window_days == 0 {
            return Err(SyncError::Config("window_days must be at least 1".into()));
        }
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(SyncError::Config(format!(
                "date_format '{}' is not a valid strftime pattern",
                self.date_format
            )));
        }
        if self.reminder_minutes_before < 0 {
            return Err(SyncError::Config(
                "reminder_minutes_before cannot be negative".into(),
            ));
        }
        if self.cancellation_markers.iter().any(|m| m.is_empty()) {
            return Err(SyncError::Config(
                "cancellation_markers cannot contain an empty marker".into(),
            ));
        }
        if self.exempt_subject_markers.iter().any(|m| m.is_empty()) {
            return Err(SyncError::Config(
                "exempt_subject_markers cannot contain an empty marker".into(),
            ));
        }
        Ok(())
    }
}
