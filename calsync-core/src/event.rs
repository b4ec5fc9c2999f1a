//! Event types on both sides of the sync.
//!
//! `SourceEvent` is what the local calendar store yields, `TargetEvent` is
//! what gets written to the cloud calendar, and `RemoteEvent` is the part of
//! an existing cloud event the reconciler needs.

use std::fmt;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// An appointment read from the local calendar store (one concrete instance).
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEvent {
    /// Unique per instance; becomes the target description (join key).
    pub id: String,
    pub subject: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    /// Cancelled according to the store itself (e.g. STATUS:CANCELLED).
    pub cancelled: bool,
}

impl fmt::Display for SourceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.subject)
    }
}

/// A start or end instant paired with the zone the cloud should display it in.
#[derive(Debug, Clone, PartialEq)]
pub struct ZonedTime {
    pub date_time: DateTime<Tz>,
    pub time_zone: Tz,
}

impl ZonedTime {
    pub fn new(date_time: DateTime<Tz>, time_zone: Tz) -> Self {
        ZonedTime {
            date_time: date_time.with_timezone(&time_zone),
            time_zone,
        }
    }
}

/// Reminder delivery method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderMethod {
    Popup,
    Email,
}

impl ReminderMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderMethod::Popup => "popup",
            ReminderMethod::Email => "email",
        }
    }
}

/// A single reminder override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderOverride {
    pub method: ReminderMethod,
    /// Minutes before the event start
    pub minutes: i64,
}

/// Reminder configuration for a target event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminders {
    pub use_default: bool,
    pub overrides: Vec<ReminderOverride>,
}

impl Reminders {
    /// Provider defaults off, one popup `minutes` before start.
    pub fn single_popup(minutes: i64) -> Self {
        Reminders {
            use_default: false,
            overrides: vec![ReminderOverride {
                method: ReminderMethod::Popup,
                minutes,
            }],
        }
    }
}

/// An event in the cloud calendar's schema, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetEvent {
    pub summary: String,
    /// Always the stable identifier of the source event.
    pub description: String,
    pub start: ZonedTime,
    pub end: ZonedTime,
    pub reminders: Reminders,
    /// Cloud-side id, set only once the reconciler found a match.
    pub remote_id: Option<String>,
}

impl TargetEvent {
    /// The cross-system join key.
    pub fn source_id(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for TargetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)
    }
}

/// An event that already exists in the cloud calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub id: String,
    pub summary: String,
    /// Empty when the cloud event has no description.
    pub description: String,
}
