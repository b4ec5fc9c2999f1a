//! Source → target event mapping.

use tracing::debug;

use crate::config::SyncConfig;
use crate::event::{Reminders, SourceEvent, TargetEvent, ZonedTime};

/// Maps local appointments into the cloud calendar's schema.
#[derive(Debug, Clone)]
pub struct EventTransformer {
    config: SyncConfig,
}

impl EventTransformer {
    pub fn new(config: &SyncConfig) -> Self {
        EventTransformer {
            config: config.clone(),
        }
    }

    /// Transform every event that is not cancelled, preserving order.
    pub fn transform(&self, events: &[SourceEvent]) -> Vec<TargetEvent> {
        events
            .iter()
            .filter_map(|event| self.transform_one(event))
            .collect()
    }

    /// `None` for cancelled events.
    pub fn transform_one(&self, event: &SourceEvent) -> Option<TargetEvent> {
        if self.is_cancelled(event) {
            debug!(id = %event.id, subject = %event.subject, "skipping cancelled event");
            return None;
        }

        let zone = self.config.time_zone;

        Some(TargetEvent {
            summary: self.normalize_subject(&event.subject),
            description: event.id.clone(),
            start: ZonedTime::new(event.start, zone),
            end: ZonedTime::new(event.end, zone),
            reminders: Reminders::single_popup(self.config.reminder_minutes_before),
            remote_id: None,
        })
    }

    pub fn is_cancelled(&self, event: &SourceEvent) -> bool {
        event.cancelled || self.config.has_cancellation_marker(&event.subject)
    }

    /// Prefix the meeting marker unless the subject is exempt or already
    /// prefixed. Applying it twice gives the same result as once.
    pub fn normalize_subject(&self, subject: &str) -> String {
        let prefix = self.config.meeting_prefix.as_str();

        if self.config.has_exempt_marker(subject) || subject.starts_with(prefix) {
            subject.to_string()
        } else {
            format!("{}{}", prefix, subject)
        }
    }
}
