//! Mapping between calsync events and `google_calendar::types::Event`.

use calsync_core::{RemoteEvent, Reminders, TargetEvent, ZonedTime};
use google_calendar::types::{Event, EventDateTime, EventReminder};

pub trait ToGoogle {
    fn to_google(&self) -> Event;
}

impl ToGoogle for TargetEvent {
    fn to_google(&self) -> Event {
        Event {
            id: self.remote_id.clone().unwrap_or_default(),
            summary: self.summary.clone(),
            description: self.description.clone(),
            start: Some(zoned_time_to_google(&self.start)),
            end: Some(zoned_time_to_google(&self.end)),
            reminders: Some(reminders_to_google(&self.reminders)),
            ..Default::default()
        }
    }
}

fn zoned_time_to_google(time: &ZonedTime) -> EventDateTime {
    EventDateTime {
        date: None,
        date_time: Some(time.date_time.to_utc()),
        time_zone: time.time_zone.name().to_string(),
    }
}

fn reminders_to_google(reminders: &Reminders) -> google_calendar::types::Reminders {
    google_calendar::types::Reminders {
        overrides: reminders
            .overrides
            .iter()
            .map(|r| EventReminder {
                method: r.method.as_str().to_string(),
                minutes: r.minutes,
            })
            .collect(),
        use_default: reminders.use_default,
    }
}

pub trait FromGoogle {
    fn from_google(event: Event) -> Self;
}

impl FromGoogle for RemoteEvent {
    fn from_google(event: Event) -> Self {
        RemoteEvent {
            id: event.id,
            summary: event.summary,
            description: event.description,
        }
    }
}
