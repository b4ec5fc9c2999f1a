//! `CalendarService` backed by the Google Calendar API.

use calsync_core::{CalendarService, RemoteEvent, SyncError, SyncResult, SyncWindow, TargetEvent};
use google_calendar::Client;
use google_calendar::types::{OrderBy, SendUpdates};
use tracing::debug;

use crate::client_secret::ClientSecret;
use crate::convert::{FromGoogle, ToGoogle};
use crate::credential::Credential;

pub struct GoogleCalendar {
    client: Client,
    calendar_id: String,
}

impl GoogleCalendar {
    pub fn new(secret: &ClientSecret, credential: &Credential, calendar_id: &str) -> Self {
        let client = Client::new(
            secret.client_id.clone(),
            secret.client_secret.clone(),
            String::new(),
            credential.access_token.clone(),
            credential.refresh_token.clone().unwrap_or_default(),
        );

        GoogleCalendar {
            client,
            calendar_id: calendar_id.to_string(),
        }
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }
}

impl CalendarService for GoogleCalendar {
    async fn list(&self, window: &SyncWindow) -> SyncResult<Vec<RemoteEvent>> {
        let time_min = window.start_utc().to_rfc3339();
        let time_max = window.end_utc().to_rfc3339();
        debug!(calendar = %self.calendar_id, %time_min, %time_max, "listing cloud events");

        let response = self
            .client
            .events()
            .list_all(
                &self.calendar_id,
                "",
                0,
                OrderBy::default(),
                &[],
                "", // search query
                &[],
                false, // show deleted
                false,
                true, // expand recurring events into instances
                &time_max,
                &time_min,
                "",
                "",
            )
            .await
            .map_err(|e| {
                SyncError::remote(format!("Failed to list events in {}", self.calendar_id), e)
            })?;

        Ok(response
            .body
            .into_iter()
            .map(RemoteEvent::from_google)
            .collect())
    }

    async fn insert(&self, event: &TargetEvent) -> SyncResult<RemoteEvent> {
        // Google assigns the id
        let mut google_event = event.to_google();
        google_event.id = String::new();

        let response = self
            .client
            .events()
            .insert(
                &self.calendar_id,
                0,
                0,
                false,
                SendUpdates::None,
                false,
                &google_event,
            )
            .await
            .map_err(|e| {
                SyncError::remote(format!("Failed to create event: {}", event.summary), e)
            })?;

        Ok(RemoteEvent::from_google(response.body))
    }

    async fn update(&self, event_id: &str, event: &TargetEvent) -> SyncResult<RemoteEvent> {
        let mut google_event = event.to_google();
        google_event.id = event_id.to_string();

        let response = self
            .client
            .events()
            .update(
                &self.calendar_id,
                event_id,
                0,
                0,
                false,
                SendUpdates::None,
                false,
                &google_event,
            )
            .await
            .map_err(|e| SyncError::remote(format!("Failed to update event {}", event_id), e))?;

        Ok(RemoteEvent::from_google(response.body))
    }
}
