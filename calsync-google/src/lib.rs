//! Google Calendar side of calsync: OAuth2 credentials and the
//! `CalendarService` implementation.

pub mod auth;
pub mod calendar;
pub mod client_secret;
pub mod config;
pub mod consent;
pub mod convert;
pub mod credential;

pub use auth::GoogleOAuth;
pub use calendar::GoogleCalendar;
pub use client_secret::ClientSecret;
pub use config::GoogleConfig;
pub use credential::{Credential, CredentialManager, OAuthFlow, TokenCache};

use calsync_core::SyncResult;

/// Credential manager wired to Google for the given settings.
pub fn credential_manager(config: &GoogleConfig) -> SyncResult<CredentialManager<GoogleOAuth>> {
    let secret = ClientSecret::load(&config.client_secret_path)?;
    let flow = GoogleOAuth::new(secret, config.redirect_port, config.open_browser);
    Ok(CredentialManager::new(
        TokenCache::new(&config.token_cache_path),
        flow,
    ))
}

/// Authorize (cached, refreshed or interactive) and open the calendar.
pub async fn connect(config: &GoogleConfig) -> SyncResult<GoogleCalendar> {
    let manager = credential_manager(config)?;
    let credential = manager.obtain().await?;
    Ok(GoogleCalendar::new(
        manager.flow().secret(),
        &credential,
        &config.calendar_id,
    ))
}
