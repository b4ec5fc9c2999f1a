//! Google's OAuth2 endpoints, reached through the `google-calendar` client.

use calsync_core::{SyncError, SyncResult};
use google_calendar::Client;
use tracing::{info, warn};

use crate::client_secret::ClientSecret;
use crate::consent::LoopbackListener;
use crate::credential::{Credential, OAuthFlow};

pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/calendar"];

pub struct GoogleOAuth {
    secret: ClientSecret,
    redirect_port: u16,
    open_browser: bool,
}

impl GoogleOAuth {
    pub fn new(secret: ClientSecret, redirect_port: u16, open_browser: bool) -> Self {
        GoogleOAuth {
            secret,
            redirect_port,
            open_browser,
        }
    }

    pub fn secret(&self) -> &ClientSecret {
        &self.secret
    }
}

impl OAuthFlow for GoogleOAuth {
    async fn refresh(&self, credential: &Credential) -> SyncResult<Credential> {
        let refresh_token = credential
            .refresh_token
            .clone()
            .ok_or_else(|| SyncError::auth("No refresh token cached"))?;

        let client = Client::new(
            self.secret.client_id.clone(),
            self.secret.client_secret.clone(),
            String::new(),
            credential.access_token.clone(),
            refresh_token.clone(),
        );

        let token = client
            .refresh_access_token()
            .await
            .map_err(|e| SyncError::auth_with("Failed to refresh token", e))?;

        Ok(Credential::from_token(&token, Some(&refresh_token)))
    }

    async fn consent(&self) -> SyncResult<Credential> {
        let listener = LoopbackListener::bind(self.redirect_port).await?;
        let scopes: Vec<String> = SCOPES.iter().map(|s| s.to_string()).collect();

        let mut client = Client::new(
            self.secret.client_id.clone(),
            self.secret.client_secret.clone(),
            listener.redirect_uri().to_string(),
            String::new(),
            String::new(),
        );

        let consent_url = force_consent_prompt(client.user_consent_url(&scopes));

        eprintln!("\nOpen this URL in your browser to authorize calsync:\n");
        eprintln!("{}\n", consent_url);

        if self.open_browser && open::that(&consent_url).is_err() {
            eprintln!("(Could not open browser automatically, please copy the URL above)");
        }

        let callback = listener.accept_callback().await?;
        info!("received authorization code, exchanging for tokens");

        let token = client
            .get_access_token(&callback.code, &callback.state)
            .await
            .map_err(|e| SyncError::auth_with("Failed to exchange authorization code", e))?;

        if token.refresh_token.is_empty() {
            warn!("Google returned no refresh token; consent will be needed again when this token expires");
        }

        Ok(Credential::from_token(&token, None))
    }
}

/// Google only hands out a refresh token on a consent screen the user
/// actually sees, so ask for one even when access was granted before.
fn force_consent_prompt(mut url: String) -> String {
    if !url.contains("prompt=") {
        url.push_str(if url.contains('?') { "&" } else { "?" });
        url.push_str("prompt=consent");
    }
    url
}
