//! OAuth2 credentials: cached on disk, refreshed when expired, obtained
//! through interactive consent when nothing usable is cached.

use std::path::{Path, PathBuf};

use calsync_core::{SyncError, SyncResult};
use chrono::{DateTime, Duration, Utc};
use google_calendar::AccessToken;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Tokens are treated as expired this long before their actual expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Build from a token response. Google usually omits the refresh token
    /// on refresh, in which case `previous_refresh` is kept.
    pub fn from_token(token: &AccessToken, previous_refresh: Option<&str>) -> Self {
        let expires_at =
            (token.expires_in > 0).then(|| Utc::now() + Duration::seconds(token.expires_in));

        let refresh_token = if token.refresh_token.is_empty() {
            previous_refresh.map(str::to_string)
        } else {
            Some(token.refresh_token.clone())
        };

        Credential {
            access_token: token.access_token.clone(),
            refresh_token,
            expires_at,
        }
    }

    /// A credential without a known expiry is assumed valid.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|at| now + Duration::seconds(EXPIRY_SKEW_SECS) >= at)
    }
}

/// The JSON file holding the last credential.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenCache { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing, unreadable or corrupt caches all read as `None`.
    pub fn load(&self) -> Option<Credential> {
        if !self.path.exists() {
            return None;
        }

        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "token cache unreadable, ignoring");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "token cache corrupt, ignoring");
                None
            }
        }
    }

    pub fn save(&self, credential: &Credential) -> SyncResult<()> {
        let write_error = |e: std::io::Error| {
            SyncError::auth_with(
                format!("Failed to write token cache to {}", self.path.display()),
                e,
            )
        };

        let contents = serde_json::to_string_pretty(credential)
            .map_err(|e| SyncError::auth_with("Failed to serialize credential", e))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }

        std::fs::write(&self.path, contents).map_err(write_error)?;

        // Owner-only (0600) since the file contains OAuth tokens
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(write_error)?;
        }

        debug!(path = %self.path.display(), "saved token cache");
        Ok(())
    }
}

/// Token endpoint operations behind the credential manager.
#[allow(async_fn_in_trait)]
pub trait OAuthFlow {
    /// Exchange a refresh token for a fresh credential.
    async fn refresh(&self, credential: &Credential) -> SyncResult<Credential>;

    /// Interactive user consent.
    async fn consent(&self) -> SyncResult<Credential>;
}

pub struct CredentialManager<F> {
    cache: TokenCache,
    flow: F,
}

impl<F: OAuthFlow> CredentialManager<F> {
    pub fn new(cache: TokenCache, flow: F) -> Self {
        CredentialManager { cache, flow }
    }

    pub fn flow(&self) -> &F {
        &self.flow
    }

    /// A usable credential: cached, refreshed, or freshly consented.
    pub async fn obtain(&self) -> SyncResult<Credential> {
        self.obtain_at(Utc::now()).await
    }

    async fn obtain_at(&self, now: DateTime<Utc>) -> SyncResult<Credential> {
        let Some(cached) = self.cache.load() else {
            info!("no cached credential, requesting consent");
            return self.reauthorize().await;
        };

        if !cached.is_expired_at(now) {
            debug!("using cached credential");
            return Ok(cached);
        }

        if cached.refresh_token.is_some() {
            info!("access token expired, refreshing");
            match self.flow.refresh(&cached).await {
                Ok(refreshed) => {
                    self.cache.save(&refreshed)?;
                    return Ok(refreshed);
                }
                Err(e) => warn!(error = %e, "token refresh rejected, falling back to consent"),
            }
        }

        self.reauthorize().await
    }

    /// Ignore the cache and run consent, then cache the result.
    pub async fn reauthorize(&self) -> SyncResult<Credential> {
        let credential = self.flow.consent().await?;
        self.cache.save(&credential)?;
        Ok(credential)
    }
}
