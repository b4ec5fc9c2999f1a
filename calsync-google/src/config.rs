//! Settings for the Google side of a sync.

use std::path::PathBuf;

use serde::Deserialize;

/// `[google]` table of the calsync config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// OAuth client JSON downloaded from the Cloud console.
    pub client_secret_path: PathBuf,
    /// Where the access/refresh token is cached between runs.
    pub token_cache_path: PathBuf,
    pub calendar_id: String,
    /// Loopback port for the consent callback; 0 picks a free one.
    pub redirect_port: u16,
    pub open_browser: bool,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        let dir = base_dir();
        GoogleConfig {
            client_secret_path: dir.join("client_secret.json"),
            token_cache_path: dir.join("token.json"),
            calendar_id: "primary".to_string(),
            redirect_port: 0,
            open_browser: true,
        }
    }
}

/// `<config_dir>/calsync`, or the working directory when the platform has no
/// config directory.
pub fn base_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("calsync")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_live_under_the_calsync_dir() {
        let config = GoogleConfig::default();

        assert!(config.token_cache_path.ends_with("calsync/token.json"));
        assert!(config.client_secret_path.ends_with("calsync/client_secret.json"));
        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.redirect_port, 0);
        assert!(config.open_browser);
    }

    #[test]
    fn partial_table_keeps_defaults() {
        let config: GoogleConfig =
            serde_json::from_str(r#"{"calendar_id": "team@group.calendar.google.com"}"#).unwrap();

        assert_eq!(config.calendar_id, "team@group.calendar.google.com");
        assert_eq!(config.redirect_port, 0);
    }
}
