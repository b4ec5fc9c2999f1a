//! OAuth client credentials as downloaded from the Google Cloud console.
//!
//! Desktop clients download `{"installed": {...}}`, web clients
//! `{"web": {...}}`. A flat `{"client_id", "client_secret"}` object is
//! accepted too.

use std::path::Path;

use calsync_core::{SyncError, SyncResult};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ClientSecretFile {
    Installed { installed: ClientSecret },
    Web { web: ClientSecret },
    Flat(ClientSecret),
}

impl ClientSecret {
    pub fn load(path: &Path) -> SyncResult<Self> {
        if !path.exists() {
            return Err(SyncError::auth(format!(
                "Google client secret not found at {}.\n\n\
                Create an OAuth client of type \"Desktop app\" at\n\
                https://console.cloud.google.com/apis/credentials\n\
                and save the downloaded JSON there (or point KEY_FILE_PATH at it).",
                path.display()
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            SyncError::auth_with(
                format!("Failed to read client secret from {}", path.display()),
                e,
            )
        })?;

        Self::parse(&contents).map_err(|e| {
            SyncError::auth_with(
                format!("Invalid client secret in {}", path.display()),
                e,
            )
        })
    }

    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let file: ClientSecretFile = serde_json::from_str(contents)?;
        let secret = match file {
            ClientSecretFile::Installed { installed } => installed,
            ClientSecretFile::Web { web } => web,
            ClientSecretFile::Flat(flat) => flat,
        };

        if secret.client_id.trim().is_empty() {
            return Err(serde::de::Error::custom("client_id is empty"));
        }
        Ok(secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_installed_app_download() {
        let json = r#"{
            "installed": {
                "client_id": "123.apps.googleusercontent.com",
                "project_id": "calsync",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "client_secret": "s3cret",
                "redirect_uris": ["http://localhost"]
            }
        }"#;

        let secret = ClientSecret::parse(json).unwrap();
        assert_eq!(secret.client_id, "123.apps.googleusercontent.com");
        assert_eq!(secret.client_secret, "s3cret");
    }

    #[test]
    fn parses_web_and_flat_layouts() {
        let web = r#"{"web": {"client_id": "w", "client_secret": "ws"}}"#;
        let flat = r#"{"client_id": "f", "client_secret": "fs"}"#;

        assert_eq!(ClientSecret::parse(web).unwrap().client_id, "w");
        assert_eq!(ClientSecret::parse(flat).unwrap().client_secret, "fs");
    }

    #[test]
    fn rejects_incomplete_secret() {
        assert!(ClientSecret::parse(r#"{"installed": {"client_id": "x"}}"#).is_err());
        assert!(ClientSecret::parse(r#"{"client_id": "", "client_secret": "y"}"#).is_err());
        assert!(ClientSecret::parse("not json").is_err());
    }

    #[test]
    fn missing_file_is_an_auth_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = ClientSecret::load(&dir.path().join("client_secret.json")).unwrap_err();

        assert_eq!(err.kind(), "auth");
        assert!(err.to_string().contains("client secret not found"));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client_secret.json");
        std::fs::write(&path, r#"{"installed": {"client_id": "a", "client_secret": "b"}}"#)
            .unwrap();

        let secret = ClientSecret::load(&path).unwrap();

        assert_eq!(
            secret,
            ClientSecret {
                client_id: "a".to_string(),
                client_secret: "b".to_string()
            }
        );
    }
}
