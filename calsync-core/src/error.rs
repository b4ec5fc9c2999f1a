//! Error types for calsync.

use std::path::PathBuf;

use thiserror::Error;

use crate::apply::{ApplyReport, WriteOp};

/// Boxed source error from an external collaborator (HTTP client, OAuth, ...).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during a sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authorization failed: {message}")]
    Auth {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Local calendar unavailable at {}: {reason}", path.display())]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("Cloud calendar request failed: {context}")]
    Remote {
        context: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to {op} event '{event_id}' ({applied} before the failure)")]
    Write {
        op: WriteOp,
        event_id: String,
        applied: ApplyReport,
        #[source]
        source: BoxError,
    },
}

impl SyncError {
    pub fn auth(message: impl Into<String>) -> Self {
        SyncError::Auth {
            message: message.into(),
            source: None,
        }
    }

    pub fn auth_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        SyncError::Auth {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn remote(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        SyncError::Remote {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Process exit code for this kind of failure (sysexits.h values).
    pub fn exit_code(&self) -> u8 {
        match self {
            SyncError::Config(_) => 78,
            SyncError::Auth { .. } => 77,
            SyncError::SourceUnavailable { .. } => 69,
            SyncError::Remote { .. } => 75,
            SyncError::Write { .. } => 74,
        }
    }

    /// Short machine-friendly label, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Config(_) => "config",
            SyncError::Auth { .. } => "auth",
            SyncError::SourceUnavailable { .. } => "source_unavailable",
            SyncError::Remote { .. } => "remote",
            SyncError::Write { .. } => "sync_write",
        }
    }
}

/// Result type alias for calsync operations.
pub type SyncResult<T> = Result<T, SyncError>;
