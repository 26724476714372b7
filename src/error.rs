use crate::session::SessionId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a block catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

/// Errors that can occur when converting an editor document into a `Project`.
#[derive(Error, Debug, Clone)]
pub enum ProjectConversionError {
    #[error("Failed to parse project JSON: {0}")]
    JsonParseError(String),

    #[error("Block id '{0}' is used by more than one block")]
    DuplicateBlockId(String),

    #[error("Connection #{connection_index} leaves through unknown connector '{connector}'")]
    UnknownConnector {
        connection_index: usize,
        connector: String,
    },
}

/// Errors raised while interpreting a sandbox policy level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Unknown policy level '{0}', expected one of: full, limited, restricted")]
    UnknownLevel(String),
}

/// The coarse category of a `SessionError`, for hosts that map failures onto responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorKind {
    NotFound,
    Unavailable,
    Io,
    Spawn,
}

/// Errors surfaced by the session manager. None of them are fatal to the host.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session '{0}' not found")]
    NotFound(SessionId),

    #[error("No usable interpreter found (tried: {})", candidates.join(", "))]
    InterpreterUnavailable { candidates: Vec<String> },

    #[error("Process finished for session '{0}'")]
    ProcessFinished(SessionId),

    #[error("I/O failure in session '{session_id}': {source}")]
    Io {
        session_id: SessionId,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to persist program artifact: {0}")]
    Artifact(#[source] std::io::Error),
}

impl SessionError {
    pub fn kind(&self) -> SessionErrorKind {
        match self {
            SessionError::NotFound(_) => SessionErrorKind::NotFound,
            SessionError::InterpreterUnavailable { .. } | SessionError::ProcessFinished(_) => {
                SessionErrorKind::Unavailable
            }
            SessionError::Io { .. } => SessionErrorKind::Io,
            SessionError::Spawn { .. } | SessionError::Artifact(_) => SessionErrorKind::Spawn,
        }
    }
}

/// Errors that can occur while loading an `EngineConfig`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(String),
}
