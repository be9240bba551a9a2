use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LspError {
    #[error("Invalid Godot executable '{path}': {reason} {location}")]
    InvalidExecutable {
        path: String,
        reason: String,
        location: ErrorLocation,
    },

    #[error("Godot {actual} does not match the project's major version {expected} {location}")]
    WrongVersion {
        expected: u32,
        actual: String,
        location: ErrorLocation,
    },

    #[error("Godot {actual} is older than the supported minimum {minimum} {location}")]
    TooOldVersion {
        minimum: String,
        actual: String,
        location: ErrorLocation,
    },

    #[error("No free TCP port available: {source} {location}")]
    NoPortAvailable {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Failed to spawn '{command}': {source} {location}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Connection to {target} refused: {source} {location}")]
    ConnectionRefused {
        target: String,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Connection to {target} timed out after {timeout_ms}ms {location}")]
    ConnectionTimeout {
        target: String,
        timeout_ms: u64,
        location: ErrorLocation,
    },

    #[error("Request '{method}' issued while not connected {location}")]
    RequestWhileDisconnected {
        method: String,
        location: ErrorLocation,
    },

    #[error("Request '{method}' timed out after {timeout_ms}ms {location}")]
    RequestTimeout {
        method: String,
        timeout_ms: u64,
        location: ErrorLocation,
    },

    #[error("Language server returned error {code}: {message} {location}")]
    ResponseError {
        code: i64,
        message: String,
        location: ErrorLocation,
    },

    #[error("Protocol error: {message} {location}")]
    Protocol {
        message: String,
        location: ErrorLocation,
    },

    #[error("No project.godot found at or above {start} {location}")]
    ProjectNotFound {
        start: PathBuf,
        location: ErrorLocation,
    },

    #[error("Operation cancelled {location}")]
    Cancelled { location: ErrorLocation },

    #[error("Connection manager is no longer running {location}")]
    ManagerUnavailable { location: ErrorLocation },

    #[error("IO error: {source} {location}")]
    Io {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("JSON error: {source} {location}")]
    Json {
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },
}

impl LspError {
    #[track_caller]
    pub fn invalid_executable(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidExecutable {
            path: path.into(),
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn request_while_disconnected(method: impl Into<String>) -> Self {
        Self::RequestWhileDisconnected {
            method: method.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn cancelled() -> Self {
        Self::Cancelled {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn manager_unavailable() -> Self {
        Self::ManagerUnavailable {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Executable problems need a configuration change and are never retried.
    pub fn is_executable_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidExecutable { .. } | Self::WrongVersion { .. } | Self::TooOldVersion { .. }
        )
    }

    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::InvalidExecutable { .. } => {
                "The configured Godot executable could not be run. \
                   Select a valid Godot editor binary."
            }
            Self::WrongVersion { .. } => {
                "The configured Godot executable has the wrong major version for this project. \
                   Select a matching Godot editor binary."
            }
            Self::TooOldVersion { .. } => {
                "The configured Godot executable is too old for headless mode. \
                   Select a newer binary or disable headless mode."
            }
            Self::NoPortAvailable { .. } => {
                "No free local port could be allocated. \
                   Close other applications or restart your computer."
            }
            Self::ConnectionRefused { .. } | Self::ConnectionTimeout { .. } => {
                "The language server is not reachable. \
                   Open the project in the Godot editor or enable headless mode."
            }
            Self::ProjectNotFound { .. } => {
                "No Godot project was found. \
                   Run from inside a project or pass --project."
            }
            _ => "An unexpected error occurred. Please check the logs for details.",
        }
    }
}

impl From<std::io::Error> for LspError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for LspError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        Self::Json {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, LspError>;
