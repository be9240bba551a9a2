use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Config error: {0}")]
    Config(#[from] gdlsp_config::ConfigError),

    #[error("{0}")]
    Lsp(#[from] gdlsp_core::LspError),

    #[error("Failed to set up logging: {message} {location}")]
    Logging {
        message: String,
        location: ErrorLocation,
    },

    #[error("IO error: {source} {location}")]
    Io {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("{message}")]
    Usage { message: String },
}

impl CliError {
    #[track_caller]
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    pub fn recovery_hint(&self) -> Option<&'static str> {
        match self {
            Self::Lsp(e) => Some(e.recovery_hint()),
            Self::Config(_) => Some("Check config.toml and GDLSP_* environment variables."),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
