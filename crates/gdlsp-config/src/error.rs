use std::panic::Location;
use std::path::PathBuf;
use std::result::Result as StdResult;

use error_location::ErrorLocation;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum ConfigError {
    #[error("{category} error: {message} {location}")]
    Generic {
        category: &'static str,
        message: String,
        location: ErrorLocation,
    },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("No configuration directory could be determined")]
    NoConfigDir,
}

impl ConfigError {
    /// Cross-section problem, e.g. an unusable log directory
    #[track_caller]
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::section("Config", message)
    }

    /// `[lsp]` and `[lsp.auto_reconnect]`
    #[track_caller]
    pub fn lsp<S: Into<String>>(message: S) -> Self {
        Self::section("Lsp", message)
    }

    #[track_caller]
    pub fn process<S: Into<String>>(message: S) -> Self {
        Self::section("Process", message)
    }

    #[track_caller]
    fn section<S: Into<String>>(category: &'static str, message: S) -> Self {
        Self::Generic {
            category,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type ConfigErrorResult<T> = StdResult<T, ConfigError>;
