//! Runs `<godot> --version` and checks it against the project's version line.

use crate::{GodotVersion, LspError, LspResult};

use std::panic::Location;
use std::process::Stdio;
use std::time::Duration;

use error_location::ErrorLocation;
use gdlsp_config::ProcessConfig;
use tokio::process::Command;
use tracing::{debug, info};

const VERSION_FLAG: &str = "--version";

#[derive(Debug, Clone)]
pub struct VersionValidator {
    timeout: Duration,
}

impl VersionValidator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(config: &ProcessConfig) -> Self {
        Self::new(config.version_check_timeout())
    }

    /// Validate the executable at `path` for a project on `required_major`.
    pub async fn validate(
        &self,
        path: &str,
        required_major: u32,
        minimum_minor: u32,
    ) -> LspResult<GodotVersion> {
        if path.trim().is_empty() {
            return Err(LspError::invalid_executable(
                path,
                format!("no Godot {required_major} executable configured"),
            ));
        }

        let output = self.read_version(path).await?;
        let version = GodotVersion::parse(&output).ok_or_else(|| {
            LspError::invalid_executable(
                path,
                format!("unrecognised version output '{}'", output.trim()),
            )
        })?;

        Self::check(&version, required_major, minimum_minor)?;

        info!("Validated Godot {} at {}", version, path);
        Ok(version)
    }

    /// Compatibility rules without running anything.
    pub fn check(version: &GodotVersion, required_major: u32, minimum_minor: u32) -> LspResult<()> {
        if version.major != required_major {
            return Err(LspError::WrongVersion {
                expected: required_major,
                actual: version.short(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if version.minor < minimum_minor {
            return Err(LspError::TooOldVersion {
                minimum: format!("{required_major}.{minimum_minor}"),
                actual: version.short(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(())
    }

    async fn read_version(&self, path: &str) -> LspResult<String> {
        debug!("Running {} {} (timeout {:?})", path, VERSION_FLAG, self.timeout);

        let mut command = Command::new(path);
        command
            .arg(VERSION_FLAG)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                LspError::invalid_executable(
                    path,
                    format!("no version reported within {}ms", self.timeout.as_millis()),
                )
            })?
            .map_err(|e| LspError::invalid_executable(path, e.to_string()))?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
