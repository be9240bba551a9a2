use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_VERSION_CHECK_TIMEOUT_MS,
    MAX_VERSION_CHECK_TIMEOUT_MS, MIN_VERSION_CHECK_TIMEOUT_MS,
};

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Upper bound for `<godot> --version`
    pub version_check_timeout_ms: u64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            version_check_timeout_ms: DEFAULT_VERSION_CHECK_TIMEOUT_MS,
        }
    }
}

impl ProcessConfig {
    pub fn version_check_timeout(&self) -> Duration {
        Duration::from_millis(self.version_check_timeout_ms)
    }

    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.version_check_timeout_ms < MIN_VERSION_CHECK_TIMEOUT_MS
            || self.version_check_timeout_ms > MAX_VERSION_CHECK_TIMEOUT_MS
        {
            return Err(ConfigError::process(format!(
                "process.version_check_timeout_ms must be {}-{}, got {}",
                MIN_VERSION_CHECK_TIMEOUT_MS,
                MAX_VERSION_CHECK_TIMEOUT_MS,
                self.version_check_timeout_ms
            )));
        }

        Ok(())
    }
}
