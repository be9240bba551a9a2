use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_AUTO_RECONNECT_ENABLED, DEFAULT_RECONNECT_ATTEMPTS,
    DEFAULT_RECONNECT_COOLDOWN_MS, MAX_RECONNECT_ATTEMPTS, MAX_RECONNECT_COOLDOWN_MS,
    MIN_RECONNECT_ATTEMPTS, MIN_RECONNECT_COOLDOWN_MS,
};

use std::time::Duration;

use serde::Deserialize;

/// Automatic reconnection after a lost language-server connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AutoReconnectConfig {
    pub enabled: bool,
    /// Maximum automatic attempts per retry cycle
    pub attempts: u32,
    /// Delay between automatic attempts in milliseconds
    pub cooldown_ms: u64,
}

impl Default for AutoReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_AUTO_RECONNECT_ENABLED,
            attempts: DEFAULT_RECONNECT_ATTEMPTS,
            cooldown_ms: DEFAULT_RECONNECT_COOLDOWN_MS,
        }
    }
}

impl AutoReconnectConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.attempts < MIN_RECONNECT_ATTEMPTS || self.attempts > MAX_RECONNECT_ATTEMPTS {
            return Err(ConfigError::lsp(format!(
                "lsp.auto_reconnect.attempts must be {}-{}, got {}",
                MIN_RECONNECT_ATTEMPTS, MAX_RECONNECT_ATTEMPTS, self.attempts
            )));
        }

        if self.cooldown_ms < MIN_RECONNECT_COOLDOWN_MS
            || self.cooldown_ms > MAX_RECONNECT_COOLDOWN_MS
        {
            return Err(ConfigError::lsp(format!(
                "lsp.auto_reconnect.cooldown_ms must be {}-{}, got {}",
                MIN_RECONNECT_COOLDOWN_MS, MAX_RECONNECT_COOLDOWN_MS, self.cooldown_ms
            )));
        }

        Ok(())
    }
}
