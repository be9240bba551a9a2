use crate::{
    AutoReconnectConfig, ConfigError, ConfigErrorResult, DEFAULT_CONNECT_TIMEOUT_MS,
    DEFAULT_HEADLESS, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
    MAX_CONNECT_TIMEOUT_MS, MAX_REQUEST_TIMEOUT_MS, MIN_CONNECT_TIMEOUT_MS,
    MIN_REQUEST_TIMEOUT_MS,
};

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LspConfig {
    /// Spawn a headless Godot editor instead of connecting to a running one
    pub headless: bool,
    /// Host of an externally running language server (ignored when headless)
    pub server_host: String,
    /// Port of an externally running language server (ignored when headless)
    pub server_port: u16,
    /// How long a single connect keeps polling for the server socket
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub auto_reconnect: AutoReconnectConfig,
}

impl Default for LspConfig {
    fn default() -> Self {
        Self {
            headless: DEFAULT_HEADLESS,
            server_host: String::from(DEFAULT_SERVER_HOST),
            server_port: DEFAULT_SERVER_PORT,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            auto_reconnect: AutoReconnectConfig::default(),
        }
    }
}

impl LspConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.server_host.trim().is_empty() {
            return Err(ConfigError::lsp("lsp.server_host cannot be empty"));
        }

        if self.server_port == 0 {
            return Err(ConfigError::lsp("lsp.server_port must be 1-65535, got 0"));
        }

        if self.connect_timeout_ms < MIN_CONNECT_TIMEOUT_MS
            || self.connect_timeout_ms > MAX_CONNECT_TIMEOUT_MS
        {
            return Err(ConfigError::lsp(format!(
                "lsp.connect_timeout_ms must be {}-{}, got {}",
                MIN_CONNECT_TIMEOUT_MS, MAX_CONNECT_TIMEOUT_MS, self.connect_timeout_ms
            )));
        }

        if self.request_timeout_ms < MIN_REQUEST_TIMEOUT_MS
            || self.request_timeout_ms > MAX_REQUEST_TIMEOUT_MS
        {
            return Err(ConfigError::lsp(format!(
                "lsp.request_timeout_ms must be {}-{}, got {}",
                MIN_REQUEST_TIMEOUT_MS, MAX_REQUEST_TIMEOUT_MS, self.request_timeout_ms
            )));
        }

        self.auto_reconnect.validate()
    }
}
