mod auto_reconnect_config;
mod config;
mod editor_path_config;
mod error;
mod log_level;
mod logging_config;
mod lsp_config;
mod process_config;
mod version_policy_config;

#[cfg(test)]
mod tests;

pub use auto_reconnect_config::AutoReconnectConfig;
pub use config::Config;
pub use editor_path_config::EditorPathConfig;
pub use error::{ConfigError, ConfigErrorResult};
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use lsp_config::LspConfig;
pub use process_config::ProcessConfig;
pub use version_policy_config::VersionPolicyConfig;

pub const CONFIG_DIR_ENV: &str = "GDLSP_CONFIG_DIR";
pub const CONFIG_FILENAME: &str = "config.toml";
const LOCAL_CONFIG_DIRNAME: &str = ".gdlsp";
const USER_CONFIG_DIRNAME: &str = "gdlsp";

// Connection target defaults (Godot 4 editor listens on 6005)
const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
pub const DEFAULT_SERVER_PORT: u16 = 6005;
const DEFAULT_HEADLESS: bool = false;

pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
pub const MIN_CONNECT_TIMEOUT_MS: u64 = 100;
pub const MAX_CONNECT_TIMEOUT_MS: u64 = 120_000;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 100;
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 300_000;

// Auto reconnect
const DEFAULT_AUTO_RECONNECT_ENABLED: bool = true;
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 10;
pub const MIN_RECONNECT_ATTEMPTS: u32 = 1;
pub const MAX_RECONNECT_ATTEMPTS: u32 = 100;

pub const DEFAULT_RECONNECT_COOLDOWN_MS: u64 = 3_000;
pub const MIN_RECONNECT_COOLDOWN_MS: u64 = 10;
pub const MAX_RECONNECT_COOLDOWN_MS: u64 = 600_000;

// Supported Godot major lines and their minimum minor versions
pub const GODOT3_MAJOR: u32 = 3;
pub const GODOT4_MAJOR: u32 = 4;
pub const DEFAULT_GODOT3_MINIMUM_MINOR: u32 = 6;
pub const DEFAULT_GODOT4_MINIMUM_MINOR: u32 = 2;

// Child processes
pub const DEFAULT_VERSION_CHECK_TIMEOUT_MS: u64 = 5_000;
pub const MIN_VERSION_CHECK_TIMEOUT_MS: u64 = 100;
pub const MAX_VERSION_CHECK_TIMEOUT_MS: u64 = 60_000;

// Logging
const DEFAULT_LOG_LEVEL: tracing::level_filters::LevelFilter =
    tracing::level_filters::LevelFilter::INFO;
const DEFAULT_LOG_DIRECTORY: &str = "logs";
