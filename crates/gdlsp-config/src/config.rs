use crate::{
    CONFIG_DIR_ENV, CONFIG_FILENAME, ConfigError, ConfigErrorResult, EditorPathConfig,
    LOCAL_CONFIG_DIRNAME, LoggingConfig, LspConfig, ProcessConfig, USER_CONFIG_DIRNAME,
    VersionPolicyConfig,
};

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub lsp: LspConfig,
    pub editor_path: EditorPathConfig,
    pub version_policy: VersionPolicyConfig,
    pub process: ProcessConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from the resolved config directory.
    ///
    /// Loading order:
    /// 1. Resolve the directory (see `config_dir`)
    /// 2. Load config.toml if it exists, else use defaults
    /// 3. Apply GDLSP_* environment variable overrides
    ///
    /// Validation is separate, see `validate`.
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;
        Self::load_from(&config_dir)
    }

    /// Same as `load` but with an explicit directory.
    pub fn load_from(config_dir: &Path) -> ConfigErrorResult<Self> {
        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Priority: GDLSP_CONFIG_DIR env var > ./.gdlsp/ if present > user config dir
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let local = std::env::current_dir()
            .map_err(|e| ConfigError::config(format!("current directory unavailable: {e}")))?
            .join(LOCAL_CONFIG_DIRNAME);
        if local.is_dir() {
            return Ok(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join(USER_CONFIG_DIRNAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Range and path checks for every section, run once at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.lsp.validate()?;
        self.process.validate()?;

        let log_dir = Path::new(&self.logging.dir);
        if log_dir.is_absolute() || self.logging.dir.contains("..") {
            return Err(ConfigError::config(
                "logging.dir must be relative and cannot contain '..'",
            ));
        }

        Ok(())
    }

    /// Address of an externally running language server.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.lsp.server_host, self.lsp.server_port)
    }

    /// Human-readable summary, one section per line.
    pub fn summary(&self) -> Vec<String> {
        vec![
            format!(
                "lsp: {} (target {}, connect {}ms, request {}ms)",
                if self.lsp.headless {
                    "headless"
                } else {
                    "external"
                },
                self.server_addr(),
                self.lsp.connect_timeout_ms,
                self.lsp.request_timeout_ms
            ),
            format!(
                "auto_reconnect: {} (attempts={}, cooldown={}ms)",
                if self.lsp.auto_reconnect.enabled {
                    "enabled"
                } else {
                    "disabled"
                },
                self.lsp.auto_reconnect.attempts,
                self.lsp.auto_reconnect.cooldown_ms
            ),
            format!(
                "editor_path: godot3={}, godot4={}",
                self.editor_path.godot3.as_deref().unwrap_or("<unset>"),
                self.editor_path.godot4.as_deref().unwrap_or("<unset>")
            ),
            format!(
                "version_policy: 3.{}+, 4.{}+",
                self.version_policy.godot3_minimum_minor, self.version_policy.godot4_minimum_minor
            ),
            format!(
                "process: version check timeout={}ms",
                self.process.version_check_timeout_ms
            ),
            format!(
                "logging: {} (file: {})",
                self.logging.level,
                self.logging.file.as_deref().unwrap_or("none")
            ),
        ]
    }

    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        for line in self.summary() {
            info!("  {line}");
        }
    }

    fn apply_env_overrides(&mut self) {
        let lsp = &mut self.lsp;
        env_override("GDLSP_LSP_HEADLESS", &mut lsp.headless, parse_bool);
        env_override("GDLSP_LSP_SERVER_HOST", &mut lsp.server_host, parse_string);
        env_override("GDLSP_LSP_SERVER_PORT", &mut lsp.server_port, parse_value);
        env_override(
            "GDLSP_LSP_CONNECT_TIMEOUT_MS",
            &mut lsp.connect_timeout_ms,
            parse_value,
        );
        env_override(
            "GDLSP_LSP_REQUEST_TIMEOUT_MS",
            &mut lsp.request_timeout_ms,
            parse_value,
        );

        let reconnect = &mut self.lsp.auto_reconnect;
        env_override(
            "GDLSP_LSP_AUTO_RECONNECT_ENABLED",
            &mut reconnect.enabled,
            parse_bool,
        );
        env_override(
            "GDLSP_LSP_AUTO_RECONNECT_ATTEMPTS",
            &mut reconnect.attempts,
            parse_value,
        );
        env_override(
            "GDLSP_LSP_AUTO_RECONNECT_COOLDOWN_MS",
            &mut reconnect.cooldown_ms,
            parse_value,
        );

        let paths = &mut self.editor_path;
        env_override(
            "GDLSP_EDITOR_PATH_GODOT3",
            &mut paths.godot3,
            parse_optional,
        );
        env_override(
            "GDLSP_EDITOR_PATH_GODOT4",
            &mut paths.godot4,
            parse_optional,
        );

        let policy = &mut self.version_policy;
        env_override(
            "GDLSP_GODOT3_MINIMUM_MINOR",
            &mut policy.godot3_minimum_minor,
            parse_value,
        );
        env_override(
            "GDLSP_GODOT4_MINIMUM_MINOR",
            &mut policy.godot4_minimum_minor,
            parse_value,
        );

        env_override(
            "GDLSP_VERSION_CHECK_TIMEOUT_MS",
            &mut self.process.version_check_timeout_ms,
            parse_value,
        );

        let logging = &mut self.logging;
        env_override("GDLSP_LOG_LEVEL", &mut logging.level, parse_value);
        env_override("GDLSP_LOG_DIR", &mut logging.dir, parse_string);
        env_override("GDLSP_LOG_FILE", &mut logging.file, parse_optional);
    }
}

/// Replace `target` when `var` is set and `parse` accepts its value.
/// Unparseable values leave the file or default value in place.
fn env_override<T>(var: &str, target: &mut T, parse: impl FnOnce(&str) -> Option<T>) {
    if let Some(value) = std::env::var(var).ok().as_deref().and_then(parse) {
        *target = value;
    }
}

fn parse_value<T: std::str::FromStr>(raw: &str) -> Option<T> {
    raw.trim().parse().ok()
}

fn parse_string(raw: &str) -> Option<String> {
    Some(raw.to_string())
}

/// Blank means unset.
fn parse_optional(raw: &str) -> Option<Option<String>> {
    let raw = raw.trim();
    Some((!raw.is_empty()).then(|| raw.to_string()))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
