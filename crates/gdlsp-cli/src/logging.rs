//! Console and rotating file logging.

use crate::{CliError, CliResult};

use std::path::Path;

use gdlsp_config::LoggingConfig;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

const MAX_LOG_FILES: usize = 7;

/// Install the global subscriber.
///
/// Console output goes to stderr so stdout stays free for the prompt. A file
/// layer with daily rotation is added when `logging.file` is set. `RUST_LOG`
/// takes precedence over `logging.level`.
pub fn setup_logging(config: &LoggingConfig, log_dir: &Path) -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr);

    let file_layer = match &config.file {
        Some(file) => {
            std::fs::create_dir_all(log_dir)?;
            let (prefix, suffix) = split_file_name(file);
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(MAX_LOG_FILES)
                .filename_prefix(prefix)
                .filename_suffix(suffix)
                .build(log_dir)
                .map_err(|e| CliError::logging(e.to_string()))?;

            Some(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(false)
                    .with_writer(appender),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::logging(e.to_string()))
}

/// `gdlsp.log` -> (`gdlsp`, `log`). Names without an extension get `log`.
pub fn split_file_name(file: &str) -> (String, String) {
    let path = Path::new(file);
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("gdlsp"));
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("log"));
    (stem, extension)
}
