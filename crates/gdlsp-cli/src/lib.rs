mod cli;
mod commands;
mod error;
pub mod logging;
pub mod repl;

#[cfg(test)]
mod tests;

pub use cli::{Cli, Command};
pub use commands::{execute, load_config};
pub use error::{CliError, Result as CliResult};
