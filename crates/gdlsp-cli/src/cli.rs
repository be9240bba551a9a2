use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "gdlsp", version, about = "GDScript language server connection manager")]
pub struct Cli {
    /// Directory holding config.toml (overrides GDLSP_CONFIG_DIR)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect to the project's language server and accept commands on stdin
    Run {
        /// Project directory or any directory below it
        #[arg(long)]
        project: Option<PathBuf>,

        /// Spawn a headless Godot language server
        #[arg(long, conflicts_with = "external")]
        headless: bool,

        /// Connect to an already running Godot editor
        #[arg(long)]
        external: bool,
    },

    /// Check that an executable is a usable Godot editor
    CheckVersion {
        path: String,

        /// Major version the project needs
        #[arg(long, default_value_t = 4)]
        major: u32,
    },

    /// Print the effective configuration
    PrintConfig,
}

impl Command {
    /// Headless override from `--headless` / `--external`.
    pub fn headless_override(&self) -> Option<bool> {
        match self {
            Self::Run { headless: true, .. } => Some(true),
            Self::Run { external: true, .. } => Some(false),
            _ => None,
        }
    }
}
