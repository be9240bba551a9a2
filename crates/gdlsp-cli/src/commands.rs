use crate::repl::{self, ReplCommand};
use crate::{CliError, CliResult, Command};

use std::path::{Path, PathBuf};

use gdlsp_config::Config;
use gdlsp_core::{
    ConnectionManager, ManagerHandle, ProjectInfo, PromptResponse, VersionValidator, protocol,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Load and validate configuration, honouring `--config-dir`.
pub fn load_config(config_dir: Option<&Path>) -> CliResult<(Config, PathBuf)> {
    let config_dir = match config_dir {
        Some(dir) => dir.to_path_buf(),
        None => Config::config_dir()?,
    };
    let config = Config::load_from(&config_dir)?;
    config.validate()?;
    Ok((config, config_dir))
}

pub async fn execute(command: Command, mut config: Config, config_dir: &Path) -> CliResult<()> {
    if let Some(headless) = command.headless_override() {
        config.lsp.headless = headless;
    }

    match command {
        Command::Run { project, .. } => run(config, project).await,
        Command::CheckVersion { path, major } => check_version(&config, &path, major).await,
        Command::PrintConfig => {
            println!("config dir: {}", config_dir.display());
            for line in config.summary() {
                println!("{line}");
            }
            Ok(())
        }
    }
}

async fn check_version(config: &Config, path: &str, major: u32) -> CliResult<()> {
    let minimum_minor = config
        .version_policy
        .minimum_minor(major)
        .ok_or_else(|| CliError::usage(format!("Godot {major} is not supported")))?;

    let version = VersionValidator::from_config(&config.process)
        .validate(path, major, minimum_minor)
        .await?;
    println!("{path}: Godot {version} (ok for {major}.{minimum_minor}+)");
    Ok(())
}

async fn run(config: Config, project: Option<PathBuf>) -> CliResult<()> {
    let start = match project {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let project = ProjectInfo::discover(&start)?;
    println!(
        "Godot {} project at {}",
        project.godot_major,
        project.project_dir.display()
    );

    let (manager, handle) = ConnectionManager::new(config, project);
    let status_printer = tokio::spawn(print_statuses(handle.clone()));
    let prompt_printer = tokio::spawn(print_prompts(handle.clone()));
    let manager_task = tokio::spawn(manager.run());

    println!("Type 'help' for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                None
            }
        };

        // EOF on stdin ends the session like `quit`
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<ReplCommand>() {
            Ok(ReplCommand::Quit) => break,
            Ok(command) => {
                if let Err(e) = dispatch(&handle, command).await {
                    println!("error: {e}");
                }
            }
            Err(e) => println!("{e}"),
        }
    }

    handle.shutdown().await?;
    if let Err(e) = manager_task.await {
        warn!("Connection manager task failed: {e}");
    }
    status_printer.abort();
    prompt_printer.abort();
    Ok(())
}

async fn dispatch(handle: &ManagerHandle, command: ReplCommand) -> CliResult<()> {
    debug!("REPL command {command:?}");
    match command {
        ReplCommand::Start => handle.start_language_server().await?,
        ReplCommand::Stop => handle.stop_language_server().await?,
        ReplCommand::Status => {
            let snapshot = handle.check_status().await?;
            println!("{}", repl::format_status(&snapshot));
        }
        ReplCommand::Retry => handle.respond(PromptResponse::Retry).await?,
        ReplCommand::Select { path } => {
            handle
                .respond(PromptResponse::SelectExecutable { path })
                .await?
        }
        ReplCommand::DisableHeadless => handle.respond(PromptResponse::DisableHeadless).await?,
        ReplCommand::Ignore => handle.respond(PromptResponse::Ignore).await?,
        ReplCommand::Editor => {
            let pid = handle.launch_editor().await?;
            println!("Godot editor started (pid {pid})");
        }
        ReplCommand::Hover {
            path,
            line,
            character,
        } => match handle.features().hover(&path, line, character).await {
            Some(hover) => println!("{}", protocol::hover_text(&hover)),
            None => println!("(no hover information)"),
        },
        ReplCommand::Symbols { path } => {
            let symbols = handle.features().document_symbols(&path).await;
            if symbols.is_empty() {
                println!("(no symbols)");
            }
            for line in repl::format_symbols(&symbols) {
                println!("{line}");
            }
        }
        ReplCommand::Help => println!("{}", repl::HELP),
        ReplCommand::Quit => {}
    }
    Ok(())
}

async fn print_statuses(handle: ManagerHandle) {
    let mut events = handle.status_events();
    loop {
        match events.recv().await {
            Ok(snapshot) => println!("{}", repl::format_status(&snapshot)),
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}

async fn print_prompts(handle: ManagerHandle) {
    let mut prompts = handle.prompts();
    loop {
        match prompts.recv().await {
            Ok(prompt) => println!("{}", repl::format_prompt(&prompt)),
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}
