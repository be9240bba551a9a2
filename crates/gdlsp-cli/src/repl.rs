//! Line commands read from stdin by `gdlsp run`.

use crate::CliError;

use std::path::PathBuf;
use std::str::FromStr;

use gdlsp_core::protocol::DocumentSymbol;
use gdlsp_core::{Prompt, PromptAction, StatusSnapshot};

pub const HELP: &str = "\
commands:
  start                        start (or restart) the language server
  stop                         stop the language server
  status                       show status, reconnecting when disconnected
  retry                        retry the connection
  select <path>                use <path> as the Godot executable
  disable-headless             connect to a running editor instead
  ignore                       dismiss the last prompt
  editor                       open the project in the Godot editor
  hover <file> <line> <col>    hover at a 1-based position
  symbols <file>               list the symbols of a script
  help                         show this help
  quit                         stop everything and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Start,
    Stop,
    Status,
    Retry,
    Select { path: String },
    DisableHeadless,
    Ignore,
    Editor,
    /// Zero-based position
    Hover {
        path: PathBuf,
        line: u32,
        character: u32,
    },
    Symbols { path: PathBuf },
    Help,
    Quit,
}

impl FromStr for ReplCommand {
    type Err = CliError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CliError::usage("empty command"));
        };
        let rest: Vec<&str> = words.collect();

        let command = match (name, rest.as_slice()) {
            ("start", []) => Self::Start,
            ("stop", []) => Self::Stop,
            ("status", []) => Self::Status,
            ("retry", []) => Self::Retry,
            ("select", [_, ..]) => Self::Select {
                path: rest.join(" "),
            },
            ("disable-headless", []) => Self::DisableHeadless,
            ("ignore", []) => Self::Ignore,
            ("editor", []) => Self::Editor,
            ("hover", [path, line, character]) => Self::Hover {
                path: PathBuf::from(path),
                line: parse_position(line)?,
                character: parse_position(character)?,
            },
            ("symbols", [path]) => Self::Symbols {
                path: PathBuf::from(path),
            },
            ("help" | "?", []) => Self::Help,
            ("quit" | "exit", []) => Self::Quit,
            _ => {
                return Err(CliError::usage(format!(
                    "unrecognised command '{}', type 'help'",
                    line.trim()
                )));
            }
        };
        Ok(command)
    }
}

fn parse_position(text: &str) -> Result<u32, CliError> {
    match text.parse::<u32>() {
        Ok(value) if value > 0 => Ok(value - 1),
        _ => Err(CliError::usage(format!(
            "'{text}' is not a 1-based line or column"
        ))),
    }
}

pub fn format_status(snapshot: &StatusSnapshot) -> String {
    let display = snapshot.display();
    format!(
        "[{}] {} ({})",
        display.text, display.tooltip, snapshot.target
    )
}

pub fn format_prompt(prompt: &Prompt) -> String {
    let actions = prompt
        .actions
        .iter()
        .map(|action| action_command(*action))
        .collect::<Vec<_>>()
        .join(" | ");
    format!("{}\n  -> {actions}", prompt.message)
}

fn action_command(action: PromptAction) -> &'static str {
    match action {
        PromptAction::SelectExecutable => "select <path>",
        PromptAction::DisableHeadless => "disable-headless",
        PromptAction::Ignore => "ignore",
        PromptAction::Retry => "retry",
    }
}

/// Indented outline, one symbol per line.
pub fn format_symbols(symbols: &[DocumentSymbol]) -> Vec<String> {
    fn walk(symbols: &[DocumentSymbol], depth: usize, lines: &mut Vec<String>) {
        for symbol in symbols {
            lines.push(format!(
                "{}{}:{}",
                "  ".repeat(depth),
                symbol.name,
                symbol.range.start.line + 1
            ));
            walk(
                symbol.children.as_deref().unwrap_or_default(),
                depth + 1,
                lines,
            );
        }
    }

    let mut lines = Vec::new();
    walk(symbols, 0, &mut lines);
    lines
}
