use crate::CliError;
use crate::repl::{ReplCommand, format_prompt, format_status, format_symbols};

use std::path::PathBuf;

use gdlsp_core::protocol::DocumentSymbol;
use gdlsp_core::{ConnectionStatus, Prompt, PromptKind, StatusSnapshot};
use googletest::assert_that;
use googletest::prelude::{eq, len};

#[test]
fn given_hover_line_when_parsed_then_position_is_zero_based() {
    // Given
    let line = "hover scripts/player.gd 12 5";

    // When
    let command: ReplCommand = line.parse().unwrap();

    // Then
    assert_that!(
        command,
        eq(&ReplCommand::Hover {
            path: PathBuf::from("scripts/player.gd"),
            line: 11,
            character: 4,
        })
    );
}

#[test]
fn given_zero_position_when_parsed_then_usage_error() {
    // Given
    let line = "hover player.gd 0 1";

    // When
    let result = line.parse::<ReplCommand>();

    // Then
    assert!(matches!(result, Err(CliError::Usage { .. })));
}

#[test]
fn given_select_with_spaces_when_parsed_then_path_rejoined() {
    // Given
    let line = "select /opt/My Godot/godot";

    // When
    let command: ReplCommand = line.parse().unwrap();

    // Then
    assert_that!(
        command,
        eq(&ReplCommand::Select {
            path: String::from("/opt/My Godot/godot"),
        })
    );
}

#[test]
fn given_simple_commands_when_parsed_then_recognised() {
    let cases = [
        ("start", ReplCommand::Start),
        ("stop", ReplCommand::Stop),
        ("  status  ", ReplCommand::Status),
        ("retry", ReplCommand::Retry),
        ("disable-headless", ReplCommand::DisableHeadless),
        ("editor", ReplCommand::Editor),
        ("exit", ReplCommand::Quit),
    ];

    for (line, expected) in cases {
        assert_that!(line.parse::<ReplCommand>().unwrap(), eq(&expected));
    }
}

#[test]
fn given_unknown_or_extra_words_when_parsed_then_usage_error() {
    for line in ["launch", "stop now", "symbols", ""] {
        assert!(matches!(
            line.parse::<ReplCommand>(),
            Err(CliError::Usage { .. })
        ));
    }
}

#[test]
fn given_prompt_when_formatted_then_lists_repl_actions() {
    // Given
    let prompt = Prompt::new(1, PromptKind::TooOldVersion, "Godot 4.1 is too old.");

    // When
    let text = format_prompt(&prompt);

    // Then
    assert_that!(
        text,
        eq("Godot 4.1 is too old.\n  -> select <path> | disable-headless | ignore")
    );
}

#[test]
fn given_snapshot_when_formatted_then_text_tooltip_and_target() {
    // Given
    let snapshot = StatusSnapshot {
        status: ConnectionStatus::Connected,
        target: String::from("127.0.0.1:6005"),
    };

    // When
    let text = format_status(&snapshot);

    // Then
    assert_that!(
        text,
        eq("[Connected] Connected to the GDScript language server. (127.0.0.1:6005)")
    );
}

#[test]
fn given_nested_symbols_when_formatted_then_indented_outline() {
    // Given
    let symbols: Vec<DocumentSymbol> = serde_json::from_value(serde_json::json!([{
        "name": "Player",
        "kind": 5,
        "range": {
            "start": { "line": 0, "character": 0 },
            "end": { "line": 9, "character": 0 }
        },
        "selectionRange": {
            "start": { "line": 0, "character": 11 },
            "end": { "line": 0, "character": 17 }
        },
        "children": [{
            "name": "_ready",
            "kind": 6,
            "range": {
                "start": { "line": 2, "character": 0 },
                "end": { "line": 4, "character": 0 }
            },
            "selectionRange": {
                "start": { "line": 2, "character": 5 },
                "end": { "line": 2, "character": 11 }
            }
        }]
    }]))
    .unwrap();

    // When
    let lines = format_symbols(&symbols);

    // Then
    assert_that!(lines, len(eq(2)));
    assert_that!(lines[0], eq("Player:1"));
    assert_that!(lines[1], eq("  _ready:3"));
}
