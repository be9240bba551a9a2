use crate::{LspError, Prompt, PromptAction, PromptKind};

use googletest::assert_that;
use googletest::prelude::{contains_substring, eq, none};

#[test]
fn given_too_old_error_when_prompted_then_offers_disable_headless() {
    // Given
    let error = LspError::TooOldVersion {
        minimum: String::from("4.2"),
        actual: String::from("4.1.3"),
        location: error_location::ErrorLocation::from(std::panic::Location::caller()),
    };

    // When
    let prompt = Prompt::for_executable_error(1, &error, 4).unwrap();

    // Then
    assert_that!(prompt.kind, eq(PromptKind::TooOldVersion));
    assert_that!(
        prompt.actions,
        eq(&vec![
            PromptAction::SelectExecutable,
            PromptAction::DisableHeadless,
            PromptAction::Ignore,
        ])
    );
    assert_that!(prompt.message, contains_substring("4.1.3"));
}

#[test]
fn given_invalid_executable_when_prompted_then_no_disable_headless() {
    // Given
    let error = LspError::invalid_executable("/bin/false", "no version");

    // When
    let prompt = Prompt::for_executable_error(1, &error, 4).unwrap();

    // Then
    assert_that!(prompt.kind, eq(PromptKind::InvalidExecutable));
    assert_that!(
        prompt.actions.contains(&PromptAction::DisableHeadless),
        eq(false)
    );
}

#[test]
fn given_connection_error_when_prompted_then_none() {
    // Given
    let error = LspError::protocol("bad frame");

    // When
    let prompt = Prompt::for_executable_error(1, &error, 4);

    // Then
    assert_that!(prompt, none());
}

#[test]
fn given_exhausted_retries_when_prompted_then_offers_retry() {
    // Given / When
    let prompt = Prompt::connection_lost(7, "127.0.0.1:6005", 10);

    // Then
    assert_that!(prompt.id, eq(7));
    assert_that!(prompt.message, contains_substring("10 attempts"));
    assert_that!(
        prompt.actions,
        eq(&vec![PromptAction::Retry, PromptAction::Ignore])
    );
}
