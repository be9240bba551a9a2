use crate::AutoReconnectConfig;

use std::time::Duration;

use googletest::assert_that;
use googletest::prelude::{anything, eq, err, ok};

#[test]
fn given_defaults_when_validate_then_ok() {
    // Given
    let config = AutoReconnectConfig::default();

    // When
    let result = config.validate();

    // Then
    assert_that!(result, ok(anything()));
    assert_that!(config.cooldown(), eq(Duration::from_millis(3_000)));
}

#[test]
fn given_attempts_at_bounds_when_validate_then_ok() {
    for attempts in [crate::MIN_RECONNECT_ATTEMPTS, crate::MAX_RECONNECT_ATTEMPTS] {
        // Given
        let config = AutoReconnectConfig {
            attempts,
            ..Default::default()
        };

        // When / Then
        assert_that!(config.validate(), ok(anything()));
    }
}

#[test]
fn given_zero_attempts_when_validate_then_error() {
    // Given
    let config = AutoReconnectConfig {
        attempts: 0,
        ..Default::default()
    };

    // When
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
fn given_attempts_above_maximum_when_validate_then_error() {
    // Given
    let config = AutoReconnectConfig {
        attempts: crate::MAX_RECONNECT_ATTEMPTS + 1,
        ..Default::default()
    };

    // When
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
fn given_cooldown_out_of_range_when_validate_then_error() {
    for cooldown_ms in [
        crate::MIN_RECONNECT_COOLDOWN_MS - 1,
        crate::MAX_RECONNECT_COOLDOWN_MS + 1,
    ] {
        // Given
        let config = AutoReconnectConfig {
            cooldown_ms,
            ..Default::default()
        };

        // When / Then
        assert_that!(config.validate(), err(anything()));
    }
}

#[test]
fn given_disabled_with_valid_numbers_when_validate_then_ok() {
    // Given
    let config = AutoReconnectConfig {
        enabled: false,
        ..Default::default()
    };

    // When / Then
    assert_that!(config.validate(), ok(anything()));
}
