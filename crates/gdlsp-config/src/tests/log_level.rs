use crate::{Config, LogLevel};

use std::str::FromStr;

use googletest::assert_that;
use googletest::prelude::eq;
use tracing::level_filters::LevelFilter;

#[test]
fn given_known_level_names_when_parse_then_matching_filter() {
    assert_that!(LogLevel::from_str("debug").unwrap().0, eq(LevelFilter::DEBUG));
    assert_that!(LogLevel::from_str(" WARN ").unwrap().0, eq(LevelFilter::WARN));
    assert_that!(LogLevel::from_str("off").unwrap().0, eq(LevelFilter::OFF));
}

#[test]
fn given_unknown_level_when_parse_then_falls_back_to_info() {
    assert_that!(LogLevel::from_str("loud").unwrap().0, eq(LevelFilter::INFO));
}

#[test]
fn given_toml_level_when_deserialize_then_applied() {
    // Given
    let toml = "[logging]\nlevel = \"trace\"\n";

    // When
    let config: Config = toml::from_str(toml).unwrap();

    // Then
    assert_that!(LevelFilter::from(config.logging.level), eq(LevelFilter::TRACE));
}

#[test]
fn given_numeric_toml_level_when_deserialize_then_default() {
    let config: Config = toml::from_str("[logging]\nlevel = 3\n").unwrap();

    assert_that!(config.logging.level, eq(LogLevel::default()));
}

#[test]
fn given_level_when_display_then_lowercase_name() {
    assert_that!(LogLevel::parse_lenient("Debug").to_string(), eq("debug"));
    assert_that!(LogLevel::default().to_string(), eq("info"));
}
