use crate::logging::split_file_name;

use googletest::assert_that;
use googletest::prelude::eq;

#[test]
fn given_file_with_extension_when_split_then_prefix_and_suffix() {
    // Given / When
    let (prefix, suffix) = split_file_name("gdlsp.log");

    // Then
    assert_that!(prefix, eq("gdlsp"));
    assert_that!(suffix, eq("log"));
}

#[test]
fn given_file_without_extension_when_split_then_log_suffix() {
    // Given / When
    let (prefix, suffix) = split_file_name("session");

    // Then
    assert_that!(prefix, eq("session"));
    assert_that!(suffix, eq("log"));
}
