use crate::{EXTERNAL_PORT_SENTINEL, LOOPBACK_HOST, ServerEndpoint};

use googletest::assert_that;
use googletest::prelude::{eq, none, some};

#[test]
fn given_external_endpoint_when_created_then_sentinel_and_external_address() {
    // Given / When
    let endpoint = ServerEndpoint::external("192.168.1.20", 6008);

    // Then
    assert_that!(endpoint.port, eq(EXTERNAL_PORT_SENTINEL));
    assert_that!(endpoint.allocated_port(), none());
    assert_that!(endpoint.address(), eq(&(String::from("192.168.1.20"), 6008)));
}

#[test]
fn given_assigned_port_when_released_then_back_to_external_host() {
    // Given
    let mut endpoint = ServerEndpoint::external("192.168.1.20", 6008);
    endpoint.assign(41000);
    assert_that!(endpoint.host, eq(LOOPBACK_HOST));
    assert_that!(endpoint.allocated_port(), some(eq(41000)));

    // When
    endpoint.release();

    // Then
    assert_that!(endpoint.is_sentinel(), eq(true));
    assert_that!(endpoint.to_string(), eq("192.168.1.20:6008"));
}
