mod connection_manager;
#[cfg(unix)]
mod process_supervisor;
mod prompt;
mod server_endpoint;

use crate::{ConnectionStateMachine, ReconnectPolicy, ServerEndpoint};

use std::time::Duration;

pub(crate) const TEST_COOLDOWN: Duration = Duration::from_millis(50);

/// State machine for an external server at 127.0.0.1:6005.
pub(crate) fn machine(enabled: bool, attempts: u32) -> ConnectionStateMachine {
    ConnectionStateMachine::new(
        ReconnectPolicy::new(enabled, attempts, TEST_COOLDOWN),
        ServerEndpoint::external("127.0.0.1", 6005),
    )
}

/// Write an executable shell script into `dir`.
#[cfg(unix)]
pub(crate) fn write_script(dir: &std::path::Path, name: &str, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
