use crate::manager_event::ManagerEvent;
use crate::{ConnectionManager, ConnectionStatus, ProcessExit, ProcessRole, ProjectInfo};

use gdlsp_config::Config;
use googletest::assert_that;
use googletest::prelude::eq;
use tempfile::TempDir;

const SPAWNED_PORT: u16 = 6010;
const SPAWNED_PID: u32 = 4242;

fn headless_manager(project: &TempDir) -> ConnectionManager {
    let mut config = Config::default();
    config.lsp.headless = true;
    config.lsp.server_port = 6005;
    let (manager, _handle) = ConnectionManager::new(config, ProjectInfo::new(project.path(), 4));
    manager
}

fn spawned(sequence: u64) -> ManagerEvent {
    ManagerEvent::ServerSpawned {
        sequence,
        port: SPAWNED_PORT,
        pid: SPAWNED_PID,
    }
}

fn exited(pid: u32) -> ProcessExit {
    ProcessExit {
        role: ProcessRole::LanguageServer,
        pid,
        exit_code: Some(1),
    }
}

#[tokio::test]
async fn given_server_exit_before_spawn_report_when_reported_then_port_released() {
    // Given
    let project = TempDir::new().unwrap();
    let mut manager = headless_manager(&project);
    manager.manual_reconnect();
    assert_that!(
        manager.snapshot().status,
        eq(ConnectionStatus::InitializingServer)
    );

    // When
    manager.handle_exit(exited(SPAWNED_PID));
    manager.handle_event(spawned(1));

    // Then
    assert_that!(manager.snapshot().target, eq("127.0.0.1:6005"));
}

#[tokio::test]
async fn given_unrelated_exit_during_attempt_when_spawn_reported_then_port_kept() {
    // Given
    let project = TempDir::new().unwrap();
    let mut manager = headless_manager(&project);
    manager.manual_reconnect();

    // When
    manager.handle_exit(exited(SPAWNED_PID + 1));
    manager.handle_event(spawned(1));

    // Then
    assert_that!(
        manager.snapshot().target,
        eq(&format!("127.0.0.1:{SPAWNED_PORT}"))
    );

    // The tracked server's own exit still releases the port
    manager.handle_exit(exited(SPAWNED_PID));
    assert_that!(manager.snapshot().target, eq("127.0.0.1:6005"));
}
