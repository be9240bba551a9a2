use crate::{KillOutcome, ProcessCommand, ProcessRole, ProcessSupervisor, SpawnOptions};

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use googletest::assert_that;
use googletest::prelude::{contains_substring, eq, len, none, some};

const WAIT: Duration = Duration::from_secs(5);

fn sleeper() -> ProcessCommand {
    ProcessCommand::new("sleep").arg("30")
}

/// In-memory sink for a thread-local fmt subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

async fn wait_until(mut done: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !done() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn given_running_process_when_role_respawned_then_previous_is_terminated() {
    // Given
    let supervisor = ProcessSupervisor::new();
    let first = supervisor
        .spawn(ProcessRole::LanguageServer, &sleeper(), SpawnOptions::attached())
        .await
        .unwrap();

    // When
    let second = supervisor
        .spawn(ProcessRole::LanguageServer, &sleeper(), SpawnOptions::attached())
        .await
        .unwrap();

    // Then
    assert_that!(first.is_alive(), eq(false));
    assert_that!(second.is_alive(), eq(true));
    assert_that!(
        supervisor.pid(ProcessRole::LanguageServer),
        some(eq(second.pid()))
    );

    supervisor.shutdown().await;
}

#[tokio::test]
async fn given_running_process_when_killed_then_exit_is_broadcast() {
    // Given
    let supervisor = ProcessSupervisor::new();
    let mut exits = supervisor.subscribe();
    let process = supervisor
        .spawn(ProcessRole::LanguageServer, &sleeper(), SpawnOptions::attached())
        .await
        .unwrap();

    // When
    let outcome = supervisor.kill(ProcessRole::LanguageServer);

    // Then
    assert_that!(outcome, eq(KillOutcome::Killed));
    let exit = tokio::time::timeout(Duration::from_secs(5), exits.recv())
        .await
        .unwrap()
        .unwrap();
    assert_that!(exit.role, eq(ProcessRole::LanguageServer));
    assert_that!(exit.pid, eq(process.pid()));
    assert_that!(exit.exit_code, none());
    assert_that!(supervisor.is_running(ProcessRole::LanguageServer), eq(false));
}

#[tokio::test]
async fn given_no_process_when_role_killed_then_not_running() {
    // Given
    let supervisor = ProcessSupervisor::new();

    // When
    let outcome = supervisor.kill(ProcessRole::Editor);

    // Then
    assert_that!(outcome, eq(KillOutcome::NotRunning));
}

#[tokio::test]
async fn given_process_exits_normally_when_waited_then_exit_code_reported() {
    // Given
    let supervisor = ProcessSupervisor::new();
    let command = ProcessCommand::new("sh").args(["-c", "exit 3"]);

    // When
    let process = supervisor
        .spawn(ProcessRole::Editor, &command, SpawnOptions::attached())
        .await
        .unwrap();
    let exit = tokio::time::timeout(Duration::from_secs(5), process.wait())
        .await
        .unwrap();

    // Then
    assert_that!(exit.exit_code, some(eq(3)));
}

#[tokio::test]
async fn given_missing_program_when_spawned_then_spawn_failed() {
    // Given
    let supervisor = ProcessSupervisor::new();
    let command = ProcessCommand::new("/nonexistent/godot");

    // When
    let result = supervisor
        .spawn(ProcessRole::LanguageServer, &command, SpawnOptions::attached())
        .await;

    // Then
    assert!(matches!(result, Err(crate::LspError::SpawnFailed { .. })));
}

#[tokio::test]
async fn given_attached_and_detached_when_shutdown_then_only_attached_killed() {
    // Given
    let supervisor = ProcessSupervisor::new();
    let server = supervisor
        .spawn(ProcessRole::LanguageServer, &sleeper(), SpawnOptions::attached())
        .await
        .unwrap();
    let editor = supervisor
        .spawn(ProcessRole::Editor, &sleeper(), SpawnOptions::detached())
        .await
        .unwrap();

    // When
    supervisor.shutdown().await;

    // Then
    assert_that!(server.is_alive(), eq(false));
    assert_that!(editor.is_alive(), eq(true));

    supervisor.kill(ProcessRole::Editor);
    tokio::time::timeout(Duration::from_secs(5), editor.wait())
        .await
        .unwrap();
}

#[tokio::test]
async fn given_concurrent_spawns_for_one_role_when_both_finish_then_single_live_process() {
    // Given
    let supervisor = ProcessSupervisor::new();
    let original = supervisor
        .spawn(ProcessRole::Editor, &sleeper(), SpawnOptions::attached())
        .await
        .unwrap();

    // When
    let command = sleeper();
    let (a, b) = tokio::join!(
        supervisor.spawn(ProcessRole::Editor, &command, SpawnOptions::attached()),
        supervisor.spawn(ProcessRole::Editor, &command, SpawnOptions::attached()),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    // Then
    let live: Vec<u32> = [&original, &a, &b]
        .into_iter()
        .filter(|process| process.is_alive())
        .map(|process| process.pid())
        .collect();
    assert_that!(live, len(eq(1)));
    assert_that!(supervisor.pid(ProcessRole::Editor), some(eq(live[0])));

    supervisor.shutdown().await;
}

#[tokio::test]
async fn given_process_already_exited_when_role_killed_then_not_running() {
    // Given
    let supervisor = ProcessSupervisor::new();
    let command = ProcessCommand::new("sh").args(["-c", "exit 0"]);
    let process = supervisor
        .spawn(ProcessRole::Editor, &command, SpawnOptions::attached())
        .await
        .unwrap();
    tokio::time::timeout(WAIT, process.wait()).await.unwrap();

    // When
    let outcome = supervisor.kill(ProcessRole::Editor);

    // Then
    assert_that!(outcome, eq(KillOutcome::NotRunning));
    assert_that!(process.exit().map(|exit| exit.exit_code), some(some(eq(0))));
    assert!(supervisor.get(ProcessRole::Editor).is_none());
}

#[tokio::test]
async fn given_shell_option_when_spawned_then_runs_through_shell() {
    // Given
    let supervisor = ProcessSupervisor::new();
    let command = ProcessCommand::new("exit").arg("4");
    let options = SpawnOptions {
        shell: true,
        detached: false,
    };

    // When
    let process = supervisor
        .spawn(ProcessRole::Editor, &command, options)
        .await
        .unwrap();
    let exit = tokio::time::timeout(WAIT, process.wait()).await.unwrap();

    // Then
    assert_that!(exit.exit_code, some(eq(4)));
}

#[tokio::test]
async fn given_attached_process_when_it_writes_output_then_lines_logged_with_role_tag() {
    // Given
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _default = tracing::subscriber::set_default(subscriber);
    let supervisor = ProcessSupervisor::new();
    let command = ProcessCommand::new("sh").args([
        "-c",
        "w=line; echo first-$w; echo second-$w; echo stderr-$w >&2",
    ]);

    // When
    let process = supervisor
        .spawn(ProcessRole::LanguageServer, &command, SpawnOptions::attached())
        .await
        .unwrap();
    tokio::time::timeout(WAIT, process.wait()).await.unwrap();
    wait_until(|| {
        let contents = logs.contents();
        contents.contains("second-line") && contents.contains("stderr-line")
    })
    .await;

    // Then
    let contents = logs.contents();
    let line_with = |word: &str| {
        contents
            .lines()
            .find(|line| line.contains(word))
            .unwrap_or_default()
            .to_string()
    };
    assert_that!(line_with("first-line"), contains_substring("INFO"));
    assert_that!(line_with("first-line"), contains_substring("LSP"));
    assert_that!(line_with("stderr-line"), contains_substring("WARN"));
    assert!(contents.find("first-line") < contents.find("second-line"));
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn given_process_with_background_child_when_killed_then_whole_group_dies() {
    // Given
    let dir = tempfile::TempDir::new().unwrap();
    let pid_file = dir.path().join("grandchild.pid");
    let script = format!("sleep 30 & echo $! > '{}'; wait", pid_file.display());
    let supervisor = ProcessSupervisor::new();
    let process = supervisor
        .spawn(
            ProcessRole::LanguageServer,
            &ProcessCommand::new("sh").args(["-c", script.as_str()]),
            SpawnOptions::attached(),
        )
        .await
        .unwrap();
    let read_pid = || {
        std::fs::read_to_string(&pid_file)
            .ok()
            .filter(|contents| contents.ends_with('\n'))
            .and_then(|contents| contents.trim().parse::<u32>().ok())
    };
    wait_until(|| read_pid().is_some()).await;
    let grandchild = read_pid().unwrap();

    // When
    let outcome = supervisor.kill(ProcessRole::LanguageServer);
    tokio::time::timeout(WAIT, process.wait()).await.unwrap();

    // Then
    assert_that!(outcome, eq(KillOutcome::Killed));
    wait_until(|| is_gone(grandchild)).await;
}

/// Gone, or a zombie waiting on a parent that no longer reaps.
#[cfg(target_os = "linux")]
fn is_gone(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Err(_) => true,
        Ok(stat) => stat
            .rsplit(')')
            .next()
            .is_some_and(|rest| rest.trim_start().starts_with('Z')),
    }
}

#[tokio::test]
async fn given_working_directory_when_spawned_then_process_runs_there() {
    // Given
    let dir = tempfile::TempDir::new().unwrap();
    let command = ProcessCommand::new("sh")
        .args(["-c", "touch started-here"])
        .current_dir(dir.path());
    let supervisor = ProcessSupervisor::new();

    // When
    let process = supervisor
        .spawn(ProcessRole::Editor, &command, SpawnOptions::attached())
        .await
        .unwrap();
    let exit = tokio::time::timeout(WAIT, process.wait()).await.unwrap();

    // Then
    assert_that!(exit.exit_code, some(eq(0)));
    assert!(dir.path().join("started-here").exists());
}
