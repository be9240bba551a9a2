//! Role-keyed child process supervision.

use crate::{
    LspError, LspResult, ManagedProcess, ProcessCommand, ProcessExit, ProcessRole, SpawnOptions,
};

use std::collections::HashMap;
use std::panic::Location;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use error_location::ErrorLocation;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{Mutex as AsyncMutex, broadcast, watch};
use tracing::{debug, info, warn};

const EXIT_CHANNEL_CAPACITY: usize = 32;
const KILL_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    NotRunning,
    Killed,
}

/// Spawns, tags and terminates child process groups.
///
/// Responsibilities:
/// - At most one live process per `ProcessRole`
/// - Forward stdout/stderr of attached processes to tracing, tagged by role
/// - Broadcast a `ProcessExit` for every termination
/// - Kill attached processes on `shutdown()` and when the last handle drops
#[derive(Clone)]
pub struct ProcessSupervisor {
    inner: Arc<SupervisorInner>,
}

struct SupervisorInner {
    processes: Mutex<HashMap<ProcessRole, ManagedProcess>>,
    /// Per role, held from the replace check until the new process is recorded
    server_spawn: AsyncMutex<()>,
    editor_spawn: AsyncMutex<()>,
    exit_tx: broadcast::Sender<ProcessExit>,
    next_generation: AtomicU64,
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        let (exit_tx, _) = broadcast::channel(EXIT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(SupervisorInner {
                processes: Mutex::new(HashMap::new()),
                server_spawn: AsyncMutex::new(()),
                editor_spawn: AsyncMutex::new(()),
                exit_tx,
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    /// Receiver for exit events of every supervised process.
    pub fn subscribe(&self) -> broadcast::Receiver<ProcessExit> {
        self.inner.exit_tx.subscribe()
    }

    /// Start `command` under `role`, replacing any live process for that role.
    ///
    /// The previous process is killed and awaited before the new one starts.
    /// Concurrent spawns for one role run one after another.
    pub async fn spawn(
        &self,
        role: ProcessRole,
        command: &ProcessCommand,
        options: SpawnOptions,
    ) -> LspResult<ManagedProcess> {
        let _spawning = self.inner.spawn_lock(role).lock().await;

        if let Some(existing) = self.get(role) {
            info!(
                "Replacing running {} process (pid {})",
                role,
                existing.pid()
            );
            signal_group(existing.pid());
            if tokio::time::timeout(KILL_WAIT_TIMEOUT, existing.wait())
                .await
                .is_err()
            {
                warn!(
                    "{} process {} did not exit within {:?}",
                    role,
                    existing.pid(),
                    KILL_WAIT_TIMEOUT
                );
            }
        }

        let mut cmd = build_command(command, options);
        let mut child = cmd.spawn().map_err(|source| LspError::SpawnFailed {
            command: command.to_string(),
            source,
            location: ErrorLocation::from(Location::caller()),
        })?;

        let Some(pid) = child.id() else {
            return Err(LspError::SpawnFailed {
                command: command.to_string(),
                source: std::io::Error::other("process exited before reporting a pid"),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        info!(
            tag = role.tag(),
            pid,
            detached = options.detached,
            "Spawned {}",
            command
        );

        if let Some(stdout) = child.stdout.take() {
            forward_output(role, stdout, false);
        }
        if let Some(stderr) = child.stderr.take() {
            forward_output(role, stderr, true);
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst);
        let (exit_tx, exit_rx) = watch::channel(None);
        let process = ManagedProcess::new(role, pid, options.detached, generation, exit_rx);
        self.inner.lock().insert(role, process.clone());

        let inner = Arc::downgrade(&self.inner);
        let exits = self.inner.exit_tx.clone();
        tokio::spawn(async move {
            let exit_code = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    warn!(tag = role.tag(), pid, "Failed to wait for process: {e}");
                    None
                }
            };

            SupervisorInner::forget(&inner, role, generation);

            info!(tag = role.tag(), pid, ?exit_code, "Process exited");
            let exit = ProcessExit {
                role,
                pid,
                exit_code,
            };
            let _ = exit_tx.send(Some(exit.clone()));
            let _ = exits.send(exit);
        });

        Ok(process)
    }

    /// Kill the whole process group for `role`. Unknown or dead roles are a no-op.
    pub fn kill(&self, role: ProcessRole) -> KillOutcome {
        let Some(process) = self.get(role) else {
            debug!("No {role} process to kill");
            return KillOutcome::NotRunning;
        };

        if !process.is_alive() {
            return KillOutcome::NotRunning;
        }

        info!(tag = role.tag(), pid = process.pid(), "Killing process group");
        signal_group(process.pid())
    }

    pub fn get(&self, role: ProcessRole) -> Option<ManagedProcess> {
        self.inner.lock().get(&role).cloned()
    }

    pub fn is_running(&self, role: ProcessRole) -> bool {
        self.get(role).is_some_and(|process| process.is_alive())
    }

    pub fn pid(&self, role: ProcessRole) -> Option<u32> {
        self.get(role)
            .filter(ManagedProcess::is_alive)
            .map(|process| process.pid())
    }

    /// Kill every attached process and wait for them to exit.
    pub async fn shutdown(&self) {
        let attached: Vec<ManagedProcess> = self
            .inner
            .lock()
            .values()
            .filter(|process| !process.is_detached())
            .cloned()
            .collect();

        for process in &attached {
            signal_group(process.pid());
        }

        for process in attached {
            if tokio::time::timeout(KILL_WAIT_TIMEOUT, process.wait())
                .await
                .is_err()
            {
                warn!(
                    "{} process {} survived shutdown",
                    process.role(),
                    process.pid()
                );
            }
        }
    }
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl SupervisorInner {
    fn spawn_lock(&self, role: ProcessRole) -> &AsyncMutex<()> {
        match role {
            ProcessRole::LanguageServer => &self.server_spawn,
            ProcessRole::Editor => &self.editor_spawn,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ProcessRole, ManagedProcess>> {
        self.processes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop the entry for `role` unless it was already replaced.
    fn forget(inner: &Weak<SupervisorInner>, role: ProcessRole, generation: u64) {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let mut processes = inner.lock();
        if processes
            .get(&role)
            .is_some_and(|process| process.generation() == generation)
        {
            processes.remove(&role);
        }
    }
}

impl Drop for SupervisorInner {
    fn drop(&mut self) {
        let processes = self
            .processes
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for process in processes.values().filter(|process| !process.is_detached()) {
            signal_group(process.pid());
        }
    }
}

fn build_command(command: &ProcessCommand, options: SpawnOptions) -> Command {
    let mut cmd = if options.shell {
        shell_command(command)
    } else {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        cmd
    };

    if let Some(dir) = &command.current_dir {
        cmd.current_dir(dir);
    }

    // Detached processes outlive our log sink, so their output is not captured
    let output = || {
        if options.detached {
            Stdio::null()
        } else {
            Stdio::piped()
        }
    };
    cmd.stdin(Stdio::null())
        .stdout(output())
        .stderr(output())
        .kill_on_drop(false);

    #[cfg(unix)]
    new_session(&mut cmd, options.detached);

    #[cfg(windows)]
    if options.detached {
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    }

    cmd
}

#[cfg(unix)]
fn shell_command(command: &ProcessCommand) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command.shell_line());
    cmd
}

#[cfg(windows)]
fn shell_command(command: &ProcessCommand) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command.cmd_line());
    cmd
}

/// Own session so the whole group can be killed; attached children also
/// die with us on Linux.
#[cfg(unix)]
fn new_session(cmd: &mut Command, detached: bool) {
    unsafe {
        cmd.pre_exec(move || {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }

            #[cfg(target_os = "linux")]
            if !detached && libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGKILL) == -1 {
                return Err(std::io::Error::last_os_error());
            }

            #[cfg(not(target_os = "linux"))]
            let _ = detached;

            Ok(())
        });
    }
}

#[cfg(unix)]
fn signal_group(pid: u32) -> KillOutcome {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(raw_pid) = i32::try_from(pid) else {
        return KillOutcome::NotRunning;
    };

    match killpg(Pid::from_raw(raw_pid), Signal::SIGKILL) {
        Ok(()) => KillOutcome::Killed,
        Err(Errno::ESRCH) => KillOutcome::NotRunning,
        Err(e) => {
            warn!("Failed to kill process group {pid}: {e}");
            KillOutcome::NotRunning
        }
    }
}

#[cfg(windows)]
fn signal_group(pid: u32) -> KillOutcome {
    match std::process::Command::new("taskkill")
        .args(["/F", "/T", "/PID", &pid.to_string()])
        .output()
    {
        Ok(output) if output.status.success() => KillOutcome::Killed,
        Ok(_) => KillOutcome::NotRunning,
        Err(e) => {
            warn!("Failed to run taskkill for {pid}: {e}");
            KillOutcome::NotRunning
        }
    }
}

fn forward_output<R>(role: ProcessRole, stream: R, is_stderr: bool)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if is_stderr => warn!(tag = role.tag(), "{line}"),
                Ok(Some(line)) => info!(tag = role.tag(), "{line}"),
                Ok(None) => break,
                Err(e) => {
                    debug!(tag = role.tag(), "Output stream closed: {e}");
                    break;
                }
            }
        }
    });
}
