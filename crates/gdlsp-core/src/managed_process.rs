use crate::{ProcessExit, ProcessRole};

use tokio::sync::watch;

/// Handle to a supervised child process.
///
/// Cloning is cheap; every clone observes the same exit.
#[derive(Debug, Clone)]
pub struct ManagedProcess {
    role: ProcessRole,
    pid: u32,
    detached: bool,
    generation: u64,
    exit: watch::Receiver<Option<ProcessExit>>,
}

impl ManagedProcess {
    pub(crate) fn new(
        role: ProcessRole,
        pid: u32,
        detached: bool,
        generation: u64,
        exit: watch::Receiver<Option<ProcessExit>>,
    ) -> Self {
        Self {
            role,
            pid,
            detached,
            generation,
            exit,
        }
    }

    pub fn role(&self) -> ProcessRole {
        self.role
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_alive(&self) -> bool {
        self.exit.borrow().is_none()
    }

    pub fn exit(&self) -> Option<ProcessExit> {
        self.exit.borrow().clone()
    }

    /// Resolve once the process has terminated.
    pub async fn wait(&self) -> ProcessExit {
        let mut exit = self.exit.clone();
        let observed = match exit.wait_for(Option::is_some).await {
            Ok(value) => value.as_ref().cloned(),
            Err(_) => None,
        };
        observed.unwrap_or(ProcessExit {
            role: self.role,
            pid: self.pid,
            exit_code: None,
        })
    }
}
