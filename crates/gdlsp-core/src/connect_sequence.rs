//! One validate, spawn and connect attempt, run as its own task.

use crate::manager_event::ManagerEvent;
use crate::{
    CancelToken, LOOPBACK_HOST, LspResult, PortAllocator, ProcessCommand, ProcessRole,
    ProcessSupervisor, ServerClient, SpawnOptions, VersionValidator,
};

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SequencePlan {
    /// Validate, spawn a headless server on a fresh port, then connect
    Spawn(SpawnPlan),
    /// Reconnect to a headless server that is still running
    ConnectHeadless { port: u16 },
    ConnectExternal { host: String, port: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SpawnPlan {
    pub executable: Option<String>,
    pub project_dir: PathBuf,
    pub required_major: u32,
    pub minimum_minor: u32,
}

pub(crate) struct ConnectSequence {
    pub id: u64,
    pub plan: SequencePlan,
    pub client: ServerClient,
    pub supervisor: ProcessSupervisor,
    pub validator: VersionValidator,
    pub events: mpsc::UnboundedSender<ManagerEvent>,
    pub cancel: CancelToken,
}

impl ConnectSequence {
    pub async fn run(self) {
        debug!("Connect sequence {} started: {:?}", self.id, self.plan);
        let result = self.cancel.run(self.execute()).await;
        let _ = self.events.send(ManagerEvent::SequenceFinished {
            sequence: self.id,
            result,
        });
    }

    async fn execute(&self) -> LspResult<()> {
        match &self.plan {
            SequencePlan::ConnectExternal { host, port } => self.client.connect(host, *port).await,
            SequencePlan::ConnectHeadless { port } => {
                self.client.connect(LOOPBACK_HOST, *port).await
            }
            SequencePlan::Spawn(plan) => self.spawn_and_connect(plan).await,
        }
    }

    async fn spawn_and_connect(&self, plan: &SpawnPlan) -> LspResult<()> {
        let executable = plan.executable.as_deref().unwrap_or_default();
        self.validator
            .validate(executable, plan.required_major, plan.minimum_minor)
            .await?;

        let port = PortAllocator::allocate()?;
        let command = headless_command(executable, &plan.project_dir, port);
        let process = self
            .supervisor
            .spawn(ProcessRole::LanguageServer, &command, SpawnOptions::attached())
            .await?;

        let _ = self.events.send(ManagerEvent::ServerSpawned {
            sequence: self.id,
            port,
            pid: process.pid(),
        });

        self.client.connect(LOOPBACK_HOST, port).await
    }
}

pub(crate) fn headless_command(executable: &str, project_dir: &Path, port: u16) -> ProcessCommand {
    ProcessCommand::new(executable)
        .arg("--path")
        .arg(project_dir.display().to_string())
        .args(["--editor", "--headless", "--no-window", "--lsp-port"])
        .arg(port.to_string())
}

pub(crate) fn editor_command(executable: &str, project_dir: &Path) -> ProcessCommand {
    ProcessCommand::new(executable)
        .arg("--path")
        .arg(project_dir.display().to_string())
        .arg("--editor")
}
