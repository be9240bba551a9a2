use crate::{
    LanguageFeatures, LspError, LspResult, ManagerCommand, Prompt, PromptResponse, ServerClient,
    StatusSnapshot,
};

use tokio::sync::{broadcast, mpsc, oneshot, watch};

/// Cloneable front end of a running `ConnectionManager`.
///
/// Every call fails with `ManagerUnavailable` once the manager has stopped.
#[derive(Clone)]
pub struct ManagerHandle {
    commands: mpsc::Sender<ManagerCommand>,
    status_rx: watch::Receiver<StatusSnapshot>,
    status_events: broadcast::Sender<StatusSnapshot>,
    prompts: broadcast::Sender<Prompt>,
    client: ServerClient,
}

impl ManagerHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<ManagerCommand>,
        status_rx: watch::Receiver<StatusSnapshot>,
        status_events: broadcast::Sender<StatusSnapshot>,
        prompts: broadcast::Sender<Prompt>,
        client: ServerClient,
    ) -> Self {
        Self {
            commands,
            status_rx,
            status_events,
            prompts,
            client,
        }
    }

    pub async fn start_language_server(&self) -> LspResult<()> {
        self.request(|reply| ManagerCommand::StartLanguageServer { reply })
            .await
    }

    pub async fn stop_language_server(&self) -> LspResult<()> {
        self.request(|reply| ManagerCommand::StopLanguageServer { reply })
            .await
    }

    /// Current status. A disconnected manager starts a manual reconnect.
    pub async fn check_status(&self) -> LspResult<StatusSnapshot> {
        self.request(|reply| ManagerCommand::CheckStatus { reply })
            .await
    }

    pub async fn respond(&self, response: PromptResponse) -> LspResult<()> {
        self.request(|reply| ManagerCommand::Respond { response, reply })
            .await
    }

    /// Open the project in a detached Godot editor and return its pid.
    pub async fn launch_editor(&self) -> LspResult<u32> {
        self.request(|reply| ManagerCommand::LaunchEditor { reply })
            .await?
    }

    /// Stop everything and wait for the manager to exit.
    pub async fn shutdown(&self) -> LspResult<()> {
        self.request(|reply| ManagerCommand::Shutdown { reply }).await
    }

    pub fn status(&self) -> StatusSnapshot {
        self.status_rx.borrow().clone()
    }

    /// Latest snapshot, for consumers that only need the current value.
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.status_rx.clone()
    }

    /// Every published snapshot in order.
    pub fn status_events(&self) -> broadcast::Receiver<StatusSnapshot> {
        self.status_events.subscribe()
    }

    pub fn prompts(&self) -> broadcast::Receiver<Prompt> {
        self.prompts.subscribe()
    }

    pub fn client(&self) -> &ServerClient {
        &self.client
    }

    pub fn features(&self) -> LanguageFeatures {
        LanguageFeatures::new(self.client.clone())
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> ManagerCommand,
    ) -> LspResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(command(reply_tx))
            .await
            .map_err(|_| LspError::manager_unavailable())?;
        reply_rx.await.map_err(|_| LspError::manager_unavailable())
    }
}
