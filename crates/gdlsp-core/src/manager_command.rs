use crate::{LspResult, PromptResponse, StatusSnapshot};

use tokio::sync::oneshot;

/// Requests sent from a `ManagerHandle` to the connection manager task.
#[derive(Debug)]
pub enum ManagerCommand {
    /// Manual start or restart
    StartLanguageServer { reply: oneshot::Sender<()> },
    StopLanguageServer { reply: oneshot::Sender<()> },
    /// Report status, reconnecting when disconnected
    CheckStatus {
        reply: oneshot::Sender<StatusSnapshot>,
    },
    Respond {
        response: PromptResponse,
        reply: oneshot::Sender<()>,
    },
    /// Open the project in a detached Godot editor
    LaunchEditor {
        reply: oneshot::Sender<LspResult<u32>>,
    },
    Shutdown { reply: oneshot::Sender<()> },
}
