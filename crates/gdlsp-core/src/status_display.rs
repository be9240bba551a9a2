use crate::ConnectionStatus;

/// Status bar text and tooltip for a connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusDisplay {
    pub text: &'static str,
    pub tooltip: &'static str,
}

impl StatusDisplay {
    pub fn for_status(status: ConnectionStatus) -> Self {
        let (text, tooltip) = match status {
            ConnectionStatus::Initializing => ("Initializing", "Initializing..."),
            ConnectionStatus::InitializingServer => (
                "Starting server",
                "Starting the headless GDScript language server...",
            ),
            ConnectionStatus::PendingConnection | ConnectionStatus::Retrying => (
                "Connecting",
                "Connecting to the GDScript language server...",
            ),
            ConnectionStatus::Connected => {
                ("Connected", "Connected to the GDScript language server.")
            }
            ConnectionStatus::Disconnected => (
                "Disconnected",
                "Disconnected from the GDScript language server. Check status to retry.",
            ),
        };
        Self { text, tooltip }
    }
}
