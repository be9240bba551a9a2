use std::fmt;

/// Current state of the language-server connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    /// Manager constructed, nothing attempted yet
    Initializing,
    /// Headless server is being validated, spawned or respawned
    InitializingServer,
    /// Client is connecting or handshaking
    PendingConnection,
    Connected,
    /// No connection and no automatic retry scheduled
    Disconnected,
    /// Automatic retry scheduled against an external server
    Retrying,
}

impl ConnectionStatus {
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }

    /// States a retry tick may act on.
    pub fn accepts_retry_tick(self) -> bool {
        matches!(self, Self::Retrying | Self::InitializingServer)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initializing => "initializing",
            Self::InitializingServer => "initializing-server",
            Self::PendingConnection => "pending-connection",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Retrying => "retrying",
        };
        f.write_str(name)
    }
}
