use std::fmt;

/// Status reported by the `ServerClient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientStatus {
    Pending,
    Connected,
    Disconnected,
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

/// A status change tagged with the client session that produced it.
///
/// Every `connect` and `disconnect` starts a new session, so a consumer can
/// discard events that belong to a session it already replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientEvent {
    pub status: ClientStatus,
    pub session: u64,
}
