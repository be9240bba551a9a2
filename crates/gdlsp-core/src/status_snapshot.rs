use crate::{ConnectionStatus, StatusDisplay};

use std::fmt;

/// Published connection state plus the `host:port` it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub status: ConnectionStatus,
    pub target: String,
}

impl StatusSnapshot {
    pub fn display(&self) -> StatusDisplay {
        StatusDisplay::for_status(self.status)
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display().text, self.target)
    }
}
