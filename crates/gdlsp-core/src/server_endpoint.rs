use std::fmt;

pub const LOOPBACK_HOST: &str = "127.0.0.1";

/// Sentinel port meaning "use the externally configured port".
pub const EXTERNAL_PORT_SENTINEL: i32 = -1;

/// Where the client should connect.
///
/// Holds the allocated port while a headless server owns it, otherwise the
/// sentinel and the externally configured host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: i32,
    external_host: String,
    external_port: u16,
}

impl ServerEndpoint {
    pub fn external(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self {
            host: host.clone(),
            port: EXTERNAL_PORT_SENTINEL,
            external_host: host,
            external_port: port,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.port == EXTERNAL_PORT_SENTINEL
    }

    /// Port owned by a headless server, if any.
    pub fn allocated_port(&self) -> Option<u16> {
        u16::try_from(self.port).ok()
    }

    pub fn assign(&mut self, port: u16) {
        self.host = String::from(LOOPBACK_HOST);
        self.port = i32::from(port);
    }

    pub fn release(&mut self) {
        self.host = self.external_host.clone();
        self.port = EXTERNAL_PORT_SENTINEL;
    }

    /// Host and port the client should dial.
    pub fn address(&self) -> (String, u16) {
        match self.allocated_port() {
            Some(port) => (self.host.clone(), port),
            None => (self.external_host.clone(), self.external_port),
        }
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (host, port) = self.address();
        write!(f, "{host}:{port}")
    }
}
