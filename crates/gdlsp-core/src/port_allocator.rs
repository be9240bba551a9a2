//! Ephemeral port allocation for headless servers.

use crate::{LOOPBACK_HOST, LspError, LspResult};

use std::net::TcpListener;
use std::panic::Location;

use error_location::ErrorLocation;
use tracing::debug;

pub struct PortAllocator;

impl PortAllocator {
    /// Bind port 0 on loopback, read back the OS-assigned port and
    /// release the socket.
    pub fn allocate() -> LspResult<u16> {
        let listener = TcpListener::bind((LOOPBACK_HOST, 0)).map_err(|source| {
            LspError::NoPortAvailable {
                source,
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        let port = listener
            .local_addr()
            .map_err(|source| LspError::NoPortAvailable {
                source,
                location: ErrorLocation::from(Location::caller()),
            })?
            .port();

        drop(listener);
        debug!("Allocated port {port}");
        Ok(port)
    }
}
