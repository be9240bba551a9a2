//! Connection status transitions, free of I/O.
//!
//! Every input returns the side effects the caller has to perform, so the
//! table can be exercised without a process or a socket.

use crate::{ClientStatus, ConnectionStatus, ReconnectPolicy, ServerEndpoint};

use std::time::Duration;

use tracing::debug;

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Arm the one-shot retry timer
    ScheduleRetry(Duration),
    CancelRetry,
    /// Run the connect sequence again
    Reconnect,
    /// Automatic retries are exhausted or disabled
    PromptManualRetry { attempts: u32 },
    NotifyConnected,
}

#[derive(Debug, Clone)]
pub struct ConnectionStateMachine {
    status: ConnectionStatus,
    policy: ReconnectPolicy,
    endpoint: ServerEndpoint,
    /// Set on Connected and manual reconnects, consumed by the next Disconnected
    retry_armed: bool,
    /// Open from the first armed Disconnected until success, exhaustion or stop
    retry_cycle: bool,
    /// Server exited while the client still held the connection
    release_on_disconnect: bool,
}

impl ConnectionStateMachine {
    pub fn new(policy: ReconnectPolicy, endpoint: ServerEndpoint) -> Self {
        Self {
            status: ConnectionStatus::Initializing,
            policy,
            endpoint,
            retry_armed: false,
            retry_cycle: false,
            release_on_disconnect: false,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    pub fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    pub fn is_retry_armed(&self) -> bool {
        self.retry_armed
    }

    pub fn in_retry_cycle(&self) -> bool {
        self.retry_cycle
    }

    pub fn on_client_status(&mut self, status: ClientStatus) -> Vec<Effect> {
        match status {
            ClientStatus::Pending => {
                self.transition(ConnectionStatus::PendingConnection);
                Vec::new()
            }
            ClientStatus::Connected => {
                self.policy.reset();
                self.retry_armed = true;
                self.retry_cycle = false;
                self.transition(ConnectionStatus::Connected);
                vec![Effect::CancelRetry, Effect::NotifyConnected]
            }
            ClientStatus::Disconnected => self.on_disconnected(),
        }
    }

    /// A connect attempt failed before the client was involved (port or spawn).
    pub fn on_attempt_failed(&mut self) -> Vec<Effect> {
        self.on_disconnected()
    }

    pub fn on_retry_tick(&mut self) -> Vec<Effect> {
        if !self.retry_cycle || !self.status.accepts_retry_tick() {
            debug!("Ignoring retry tick in {}", self.status);
            return Vec::new();
        }

        if self.policy.can_retry() {
            self.policy.record_attempt();
            debug!(
                "Automatic retry {}/{}",
                self.policy.attempts_made(),
                self.policy.max_attempts
            );
            return vec![Effect::Reconnect];
        }

        let attempts = self.policy.attempts_made();
        self.retry_cycle = false;
        self.retry_armed = false;
        self.transition(ConnectionStatus::Disconnected);
        vec![Effect::PromptManualRetry { attempts }]
    }

    /// User-initiated start or retry.
    pub fn on_manual_reconnect(&mut self) -> Vec<Effect> {
        self.policy.reset();
        self.retry_armed = true;
        self.retry_cycle = false;
        vec![Effect::CancelRetry]
    }

    /// The connect sequence is about to validate and spawn a headless server.
    pub fn on_server_starting(&mut self) {
        self.transition(ConnectionStatus::InitializingServer);
    }

    pub fn on_server_spawned(&mut self, port: u16) {
        self.endpoint.assign(port);
        self.release_on_disconnect = false;
    }

    /// Port release waits for the client's Disconnected while it still holds
    /// the connection, so a crash is still seen with the allocated port.
    pub fn on_server_exited(&mut self) {
        if matches!(
            self.status,
            ConnectionStatus::Connected | ConnectionStatus::PendingConnection
        ) {
            self.release_on_disconnect = true;
        } else {
            self.endpoint.release();
        }
    }

    /// Executable or version rejected. Needs a configuration change.
    pub fn on_executable_rejected(&mut self) -> Vec<Effect> {
        self.retry_armed = false;
        self.retry_cycle = false;
        self.transition(ConnectionStatus::Disconnected);
        vec![Effect::CancelRetry]
    }

    /// Headless mode switched off; the allocated port no longer applies.
    pub fn on_headless_disabled(&mut self) {
        self.endpoint.release();
        self.release_on_disconnect = false;
    }

    pub fn on_stop(&mut self) -> Vec<Effect> {
        self.retry_armed = false;
        self.retry_cycle = false;
        vec![Effect::CancelRetry]
    }

    fn on_disconnected(&mut self) -> Vec<Effect> {
        let retry = if self.retry_cycle {
            true
        } else if self.retry_armed {
            self.retry_armed = false;
            self.retry_cycle = true;
            true
        } else {
            false
        };

        let effects = if retry {
            let next = if self.endpoint.is_sentinel() {
                ConnectionStatus::Retrying
            } else {
                ConnectionStatus::InitializingServer
            };
            self.transition(next);
            vec![Effect::ScheduleRetry(self.policy.cooldown)]
        } else {
            self.transition(ConnectionStatus::Disconnected);
            Vec::new()
        };

        if self.release_on_disconnect {
            self.release_on_disconnect = false;
            self.endpoint.release();
        }

        effects
    }

    fn transition(&mut self, next: ConnectionStatus) {
        if self.status != next {
            debug!("Connection status {} -> {}", self.status, next);
        }
        self.status = next;
    }
}
