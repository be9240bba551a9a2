//! GDScript language-server connection management.
//!
//! Validates and supervises a headless Godot language server (or targets an
//! externally running editor), keeps a TCP LSP client connected to it and
//! recovers from disconnects and crashes.

mod cancel_token;
mod client_status;
mod connect_sequence;
mod connection_manager;
mod connection_status;
mod error;
mod features;
mod godot_version;
mod managed_process;
mod manager_command;
mod manager_event;
mod manager_handle;
mod port_allocator;
mod process_command;
mod process_exit;
mod process_role;
mod process_supervisor;
mod project_info;
mod prompt;
mod reconnect_policy;
mod server_client;
mod server_endpoint;
mod spawn_options;
mod state_machine;
mod status_display;
mod status_snapshot;
mod version_validator;

pub mod protocol;
pub mod transport;

pub use cancel_token::CancelToken;
pub use client_status::{ClientEvent, ClientStatus};
pub use connection_manager::ConnectionManager;
pub use connection_status::ConnectionStatus;
pub use error::{LspError, Result as LspResult};
pub use features::LanguageFeatures;
pub use godot_version::GodotVersion;
pub use managed_process::ManagedProcess;
pub use manager_command::ManagerCommand;
pub use manager_handle::ManagerHandle;
pub use port_allocator::PortAllocator;
pub use process_command::ProcessCommand;
pub use process_exit::ProcessExit;
pub use process_role::ProcessRole;
pub use process_supervisor::{KillOutcome, ProcessSupervisor};
pub use project_info::{PROJECT_FILE, ProjectInfo};
pub use prompt::{Prompt, PromptAction, PromptKind, PromptResponse};
pub use reconnect_policy::ReconnectPolicy;
pub use server_client::{ClientOptions, ServerClient};
pub use server_endpoint::{EXTERNAL_PORT_SENTINEL, LOOPBACK_HOST, ServerEndpoint};
pub use spawn_options::SpawnOptions;
pub use state_machine::{ConnectionStateMachine, Effect};
pub use status_display::StatusDisplay;
pub use status_snapshot::StatusSnapshot;
pub use version_validator::VersionValidator;

#[cfg(test)]
mod tests;
