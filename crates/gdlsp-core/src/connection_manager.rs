//! Owns the connection lifecycle: starting, retrying, reconnecting and
//! stopping the language server.
//!
//! All state lives in one task. Handles talk to it through `ManagerCommand`,
//! connect sequences report back through `ManagerEvent`, and every
//! transition goes through `ConnectionStateMachine`.

use crate::connect_sequence::{ConnectSequence, SequencePlan, SpawnPlan, editor_command};
use crate::manager_event::ManagerEvent;
use crate::state_machine::{ConnectionStateMachine, Effect};
use crate::{
    CancelToken, ClientEvent, ClientOptions, ClientStatus, ConnectionStatus, LspError, LspResult,
    ManagerCommand, ManagerHandle, ProcessExit, ProcessRole, ProcessSupervisor, ProjectInfo,
    Prompt, PromptKind, PromptResponse, ReconnectPolicy, ServerClient, ServerEndpoint,
    SpawnOptions, StatusSnapshot, VersionValidator,
};

use gdlsp_config::Config;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

const COMMAND_CHANNEL_CAPACITY: usize = 16;
const STATUS_CHANNEL_CAPACITY: usize = 64;
const PROMPT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Manual,
    Retry,
}

struct InFlight {
    id: u64,
    cancel: CancelToken,
}

pub struct ConnectionManager {
    config: Config,
    project: ProjectInfo,
    machine: ConnectionStateMachine,
    client: ServerClient,
    supervisor: ProcessSupervisor,
    commands: mpsc::Receiver<ManagerCommand>,
    events_tx: mpsc::UnboundedSender<ManagerEvent>,
    events_rx: mpsc::UnboundedReceiver<ManagerEvent>,
    client_events: broadcast::Receiver<ClientEvent>,
    process_exits: broadcast::Receiver<ProcessExit>,
    status_tx: watch::Sender<StatusSnapshot>,
    status_events: broadcast::Sender<StatusSnapshot>,
    prompts: broadcast::Sender<Prompt>,
    retry_deadline: Option<Instant>,
    in_flight: Option<InFlight>,
    next_sequence: u64,
    /// Client events up to this session belong to replaced connections
    stale_session: u64,
    server_pid: Option<u32>,
    /// Language server exit seen before its sequence reported the spawn
    early_exit: Option<u32>,
    last_prompt: Option<PromptKind>,
    next_prompt_id: u64,
}

impl ConnectionManager {
    pub fn new(config: Config, project: ProjectInfo) -> (Self, ManagerHandle) {
        let client = ServerClient::new(ClientOptions::from_config(
            &config.lsp,
            Some(project.project_dir.clone()),
        ));
        let supervisor = ProcessSupervisor::new();

        let endpoint = ServerEndpoint::external(&config.lsp.server_host, config.lsp.server_port);
        let machine = ConnectionStateMachine::new(
            ReconnectPolicy::from_config(&config.lsp.auto_reconnect),
            endpoint,
        );
        let snapshot = StatusSnapshot {
            status: machine.status(),
            target: machine.endpoint().to_string(),
        };

        let (command_tx, commands) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(snapshot);
        let (status_events, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        let (prompts, _) = broadcast::channel(PROMPT_CHANNEL_CAPACITY);

        let handle = ManagerHandle::new(
            command_tx,
            status_rx,
            status_events.clone(),
            prompts.clone(),
            client.clone(),
        );

        let manager = Self {
            client_events: client.subscribe(),
            process_exits: supervisor.subscribe(),
            config,
            project,
            machine,
            client,
            supervisor,
            commands,
            events_tx,
            events_rx,
            status_tx,
            status_events,
            prompts,
            retry_deadline: None,
            in_flight: None,
            next_sequence: 1,
            stale_session: 0,
            server_pid: None,
            early_exit: None,
            last_prompt: None,
            next_prompt_id: 1,
        };

        (manager, handle)
    }

    /// Construct and run on the current runtime.
    pub fn spawn(config: Config, project: ProjectInfo) -> (ManagerHandle, JoinHandle<()>) {
        let (manager, handle) = Self::new(config, project);
        (handle, tokio::spawn(manager.run()))
    }

    /// Run until `Shutdown` or until every handle is dropped.
    pub async fn run(mut self) {
        info!(
            project = %self.project.project_dir.display(),
            godot = self.project.godot_major,
            headless = self.config.lsp.headless,
            "Connection manager started"
        );

        let initial = self.snapshot();
        let _ = self.status_events.send(initial);
        self.manual_reconnect();
        self.publish();

        loop {
            tokio::select! {
                biased;

                Some(event) = self.events_rx.recv() => self.handle_event(event),

                () = retry_timer(self.retry_deadline) => {
                    self.retry_deadline = None;
                    let effects = self.machine.on_retry_tick();
                    self.apply(effects);
                }

                event = self.client_events.recv() => match event {
                    Ok(event) => self.handle_client_event(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Missed {skipped} client status events");
                    }
                    Err(RecvError::Closed) => {
                        error!("Client event channel closed");
                        break;
                    }
                },

                exit = self.process_exits.recv() => match exit {
                    Ok(exit) => self.handle_exit(exit),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Missed {skipped} process exit events");
                    }
                    Err(RecvError::Closed) => {
                        error!("Process exit channel closed");
                        break;
                    }
                },

                command = self.commands.recv() => match command {
                    Some(ManagerCommand::Shutdown { reply }) => {
                        self.shutdown().await;
                        let _ = reply.send(());
                        break;
                    }
                    Some(command) => self.handle_command(command),
                    None => {
                        debug!("All manager handles dropped");
                        self.shutdown().await;
                        break;
                    }
                },
            }

            self.publish();
        }

        info!("Connection manager stopped");
    }

    fn handle_command(&mut self, command: ManagerCommand) {
        match command {
            ManagerCommand::StartLanguageServer { reply } => {
                self.manual_reconnect();
                let _ = reply.send(());
            }
            ManagerCommand::StopLanguageServer { reply } => {
                self.stop();
                let _ = reply.send(());
            }
            ManagerCommand::CheckStatus { reply } => {
                let snapshot = self.snapshot();
                if snapshot.status == ConnectionStatus::Disconnected {
                    self.manual_reconnect();
                }
                let _ = reply.send(snapshot);
            }
            ManagerCommand::Respond { response, reply } => {
                self.respond(response);
                let _ = reply.send(());
            }
            ManagerCommand::LaunchEditor { reply } => self.launch_editor(reply),
            ManagerCommand::Shutdown { reply } => {
                // Handled in run, which has to await the teardown
                let _ = reply.send(());
            }
        }
    }

    pub(crate) fn handle_event(&mut self, event: ManagerEvent) {
        match event {
            ManagerEvent::ServerSpawned {
                sequence,
                port,
                pid,
            } => {
                if !self.is_current(sequence) {
                    warn!("Killing language server {pid} spawned by a cancelled attempt");
                    if self.supervisor.pid(ProcessRole::LanguageServer) == Some(pid) {
                        self.supervisor.kill(ProcessRole::LanguageServer);
                    }
                    return;
                }
                self.machine.on_server_spawned(port);
                if self.early_exit.take() == Some(pid) {
                    warn!("Headless language server {pid} exited before it was reported");
                    self.server_pid = None;
                    self.machine.on_server_exited();
                    return;
                }
                info!("Headless language server {pid} listening on port {port}");
                self.server_pid = Some(pid);
            }
            ManagerEvent::SequenceFinished { sequence, result } => {
                if !self.is_current(sequence) {
                    debug!("Ignoring result of replaced sequence {sequence}");
                    return;
                }
                self.in_flight = None;
                self.sequence_finished(result);
            }
        }
    }

    fn sequence_finished(&mut self, result: LspResult<()>) {
        let error = match result {
            Ok(()) => return,
            Err(LspError::Cancelled { .. }) => return,
            Err(error) => error,
        };

        if error.is_executable_error() {
            warn!("Godot executable rejected: {error}");
            let effects = self.machine.on_executable_rejected();
            self.apply(effects);
            let id = self.next_prompt_id();
            if let Some(prompt) =
                Prompt::for_executable_error(id, &error, self.project.godot_major)
            {
                self.emit_prompt(prompt);
            }
            return;
        }

        match error {
            LspError::NoPortAvailable { .. } | LspError::SpawnFailed { .. } => {
                warn!("Failed to start language server: {error}");
                let effects = self.machine.on_attempt_failed();
                self.apply(effects);
            }
            // Connection failures were already reported through the client
            _ => debug!("Connect attempt failed: {error}"),
        }
    }

    fn handle_client_event(&mut self, event: ClientEvent) {
        if event.session <= self.stale_session {
            debug!(
                "Ignoring {} from replaced session {}",
                event.status, event.session
            );
            return;
        }
        let effects = self.machine.on_client_status(event.status);
        self.apply(effects);
    }

    pub(crate) fn handle_exit(&mut self, exit: ProcessExit) {
        match exit.role {
            ProcessRole::LanguageServer if self.server_pid == Some(exit.pid) => {
                warn!(
                    pid = exit.pid,
                    exit_code = ?exit.exit_code,
                    "Headless language server exited"
                );
                self.server_pid = None;
                self.machine.on_server_exited();
            }
            ProcessRole::LanguageServer if self.in_flight.is_some() => {
                debug!("Language server {} exited during a connect attempt", exit.pid);
                self.early_exit = Some(exit.pid);
            }
            ProcessRole::LanguageServer => {
                debug!("Ignoring exit of previous language server {}", exit.pid);
            }
            ProcessRole::Editor => {
                info!(pid = exit.pid, exit_code = ?exit.exit_code, "Godot editor exited");
            }
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ScheduleRetry(cooldown) => {
                    debug!("Retrying in {cooldown:?}");
                    self.retry_deadline = Some(Instant::now() + cooldown);
                }
                Effect::CancelRetry => self.retry_deadline = None,
                Effect::Reconnect => self.start_sequence(Trigger::Retry),
                Effect::PromptManualRetry { attempts } => {
                    let id = self.next_prompt_id();
                    let target = self.machine.endpoint().to_string();
                    self.emit_prompt(Prompt::connection_lost(id, &target, attempts));
                }
                Effect::NotifyConnected => {
                    info!("Connected to language server at {}", self.client.target());
                    self.last_prompt = None;
                }
            }
        }
    }

    pub(crate) fn manual_reconnect(&mut self) {
        self.last_prompt = None;
        let effects = self.machine.on_manual_reconnect();
        self.apply(effects);
        self.start_sequence(Trigger::Manual);
    }

    fn start_sequence(&mut self, trigger: Trigger) {
        self.cancel_sequence();
        self.client.disconnect();
        self.stale_session = self.client.session();
        self.early_exit = None;

        let plan = self.plan(trigger);
        if matches!(plan, SequencePlan::Spawn(_)) {
            self.machine.on_server_starting();
        }

        let id = self.next_sequence;
        self.next_sequence += 1;
        let cancel = CancelToken::new();
        let sequence = ConnectSequence {
            id,
            plan,
            client: self.client.clone(),
            supervisor: self.supervisor.clone(),
            validator: VersionValidator::from_config(&self.config.process),
            events: self.events_tx.clone(),
            cancel: cancel.clone(),
        };
        tokio::spawn(sequence.run());
        self.in_flight = Some(InFlight { id, cancel });
    }

    fn plan(&self, trigger: Trigger) -> SequencePlan {
        let lsp = &self.config.lsp;
        if !lsp.headless {
            return SequencePlan::ConnectExternal {
                host: lsp.server_host.clone(),
                port: lsp.server_port,
            };
        }

        if trigger == Trigger::Retry
            && self.machine.status() == ConnectionStatus::InitializingServer
            && self.supervisor.is_running(ProcessRole::LanguageServer)
            && let Some(port) = self.machine.endpoint().allocated_port()
        {
            return SequencePlan::ConnectHeadless { port };
        }

        let major = self.project.godot_major;
        SequencePlan::Spawn(SpawnPlan {
            executable: self.config.editor_path.for_major(major).map(String::from),
            project_dir: self.project.project_dir.clone(),
            required_major: major,
            minimum_minor: self
                .config
                .version_policy
                .minimum_minor(major)
                .unwrap_or_default(),
        })
    }

    fn cancel_sequence(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            debug!("Cancelling connect sequence {}", in_flight.id);
            in_flight.cancel.cancel();
        }
    }

    fn is_current(&self, sequence: u64) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.id == sequence)
    }

    /// Timer first, then the in-flight sequence, then the server process.
    fn stop(&mut self) {
        info!("Stopping language server");
        self.retry_deadline = None;
        self.cancel_sequence();
        let effects = self.machine.on_stop();
        self.apply(effects);
        self.supervisor.kill(ProcessRole::LanguageServer);

        if self.client.status() != ClientStatus::Connected {
            self.client.disconnect();
        }
    }

    async fn shutdown(&mut self) {
        self.stop();
        self.client.disconnect();
        self.supervisor.shutdown().await;
    }

    fn respond(&mut self, response: PromptResponse) {
        debug!("Prompt response: {response:?}");
        match response {
            PromptResponse::Retry => self.manual_reconnect(),
            PromptResponse::Ignore => {}
            PromptResponse::SelectExecutable { path } => {
                info!(
                    "Using {path} as the Godot {} executable",
                    self.project.godot_major
                );
                self.config
                    .editor_path
                    .set_for_major(self.project.godot_major, path);
                self.manual_reconnect();
            }
            PromptResponse::DisableHeadless => {
                info!("Headless mode disabled, connecting to an external server");
                self.config.lsp.headless = false;
                self.cancel_sequence();
                self.supervisor.kill(ProcessRole::LanguageServer);
                self.server_pid = None;
                self.machine.on_headless_disabled();
                self.manual_reconnect();
            }
        }
    }

    fn launch_editor(&self, reply: oneshot::Sender<LspResult<u32>>) {
        let major = self.project.godot_major;
        let Some(executable) = self.config.editor_path.for_major(major) else {
            let _ = reply.send(Err(LspError::invalid_executable(
                "",
                format!("no Godot {major} executable configured"),
            )));
            return;
        };

        let command = editor_command(executable, &self.project.project_dir);
        let supervisor = self.supervisor.clone();
        tokio::spawn(async move {
            let result = supervisor
                .spawn(ProcessRole::Editor, &command, SpawnOptions::detached())
                .await
                .map(|process| process.pid());
            let _ = reply.send(result);
        });
    }

    fn emit_prompt(&mut self, prompt: Prompt) {
        if self.last_prompt == Some(prompt.kind) {
            debug!("Suppressing repeated {:?} prompt", prompt.kind);
            return;
        }
        self.last_prompt = Some(prompt.kind);
        warn!("{}", prompt.message);
        let _ = self.prompts.send(prompt);
    }

    fn next_prompt_id(&mut self) -> u64 {
        let id = self.next_prompt_id;
        self.next_prompt_id += 1;
        id
    }

    pub(crate) fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            status: self.machine.status(),
            target: self.machine.endpoint().to_string(),
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        if *self.status_tx.borrow() == snapshot {
            return;
        }
        info!(
            status = %snapshot.status,
            target = %snapshot.target,
            "Connection status changed"
        );
        self.status_tx.send_replace(snapshot.clone());
        let _ = self.status_events.send(snapshot);
    }
}

async fn retry_timer(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
