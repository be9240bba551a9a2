//! TCP client for the Godot language server.

use crate::protocol::{JSONRPC_VERSION, METHOD_NOT_FOUND, RpcResponse, file_uri};
use crate::{ClientEvent, ClientStatus, LspError, LspResult, transport};

use std::collections::HashMap;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use error_location::ErrorLocation;
use gdlsp_config::LspConfig;
use lsp_types::{
    ClientCapabilities, ClientInfo, DocumentSymbolClientCapabilities, HoverClientCapabilities,
    InitializeParams, MarkupKind, TextDocumentClientCapabilities, WorkspaceFolder,
};
use serde_json::{Value, json};
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const CLIENT_NAME: &str = "gdlsp";
const EVENT_CHANNEL_CAPACITY: usize = 64;
/// Poll interval while waiting for a freshly spawned server to open its port
const CONNECT_RETRY_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Project root announced in `initialize`
    pub root_path: Option<PathBuf>,
}

impl ClientOptions {
    pub fn from_config(config: &LspConfig, root_path: Option<PathBuf>) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
            request_timeout: config.request_timeout(),
            root_path,
        }
    }
}

type SharedWriter = Arc<tokio::sync::Mutex<OwnedWriteHalf>>;

struct PendingRequest {
    method: String,
    reply: oneshot::Sender<LspResult<Value>>,
}

struct ClientState {
    /// Bumped by every connect and disconnect
    session: u64,
    status: ClientStatus,
    target: String,
    writer: Option<SharedWriter>,
    reader: Option<JoinHandle<()>>,
    pending: HashMap<u64, PendingRequest>,
}

struct ClientInner {
    options: ClientOptions,
    status_tx: watch::Sender<ClientStatus>,
    events_tx: broadcast::Sender<ClientEvent>,
    request_id: AtomicU64,
    state: Mutex<ClientState>,
}

/// Owns the transport connection and reports `Pending | Connected | Disconnected`.
///
/// A dropped connection reports the same `Disconnected` as a failed connect.
#[derive(Clone)]
pub struct ServerClient {
    inner: Arc<ClientInner>,
}

impl ServerClient {
    pub fn new(options: ClientOptions) -> Self {
        let (status_tx, _) = watch::channel(ClientStatus::Disconnected);
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(ClientInner {
                options,
                status_tx,
                events_tx,
                request_id: AtomicU64::new(1),
                state: Mutex::new(ClientState {
                    session: 0,
                    status: ClientStatus::Disconnected,
                    target: String::new(),
                    writer: None,
                    reader: None,
                    pending: HashMap::new(),
                }),
            }),
        }
    }

    pub fn status(&self) -> ClientStatus {
        *self.inner.status_tx.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<ClientStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Ordered stream of every status change.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.events_tx.subscribe()
    }

    /// `host:port` of the most recent connect.
    pub fn target(&self) -> String {
        self.inner.lock().target.clone()
    }

    pub fn session(&self) -> u64 {
        self.inner.lock().session
    }

    /// Connect and run the LSP handshake.
    ///
    /// Emits `Pending` immediately, then `Connected` or `Disconnected`.
    pub async fn connect(&self, host: &str, port: u16) -> LspResult<()> {
        let session = {
            let mut state = self.inner.lock();
            self.inner.close_session(&mut state, true);
            state.session += 1;
            state.target = format!("{host}:{port}");
            self.inner.emit(&mut state, ClientStatus::Pending, true);
            state.session
        };

        let result = self.establish(host, port, session).await;

        let mut state = self.inner.lock();
        if state.session != session {
            return result.and_then(|()| Err(LspError::cancelled()));
        }

        match result {
            Ok(()) if state.writer.is_none() => {
                Err(LspError::protocol("connection closed during handshake"))
            }
            Ok(()) => {
                self.inner.emit(&mut state, ClientStatus::Connected, false);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to connect to {}: {e}", state.target);
                self.inner.close_session(&mut state, true);
                self.inner.emit(&mut state, ClientStatus::Disconnected, false);
                Err(e)
            }
        }
    }

    /// Close the connection. Always reports `Disconnected`.
    pub fn disconnect(&self) {
        let mut state = self.inner.lock();
        self.inner.close_session(&mut state, true);
        state.session += 1;
        self.inner.emit(&mut state, ClientStatus::Disconnected, true);
    }

    /// Send a request and wait for its result.
    ///
    /// Fails with `RequestWhileDisconnected` unless connected.
    pub async fn send_request(&self, method: &str, params: Value) -> LspResult<Value> {
        self.call(method, params, true).await
    }

    async fn establish(&self, host: &str, port: u16, session: u64) -> LspResult<()> {
        let stream = self.open_stream(host, port).await?;
        let _ = stream.set_nodelay(true);
        let (read_half, write_half) = stream.into_split();

        {
            let mut state = self.inner.lock();
            if state.session != session {
                return Err(LspError::cancelled());
            }
            state.writer = Some(Arc::new(tokio::sync::Mutex::new(write_half)));
            state.reader = Some(tokio::spawn(read_loop(
                Arc::downgrade(&self.inner),
                read_half,
                session,
            )));
        }

        self.initialize().await
    }

    /// Retry the TCP connect until `connect_timeout` elapses.
    async fn open_stream(&self, host: &str, port: u16) -> LspResult<TcpStream> {
        let target = format!("{host}:{port}");
        let timeout = self.inner.options.connect_timeout;
        let deadline = Instant::now() + timeout;
        let timed_out = || LspError::ConnectionTimeout {
            target: target.clone(),
            timeout_ms: timeout.as_millis() as u64,
            location: ErrorLocation::from(Location::caller()),
        };

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let attempt = tokio::time::timeout(remaining, TcpStream::connect((host, port)));
            let error = match attempt.await {
                Ok(Ok(stream)) => return Ok(stream),
                Ok(Err(error)) => error,
                Err(_) => return Err(timed_out()),
            };

            if Instant::now() + CONNECT_RETRY_INTERVAL >= deadline {
                if error.kind() == std::io::ErrorKind::TimedOut {
                    return Err(timed_out());
                }
                return Err(LspError::ConnectionRefused {
                    target: target.clone(),
                    source: error,
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            debug!("{target} not reachable yet: {error}");
            tokio::time::sleep(CONNECT_RETRY_INTERVAL).await;
        }
    }

    #[expect(deprecated, reason = "root_uri kept for servers without workspace folders")]
    async fn initialize(&self) -> LspResult<()> {
        let root_uri = match self.inner.options.root_path.as_deref().map(file_uri).transpose() {
            Ok(uri) => uri,
            Err(e) => {
                warn!("Announcing no workspace root: {e}");
                None
            }
        };

        let params = InitializeParams {
            process_id: Some(std::process::id()),
            client_info: Some(ClientInfo {
                name: String::from(CLIENT_NAME),
                version: Some(String::from(env!("CARGO_PKG_VERSION"))),
            }),
            root_uri: root_uri.clone(),
            workspace_folders: root_uri.map(|uri| {
                vec![WorkspaceFolder {
                    uri,
                    name: String::from("project"),
                }]
            }),
            capabilities: client_capabilities(),
            ..Default::default()
        };

        let result = self
            .call("initialize", serde_json::to_value(params)?, false)
            .await?;
        let capabilities = result.get("capabilities").cloned().unwrap_or_default();
        debug!("Server capabilities: {capabilities}");
        self.notify("initialized", json!({}), false).await
    }

    async fn call(&self, method: &str, params: Value, require_connected: bool) -> LspResult<Value> {
        let id = self.inner.request_id.fetch_add(1, Ordering::SeqCst);
        let (reply_tx, reply_rx) = oneshot::channel();

        let writer = {
            let mut state = self.inner.lock();
            let writer = state
                .writer
                .clone()
                .filter(|_| !require_connected || state.status == ClientStatus::Connected)
                .ok_or_else(|| LspError::request_while_disconnected(method))?;
            state.pending.insert(
                id,
                PendingRequest {
                    method: method.to_string(),
                    reply: reply_tx,
                },
            );
            writer
        };

        let message = json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": id,
            "method": method,
            "params": params,
        });

        debug!("Sending request {method} (id {id})");
        if let Err(e) = transport::write_message(&mut *writer.lock().await, &message).await {
            self.inner.lock().pending.remove(&id);
            return Err(e);
        }

        let timeout = self.inner.options.request_timeout;
        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(LspError::request_while_disconnected(method)),
            Err(_) => {
                self.inner.lock().pending.remove(&id);
                Err(LspError::RequestTimeout {
                    method: method.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }

    async fn notify(&self, method: &str, params: Value, require_connected: bool) -> LspResult<()> {
        let writer = {
            let state = self.inner.lock();
            state
                .writer
                .clone()
                .filter(|_| !require_connected || state.status == ClientStatus::Connected)
                .ok_or_else(|| LspError::request_while_disconnected(method))?
        };

        let message = json!({
            "jsonrpc": JSONRPC_VERSION,
            "method": method,
            "params": params,
        });

        transport::write_message(&mut *writer.lock().await, &message).await
    }
}

impl ClientInner {
    fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish `status`. Repeats are dropped unless `force` is set.
    fn emit(&self, state: &mut ClientState, status: ClientStatus, force: bool) {
        if !force && state.status == status {
            return;
        }
        state.status = status;
        self.status_tx.send_replace(status);
        let _ = self.events_tx.send(ClientEvent {
            status,
            session: state.session,
        });
        info!(server = %state.target, session = state.session, "Language server client {status}");
    }

    /// Drop the transport and fail every pending request.
    fn close_session(&self, state: &mut ClientState, abort_reader: bool) {
        if let Some(reader) = state.reader.take()
            && abort_reader
        {
            reader.abort();
        }
        state.writer = None;
        for (_, pending) in state.pending.drain() {
            let _ = pending
                .reply
                .send(Err(LspError::request_while_disconnected(pending.method)));
        }
    }

    fn connection_lost(&self, session: u64) {
        let mut state = self.lock();
        if state.session != session {
            return;
        }
        self.close_session(&mut state, false);
        self.emit(&mut state, ClientStatus::Disconnected, false);
    }

    async fn dispatch(&self, message: Value, session: u64) {
        let id = message.get("id").cloned();
        let method = message
            .get("method")
            .and_then(Value::as_str)
            .map(str::to_owned);

        match (id, method) {
            (Some(id), Some(method)) => self.reject_request(id, &method, session).await,
            (None, Some(method)) => debug!(method = %method, "Server notification"),
            (Some(_), None) => self.complete(message),
            (None, None) => warn!("Ignoring malformed message from language server"),
        }
    }

    fn complete(&self, message: Value) {
        let response: RpcResponse = match serde_json::from_value(message) {
            Ok(response) => response,
            Err(e) => {
                warn!("Ignoring unparseable response: {e}");
                return;
            }
        };

        let Some(id) = response.id.as_u64() else {
            warn!("Ignoring response with id {}", response.id);
            return;
        };

        let Some(pending) = self.lock().pending.remove(&id) else {
            debug!("Response for unknown request {id}");
            return;
        };

        let result = match response.error {
            Some(error) => Err(LspError::ResponseError {
                code: error.code,
                message: error.message,
                location: ErrorLocation::from(Location::caller()),
            }),
            None => Ok(response.result.unwrap_or(Value::Null)),
        };
        let _ = pending.reply.send(result);
    }

    /// Server-to-client requests are not supported.
    async fn reject_request(&self, id: Value, method: &str, session: u64) {
        debug!(method, "Rejecting server request");

        let writer = {
            let state = self.lock();
            if state.session != session {
                return;
            }
            state.writer.clone()
        };
        let Some(writer) = writer else {
            return;
        };

        let reply = json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": id,
            "error": {
                "code": METHOD_NOT_FOUND,
                "message": format!("Method not found: {method}"),
            },
        });
        if let Err(e) = transport::write_message(&mut *writer.lock().await, &reply).await {
            debug!("Failed to reject {method}: {e}");
        }
    }
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(reader) = state.reader.take() {
            reader.abort();
        }
    }
}

async fn read_loop(inner: Weak<ClientInner>, read_half: OwnedReadHalf, session: u64) {
    let mut reader = BufReader::new(read_half);

    loop {
        let message = match transport::read_message(&mut reader).await {
            Ok(Some(message)) => message,
            Ok(None) => {
                debug!("Language server closed the connection");
                break;
            }
            Err(e) => {
                warn!("Language server connection failed: {e}");
                break;
            }
        };

        let Some(inner) = inner.upgrade() else {
            return;
        };
        inner.dispatch(message, session).await;
    }

    if let Some(inner) = inner.upgrade() {
        inner.connection_lost(session);
    }
}

fn client_capabilities() -> ClientCapabilities {
    ClientCapabilities {
        text_document: Some(TextDocumentClientCapabilities {
            hover: Some(HoverClientCapabilities {
                dynamic_registration: Some(false),
                content_format: Some(vec![MarkupKind::Markdown, MarkupKind::PlainText]),
            }),
            document_symbol: Some(DocumentSymbolClientCapabilities {
                dynamic_registration: Some(false),
                hierarchical_document_symbol_support: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}
