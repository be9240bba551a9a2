//! In-process stand-in for the Godot language server.

#![allow(dead_code)]

use gdlsp_core::transport::{read_message, write_message};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const WAIT: Duration = Duration::from_secs(10);

#[derive(Default)]
struct ServerState {
    received: Mutex<Vec<Value>>,
    outbound: Mutex<Vec<mpsc::UnboundedSender<Value>>>,
    connections: Mutex<Vec<JoinHandle<()>>>,
}

pub struct FakeLspServer {
    port: u16,
    state: Arc<ServerState>,
    accept: JoinHandle<()>,
}

impl FakeLspServer {
    pub async fn start() -> Self {
        Self::bind(0).await
    }

    pub async fn bind(port: u16) -> Self {
        let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(ServerState::default());

        let accept_state = state.clone();
        let accept = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                serve(stream, accept_state.clone());
            }
        });

        Self {
            port,
            state,
            accept,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Drop every open connection, as a crashed server would.
    pub fn close_connections(&self) {
        self.state.outbound.lock().unwrap().clear();
        for connection in self.state.connections.lock().unwrap().drain(..) {
            connection.abort();
        }
    }

    pub fn shutdown(&self) {
        self.accept.abort();
        self.close_connections();
    }

    /// Send a message to every connected client.
    pub fn push(&self, message: Value) {
        for outbound in self.state.outbound.lock().unwrap().iter() {
            let _ = outbound.send(message.clone());
        }
    }

    pub fn received(&self) -> Vec<Value> {
        self.state.received.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.received()
            .iter()
            .filter_map(|message| message.get("method").and_then(Value::as_str))
            .map(String::from)
            .collect()
    }

    /// Wait until a message matching `predicate` has been received.
    pub async fn wait_for(&self, predicate: impl Fn(&Value) -> bool) -> Value {
        tokio::time::timeout(WAIT, async {
            loop {
                if let Some(found) = self.received().into_iter().find(|m| predicate(m)) {
                    return found;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap()
    }
}

impl Drop for FakeLspServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn serve(stream: TcpStream, state: Arc<ServerState>) {
    let (read_half, mut write_half) = stream.into_split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Value>();
    state.outbound.lock().unwrap().push(outbound_tx.clone());

    let writer = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if write_message(&mut write_half, &message).await.is_err() {
                break;
            }
        }
    });

    let reader_state = state.clone();
    let reader = tokio::spawn(async move {
        let mut reader = BufReader::new(read_half);
        while let Ok(Some(message)) = read_message(&mut reader).await {
            reader_state.received.lock().unwrap().push(message.clone());
            if let Some(reply) = reply_to(&message) {
                let _ = outbound_tx.send(reply);
            }
        }
    });

    let mut connections = state.connections.lock().unwrap();
    connections.push(writer);
    connections.push(reader);
}

fn reply_to(message: &Value) -> Option<Value> {
    let id = message.get("id")?.clone();
    let method = message.get("method").and_then(Value::as_str)?;

    let result = match method {
        "initialize" => json!({
            "capabilities": {
                "hoverProvider": true,
                "documentSymbolProvider": true
            }
        }),
        "textDocument/hover" => json!({
            "contents": { "kind": "markdown", "value": "func _ready() -> void" }
        }),
        "textDocument/documentSymbol" => json!([{
            "name": "Player",
            "kind": 5,
            "range": {
                "start": { "line": 0, "character": 0 },
                "end": { "line": 20, "character": 0 }
            },
            "selectionRange": {
                "start": { "line": 0, "character": 11 },
                "end": { "line": 0, "character": 17 }
            },
            "children": [{
                "name": "_ready",
                "kind": 6,
                "range": {
                    "start": { "line": 4, "character": 0 },
                    "end": { "line": 6, "character": 0 }
                },
                "selectionRange": {
                    "start": { "line": 4, "character": 5 },
                    "end": { "line": 4, "character": 11 }
                }
            }]
        }]),
        _ => {
            return Some(json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": format!("unknown method {method}") }
            }));
        }
    };

    Some(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
}
