//! TCP server for the roll-stream adapter
//!
//! Accepts client connections speaking the line-delimited JSON protocol,
//! assigns controller/observer roles, forwards controller rolls to the game
//! loop, and fans score observations out to streaming clients.
//! Uses tokio for async networking.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::adapter::protocol::*;
use crate::adapter::runtime::{InboundRoll, OutboundMessage};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
    pub max_pending_rolls: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7313,
            protocol_version: PROTOCOL_VERSION.to_string(),
            max_pending_rolls: 16,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("TENPIN_HOST").unwrap_or(defaults.host);
        let port = env::var("TENPIN_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);
        let max_pending_rolls = env::var("TENPIN_MAX_PENDING")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_pending_rolls);

        Self {
            host,
            port,
            protocol_version: defaults.protocol_version,
            max_pending_rolls,
        }
    }
}

/// Handle to a connected client
pub struct ClientHandle {
    pub id: u64,
    pub addr: SocketAddr,
    pub role: AssignedRole,
    pub stream_scores: bool,
    pub handshaken: bool,
    pub last_seq: Option<u64>,
    pub tx: mpsc::UnboundedSender<String>,
}

/// Shared server state
pub struct ServerState {
    config: ServerConfig,
    clients: RwLock<Vec<ClientHandle>>,
    /// Client id of the current controller, if any.
    controller: RwLock<Option<u64>>,
    next_client_id: AtomicU64,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            clients: RwLock::new(Vec::new()),
            controller: RwLock::new(None),
            next_client_id: AtomicU64::new(1),
        }
    }

    /// Check if the adapter is disabled via environment
    pub fn is_disabled() -> bool {
        std::env::var("TENPIN_DISABLED")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false)
    }

    fn alloc_client_id(&self) -> u64 {
        self.next_client_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn register(&self, handle: ClientHandle) {
        debug!("client {} connected from {}", handle.id, handle.addr);
        self.clients.write().await.push(handle);
    }

    async fn deregister(&self, client_id: u64) {
        self.clients.write().await.retain(|c| c.id != client_id);
        let mut controller = self.controller.write().await;
        if *controller == Some(client_id) {
            *controller = None;
            info!("controller {} disconnected, role released", client_id);
        }
    }

    async fn is_handshaken(&self, client_id: u64) -> bool {
        let clients = self.clients.read().await;
        clients
            .iter()
            .find(|c| c.id == client_id)
            .map(|c| c.handshaken)
            .unwrap_or(false)
    }

    async fn role(&self, client_id: u64) -> Option<AssignedRole> {
        let clients = self.clients.read().await;
        clients.iter().find(|c| c.id == client_id).map(|c| c.role)
    }

    /// Enforce monotonically increasing per-client sequence numbers.
    /// Returns false for stale messages, which are dropped.
    async fn check_and_update_seq(&self, client_id: u64, seq: u64) -> bool {
        let mut clients = self.clients.write().await;
        let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
            return true;
        };

        match client.last_seq {
            None => {
                client.last_seq = Some(seq);
                true
            }
            Some(prev) => {
                if seq <= prev {
                    false
                } else {
                    client.last_seq = Some(seq);
                    true
                }
            }
        }
    }

    /// Complete a handshake: assign a role and record capabilities.
    async fn complete_handshake(&self, client_id: u64, hello: &HelloMessage) -> AssignedRole {
        let requested = hello.requested.role.unwrap_or(RequestedRole::Auto);
        let assigned = {
            let mut controller = self.controller.write().await;
            match requested {
                RequestedRole::Observer => AssignedRole::Observer,
                RequestedRole::Controller | RequestedRole::Auto => {
                    if controller.is_none() {
                        *controller = Some(client_id);
                        AssignedRole::Controller
                    } else {
                        AssignedRole::Observer
                    }
                }
            }
        };

        let mut clients = self.clients.write().await;
        if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
            client.handshaken = true;
            client.role = assigned;
            client.stream_scores = hello.requested.stream_scores;
            client.last_seq = Some(hello.seq);
        }
        assigned
    }
}

/// Start the TCP server.
///
/// Controller rolls go out through `roll_tx`; the game loop answers through
/// `out_rx` (acks, errors, observation broadcasts). `ready_tx` reports the
/// bound address, which tests use with port 0.
pub async fn run_server(
    config: ServerConfig,
    roll_tx: mpsc::Sender<InboundRoll>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    info!("adapter listening on {}", addr);
    if let Some(tx) = ready_tx {
        let _ = tx.send(addr);
    }

    let state = Arc::new(ServerState::new(config));

    // Outbound dispatch: targeted replies and observation broadcasts.
    let dispatch_state = state.clone();
    tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let clients = dispatch_state.clients.read().await;
            match msg {
                OutboundMessage::ToClient { client_id, line } => {
                    if let Some(client) = clients.iter().find(|c| c.id == client_id) {
                        let _ = client.tx.send(line);
                    }
                }
                OutboundMessage::Broadcast { line } => {
                    for client in clients.iter().filter(|c| c.handshaken && c.stream_scores) {
                        let _ = client.tx.send(line.clone());
                    }
                }
            }
        }
    });

    loop {
        let (stream, peer) = listener.accept().await?;
        let state = state.clone();
        let roll_tx = roll_tx.clone();
        tokio::spawn(async move {
            handle_client(state, roll_tx, stream, peer).await;
        });
    }
}

async fn handle_client(
    state: Arc<ServerState>,
    roll_tx: mpsc::Sender<InboundRoll>,
    stream: TcpStream,
    peer: SocketAddr,
) {
    let client_id = state.alloc_client_id();
    let (out_tx, mut out_line_rx) = mpsc::unbounded_channel::<String>();

    state
        .register(ClientHandle {
            id: client_id,
            addr: peer,
            role: AssignedRole::Observer,
            stream_scores: false,
            handshaken: false,
            last_seq: None,
            tx: out_tx.clone(),
        })
        .await;

    let (read_half, mut write_half) = stream.into_split();

    let writer = tokio::spawn(async move {
        while let Some(line) = out_line_rx.recv().await {
            if write_half.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if write_half.write_all(b"\n").await.is_err() {
                break;
            }
        }
    });

    let mut server_seq: u64 = 0;
    let mut lines = BufReader::new(read_half).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }

        let parsed = match parse_message(&line) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("client {}: unparseable message: {}", client_id, e);
                continue;
            }
        };

        match parsed {
            ParsedMessage::Hello(hello) => {
                server_seq += 1;
                if hello.protocol_version != state.config.protocol_version {
                    let err = create_error(
                        server_seq,
                        ErrorCode::ProtocolMismatch,
                        &format!(
                            "unsupported protocol version {} (server speaks {})",
                            hello.protocol_version, state.config.protocol_version
                        ),
                    );
                    send_json(&out_tx, &err);
                    continue;
                }

                let role = state.complete_handshake(client_id, &hello).await;
                info!(
                    "client {} ({}) handshake complete, role {:?}",
                    client_id, hello.client.name, role
                );
                let welcome =
                    create_welcome(server_seq, &state.config.protocol_version, client_id, role);
                send_json(&out_tx, &welcome);
            }
            ParsedMessage::Roll(roll) => {
                if !state.is_handshaken(client_id).await {
                    server_seq += 1;
                    let err = create_error(
                        server_seq,
                        ErrorCode::HandshakeRequired,
                        "hello required before rolls",
                    );
                    send_json(&out_tx, &err);
                    continue;
                }
                if !state.check_and_update_seq(client_id, roll.seq).await {
                    debug!("client {}: stale seq {}, dropped", client_id, roll.seq);
                    continue;
                }
                if state.role(client_id).await != Some(AssignedRole::Controller) {
                    server_seq += 1;
                    let err = create_error(
                        server_seq,
                        ErrorCode::NotController,
                        "only the controller may roll",
                    );
                    send_json(&out_tx, &err);
                    continue;
                }

                let inbound = InboundRoll {
                    client_id,
                    seq: roll.seq,
                    pins: roll.pins,
                };
                match roll_tx.try_send(inbound) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        server_seq += 1;
                        let err = create_error(
                            server_seq,
                            ErrorCode::Backpressure,
                            "too many pending rolls",
                        );
                        send_json(&out_tx, &err);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
            ParsedMessage::Unknown(unknown) => {
                debug!(
                    "client {}: ignoring unknown message (seq {})",
                    client_id, unknown.seq
                );
            }
        }
    }

    state.deregister(client_id).await;
    drop(out_tx);
    let _ = writer.await;
    debug!("client {} disconnected", client_id);
}

fn send_json<T: serde::Serialize>(tx: &mpsc::UnboundedSender<String>, msg: &T) {
    match serde_json::to_string(msg) {
        Ok(line) => {
            let _ = tx.send(line);
        }
        Err(e) => warn!("failed to serialize outbound message: {}", e),
    }
}
