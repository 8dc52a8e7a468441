//! WebSocket relay for one shared board.
//!
//! Architecture:
//! ```text
//! Client A ──┐                      ┌──► Client B
//!            ├── RelayServer ── BroadcastGroup
//! Client B ──┘        │             └──► Client A   (never echoed to the sender)
//!                     ▼
//!              StrokeStore replica ──► stroke-full × N to each late joiner
//! ```
//!
//! Every well-formed frame is merged into an in-memory replica and then
//! fanned out, verbatim, to the other connections. The replica exists only to
//! bring newcomers up to date and lives as long as the process.
//!
//! Reference: Kleppmann, Designing Data-Intensive Applications, Chapter 8

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use inkboard_core::{MessageError, StrokeMsg, StrokeStore};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, RwLock};
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

use crate::broadcast::{BroadcastGroup, PeerInfo, RelayFrame};

/// Owner of the relay's replica. It never authors strokes.
const RELAY_OWNER: &str = "relay";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error(transparent)]
    Message(#[from] MessageError),
    #[error("invalid value {value:?} for {var}")]
    Config { var: &'static str, value: String },
}

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address to bind to
    pub bind_addr: String,
    /// Connections beyond this are closed on arrival
    pub max_peers: usize,
    /// Frames buffered per connection before it lags
    pub broadcast_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            max_peers: 100,
            broadcast_capacity: 256,
        }
    }
}

impl RelayConfig {
    /// Defaults overridden by `INKBOARD_BIND`, `INKBOARD_MAX_PEERS` and
    /// `INKBOARD_BROADCAST_CAPACITY`.
    pub fn from_env() -> Result<Self, RelayError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, RelayError> {
        let mut config = Self::default();
        if let Some(bind) = lookup("INKBOARD_BIND") {
            config.bind_addr = bind;
        }
        if let Some(value) = lookup("INKBOARD_MAX_PEERS") {
            config.max_peers = parse_count("INKBOARD_MAX_PEERS", value)?;
        }
        if let Some(value) = lookup("INKBOARD_BROADCAST_CAPACITY") {
            config.broadcast_capacity = parse_count("INKBOARD_BROADCAST_CAPACITY", value)?;
        }
        Ok(config)
    }
}

fn parse_count(var: &'static str, value: String) -> Result<usize, RelayError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(RelayError::Config { var, value }),
    }
}

/// Relay statistics.
#[derive(Debug, Clone, Default)]
pub struct RelayStats {
    pub total_connections: u64,
    pub active_connections: u64,
    pub refused_connections: u64,
    pub total_frames: u64,
    pub total_bytes: u64,
    pub rejected_frames: u64,
}

/// Shared state handed to each connection task.
#[derive(Clone)]
struct RelayState {
    config: RelayConfig,
    board: Arc<RwLock<StrokeStore>>,
    group: Arc<BroadcastGroup>,
    stats: Arc<RwLock<RelayStats>>,
}

pub struct RelayServer {
    state: RelayState,
}

impl RelayServer {
    pub fn new(config: RelayConfig) -> Self {
        let group = Arc::new(BroadcastGroup::new(config.broadcast_capacity));
        Self {
            state: RelayState {
                config,
                board: Arc::new(RwLock::new(StrokeStore::new(RELAY_OWNER))),
                group,
                stats: Arc::new(RwLock::new(RelayStats::default())),
            },
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RelayConfig::default())
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, RelayError> {
        let listener = TcpListener::bind(&self.state.config.bind_addr).await?;
        log::info!("Relay listening on {}", listener.local_addr()?);
        Ok(listener)
    }

    /// Accept connections on `listener` until accepting fails.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), RelayError> {
        loop {
            let (stream, addr) = listener.accept().await?;
            log::debug!("New TCP connection from {addr}");

            let state = self.state.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, addr, state).await {
                    log::error!("Connection error from {addr}: {e}");
                }
            });
        }
    }

    /// Bind and serve.
    pub async fn run(&self) -> Result<(), RelayError> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    pub async fn stats(&self) -> RelayStats {
        self.state.stats.read().await.clone()
    }

    /// Number of strokes a late joiner would receive.
    pub async fn board_len(&self) -> usize {
        self.state.board.read().await.len()
    }

    pub fn bind_addr(&self) -> &str {
        &self.state.config.bind_addr
    }
}

async fn handle_connection(stream: TcpStream, addr: SocketAddr, state: RelayState) -> Result<(), RelayError> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let conn_id = Uuid::new_v4();
    // Subscribe and snapshot under the board read lock: every frame is then
    // either already in the snapshot or still ahead in the receiver, never both.
    let joined = {
        let board = state.board.read().await;
        state
            .group
            .try_add_peer(PeerInfo { conn_id, addr }, state.config.max_peers)
            .await
            .map(|rx| (rx, board.snapshot_messages()))
    };
    let Some((mut broadcast_rx, snapshot)) = joined else {
        log::warn!("Refusing {addr}: {} peers connected", state.config.max_peers);
        state.stats.write().await.refused_connections += 1;
        ws_sender.send(Message::Close(None)).await?;
        return Ok(());
    };

    {
        let mut s = state.stats.write().await;
        s.total_connections += 1;
        s.active_connections += 1;
    }
    log::info!("Peer {conn_id} connected from {addr}; replaying {} strokes", snapshot.len());

    let result = async {
        for msg in &snapshot {
            ws_sender.send(Message::Text(msg.encode()?.into())).await?;
        }

        loop {
            tokio::select! {
                frame = ws_receiver.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            let msg = match StrokeMsg::decode(text.as_str()) {
                                Ok(msg) => msg,
                                Err(e) => {
                                    log::warn!("Rejected frame from {addr}: {e}");
                                    state.stats.write().await.rejected_frames += 1;
                                    continue;
                                }
                            };
                            {
                                let mut s = state.stats.write().await;
                                s.total_frames += 1;
                                s.total_bytes += text.len() as u64;
                            }
                            // Merge and fan out under one write lock, see above.
                            let mut board = state.board.write().await;
                            board.merge_stroke(&msg);
                            state.group.broadcast(RelayFrame { from: conn_id, text: text.to_string() });
                        }
                        Some(Ok(Message::Binary(data))) => {
                            log::warn!("Rejected {}-byte binary frame from {addr}", data.len());
                            state.stats.write().await.rejected_frames += 1;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            ws_sender.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            log::info!("Connection closed from {addr}");
                            break;
                        }
                        Some(Err(e)) => {
                            log::error!("WebSocket error from {addr}: {e}");
                            break;
                        }
                        _ => {}
                    }
                }

                relayed = broadcast_rx.recv() => {
                    match relayed {
                        Ok(frame) => {
                            if frame.from == conn_id {
                                continue;
                            }
                            ws_sender.send(Message::Text(frame.text.clone().into())).await?;
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            log::warn!("Peer {conn_id} lagged by {n} frames");
                            state.group.record_lag(n);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }
        Ok::<(), RelayError>(())
    }
    .await;

    state.group.remove_peer(&conn_id).await;
    state.stats.write().await.active_connections -= 1;
    log::info!("Peer {conn_id} left");

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_relay_config_default() {
        let config = RelayConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:8000");
        assert_eq!(config.max_peers, 100);
        assert_eq!(config.broadcast_capacity, 256);
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("INKBOARD_BIND", "0.0.0.0:9000"),
            ("INKBOARD_MAX_PEERS", "12"),
        ]
        .into_iter()
        .collect();

        let config = RelayConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.max_peers, 12);
        assert_eq!(config.broadcast_capacity, 256);
    }

    #[test]
    fn test_config_rejects_bad_numbers() {
        let err = RelayConfig::from_lookup(|k| {
            (k == "INKBOARD_BROADCAST_CAPACITY").then(|| "lots".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, RelayError::Config { var: "INKBOARD_BROADCAST_CAPACITY", .. }));

        assert!(RelayConfig::from_lookup(|k| (k == "INKBOARD_MAX_PEERS").then(|| "0".to_string())).is_err());
    }

    #[test]
    fn test_server_creation() {
        let server = RelayServer::with_defaults();
        assert_eq!(server.bind_addr(), "127.0.0.1:8000");
    }

    #[tokio::test]
    async fn test_server_stats_initial() {
        let server = RelayServer::with_defaults();
        let stats = server.stats().await;
        assert_eq!(stats.total_connections, 0);
        assert_eq!(stats.active_connections, 0);
        assert_eq!(stats.total_frames, 0);
        assert_eq!(stats.rejected_frames, 0);
        assert_eq!(server.board_len().await, 0);
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let server = RelayServer::new(RelayConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            ..RelayConfig::default()
        });
        let listener = server.bind().await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }
}
