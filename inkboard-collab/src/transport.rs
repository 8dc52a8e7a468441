//! Transport contract and its WebSocket implementation.
//!
//! The core only needs three things from the network:
//! - whether the link is up ([`Transport::is_connected`]),
//! - a fire-and-forget send ([`Transport::send`]), dropped while the link is down,
//! - a stream of [`TransportEvent`]s carrying link changes and parsed frames.
//!
//! [`WsTransport`] speaks JSON text frames over `tokio-tungstenite`. Reading
//! and writing run on spawned tasks; the owning thread talks to them only
//! through channels and an atomic status flag.
//!
//! Reference: Kleppmann, Chapter 5, Replication

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use inkboard_core::{ensure_owner_id, generate_owner_id, Brush, IdentityError, StrokeMsg, StrokeStore};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// The network as seen by the wiring layer.
pub trait Transport {
    /// Current link status.
    fn is_connected(&self) -> bool;

    /// Queue `msg` for transmission. At most once; silently dropped when the
    /// link is down.
    fn send(&self, msg: &StrokeMsg);
}

/// Link changes and inbound frames, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    /// A well-formed frame from another participant.
    Message(StrokeMsg),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },
    #[error("transport is already connected")]
    AlreadyConnected,
}

/// Client-side settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relay WebSocket URL
    pub server_url: String,
    /// Where the session's owner id is kept (None = fresh id per process)
    pub owner_id_path: Option<PathBuf>,
    /// Brush for the first stroke
    pub brush: Brush,
    /// Buffered frames per direction before new ones are dropped
    pub channel_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:8000/ws".to_string(),
            owner_id_path: None,
            brush: Brush::default(),
            channel_capacity: 256,
        }
    }
}

impl ClientConfig {
    /// Empty board owned by this session's identity, with the configured brush.
    pub fn open_store(&self) -> Result<StrokeStore, IdentityError> {
        let owner = match &self.owner_id_path {
            Some(path) => ensure_owner_id(path)?,
            None => generate_owner_id(),
        };
        let mut store = StrokeStore::new(owner);
        store.set_color(self.brush.color.clone());
        store.set_width(self.brush.width);
        Ok(store)
    }

    /// WebSocket transport for [`Self::server_url`].
    pub fn transport(&self) -> WsTransport {
        WsTransport::with_capacity(self.server_url.clone(), self.channel_capacity)
    }
}

/// WebSocket implementation of [`Transport`].
pub struct WsTransport {
    url: String,
    capacity: usize,
    connected: Arc<AtomicBool>,
    /// Bumped on every connect so a stale reader cannot flip a newer link down.
    generation: Arc<AtomicU64>,
    outgoing_tx: Mutex<Option<mpsc::Sender<String>>>,
    event_tx: mpsc::Sender<TransportEvent>,
    event_rx: Option<mpsc::Receiver<TransportEvent>>,
}

impl WsTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_capacity(url, 256)
    }

    pub fn with_capacity(url: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel(capacity);
        Self {
            url: url.into(),
            capacity,
            connected: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            outgoing_tx: Mutex::new(None),
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Take the event receiver (can only be called once).
    pub fn take_event_rx(&mut self) -> Option<mpsc::Receiver<TransportEvent>> {
        self.event_rx.take()
    }

    /// Open the socket and start the reader/writer tasks.
    ///
    /// May be called again after the link drops.
    pub async fn connect(&self) -> Result<(), TransportError> {
        if self.is_connected() {
            return Err(TransportError::AlreadyConnected);
        }

        let (ws_stream, _) = tokio_tungstenite::connect_async(&self.url)
            .await
            .map_err(|source| TransportError::Connect {
                url: self.url.clone(),
                source,
            })?;
        let (mut ws_writer, mut ws_reader) = ws_stream.split();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        // Writer task: forward outgoing channel to WebSocket
        let (out_tx, mut out_rx) = mpsc::channel::<String>(self.capacity);
        tokio::spawn(async move {
            while let Some(text) = out_rx.recv().await {
                if ws_writer.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            let _ = ws_writer.close().await;
        });
        *self.outgoing_tx.lock().unwrap_or_else(|e| e.into_inner()) = Some(out_tx);

        self.connected.store(true, Ordering::SeqCst);
        let _ = self.event_tx.send(TransportEvent::Connected).await;
        log::info!("Connected to {}", self.url);

        // Reader task: parse frames; malformed ones stop here.
        let event_tx = self.event_tx.clone();
        let connected = self.connected.clone();
        let current = self.generation.clone();
        let url = self.url.clone();
        tokio::spawn(async move {
            while let Some(frame) = ws_reader.next().await {
                match frame {
                    Ok(Message::Text(text)) => match StrokeMsg::decode(text.as_str()) {
                        Ok(msg) => {
                            if event_tx.send(TransportEvent::Message(msg)).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => log::warn!("Rejected frame from {url}: {e}"),
                    },
                    Ok(Message::Binary(data)) => {
                        log::warn!("Rejected {}-byte binary frame from {url}", data.len());
                    }
                    Ok(Message::Close(_)) | Err(_) => break,
                    _ => {}
                }
            }

            if current.load(Ordering::SeqCst) == generation {
                connected.store(false, Ordering::SeqCst);
                let _ = event_tx.send(TransportEvent::Disconnected).await;
                log::info!("Disconnected from {url}");
            }
        });

        Ok(())
    }

    /// Close the link. Pending outgoing frames are flushed first.
    pub fn disconnect(&self) {
        // Dropping the sender ends the writer task, which closes the socket.
        self.outgoing_tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for WsTransport {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn send(&self, msg: &StrokeMsg) {
        if !self.is_connected() {
            log::warn!("WebSocket not open; skipped {}", msg.kind());
            return;
        }
        let text = match msg.encode() {
            Ok(text) => text,
            Err(e) => {
                log::error!("{e}");
                return;
            }
        };
        let guard = self.outgoing_tx.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = guard.as_ref() {
            if tx.try_send(text).is_err() {
                log::warn!("Outgoing buffer full or closed; dropped {}", msg.kind());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        let transport = WsTransport::new("ws://localhost:9090");
        assert_eq!(transport.url(), "ws://localhost:9090");
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_send_while_down_is_noop() {
        let transport = WsTransport::new("ws://localhost:9090");
        transport.send(&StrokeMsg::Undo { id: "s1".into() });
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_take_event_rx() {
        let mut transport = WsTransport::new("ws://localhost:9090");
        assert!(transport.take_event_rx().is_some());
        assert!(transport.take_event_rx().is_none());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = WsTransport::new(format!("ws://127.0.0.1:{port}"));
        let err = transport.connect().await.unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.server_url, "ws://127.0.0.1:8000/ws");
        assert!(config.owner_id_path.is_none());
        assert_eq!(config.brush, Brush::default());
        assert_eq!(config.channel_capacity, 256);
    }

    #[test]
    fn test_open_store_applies_brush() {
        let config = ClientConfig {
            brush: Brush::new("#22c55e", 6.0),
            ..ClientConfig::default()
        };
        let store = config.open_store().unwrap();
        assert_eq!(store.brush(), &Brush::new("#22c55e", 6.0));
        assert!(!store.owner_id().is_empty());
        assert!(store.is_empty());
    }
}
