//! Fan-out of relayed frames to every other connection.
//!
//! Uses a tokio broadcast channel: one send reaches all subscribers. Each
//! connection gets an independent receiver that buffers up to `capacity`
//! frames; a connection that falls further behind loses the oldest frames,
//! which the store tolerates as lost deltas.
//!
//! Reference: Patterson & Hennessy, Section 6.4, Interconnection Networks

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// A frame as relayed, tagged with the connection it came from so the
/// sender can skip its own echo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayFrame {
    pub from: Uuid,
    pub text: String,
}

/// A connected participant's socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub conn_id: Uuid,
    pub addr: SocketAddr,
}

#[derive(Debug, Clone, Default)]
pub struct BroadcastStats {
    pub frames_sent: u64,
    pub frames_lagged: u64,
    pub active_peers: usize,
}

/// Fan-out group for the shared board.
pub struct BroadcastGroup {
    sender: broadcast::Sender<Arc<RelayFrame>>,
    peers: Arc<RwLock<HashMap<Uuid, PeerInfo>>>,
    capacity: usize,
    /// Lock-free on the hot path.
    frames_sent: AtomicU64,
    frames_lagged: AtomicU64,
}

impl BroadcastGroup {
    /// `capacity` frames are buffered per peer before it starts lagging.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            peers: Arc::new(RwLock::new(HashMap::new())),
            capacity,
            frames_sent: AtomicU64::new(0),
            frames_lagged: AtomicU64::new(0),
        }
    }

    /// Register a peer and hand back its receiver.
    pub async fn add_peer(&self, info: PeerInfo) -> broadcast::Receiver<Arc<RelayFrame>> {
        let mut peers = self.peers.write().await;
        peers.insert(info.conn_id, info);
        self.sender.subscribe()
    }

    /// Register a peer unless `max_peers` are already present. The check and
    /// the insert happen under one lock.
    pub async fn try_add_peer(&self, info: PeerInfo, max_peers: usize) -> Option<broadcast::Receiver<Arc<RelayFrame>>> {
        let mut peers = self.peers.write().await;
        if peers.len() >= max_peers {
            return None;
        }
        peers.insert(info.conn_id, info);
        Some(self.sender.subscribe())
    }

    pub async fn remove_peer(&self, conn_id: &Uuid) -> Option<PeerInfo> {
        self.peers.write().await.remove(conn_id)
    }

    /// Send to every receiver, including the sender's own; receivers filter
    /// by [`RelayFrame::from`]. Returns the number of receivers reached.
    pub fn broadcast(&self, frame: RelayFrame) -> usize {
        let count = self.sender.send(Arc::new(frame)).unwrap_or(0);
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        count
    }

    /// Record that a receiver skipped `n` frames.
    pub fn record_lag(&self, n: u64) {
        self.frames_lagged.fetch_add(n, Ordering::Relaxed);
    }

    pub async fn peer_count(&self) -> usize {
        self.peers.read().await.len()
    }

    pub async fn has_peer(&self, conn_id: &Uuid) -> bool {
        self.peers.read().await.contains_key(conn_id)
    }

    pub async fn peers(&self) -> Vec<PeerInfo> {
        self.peers.read().await.values().cloned().collect()
    }

    pub async fn stats(&self) -> BroadcastStats {
        BroadcastStats {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_lagged: self.frames_lagged.load(Ordering::Relaxed),
            active_peers: self.peers.read().await.len(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
