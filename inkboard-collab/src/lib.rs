//! # inkboard-collab: Network layer for the shared board
//!
//! Carries stroke messages between participants over WebSocket text frames.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    JSON frames     ┌──────────────┐
//! │ WsTransport  │ ◄────────────────► │ RelayServer  │
//! │ (per client) │                    │ (central)    │
//! └──────┬───────┘                    └──────┬───────┘
//!        │ TransportEvent                    │
//!        ▼                                   ▼
//! ┌──────────────┐                    ┌──────────────┐
//! │ Wiring       │                    │ StrokeStore  │
//! │ bus ⇄ store  │                    │ (replica)    │
//! └──────────────┘                    └──────┬───────┘
//!                                            │
//!                                    ┌───────┴───────┐
//!                                    │ BroadcastGroup│
//!                                    │ (fan-out)     │
//!                                    └───────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`transport`]: Transport contract and the WebSocket client
//! - [`wiring`]: Binds a transport to the board bus and store
//! - [`broadcast`]: Fan-out with per-peer backpressure
//! - [`relay`]: WebSocket relay with late-joiner replay

pub mod broadcast;
pub mod relay;
pub mod transport;
pub mod wiring;

// Re-exports for convenience
pub use broadcast::{BroadcastGroup, BroadcastStats, PeerInfo, RelayFrame};
pub use relay::{RelayConfig, RelayError, RelayServer, RelayStats};
pub use transport::{ClientConfig, Transport, TransportError, TransportEvent, WsTransport};
pub use wiring::{Wiring, WiringError};
