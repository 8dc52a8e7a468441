//! # inkboard-core: stroke synchronization engine
//!
//! Shared state for a multi-participant freehand canvas. Strokes stream
//! point-by-point between participants; every participant folds the deltas
//! into its own [`StrokeStore`].
//!
//! ## Architecture
//!
//! ```text
//!  pointer input                              network
//!       │                                        │
//!       ▼                                        ▼
//! ┌───────────────┐  Outbound  ┌──────────┐  Inbound   ┌──────────────┐
//! │DrawingSession │ ─────────► │ BoardBus │ ─────────► │ merge_stroke │
//! └───────┬───────┘            └──────────┘            └──────┬───────┘
//!         │ start/add/end/undo                                │
//!         ▼                                                   ▼
//!   ┌───────────────────────────────────────────────────────────────┐
//!   │ StrokeStore  (strokes in draw order + per-owner undo history) │
//!   └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`stroke`]: stroke data model
//! - [`message`]: JSON wire schema (`StrokeMsg`)
//! - [`store`]: state container, local mutations, remote-merge reducer
//! - [`bus`]: two-topic publish/subscribe
//! - [`session`]: pointer gestures → store + outbound deltas
//! - [`brush`]: color/width for new strokes
//! - [`identity`]: per-session owner id
//!
//! Everything here is single-threaded: share the store as
//! [`SharedStore`] and the bus as `Rc<BoardBus>` on one thread.

pub mod brush;
pub mod bus;
pub mod identity;
pub mod message;
pub mod session;
pub mod store;
pub mod stroke;

pub use brush::{Brush, PRESET_COLORS};
pub use bus::{BoardBus, EventBus, Subscription, Topic};
pub use identity::{ensure_owner_id, generate_owner_id, IdentityError};
pub use message::{MessageError, StrokeMsg};
pub use session::DrawingSession;
pub use store::{SharedStore, StrokeStore};
pub use stroke::{OwnerId, Stroke, StrokeHead, StrokeId};
