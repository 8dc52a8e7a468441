//! Connects a [`Transport`] to the board bus and store.
//!
//! ```text
//!  Transport ──TransportEvent──► Wiring::dispatch ──┬─ Connected/Disconnected ─► store.connected
//!                                                   └─ Message ─► bus Inbound ─► store.merge_stroke
//!  bus Outbound ───────────────────────────────────────────────► transport.send
//! ```
//!
//! A bus carries at most one wiring at a time. Dropping the [`Wiring`]
//! releases every binding, so rebinding after a reconnect or remount never
//! delivers a frame twice.

use std::rc::Rc;

use inkboard_core::{BoardBus, SharedStore, StrokeMsg, Subscription, Topic};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::transport::{Transport, TransportEvent};

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("the board bus is already wired to a transport")]
    AlreadyBound,
}

pub struct Wiring {
    store: SharedStore,
    bus: Rc<BoardBus>,
    events: mpsc::Receiver<TransportEvent>,
    _outbound: Subscription<StrokeMsg>,
    _inbound: Subscription<StrokeMsg>,
}

impl Wiring {
    /// Establish all four bindings. Fails if `bus` is already wired.
    pub fn bind(
        store: SharedStore,
        bus: Rc<BoardBus>,
        transport: Rc<dyn Transport>,
        events: mpsc::Receiver<TransportEvent>,
    ) -> Result<Self, WiringError> {
        if !bus.claim_bridge() {
            return Err(WiringError::AlreadyBound);
        }

        store.borrow_mut().set_connected(transport.is_connected());

        let outbound = bus.subscribe(Topic::Outbound, move |msg| transport.send(msg));

        let target = Rc::clone(&store);
        let inbound = bus.subscribe(Topic::Inbound, move |msg| {
            target.borrow_mut().merge_stroke(msg);
        });

        Ok(Self {
            store,
            bus,
            events,
            _outbound: outbound,
            _inbound: inbound,
        })
    }

    /// Apply one transport event.
    pub fn dispatch(&self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => self.store.borrow_mut().set_connected(true),
            TransportEvent::Disconnected => self.store.borrow_mut().set_connected(false),
            TransportEvent::Message(msg) => {
                log::trace!("Inbound {} for {:?}", msg.kind(), msg.stroke_id());
                self.bus.publish(Topic::Inbound, &msg);
            }
        }
    }

    /// Apply every event already waiting, without blocking.
    ///
    /// Returns the number of events applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.dispatch(event);
            applied += 1;
        }
        applied
    }

    /// Wait for the next event and apply it. Returns `false` once the
    /// transport has gone away for good.
    pub async fn next_event(&mut self) -> bool {
        match self.events.recv().await {
            Some(event) => {
                self.dispatch(event);
                true
            }
            None => false,
        }
    }

    /// Tear down every binding. Same as dropping.
    pub fn unbind(self) {}
}

impl Drop for Wiring {
    fn drop(&mut self) {
        self.bus.release_bridge();
    }
}
