//! Typed publish/subscribe between the store, the transport and any
//! diagnostic listeners.
//!
//! Two closed topics: [`Topic::Outbound`] carries deltas authored locally and
//! waiting for the transport; [`Topic::Inbound`] carries deltas received from
//! the network and waiting for the store. Delivery is synchronous, on the
//! publishing thread, in registration order. Nothing is buffered for late
//! subscribers.
//!
//! Subscriptions follow the disposer pattern: keep the [`Subscription`] to
//! keep receiving, drop it to unsubscribe.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::message::StrokeMsg;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Network → store.
    Inbound,
    /// Store → network.
    Outbound,
}

type Handler<T> = Rc<dyn Fn(&T)>;

/// Single-threaded event bus. Wrap in `Rc` to subscribe.
pub struct EventBus<T> {
    inbound: RefCell<Vec<(usize, Handler<T>)>>,
    outbound: RefCell<Vec<(usize, Handler<T>)>>,
    next_id: Cell<usize>,
    bridged: Cell<bool>,
}

/// The bus used by a drawing board.
pub type BoardBus = EventBus<StrokeMsg>;

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self {
            inbound: RefCell::new(Vec::new()),
            outbound: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            bridged: Cell::new(false),
        }
    }
}

impl<T: 'static> EventBus<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn handlers(&self, topic: Topic) -> &RefCell<Vec<(usize, Handler<T>)>> {
        match topic {
            Topic::Inbound => &self.inbound,
            Topic::Outbound => &self.outbound,
        }
    }

    /// Register `handler` on `topic`. Returns a handle that unsubscribes on drop.
    pub fn subscribe(self: &Rc<Self>, topic: Topic, handler: impl Fn(&T) + 'static) -> Subscription<T> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.handlers(topic).borrow_mut().push((id, Rc::new(handler)));
        Subscription {
            bus: Rc::downgrade(self),
            topic,
            id,
        }
    }

    fn unsubscribe(&self, topic: Topic, id: usize) {
        self.handlers(topic).borrow_mut().retain(|(i, _)| *i != id);
    }

    /// Deliver `event` to every current subscriber of `topic`.
    ///
    /// Returns the number of handlers invoked.
    pub fn publish(&self, topic: Topic, event: &T) -> usize {
        // Snapshot so handlers may subscribe or unsubscribe while we dispatch.
        let handlers: Vec<Handler<T>> = self
            .handlers(topic)
            .borrow()
            .iter()
            .map(|(_, h)| Rc::clone(h))
            .collect();

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.handlers(topic).borrow().len()
    }

    /// Reserve the bus for a transport bridge. Returns `false` if one is
    /// already attached.
    pub fn claim_bridge(&self) -> bool {
        !self.bridged.replace(true)
    }

    pub fn release_bridge(&self) {
        self.bridged.set(false);
    }

    pub fn is_bridged(&self) -> bool {
        self.bridged.get()
    }
}

/// Live registration on an [`EventBus`].
pub struct Subscription<T: 'static> {
    bus: Weak<EventBus<T>>,
    topic: Topic,
    id: usize,
}

impl<T: 'static> Subscription<T> {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Explicit form of dropping the handle.
    pub fn unsubscribe(self) {}
}

impl<T: 'static> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.topic, self.id);
        }
    }
}
