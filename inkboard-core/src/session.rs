//! Pointer-driven drawing on the local board.
//!
//! Each gesture is applied to the store first and then published on the
//! outbound topic, so local strokes show up immediately whatever the state of
//! the link.

use std::rc::Rc;

use uuid::Uuid;

use crate::bus::{BoardBus, Topic};
use crate::message::StrokeMsg;
use crate::store::SharedStore;
use crate::stroke::{StrokeHead, StrokeId};

pub struct DrawingSession {
    store: SharedStore,
    bus: Rc<BoardBus>,
}

impl DrawingSession {
    pub fn new(store: SharedStore, bus: Rc<BoardBus>) -> Self {
        Self { store, bus }
    }

    /// Start a stroke at `(x, y)` with the current brush. Returns its id.
    pub fn pointer_down(&self, x: f64, y: f64) -> Option<StrokeId> {
        // A stroke left open by a missed pointer-up is finished first.
        self.pointer_up();

        let id = Uuid::new_v4().to_string();
        let msg = {
            let mut store = self.store.borrow_mut();
            let brush = store.brush().clone();
            if !store.start_stroke(id.clone(), x, y, brush.color.clone(), brush.width) {
                return None;
            }
            StrokeMsg::StrokeStart {
                stroke: StrokeHead {
                    id: id.clone(),
                    owner_id: store.owner_id().clone(),
                    color: brush.color,
                    width: brush.width,
                },
                first: [x, y],
            }
        };
        self.bus.publish(Topic::Outbound, &msg);
        Some(id)
    }

    /// Extend the active stroke. Ignored when not drawing.
    pub fn pointer_move(&self, x: f64, y: f64) {
        let id = {
            let mut store = self.store.borrow_mut();
            if !store.is_drawing() {
                return;
            }
            let Some(id) = store.current_id().cloned() else {
                return;
            };
            store.add_point(x, y);
            id
        };
        self.bus
            .publish(Topic::Outbound, &StrokeMsg::StrokePoints { id, pts: vec![x, y] });
    }

    /// Finish the active stroke. Ignored when nothing is active.
    pub fn pointer_up(&self) {
        let id = {
            let mut store = self.store.borrow_mut();
            let Some(id) = store.current_id().cloned() else {
                return;
            };
            store.end_stroke();
            id
        };
        self.bus.publish(Topic::Outbound, &StrokeMsg::StrokeEnd { id });
    }

    /// Undo the local participant's most recent stroke and tell the others.
    pub fn undo(&self) -> Option<StrokeId> {
        let id = {
            let mut store = self.store.borrow_mut();
            let id = store.last_stroke_id(None).cloned()?;
            store.undo_last(None);
            id
        };
        self.bus.publish(Topic::Outbound, &StrokeMsg::Undo { id: id.clone() });
        Some(id)
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }
}
