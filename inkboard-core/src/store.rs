//! Stroke store: strokes, per-owner undo history, and the two write paths.
//!
//! ```text
//! pointer input ──► start_stroke / add_point / end_stroke / undo_last ─┐
//!                                                                      ├──► StrokeStore
//! inbound deltas ─► merge_stroke ──────────────────────────────────────┘
//! ```
//!
//! Both paths key everything on the stroke id, never on arrival order, so
//! interleaved deltas from different owners cannot corrupt each other.
//! References to unknown ids are treated as stale and dropped. Ids removed
//! by undo are remembered so a duplicate or replayed creation cannot bring
//! them back.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::brush::{clamp_width, Brush};
use crate::identity::generate_owner_id;
use crate::message::StrokeMsg;
use crate::stroke::{OwnerId, Stroke, StrokeHead, StrokeId};

/// Handle shared by the drawing session and the wiring layer on one thread.
pub type SharedStore = Rc<RefCell<StrokeStore>>;

/// In-memory board state.
#[derive(Debug, Clone)]
pub struct StrokeStore {
    /// Strokes in draw order.
    strokes: IndexMap<StrokeId, Stroke>,
    /// owner → stroke ids, oldest first.
    history: HashMap<OwnerId, Vec<StrokeId>>,
    /// Ids removed by undo; never recreated.
    undone: HashSet<StrokeId>,
    current_id: Option<StrokeId>,
    owner_id: OwnerId,
    is_drawing: bool,
    brush: Brush,
    connected: bool,
}

impl StrokeStore {
    pub fn new(owner_id: impl Into<OwnerId>) -> Self {
        Self {
            strokes: IndexMap::new(),
            history: HashMap::new(),
            undone: HashSet::new(),
            current_id: None,
            owner_id: owner_id.into(),
            is_drawing: false,
            brush: Brush::default(),
            connected: false,
        }
    }

    /// Store owned by a freshly generated identity.
    pub fn with_random_owner() -> Self {
        Self::new(generate_owner_id())
    }

    /// Wrap for sharing between the local and remote write paths.
    pub fn into_shared(self) -> SharedStore {
        Rc::new(RefCell::new(self))
    }

    // ── Local authoring ─────────────────────────────────────────

    /// Begin a stroke owned by the local participant (pointer-down).
    ///
    /// Returns `false` and leaves the state untouched if `id` is already in
    /// use; the first stroke to claim an id keeps it.
    pub fn start_stroke(&mut self, id: impl Into<StrokeId>, x: f64, y: f64, color: impl Into<String>, width: f64) -> bool {
        let id = id.into();
        if self.strokes.contains_key(&id) || self.undone.contains(&id) {
            log::warn!("Refusing local stroke {id}: id already in use");
            return false;
        }

        let head = StrokeHead {
            id: id.clone(),
            owner_id: self.owner_id.clone(),
            color: color.into(),
            width,
        };
        self.strokes.insert(id.clone(), Stroke::begin(head, x, y));
        self.history
            .entry(self.owner_id.clone())
            .or_default()
            .push(id.clone());
        self.current_id = Some(id);
        self.is_drawing = true;
        true
    }

    /// Append a point to the active stroke (pointer-move). No-op when idle.
    pub fn add_point(&mut self, x: f64, y: f64) {
        if !self.is_drawing {
            return;
        }
        let Some(id) = self.current_id.as_ref() else {
            return;
        };
        if let Some(stroke) = self.strokes.get_mut(id) {
            stroke.append(&[x, y]);
        }
    }

    /// Finish the active stroke (pointer-up). No-op when idle.
    pub fn end_stroke(&mut self) {
        let Some(id) = self.current_id.take() else {
            return;
        };
        if let Some(stroke) = self.strokes.get_mut(&id) {
            stroke.done = true;
        }
        self.is_drawing = false;
    }

    /// Pop `owner`'s most recent stroke (the local owner when `None`) and
    /// remove it. No-op when that owner has no history.
    pub fn undo_last(&mut self, owner: Option<&str>) {
        let owner = owner.unwrap_or(&self.owner_id).to_string();
        let Some(id) = self.history.get_mut(&owner).and_then(Vec::pop) else {
            return;
        };
        self.remove_stroke(&id);
    }

    /// Most recent not-undone stroke of `owner` (local owner when `None`),
    /// without changing anything. Used to address an outbound `undo`.
    pub fn last_stroke_id(&self, owner: Option<&str>) -> Option<&StrokeId> {
        let owner = owner.unwrap_or(&self.owner_id);
        self.history.get(owner).and_then(|stack| stack.last())
    }

    // ── Remote merge ────────────────────────────────────────────

    /// Fold a delta from another participant into the board.
    ///
    /// Never fails: unknown ids, finished strokes and unknown kinds drop the
    /// update. Returns `true` if the visible state changed.
    pub fn merge_stroke(&mut self, msg: &StrokeMsg) -> bool {
        match msg {
            StrokeMsg::StrokeStart { stroke, first } => {
                if self.undone.contains(&stroke.id) {
                    log::debug!("Dropping stroke-start for undone stroke {}", stroke.id);
                    return false;
                }
                if self.strokes.contains_key(&stroke.id) {
                    log::warn!("Ignoring stroke-start for {}: id already in use", stroke.id);
                    return false;
                }
                let owner = stroke.owner_id.clone();
                let id = stroke.id.clone();
                self.strokes
                    .insert(id.clone(), Stroke::begin(stroke.clone(), first[0], first[1]));
                self.history.entry(owner).or_default().push(id);
                true
            }

            StrokeMsg::StrokePoints { id, pts } => match self.strokes.get_mut(id) {
                Some(stroke) => stroke.append(pts),
                None => {
                    log::debug!("Dropping {} points for unknown stroke {id}", pts.len() / 2);
                    false
                }
            },

            StrokeMsg::StrokeEnd { id } => match self.strokes.get_mut(id) {
                Some(stroke) if !stroke.done => {
                    stroke.done = true;
                    true
                }
                Some(_) => false,
                None => {
                    log::debug!("Dropping stroke-end for unknown stroke {id}");
                    false
                }
            },

            StrokeMsg::Undo { id } => {
                let Some(owner) = self.strokes.get(id).map(|s| s.owner_id.clone()) else {
                    log::debug!("Dropping undo for unknown stroke {id}");
                    return false;
                };
                // Filter by id rather than pop: with reordering the target is
                // not necessarily the top of the owner's stack.
                if let Some(stack) = self.history.get_mut(&owner) {
                    stack.retain(|s| s != id);
                }
                self.remove_stroke(id)
            }

            StrokeMsg::StrokeFull { stroke } => match self.strokes.get_mut(&stroke.id) {
                Some(existing) => {
                    if existing.owner_id != stroke.owner_id {
                        log::warn!("Ignoring stroke-full for {}: owned by another participant", stroke.id);
                        return false;
                    }
                    if existing.done {
                        return false;
                    }
                    let mut changed = existing.resync(&stroke.points);
                    if stroke.done {
                        existing.done = true;
                        changed = true;
                    }
                    changed
                }
                None if self.undone.contains(&stroke.id) => {
                    log::debug!("Dropping stroke-full for undone stroke {}", stroke.id);
                    false
                }
                None => {
                    self.strokes.insert(stroke.id.clone(), stroke.clone());
                    self.history
                        .entry(stroke.owner_id.clone())
                        .or_default()
                        .push(stroke.id.clone());
                    true
                }
            },

            StrokeMsg::StrokeSnapshot { id, points } => match self.strokes.get_mut(id) {
                Some(stroke) if !stroke.done => stroke.resync(points),
                Some(_) => false,
                None => {
                    log::debug!("Dropping snapshot for unknown stroke {id}");
                    false
                }
            },

            StrokeMsg::Unknown => false,
        }
    }

    fn remove_stroke(&mut self, id: &str) -> bool {
        if self.current_id.as_deref() == Some(id) {
            self.current_id = None;
            self.is_drawing = false;
        }
        let removed = self.strokes.shift_remove(id).is_some();
        if removed {
            self.undone.insert(id.to_string());
        }
        removed
    }

    // ── UI state ────────────────────────────────────────────────

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.brush.color = color.into();
    }

    pub fn set_width(&mut self, width: f64) {
        self.brush.width = clamp_width(width);
    }

    /// Switch identity; `None` generates a fresh one. Existing strokes keep
    /// their owners.
    pub fn set_owner_id(&mut self, id: Option<OwnerId>) -> &OwnerId {
        self.owner_id = id.unwrap_or_else(generate_owner_id);
        &self.owner_id
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    // ── Readers ─────────────────────────────────────────────────

    /// Strokes in draw order.
    pub fn strokes(&self) -> impl Iterator<Item = &Stroke> {
        self.strokes.values()
    }

    pub fn stroke(&self, id: &str) -> Option<&Stroke> {
        self.strokes.get(id)
    }

    /// Undo stack for `owner`, oldest first.
    pub fn history(&self, owner: &str) -> &[StrokeId] {
        self.history.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn current_id(&self) -> Option<&StrokeId> {
        self.current_id.as_ref()
    }

    pub fn is_drawing(&self) -> bool {
        self.is_drawing
    }

    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// The whole board as `stroke-full` messages, in draw order.
    pub fn snapshot_messages(&self) -> Vec<StrokeMsg> {
        self.strokes
            .values()
            .map(|stroke| StrokeMsg::StrokeFull { stroke: stroke.clone() })
            .collect()
    }
}
