//! Wire schema for stroke deltas.
//!
//! One JSON object per message, tagged by `kind`:
//! ```text
//! {"kind":"stroke-start","stroke":{"id":"s1","ownerId":"A","color":"#000","width":2},"first":[10,10]}
//! {"kind":"stroke-points","id":"s1","pts":[20,20,30,30]}
//! {"kind":"stroke-end","id":"s1"}
//! {"kind":"undo","id":"s1"}
//! {"kind":"stroke-full","stroke":{"id":"s1","ownerId":"A","color":"#000","width":2,"points":[...],"done":true}}
//! {"kind":"stroke-snapshot","id":"s1","points":[...]}
//! ```
//!
//! Every variant can be applied more than once without changing the result
//! after the first application. Kinds this build does not know decode to
//! [`StrokeMsg::Unknown`] so newer peers never break older ones.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stroke::{Stroke, StrokeHead, StrokeId};

/// Errors raised at the wire boundary.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("failed to encode stroke message: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("malformed stroke message: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("malformed {kind} message: {len} coordinates do not form x/y pairs")]
    UnpairedCoordinates { kind: &'static str, len: usize },
}

/// A stroke delta as sent between participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StrokeMsg {
    /// A new stroke and its first point.
    StrokeStart { stroke: StrokeHead, first: [f64; 2] },
    /// One or more further points, flattened.
    StrokePoints { id: StrokeId, pts: Vec<f64> },
    /// Pointer released; the stroke is finished.
    StrokeEnd { id: StrokeId },
    /// Remove a stroke entirely.
    Undo { id: StrokeId },
    /// Whole stroke, used to bring late joiners up to date.
    StrokeFull { stroke: Stroke },
    /// Complete point list for a stroke whose deltas may have been missed.
    StrokeSnapshot { id: StrokeId, points: Vec<f64> },
    /// Any `kind` this build does not understand.
    #[serde(other)]
    Unknown,
}

impl StrokeMsg {
    /// Serialize to a JSON text frame.
    pub fn encode(&self) -> Result<String, MessageError> {
        serde_json::to_string(self).map_err(MessageError::Encode)
    }

    /// Parse a JSON text frame. Shape errors, including a coordinate list
    /// of odd length, are reported here so they never reach the store.
    pub fn decode(text: &str) -> Result<Self, MessageError> {
        let msg: Self = serde_json::from_str(text).map_err(MessageError::Decode)?;
        if let Some(len) = msg.coordinate_len() {
            if len % 2 != 0 {
                return Err(MessageError::UnpairedCoordinates { kind: msg.kind(), len });
            }
        }
        Ok(msg)
    }

    /// Length of the flattened coordinate list this message carries.
    fn coordinate_len(&self) -> Option<usize> {
        match self {
            StrokeMsg::StrokePoints { pts, .. } => Some(pts.len()),
            StrokeMsg::StrokeFull { stroke } => Some(stroke.points.len()),
            StrokeMsg::StrokeSnapshot { points, .. } => Some(points.len()),
            _ => None,
        }
    }

    /// The stroke this message addresses, if any.
    pub fn stroke_id(&self) -> Option<&str> {
        match self {
            StrokeMsg::StrokeStart { stroke, .. } => Some(stroke.id.as_str()),
            StrokeMsg::StrokeFull { stroke } => Some(stroke.id.as_str()),
            StrokeMsg::StrokePoints { id, .. }
            | StrokeMsg::StrokeEnd { id }
            | StrokeMsg::Undo { id }
            | StrokeMsg::StrokeSnapshot { id, .. } => Some(id.as_str()),
            StrokeMsg::Unknown => None,
        }
    }

    /// Wire tag, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            StrokeMsg::StrokeStart { .. } => "stroke-start",
            StrokeMsg::StrokePoints { .. } => "stroke-points",
            StrokeMsg::StrokeEnd { .. } => "stroke-end",
            StrokeMsg::Undo { .. } => "undo",
            StrokeMsg::StrokeFull { .. } => "stroke-full",
            StrokeMsg::StrokeSnapshot { .. } => "stroke-snapshot",
            StrokeMsg::Unknown => "unknown",
        }
    }
}
