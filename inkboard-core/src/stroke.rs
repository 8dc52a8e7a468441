//! Stroke data model shared by the store, the wire schema and renderers.

use serde::{Deserialize, Serialize};

/// Globally unique stroke identifier, chosen by the authoring client.
pub type StrokeId = String;

/// Per-session participant identifier.
pub type OwnerId = String;

/// Addressing and visual attributes of a stroke, fixed at creation.
///
/// This is the `stroke` object carried by `stroke-start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeHead {
    pub id: StrokeId,
    pub owner_id: OwnerId,
    pub color: String,
    pub width: f64,
}

/// One continuous pen gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub id: StrokeId,
    pub owner_id: OwnerId,
    pub color: String,
    pub width: f64,
    /// Flattened coordinates: `[x0, y0, x1, y1, ...]`.
    pub points: Vec<f64>,
    /// False while the stroke is still being drawn.
    #[serde(default)]
    pub done: bool,
}

impl Stroke {
    /// Create an active stroke whose first point is `(x, y)`.
    pub fn begin(head: StrokeHead, x: f64, y: f64) -> Self {
        Self {
            id: head.id,
            owner_id: head.owner_id,
            color: head.color,
            width: head.width,
            points: vec![x, y],
            done: false,
        }
    }

    /// The immutable part of this stroke.
    pub fn head(&self) -> StrokeHead {
        StrokeHead {
            id: self.id.clone(),
            owner_id: self.owner_id.clone(),
            color: self.color.clone(),
            width: self.width,
        }
    }

    /// Append flattened points. Ignored once the stroke is finished.
    ///
    /// Returns `true` if anything was appended.
    pub fn append(&mut self, pts: &[f64]) -> bool {
        if self.done || pts.is_empty() {
            return false;
        }
        self.points.extend_from_slice(pts);
        true
    }

    /// Replace the point list with a complete copy, never shrinking it.
    ///
    /// Returns `true` if the points changed.
    pub fn resync(&mut self, points: &[f64]) -> bool {
        if points.len() < self.points.len() || points == self.points.as_slice() {
            return false;
        }
        self.points = points.to_vec();
        true
    }

    /// Number of `(x, y)` pairs.
    pub fn point_count(&self) -> usize {
        self.points.len() / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head() -> StrokeHead {
        StrokeHead {
            id: "s1".into(),
            owner_id: "A".into(),
            color: "#000000".into(),
            width: 2.0,
        }
    }

    #[test]
    fn test_begin_has_first_point() {
        let stroke = Stroke::begin(head(), 10.0, 10.0);
        assert_eq!(stroke.points, vec![10.0, 10.0]);
        assert!(!stroke.done);
        assert_eq!(stroke.point_count(), 1);
        assert_eq!(stroke.head(), head());
    }

    #[test]
    fn test_append_after_done_ignored() {
        let mut stroke = Stroke::begin(head(), 0.0, 0.0);
        assert!(stroke.append(&[1.0, 1.0]));
        stroke.done = true;
        assert!(!stroke.append(&[2.0, 2.0]));
        assert_eq!(stroke.points, vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_resync_never_shrinks() {
        let mut stroke = Stroke::begin(head(), 0.0, 0.0);
        stroke.append(&[1.0, 1.0, 2.0, 2.0]);

        assert!(!stroke.resync(&[0.0, 0.0]));
        assert_eq!(stroke.point_count(), 3);

        assert!(stroke.resync(&[0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0]));
        assert_eq!(stroke.point_count(), 4);
    }

    #[test]
    fn test_camel_case_wire_fields() {
        let json = serde_json::to_value(head()).unwrap();
        assert_eq!(json["ownerId"], "A");
        assert!(json.get("owner_id").is_none());
    }
}
