//! Brush settings for new strokes: color, width range and the preset palette.

use serde::{Deserialize, Serialize};

/// Toolbar palette.
pub const PRESET_COLORS: [&str; 7] = [
    "#1e40af", "#ef4444", "#22c55e", "#eab308", "#0ea5e9", "#000000", "#ffffff",
];

pub const MIN_WIDTH: f64 = 1.0;
pub const MAX_WIDTH: f64 = 20.0;

/// Visual attributes applied to the next stroke the local participant starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    pub color: String,
    pub width: f64,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            width: 2.0,
        }
    }
}

impl Brush {
    pub fn new(color: impl Into<String>, width: f64) -> Self {
        Self {
            color: color.into(),
            width: clamp_width(width),
        }
    }
}

/// Clamp to the slider range. NaN falls back to the minimum.
pub fn clamp_width(width: f64) -> f64 {
    if width.is_nan() {
        return MIN_WIDTH;
    }
    width.clamp(MIN_WIDTH, MAX_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_brush() {
        let brush = Brush::default();
        assert_eq!(brush.color, "#000000");
        assert_eq!(brush.width, 2.0);
        assert!(PRESET_COLORS.contains(&brush.color.as_str()));
    }

    #[test]
    fn test_width_clamped() {
        assert_eq!(Brush::new("#ef4444", 0.0).width, MIN_WIDTH);
        assert_eq!(Brush::new("#ef4444", 64.0).width, MAX_WIDTH);
        assert_eq!(Brush::new("#ef4444", 7.0).width, 7.0);
        assert_eq!(clamp_width(f64::NAN), MIN_WIDTH);
    }
}
