use serde::{Deserialize, Serialize};

use super::Rect;

/// `Bounds` is a measured width and height with no location. Layout passes
/// write their measured size into a `Bounds`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    /// Measured width.
    pub width: f32,
    /// Measured height.
    pub height: f32,
}

impl Bounds {
    /// Construct a bounds value.
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Set both dimensions.
    pub fn set(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Reset to zero.
    pub fn clear(&mut self) {
        self.set(0.0, 0.0);
    }

    /// True if either dimension is NaN.
    pub fn is_nan(&self) -> bool {
        self.width.is_nan() || self.height.is_nan()
    }

    /// Grow each dimension to at least the given explicit size.
    pub fn expand_to(&mut self, width: Option<f32>, height: Option<f32>) {
        if let Some(w) = width
            && w > self.width
        {
            self.width = w;
        }
        if let Some(h) = height
            && h > self.height
        {
            self.height = h;
        }
    }

    /// A rect at the origin with these dimensions.
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

impl From<(f32, f32)> for Bounds {
    fn from(v: (f32, f32)) -> Self {
        Self::new(v.0, v.1)
    }
}
