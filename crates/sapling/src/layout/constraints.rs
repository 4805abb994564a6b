use serde::{Deserialize, Serialize};

/// An optional minimum and maximum for one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MinMax {
    /// Lower bound, if any.
    pub min: Option<f32>,
    /// Upper bound, if any.
    pub max: Option<f32>,
}

impl MinMax {
    /// Construct a range.
    pub const fn new(min: Option<f32>, max: Option<f32>) -> Self {
        Self { min, max }
    }

    /// Clamp a value into the range. `None` passes through unchanged. When
    /// the bounds cross, the minimum wins.
    pub fn clamp(&self, value: Option<f32>) -> Option<f32> {
        let mut v = value?;
        if let Some(max) = self.max {
            v = v.min(max);
        }
        if let Some(min) = self.min {
            v = v.max(min);
        }
        Some(v)
    }

    /// Clamp a definite value into the range.
    pub fn clamp_f32(&self, value: f32) -> f32 {
        self.clamp(Some(value)).unwrap_or(value)
    }

    /// Narrow this range by `other`: the larger minimum and the smaller
    /// maximum win.
    pub fn bound(&mut self, other: Self) {
        self.min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
    }

    /// Reset both bounds.
    pub fn clear(&mut self) {
        self.min = None;
        self.max = None;
    }
}

/// Minimum and maximum dimensions of a component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeConstraints {
    /// Horizontal range.
    pub width: MinMax,
    /// Vertical range.
    pub height: MinMax,
}

impl SizeConstraints {
    /// Reset both axes.
    pub fn clear(&mut self) {
        self.width.clear();
        self.height.clear();
    }

    /// Narrow both axes by `other`.
    pub fn bound(&mut self, other: Self) {
        self.width.bound(other.width);
        self.height.bound(other.height);
    }
}
