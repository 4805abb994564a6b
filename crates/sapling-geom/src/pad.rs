use serde::{Deserialize, Serialize};

/// Padding on the four sides of a box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pad {
    /// Top padding.
    pub top: f32,
    /// Right padding.
    pub right: f32,
    /// Bottom padding.
    pub bottom: f32,
    /// Left padding.
    pub left: f32,
}

impl Pad {
    /// Construct padding from explicit sides.
    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// The same padding on every side.
    pub const fn uniform(all: f32) -> Self {
        Self::new(all, all, all, all)
    }

    /// Left plus right.
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    /// Top plus bottom.
    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    /// Remove the horizontal padding from an optional width.
    pub fn reduce_width(&self, width: Option<f32>) -> Option<f32> {
        width.map(|w| w - self.horizontal())
    }

    /// Remove the vertical padding from an optional height.
    pub fn reduce_height(&self, height: Option<f32>) -> Option<f32> {
        height.map(|h| h - self.vertical())
    }

    /// Add the horizontal padding to a width.
    pub fn expand_width(&self, width: f32) -> f32 {
        width + self.horizontal()
    }

    /// Add the vertical padding to a height.
    pub fn expand_height(&self, height: f32) -> f32 {
        height + self.vertical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce() {
        let p = Pad::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(p.reduce_width(Some(100.0)), Some(94.0));
        assert_eq!(p.reduce_height(Some(100.0)), Some(96.0));
        assert_eq!(p.reduce_width(None), None);
        assert_eq!(p.expand_height(10.0), 14.0);
    }
}
