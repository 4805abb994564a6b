/// Measurements of one line produced by a flow layout.
///
/// `start..end` is the half-open range of element (or text part) indices on
/// the line.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LineInfo {
    /// Index of the first element.
    pub start: usize,
    /// One past the last element.
    pub end: usize,
    /// Horizontal offset of the line.
    pub x: f32,
    /// Top of the line.
    pub y: f32,
    /// Width including overhanging elements.
    pub width: f32,
    /// Width excluding trailing overhang. Used for alignment.
    pub contents_width: f32,
    /// Distance from the top of the line to its baseline.
    pub baseline: f32,
    /// Largest distance any element extends below the baseline.
    pub below_baseline: f32,
}

impl LineInfo {
    /// An empty line starting at `start`.
    pub fn at(start: usize) -> Self {
        Self {
            start,
            end: start,
            ..Self::default()
        }
    }

    /// Total height.
    pub fn height(&self) -> f32 {
        self.baseline + self.below_baseline
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True if the line holds nothing.
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}
