use serde::{Deserialize, Serialize};

/// Horizontal alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    /// Align to the left edge.
    #[default]
    Left,
    /// Center horizontally.
    Center,
    /// Align to the right edge.
    Right,
}

/// Vertical alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    /// Align to the top edge.
    #[default]
    Top,
    /// Center vertically.
    Middle,
    /// Align to the bottom edge.
    Bottom,
}

/// Horizontal alignment of a flow line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowHAlign {
    /// Lines start at the left padding.
    #[default]
    Left,
    /// Lines are centered.
    Center,
    /// Lines end at the right padding.
    Right,
    /// Lines span the available width; the extra space widens the gaps.
    Justify,
}

/// Vertical alignment of an element within its flow line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowVAlign {
    /// Top of the line.
    #[default]
    Top,
    /// Middle of the line.
    Middle,
    /// Bottom of the line.
    Bottom,
    /// Element baselines line up with the line's baseline.
    Baseline,
}

/// Per-element hints for the flow layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowHints {
    /// Break the line after this element.
    pub clears_line: bool,
    /// Break the line before this element.
    pub starts_new_line: bool,
    /// The element may hang past the right edge and does not count toward
    /// the line's content width.
    pub overhangs: bool,
    /// A line may break after this element when a later element overflows.
    pub breaking: bool,
    /// Overrides the layout's vertical alignment.
    pub vertical_align: Option<FlowVAlign>,
    /// Distance from the element's top to its baseline. Defaults to the height.
    pub baseline: Option<f32>,
}

/// Per-element hints for the grid layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridHints {
    /// Columns spanned, at least 1.
    pub col_span: usize,
    /// Rows spanned, at least 1.
    pub row_span: usize,
    /// Overrides the column's horizontal alignment.
    pub horizontal_align: Option<HAlign>,
    /// Overrides the layout's vertical alignment.
    pub vertical_align: Option<VAlign>,
}

impl Default for GridHints {
    fn default() -> Self {
        Self {
            col_span: 1,
            row_span: 1,
            horizontal_align: None,
            vertical_align: None,
        }
    }
}

/// Algorithm-specific hints carried by a [`LayoutData`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutHints {
    /// No algorithm-specific hints.
    #[default]
    None,
    /// Horizontal layout: cross-axis alignment override.
    Horizontal {
        /// Overrides the layout's vertical alignment.
        vertical_align: Option<VAlign>,
    },
    /// Vertical layout: cross-axis alignment override.
    Vertical {
        /// Overrides the layout's horizontal alignment.
        horizontal_align: Option<HAlign>,
    },
    /// Flow layout hints.
    Flow(FlowHints),
    /// Grid layout hints.
    Grid(GridHints),
}

/// Sizing and placement hints attached to an element by its container.
///
/// The basic fields request an explicit size, or a size as a fraction of the
/// space the layout makes available. A percent wins over the fixed size
/// whenever the available size is known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutData {
    /// Requested width.
    pub width: Option<f32>,
    /// Requested height.
    pub height: Option<f32>,
    /// Requested width as a fraction of the available width.
    pub width_percent: Option<f32>,
    /// Requested height as a fraction of the available height.
    pub height_percent: Option<f32>,
    /// Algorithm-specific hints.
    pub hints: LayoutHints,
}

impl LayoutData {
    /// Empty layout data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout data carrying flow hints.
    pub fn flow(hints: FlowHints) -> Self {
        Self {
            hints: LayoutHints::Flow(hints),
            ..Self::default()
        }
    }

    /// Layout data carrying grid hints.
    pub fn grid(hints: GridHints) -> Self {
        Self {
            hints: LayoutHints::Grid(hints),
            ..Self::default()
        }
    }

    /// Set the requested width.
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    /// Set the requested height.
    pub fn with_height(mut self, height: f32) -> Self {
        self.height = Some(height);
        self
    }

    /// Set the requested width percent.
    pub fn with_width_percent(mut self, percent: f32) -> Self {
        self.width_percent = Some(percent);
        self
    }

    /// Set the requested height percent.
    pub fn with_height_percent(mut self, percent: f32) -> Self {
        self.height_percent = Some(percent);
        self
    }

    /// Replace the hints.
    pub fn with_hints(mut self, hints: LayoutHints) -> Self {
        self.hints = hints;
        self
    }

    /// The width to request given the available width.
    pub fn preferred_width(&self, available: Option<f32>) -> Option<f32> {
        match (self.width_percent, available) {
            (Some(p), Some(a)) => Some(p * a),
            _ => self.width,
        }
    }

    /// The height to request given the available height.
    pub fn preferred_height(&self, available: Option<f32>) -> Option<f32> {
        match (self.height_percent, available) {
            (Some(p), Some(a)) => Some(p * a),
            _ => self.height,
        }
    }

    /// Flow hints, or the defaults.
    pub fn flow_hints(&self) -> FlowHints {
        match self.hints {
            LayoutHints::Flow(h) => h,
            _ => FlowHints::default(),
        }
    }

    /// Grid hints, or the defaults.
    pub fn grid_hints(&self) -> GridHints {
        match self.hints {
            LayoutHints::Grid(h) => h,
            _ => GridHints::default(),
        }
    }

    /// Vertical alignment override for horizontal layouts.
    pub fn vertical_align(&self) -> Option<VAlign> {
        match self.hints {
            LayoutHints::Horizontal { vertical_align } => vertical_align,
            _ => None,
        }
    }

    /// Horizontal alignment override for vertical layouts.
    pub fn horizontal_align(&self) -> Option<HAlign> {
        match self.hints {
            LayoutHints::Vertical { horizontal_align } => horizontal_align,
            _ => None,
        }
    }
}
