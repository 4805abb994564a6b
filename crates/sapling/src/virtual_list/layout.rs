use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    geom::{Bounds, Pad},
    layout::{HAlign, LayoutElements},
};

/// Places list renderers one at a time, relative to the renderer placed
/// before it.
///
/// A virtual list anchors its first renderer at a fractional index
/// position and walks outwards, so the algorithm never sees more than the
/// renderers that fit in the viewport.
pub trait VirtualLayoutAlgorithm {
    /// Size and place `element`.
    ///
    /// With no `previous` element the position is derived from the
    /// renderer's display index relative to `start_position`: forward
    /// layouts anchor to the leading edge, reversed layouts to the
    /// trailing edge. Otherwise the element is placed directly after
    /// `previous`, or directly before it when `reversed`.
    #[allow(clippy::too_many_arguments)]
    fn update_layout_entry(
        &self,
        explicit_width: Option<f32>,
        explicit_height: Option<f32>,
        elements: &mut dyn LayoutElements,
        element: usize,
        previous: Option<usize>,
        display_index: isize,
        start_position: f32,
        reversed: bool,
    ) -> Result<()>;

    /// True while `element` overlaps the viewport extended by `buffer`, a
    /// fraction of the viewport size. Always true without an explicit size
    /// on the scrolling axis.
    fn should_show_renderer(
        &self,
        explicit_width: Option<f32>,
        explicit_height: Option<f32>,
        elements: &mut dyn LayoutElements,
        element: usize,
        buffer: f32,
    ) -> Result<bool>;

    /// Measure the laid out renderers.
    fn measure(
        &self,
        explicit_width: Option<f32>,
        explicit_height: Option<f32>,
        elements: &mut dyn LayoutElements,
        out: &mut Bounds,
    ) -> Result<()>;

    /// How far `element` sits from the leading edge (or, when `reversed`,
    /// the trailing edge), in units of the element's extent. Zero when it
    /// is flush with the edge, negative when it has scrolled past it.
    fn get_offset(
        &self,
        explicit_width: Option<f32>,
        explicit_height: Option<f32>,
        elements: &mut dyn LayoutElements,
        element: usize,
        reversed: bool,
    ) -> Result<f32>;
}

/// Style for [`VirtualVerticalLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualVerticalLayoutStyle {
    /// Space between rows.
    pub gap: f32,
    /// Padding around the rows.
    pub padding: Pad,
    /// Placement of rows narrower than the list.
    pub horizontal_align: HAlign,
}

impl Default for VirtualVerticalLayoutStyle {
    fn default() -> Self {
        Self {
            gap: 0.0,
            padding: Pad::default(),
            horizontal_align: HAlign::Left,
        }
    }
}

/// Stacks renderers top to bottom. Rows fill the available width unless
/// their layout data asks for a width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VirtualVerticalLayout {
    /// Style.
    pub style: VirtualVerticalLayoutStyle,
}

impl VirtualVerticalLayout {
    /// A layout with the given style.
    pub fn new(style: VirtualVerticalLayoutStyle) -> Self {
        Self { style }
    }

    /// Bottom edge rows are anchored to in a reversed layout.
    fn bottom_edge(&self, explicit_height: Option<f32>) -> f32 {
        explicit_height.unwrap_or(0.0) - self.style.padding.bottom
    }
}

impl VirtualLayoutAlgorithm for VirtualVerticalLayout {
    fn update_layout_entry(
        &self,
        explicit_width: Option<f32>,
        explicit_height: Option<f32>,
        elements: &mut dyn LayoutElements,
        element: usize,
        previous: Option<usize>,
        display_index: isize,
        start_position: f32,
        reversed: bool,
    ) -> Result<()> {
        let pad = self.style.padding;
        let gap = self.style.gap;
        let available = pad.reduce_width(explicit_width);
        let ld = elements.layout_data(element)?;
        let width = match ld.and_then(|d| d.preferred_width(available)) {
            Some(w) => Some(w),
            None => available,
        };
        elements.set_size(element, width, ld.and_then(|d| d.preferred_height(None)))?;
        let (w, h) = (elements.width(element)?, elements.height(element)?);

        let y = match previous {
            Some(p) if reversed => elements.y(p)? - gap - h,
            Some(p) => elements.y(p)? + elements.height(p)? + gap,
            None => {
                let shift = (display_index as f32 - start_position) * (h + gap);
                if reversed {
                    self.bottom_edge(explicit_height) - h + shift
                } else {
                    pad.top + shift
                }
            }
        };
        let align = ld
            .and_then(|d| d.horizontal_align())
            .unwrap_or(self.style.horizontal_align);
        let x = pad.left
            + available.map_or(0.0, |av| match align {
                HAlign::Left => 0.0,
                HAlign::Center => ((av - w) * 0.5).round(),
                HAlign::Right => av - w,
            });
        elements.move_to(element, x, y)
    }

    fn should_show_renderer(
        &self,
        _explicit_width: Option<f32>,
        explicit_height: Option<f32>,
        elements: &mut dyn LayoutElements,
        element: usize,
        buffer: f32,
    ) -> Result<bool> {
        let Some(height) = explicit_height else {
            return Ok(true);
        };
        let pad = self.style.padding;
        let extra = height * buffer;
        let y = elements.y(element)?;
        let bottom = y + elements.height(element)?;
        Ok(bottom > pad.top - extra && y < height - pad.bottom + extra)
    }

    fn measure(
        &self,
        _explicit_width: Option<f32>,
        _explicit_height: Option<f32>,
        elements: &mut dyn LayoutElements,
        out: &mut Bounds,
    ) -> Result<()> {
        let pad = self.style.padding;
        let mut width: f32 = 0.0;
        let mut height: f32 = 0.0;
        for i in 0..elements.len() {
            width = width.max(elements.width(i)?);
            height += elements.height(i)?;
            if i > 0 {
                height += self.style.gap;
            }
        }
        out.set(width + pad.horizontal(), height + pad.vertical());
        Ok(())
    }

    fn get_offset(
        &self,
        _explicit_width: Option<f32>,
        explicit_height: Option<f32>,
        elements: &mut dyn LayoutElements,
        element: usize,
        reversed: bool,
    ) -> Result<f32> {
        let y = elements.y(element)?;
        let h = elements.height(element)?;
        let extent = h + self.style.gap;
        if extent <= 0.0 {
            return Ok(0.0);
        }
        let distance = if reversed {
            self.bottom_edge(explicit_height) - (y + h)
        } else {
            y - self.style.padding.top
        };
        Ok(distance / extent)
    }
}
