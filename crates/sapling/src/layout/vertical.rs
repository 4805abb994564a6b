use serde::{Deserialize, Serialize};

use super::{
    horizontal::{h_place, v_place},
    stack::{Axis, Stack},
};
use crate::{
    error::Result,
    geom::{Bounds, Pad},
    layout::{HAlign, LayoutAlgorithm, LayoutElements, SizeConstraints, VAlign},
};

/// Style for [`VerticalLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerticalLayoutStyle {
    /// Space between elements.
    pub gap: f32,
    /// Padding around the content.
    pub padding: Pad,
    /// Default placement of each element within the column width.
    pub horizontal_align: HAlign,
    /// Placement of the column when it is shorter than the available height.
    pub vertical_align: VAlign,
}

impl Default for VerticalLayoutStyle {
    fn default() -> Self {
        Self {
            gap: 5.0,
            padding: Pad::default(),
            horizontal_align: HAlign::Left,
            vertical_align: VAlign::Top,
        }
    }
}

/// Packs elements top to bottom in a single column. The mirror image of
/// [`HorizontalLayout`](super::HorizontalLayout), with `height_percent` as
/// the flexible dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerticalLayout {
    /// Style.
    pub style: VerticalLayoutStyle,
}

impl VerticalLayout {
    /// A layout with the given style.
    pub fn new(style: VerticalLayoutStyle) -> Self {
        Self { style }
    }
}

impl LayoutAlgorithm for VerticalLayout {
    fn calculate_size_constraints(
        &self,
        elements: &mut dyn LayoutElements,
        out: &mut SizeConstraints,
    ) -> Result<()> {
        let mut min_width: f32 = 0.0;
        let mut min_height = self.style.padding.vertical();
        for i in 0..elements.len() {
            let sc = elements.size_constraints(i)?;
            min_width = min_width.max(sc.width.min.unwrap_or(0.0));
            min_height += sc.height.min.unwrap_or(0.0);
            if i > 0 {
                min_height += self.style.gap;
            }
        }
        out.width.min = Some(min_width + self.style.padding.horizontal());
        out.height.min = Some(min_height);
        Ok(())
    }

    fn layout(
        &mut self,
        explicit_width: Option<f32>,
        explicit_height: Option<f32>,
        elements: &mut dyn LayoutElements,
        out: &mut Bounds,
    ) -> Result<()> {
        let stack = Stack {
            axis: Axis::Vertical,
            gap: self.style.gap,
            padding: self.style.padding,
            main: v_place(self.style.vertical_align),
            cross: h_place(self.style.horizontal_align),
        };
        stack.layout(
            explicit_width,
            explicit_height,
            elements,
            |ld| ld.horizontal_align().map(h_place),
            out,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Element, LayoutData, LayoutHints};

    #[test]
    fn stacks_top_down() -> Result<()> {
        let mut l = VerticalLayout::new(VerticalLayoutStyle {
            padding: Pad::new(2.0, 0.0, 3.0, 1.0),
            ..VerticalLayoutStyle::default()
        });
        let mut els = vec![
            Element::new(20.0, 10.0),
            Element::new(40.0, 10.0).with_data(LayoutData::new().with_hints(
                LayoutHints::Vertical {
                    horizontal_align: Some(HAlign::Right),
                },
            )),
            Element::new(10.0, 0.0).with_data(LayoutData::new().with_height_percent(1.0)),
        ];
        let mut out = Bounds::default();
        l.layout(None, Some(60.0), &mut els, &mut out)?;
        assert_eq!((els[0].x, els[0].y), (1.0, 2.0));
        assert_eq!((els[1].x, els[1].y), (1.0, 17.0));
        // 55 available, 30 spoken for by the fixed rows and gaps.
        assert!((els[2].height() - 25.0).abs() < 1e-4);
        assert_eq!(els[2].y, 32.0);
        assert_eq!(out.width, 41.0);
        assert!((out.height - 60.0).abs() < 1e-4);
        Ok(())
    }

    #[test]
    fn bottom_aligned_column() -> Result<()> {
        let mut l = VerticalLayout::new(VerticalLayoutStyle {
            gap: 0.0,
            vertical_align: VAlign::Bottom,
            horizontal_align: HAlign::Center,
            ..VerticalLayoutStyle::default()
        });
        let mut els = vec![Element::new(10.0, 10.0), Element::new(20.0, 10.0)];
        let mut out = Bounds::default();
        l.layout(None, Some(50.0), &mut els, &mut out)?;
        assert_eq!(els[0].y, 30.0);
        assert_eq!(els[1].y, 40.0);
        assert_eq!(els[0].x, 5.0);
        Ok(())
    }
}
