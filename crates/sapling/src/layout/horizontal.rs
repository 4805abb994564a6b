use serde::{Deserialize, Serialize};

use super::stack::{Axis, Place, Stack};
use crate::{
    error::Result,
    geom::{Bounds, Pad},
    layout::{HAlign, LayoutAlgorithm, LayoutElements, SizeConstraints, VAlign},
};

/// Style for [`HorizontalLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizontalLayoutStyle {
    /// Space between elements.
    pub gap: f32,
    /// Padding around the content.
    pub padding: Pad,
    /// Placement of the row when it is narrower than the available width.
    pub horizontal_align: HAlign,
    /// Default placement of each element within the row height.
    pub vertical_align: VAlign,
}

impl Default for HorizontalLayoutStyle {
    fn default() -> Self {
        Self {
            gap: 5.0,
            padding: Pad::default(),
            horizontal_align: HAlign::Left,
            vertical_align: VAlign::Bottom,
        }
    }
}

/// Packs elements left to right in a single row.
///
/// Elements with a `width_percent` are flexible: when the available width
/// is known they share what the fixed-width elements leave over, scaled
/// down together if their percents ask for more than that.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HorizontalLayout {
    /// Style.
    pub style: HorizontalLayoutStyle,
}

impl HorizontalLayout {
    /// A layout with the given style.
    pub fn new(style: HorizontalLayoutStyle) -> Self {
        Self { style }
    }
}

/// Map a vertical alignment onto a cross-axis placement.
pub(super) fn v_place(v: VAlign) -> Place {
    match v {
        VAlign::Top => Place::Start,
        VAlign::Middle => Place::Center,
        VAlign::Bottom => Place::End,
    }
}

/// Map a horizontal alignment onto a placement.
pub(super) fn h_place(h: HAlign) -> Place {
    match h {
        HAlign::Left => Place::Start,
        HAlign::Center => Place::Center,
        HAlign::Right => Place::End,
    }
}

impl LayoutAlgorithm for HorizontalLayout {
    fn calculate_size_constraints(
        &self,
        elements: &mut dyn LayoutElements,
        out: &mut SizeConstraints,
    ) -> Result<()> {
        let mut min_width = self.style.padding.horizontal();
        let mut min_height: f32 = 0.0;
        for i in 0..elements.len() {
            let sc = elements.size_constraints(i)?;
            min_width += sc.width.min.unwrap_or(0.0);
            min_height = min_height.max(sc.height.min.unwrap_or(0.0));
            if i > 0 {
                min_width += self.style.gap;
            }
        }
        out.width.min = Some(min_width);
        out.height.min = Some(min_height + self.style.padding.vertical());
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
            axis: Axis::Horizontal,
            gap: self.style.gap,
            padding: self.style.padding,
            main: h_place(self.style.horizontal_align),
            cross: v_place(self.style.vertical_align),
        };
        stack.layout(
            explicit_width,
            explicit_height,
            elements,
            |ld| ld.vertical_align().map(v_place),
            out,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Element, LayoutData, LayoutHints, MinMax};

    fn run(
        layout: &mut HorizontalLayout,
        w: Option<f32>,
        h: Option<f32>,
        elements: &mut Vec<Element>,
    ) -> Result<Bounds> {
        let mut out = Bounds::default();
        layout.layout(w, h, elements, &mut out)?;
        Ok(out)
    }

    #[test]
    fn percent_takes_leftover() -> Result<()> {
        let mut l = HorizontalLayout::default();
        let mut els = vec![
            Element::new(0.0, 10.0).with_data(LayoutData::new().with_width(50.0)),
            Element::new(0.0, 10.0).with_data(LayoutData::new().with_width_percent(0.5)),
        ];
        let out = run(&mut l, Some(200.0), None, &mut els)?;
        assert_eq!(els[0].width(), 50.0);
        assert_eq!(els[1].width(), 100.0);
        // Left aligned.
        assert_eq!((els[0].x, els[1].x), (0.0, 55.0));
        assert_eq!(out.width, 155.0);
        Ok(())
    }

    #[test]
    fn percents_scale_down_together() -> Result<()> {
        let mut l = HorizontalLayout::new(HorizontalLayoutStyle {
            gap: 0.0,
            ..HorizontalLayoutStyle::default()
        });
        let mut els = vec![
            Element::new(40.0, 10.0),
            Element::new(0.0, 10.0).with_data(LayoutData::new().with_width_percent(0.8)),
            Element::new(0.0, 10.0).with_data(LayoutData::new().with_width_percent(0.4)),
        ];
        run(&mut l, Some(100.0), None, &mut els)?;
        // 60 left over for 120 requested.
        assert_eq!(els[1].width(), 40.0);
        assert_eq!(els[2].width(), 20.0);
        Ok(())
    }

    #[test]
    fn alignment() -> Result<()> {
        let mut l = HorizontalLayout::new(HorizontalLayoutStyle {
            gap: 0.0,
            padding: Pad::uniform(1.0),
            horizontal_align: HAlign::Center,
            vertical_align: VAlign::Top,
        });
        let mut els = vec![
            Element::new(10.0, 10.0),
            Element::new(10.0, 20.0),
            Element::new(10.0, 4.0).with_data(LayoutData::new().with_hints(
                LayoutHints::Horizontal {
                    vertical_align: Some(VAlign::Middle),
                },
            )),
        ];
        let out = run(&mut l, Some(42.0), None, &mut els)?;
        assert_eq!(els[0].x, 6.0);
        assert_eq!(els[0].y, 1.0);
        assert_eq!(els[2].y, 1.0 + 8.0);
        assert_eq!(out, Bounds::new(37.0, 22.0));

        l.style.horizontal_align = HAlign::Right;
        run(&mut l, Some(42.0), None, &mut els)?;
        assert_eq!(els[0].x, 11.0);
        Ok(())
    }

    #[test]
    fn height_percent_follows_tallest() -> Result<()> {
        let mut l = HorizontalLayout::default();
        let mut els = vec![
            Element::new(10.0, 30.0),
            Element::new(10.0, 0.0).with_data(LayoutData::new().with_height_percent(0.5)),
        ];
        run(&mut l, None, None, &mut els)?;
        assert_eq!(els[1].height(), 15.0);
        run(&mut l, None, Some(100.0), &mut els)?;
        assert_eq!(els[1].height(), 50.0);
        Ok(())
    }

    #[test]
    fn width_percent_height_uses_available_height() -> Result<()> {
        let mut l = HorizontalLayout::default();
        let mut els = vec![
            Element::new(10.0, 80.0),
            Element::new(0.0, 0.0).with_data(
                LayoutData::new()
                    .with_width_percent(0.5)
                    .with_height_percent(1.0),
            ),
        ];
        let out = run(&mut l, Some(200.0), Some(50.0), &mut els)?;
        assert_eq!(els[1].height(), 50.0);
        assert_eq!(out.height, 80.0);
        Ok(())
    }

    #[test]
    fn idempotent() -> Result<()> {
        let mut l = HorizontalLayout::default();
        let mut els = vec![
            Element::new(10.0, 30.0),
            Element::new(0.0, 5.0).with_data(LayoutData::new().with_width_percent(0.3)),
        ];
        let a = run(&mut l, Some(90.0), Some(40.0), &mut els)?;
        let first = els.clone();
        let b = run(&mut l, Some(90.0), Some(40.0), &mut els)?;
        assert_eq!(a, b);
        assert_eq!(first, els);
        Ok(())
    }

    #[test]
    fn min_size() -> Result<()> {
        let l = HorizontalLayout::default();
        let mut els = vec![
            Element::new(0.0, 0.0).with_constraints(SizeConstraints {
                width: MinMax::new(Some(10.0), None),
                height: MinMax::new(Some(3.0), None),
            }),
            Element::new(0.0, 0.0),
        ];
        let mut sc = SizeConstraints::default();
        l.calculate_size_constraints(&mut els, &mut sc)?;
        assert_eq!(sc.width.min, Some(15.0));
        assert_eq!(sc.height.min, Some(3.0));
        Ok(())
    }
}
