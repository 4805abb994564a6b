use std::mem;

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    geom::{Bounds, Pad},
    layout::{
        FlowHAlign, FlowHints, FlowVAlign, LayoutAlgorithm, LayoutElements, LineInfo,
        SizeConstraints,
    },
};

/// Style for [`FlowLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowLayoutStyle {
    /// Space between elements on a line.
    pub horizontal_gap: f32,
    /// Space between lines.
    pub vertical_gap: f32,
    /// Padding around the content.
    pub padding: Pad,
    /// Placement of each line.
    pub horizontal_align: FlowHAlign,
    /// Default placement of elements within their line.
    pub vertical_align: FlowVAlign,
    /// Wrap lines at the available width. When false everything sits on one
    /// line.
    pub multiline: bool,
}

impl Default for FlowLayoutStyle {
    fn default() -> Self {
        Self {
            horizontal_gap: 5.0,
            vertical_gap: 5.0,
            padding: Pad::default(),
            horizontal_align: FlowHAlign::Left,
            vertical_align: FlowVAlign::Top,
            multiline: true,
        }
    }
}

/// Places elements left to right, wrapping onto a new line before the
/// available width is exceeded.
///
/// Lines break before an element with `starts_new_line`, after an element
/// with `clears_line`, or when a non-overhanging element would cross the
/// available width. An overflow break backs up to just after the last
/// `breaking` element on the line, so that runs of non-breaking elements
/// move to the next line together. Overhanging elements that follow the
/// break stay at the end of the broken line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowLayout {
    /// Style.
    pub style: FlowLayoutStyle,
    /// Lines from the last layout pass.
    lines: Vec<LineInfo>,
}

/// Flow hints of element `i`.
fn hints(elements: &dyn LayoutElements, i: usize) -> Result<FlowHints> {
    Ok(elements
        .layout_data(i)?
        .map(|d| d.flow_hints())
        .unwrap_or_default())
}

impl FlowLayout {
    /// A layout with the given style.
    pub fn new(style: FlowLayoutStyle) -> Self {
        Self {
            style,
            lines: Vec::new(),
        }
    }

    /// The lines measured by the last layout pass.
    pub fn lines(&self) -> &[LineInfo] {
        &self.lines
    }

    /// The index at which an element dropped at `(x, y)` would be inserted,
    /// based on the lines of the last layout pass.
    pub fn element_insertion_index(
        &self,
        x: f32,
        y: f32,
        elements: &mut dyn LayoutElements,
    ) -> Result<usize> {
        let (Some(first), Some(last)) = (self.lines.first(), self.lines.last()) else {
            return Ok(0);
        };
        if y < first.y {
            return Ok(0);
        }
        if y >= last.bottom() {
            return Ok(elements.len());
        }
        let Some(line) = self.lines.iter().find(|l| y < l.bottom()) else {
            return Ok(elements.len());
        };
        for j in line.start..line.end {
            if x < elements.x(j)? + elements.width(j)? {
                return Ok(j);
            }
        }
        Ok(line.end)
    }

    /// Size every element to its preferred size, no wider than the
    /// available width.
    fn size_elements(
        elements: &mut dyn LayoutElements,
        available_width: Option<f32>,
        available_height: Option<f32>,
    ) -> Result<()> {
        for i in 0..elements.len() {
            let ld = elements.layout_data(i)?;
            elements.set_size(
                i,
                ld.and_then(|d| d.preferred_width(available_width)),
                ld.and_then(|d| d.preferred_height(available_height)),
            )?;
            if let Some(av) = available_width
                && elements.width(i)? > av
            {
                elements.set_width(i, Some(av))?;
            }
        }
        Ok(())
    }

    /// Split elements into lines, recording each line's index range.
    fn break_lines(
        &mut self,
        elements: &mut dyn LayoutElements,
        available_width: Option<f32>,
    ) -> Result<()> {
        let n = elements.len();
        let mut start = 0;
        let mut x = 0.0;
        let mut i = 0;
        while i < n {
            let h = hints(elements, i)?;
            let w = elements.width(i)?;
            if self.style.multiline && i > start {
                let forced = hints(elements, i - 1)?.clears_line || h.starts_new_line;
                let overflow =
                    !forced && !h.overhangs && available_width.is_some_and(|av| x + w > av);
                if forced || overflow {
                    let end = if overflow {
                        Self::break_point(elements, start, i)?
                    } else {
                        i
                    };
                    self.lines.push(LineInfo {
                        end,
                        ..LineInfo::at(start)
                    });
                    start = end;
                    i = end;
                    x = 0.0;
                    continue;
                }
            }
            x += w + self.style.horizontal_gap;
            i += 1;
        }
        if start < n {
            self.lines.push(LineInfo {
                end: n,
                ..LineInfo::at(start)
            });
        }
        Ok(())
    }

    /// Where a line overflowing at `i` ends: after the last breaking element
    /// in `start..i` and any overhanging elements that follow it. With no
    /// breaking element the line ends at `i`.
    fn break_point(elements: &dyn LayoutElements, start: usize, i: usize) -> Result<usize> {
        let mut breaking = None;
        for j in (start..i).rev() {
            if hints(elements, j)?.breaking {
                breaking = Some(j);
                break;
            }
        }
        let Some(j) = breaking else {
            return Ok(i);
        };
        for k in j + 1..i {
            if !hints(elements, k)?.overhangs {
                return Ok(k);
            }
        }
        Ok(i)
    }

    /// Fill in a line's widths and baseline from its elements.
    fn measure_line(&self, elements: &mut dyn LayoutElements, line: &mut LineInfo) -> Result<()> {
        let mut x = 0.0;
        for j in line.start..line.end {
            let h = hints(elements, j)?;
            let (w, height) = (elements.width(j)?, elements.height(j)?);
            x += w;
            line.width = x;
            if !h.overhangs {
                line.contents_width = x;
            }
            x += self.style.horizontal_gap;
            let baseline = h.baseline.unwrap_or(height);
            line.baseline = line.baseline.max(baseline);
            line.below_baseline = line.below_baseline.max(height - baseline);
        }
        Ok(())
    }

    /// Horizontal start of a line.
    fn line_x(&self, available_width: Option<f32>, contents_width: f32) -> f32 {
        let left = self.style.padding.left;
        let Some(av) = available_width else {
            return left;
        };
        let remaining = av - contents_width;
        left + match self.style.horizontal_align {
            FlowHAlign::Left | FlowHAlign::Justify => 0.0,
            FlowHAlign::Center => (remaining * 0.5).round(),
            FlowHAlign::Right => remaining,
        }
    }

    /// Place the elements of a line, applying alignment.
    fn position_line(
        &self,
        elements: &mut dyn LayoutElements,
        line: &LineInfo,
        available_width: Option<f32>,
    ) -> Result<()> {
        let n = elements.len();
        let mut gap = self.style.horizontal_gap;
        if let Some(av) = available_width
            && self.style.horizontal_align == FlowHAlign::Justify
            && line.len() > 1
            && line.end != n
            && !hints(elements, line.end - 1)?.clears_line
            && !hints(elements, line.end)?.starts_new_line
        {
            gap = (gap + (av - line.contents_width) / (line.len() - 1) as f32).floor();
        }
        let mut x = 0.0;
        for j in line.start..line.end {
            let h = hints(elements, j)?;
            let (w, height) = (elements.width(j)?, elements.height(j)?);
            let dy = match h.vertical_align.unwrap_or(self.style.vertical_align) {
                FlowVAlign::Top => 0.0,
                FlowVAlign::Middle => ((line.height() - height) * 0.5).round(),
                FlowVAlign::Bottom => line.height() - height,
                FlowVAlign::Baseline => line.baseline - h.baseline.unwrap_or(height),
            };
            elements.move_to(j, line.x + x, line.y + dy)?;
            x += w + gap;
        }
        Ok(())
    }
}

impl LayoutAlgorithm for FlowLayout {
    fn calculate_size_constraints(
        &self,
        elements: &mut dyn LayoutElements,
        out: &mut SizeConstraints,
    ) -> Result<()> {
        let mut min_width: f32 = 0.0;
        for i in 0..elements.len() {
            min_width = min_width.max(elements.size_constraints(i)?.width.min.unwrap_or(0.0));
        }
        out.width.min = Some(min_width + self.style.padding.horizontal());
        Ok(())
    }

    fn layout(
        &mut self,
        explicit_width: Option<f32>,
        explicit_height: Option<f32>,
        elements: &mut dyn LayoutElements,
        out: &mut Bounds,
    ) -> Result<()> {
        let pad = self.style.padding;
        let available_width = pad.reduce_width(explicit_width);
        let available_height = pad.reduce_height(explicit_height);
        self.lines.clear();
        Self::size_elements(elements, available_width, available_height)?;
        self.break_lines(elements, available_width)?;

        let mut lines = mem::take(&mut self.lines);
        let mut measured_width: f32 = 0.0;
        let mut y = 0.0;
        for (k, line) in lines.iter_mut().enumerate() {
            self.measure_line(elements, line)?;
            measured_width = measured_width.max(line.contents_width);
            if k > 0 {
                y += self.style.vertical_gap;
            }
            line.y = pad.top + y;
            line.x = self.line_x(available_width, line.contents_width);
            self.position_line(elements, line, available_width)?;
            y += line.height();
        }
        self.lines = lines;

        out.width = out.width.max(measured_width + pad.horizontal());
        out.height = out.height.max(y + pad.vertical());
        tracing::trace!(lines = self.lines.len(), "flow layout");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Element, LayoutData};

    fn word(w: f32) -> Element {
        Element::new(w, 10.0)
    }

    fn space(w: f32) -> Element {
        Element::new(w, 10.0).with_data(LayoutData::flow(FlowHints {
            overhangs: true,
            breaking: true,
            ..FlowHints::default()
        }))
    }

    fn flow(hgap: f32) -> FlowLayout {
        FlowLayout::new(FlowLayoutStyle {
            horizontal_gap: hgap,
            ..FlowLayoutStyle::default()
        })
    }

    fn ranges(l: &FlowLayout) -> Vec<(usize, usize)> {
        l.lines().iter().map(|l| (l.start, l.end)).collect()
    }

    #[test]
    fn breaks_at_whitespace() -> Result<()> {
        let mut l = flow(0.0);
        let mut els = vec![word(50.0), space(5.0), word(50.0), space(5.0), word(50.0)];
        let mut out = Bounds::default();
        l.layout(Some(120.0), None, &mut els, &mut out)?;
        assert_eq!(ranges(&l), vec![(0, 4), (4, 5)]);
        assert_eq!(l.lines()[0].contents_width, 105.0);
        assert_eq!(l.lines()[0].width, 110.0);
        assert_eq!((els[4].x, els[4].y), (0.0, 15.0));
        assert_eq!(out, Bounds::new(105.0, 25.0));
        Ok(())
    }

    #[test]
    fn backs_up_to_last_break() -> Result<()> {
        let mut l = flow(0.0);
        let mut els = vec![word(30.0), space(5.0), word(30.0), word(30.0), word(30.0)];
        let mut out = Bounds::default();
        l.layout(Some(100.0), None, &mut els, &mut out)?;
        assert_eq!(ranges(&l), vec![(0, 2), (2, 5)]);
        assert_eq!(els[2].x, 0.0);
        assert_eq!(els[4].x, 60.0);
        Ok(())
    }

    #[test]
    fn no_break_opportunity() -> Result<()> {
        let mut l = flow(5.0);
        let mut els = vec![word(60.0), word(60.0), word(300.0)];
        let mut out = Bounds::default();
        l.layout(Some(100.0), None, &mut els, &mut out)?;
        assert_eq!(ranges(&l), vec![(0, 1), (1, 2), (2, 3)]);
        // Clamped to the available width.
        assert_eq!(els[2].width(), 100.0);
        Ok(())
    }

    #[test]
    fn forced_breaks() -> Result<()> {
        let mut l = flow(0.0);
        let clear = LayoutData::flow(FlowHints {
            clears_line: true,
            ..FlowHints::default()
        });
        let fresh = LayoutData::flow(FlowHints {
            starts_new_line: true,
            ..FlowHints::default()
        });
        let mut els = vec![
            word(10.0).with_data(clear),
            word(10.0),
            word(10.0).with_data(fresh),
        ];
        let mut out = Bounds::default();
        l.layout(None, None, &mut els, &mut out)?;
        assert_eq!(ranges(&l), vec![(0, 1), (1, 2), (2, 3)]);

        l.style.multiline = false;
        l.layout(None, None, &mut els, &mut out)?;
        assert_eq!(ranges(&l), vec![(0, 3)]);
        Ok(())
    }

    #[test]
    fn justify_spreads_all_but_last_line() -> Result<()> {
        let mut l = FlowLayout::new(FlowLayoutStyle {
            horizontal_gap: 0.0,
            horizontal_align: FlowHAlign::Justify,
            ..FlowLayoutStyle::default()
        });
        let mut els = vec![word(20.0), word(20.0), word(20.0), word(20.0)];
        let mut out = Bounds::default();
        l.layout(Some(50.0), None, &mut els, &mut out)?;
        assert_eq!(ranges(&l), vec![(0, 2), (2, 4)]);
        assert_eq!((els[0].x, els[1].x), (0.0, 30.0));
        assert_eq!((els[2].x, els[3].x), (0.0, 20.0));
        Ok(())
    }

    #[test]
    fn center_and_right() -> Result<()> {
        let mut l = flow(0.0);
        l.style.horizontal_align = FlowHAlign::Center;
        let mut els = vec![word(20.0), word(20.0)];
        let mut out = Bounds::default();
        l.layout(Some(100.0), None, &mut els, &mut out)?;
        assert_eq!(els[0].x, 30.0);
        l.style.horizontal_align = FlowHAlign::Right;
        l.layout(Some(100.0), None, &mut els, &mut out)?;
        assert_eq!(els[0].x, 60.0);
        Ok(())
    }

    #[test]
    fn vertical_alignment() -> Result<()> {
        let mut l = flow(0.0);
        l.style.vertical_align = FlowVAlign::Baseline;
        let tall = LayoutData::flow(FlowHints {
            baseline: Some(15.0),
            ..FlowHints::default()
        });
        let short = LayoutData::flow(FlowHints {
            baseline: Some(5.0),
            ..FlowHints::default()
        });
        let mut els = vec![
            Element::new(10.0, 20.0).with_data(tall),
            Element::new(10.0, 10.0).with_data(short),
        ];
        let mut out = Bounds::default();
        l.layout(None, None, &mut els, &mut out)?;
        assert_eq!(l.lines()[0].baseline, 15.0);
        assert_eq!(l.lines()[0].below_baseline, 5.0);
        assert_eq!((els[0].y, els[1].y), (0.0, 10.0));

        l.style.vertical_align = FlowVAlign::Middle;
        l.layout(None, None, &mut els, &mut out)?;
        assert_eq!(els[1].y, 5.0);
        l.style.vertical_align = FlowVAlign::Bottom;
        l.layout(None, None, &mut els, &mut out)?;
        assert_eq!(els[1].y, 10.0);
        Ok(())
    }

    #[test]
    fn insertion_index() -> Result<()> {
        let mut l = flow(0.0);
        let mut els = vec![word(50.0), space(5.0), word(50.0), space(5.0), word(50.0)];
        assert_eq!(l.element_insertion_index(0.0, 0.0, &mut els)?, 0);
        let mut out = Bounds::default();
        l.layout(Some(120.0), None, &mut els, &mut out)?;
        assert_eq!(l.element_insertion_index(0.0, 20.0, &mut els)?, 4);
        assert_eq!(l.element_insertion_index(200.0, 5.0, &mut els)?, 4);
        assert_eq!(l.element_insertion_index(52.0, 5.0, &mut els)?, 1);
        assert_eq!(l.element_insertion_index(0.0, -1.0, &mut els)?, 0);
        assert_eq!(l.element_insertion_index(0.0, 100.0, &mut els)?, 5);
        Ok(())
    }

    #[test]
    fn idempotent() -> Result<()> {
        let mut l = flow(3.0);
        l.style.padding = Pad::uniform(2.0);
        let mut els = vec![word(40.0), space(4.0), word(70.0), space(4.0), word(10.0)];
        let mut a = Bounds::default();
        l.layout(Some(100.0), None, &mut els, &mut a)?;
        let (lines, first) = (l.lines().to_vec(), els.clone());
        let mut b = Bounds::default();
        l.layout(Some(100.0), None, &mut els, &mut b)?;
        assert_eq!(a, b);
        assert_eq!(lines, l.lines());
        assert_eq!(first, els);
        Ok(())
    }
}
