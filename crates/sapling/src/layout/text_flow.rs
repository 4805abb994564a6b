//! Line breaking for runs of text.
//!
//! Text is split into grapheme clusters, each measured through a
//! [`FontMetrics`] provider. [`TextFlow`] wraps the parts into lines the way
//! [`FlowLayout`](super::FlowLayout) wraps elements: spaces hang past the
//! right edge, whitespace and hyphens are break opportunities, newlines
//! force a break, and tabs advance to the next tab stop.

use std::mem;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    core::{
        flags::{LAYOUT, SIZE_CONSTRAINTS},
        id::{NodeId, TypedId},
        render::RenderBatch,
        world::Core,
    },
    error::Result,
    geom::{Bounds, Color, Pad, Rect},
    layout::{FlowHAlign, FlowVAlign, LineInfo},
    widget::Widget,
};

/// Glyph measurements for one font.
pub trait FontMetrics {
    /// Horizontal advance of a grapheme cluster.
    fn advance(&self, grapheme: &str) -> f32;

    /// Adjustment between two adjacent graphemes.
    fn kerning(&self, _left: &str, _right: &str) -> f32 {
        0.0
    }

    /// Height of a line.
    fn line_height(&self) -> f32;

    /// Distance from the top of a line to the baseline.
    fn baseline(&self) -> f32;
}

/// Metrics where every grapheme has the same advance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMetrics {
    /// Advance of every grapheme.
    pub advance: f32,
    /// Line height.
    pub line_height: f32,
    /// Baseline.
    pub baseline: f32,
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self {
            advance: 8.0,
            line_height: 16.0,
            baseline: 12.0,
        }
    }
}

impl FontMetrics for MonospaceMetrics {
    fn advance(&self, _grapheme: &str) -> f32 {
        self.advance
    }

    fn line_height(&self) -> f32 {
        self.line_height
    }

    fn baseline(&self) -> f32 {
        self.baseline
    }
}

/// One grapheme cluster, measured and placed.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPart {
    /// The grapheme.
    pub text: String,
    /// Horizontal advance.
    pub advance: f32,
    /// Kerning toward the following part.
    pub kerning: f32,
    /// Width assigned by layout to tabs and justified spaces.
    pub explicit_width: Option<f32>,
    /// Line height.
    pub line_height: f32,
    /// Baseline.
    pub baseline: f32,
    /// Position after layout.
    pub x: f32,
    /// Position after layout.
    pub y: f32,
}

impl TextPart {
    /// Width used for placement and hit testing.
    pub fn width(&self) -> f32 {
        self.explicit_width.unwrap_or(self.advance)
    }

    /// True for a hard line break.
    pub fn clears_line(&self) -> bool {
        self.text == "\n" || self.text == "\r\n"
    }

    /// True for a tab.
    pub fn clears_tabstop(&self) -> bool {
        self.text == "\t"
    }

    /// True if a line may break after this part.
    pub fn is_breaking(&self) -> bool {
        self.text == "-" || self.text.chars().all(char::is_whitespace)
    }

    /// True if this part may hang past the right edge.
    pub fn overhangs(&self) -> bool {
        self.text == " "
    }

    /// True if the part draws nothing.
    fn is_blank(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }
}

/// Style for [`TextFlow`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextFlowStyle {
    /// Space between lines.
    pub vertical_gap: f32,
    /// Padding around the text.
    pub padding: Pad,
    /// Placement of each line.
    pub horizontal_align: FlowHAlign,
    /// Placement of each part within its line.
    pub vertical_align: FlowVAlign,
    /// Wrap at the available width.
    pub multiline: bool,
    /// Tab stop spacing, in spaces.
    pub tab_size: usize,
}

impl Default for TextFlowStyle {
    fn default() -> Self {
        Self {
            vertical_gap: 0.0,
            padding: Pad::default(),
            horizontal_align: FlowHAlign::Left,
            vertical_align: FlowVAlign::Baseline,
            multiline: true,
            tab_size: 4,
        }
    }
}

/// Measured text wrapped into lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextFlow {
    /// Style.
    pub style: TextFlowStyle,
    /// Parts, one per grapheme.
    parts: Vec<TextPart>,
    /// Lines from the last layout.
    lines: Vec<LineInfo>,
    /// Advance of a space, used for tab stops.
    space: f32,
}

impl TextFlow {
    /// An empty text flow.
    pub fn new(style: TextFlowStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    /// Replace the text, measuring it with `metrics`. Lines are cleared
    /// until the next layout.
    pub fn set_text(&mut self, text: &str, metrics: &dyn FontMetrics) {
        self.space = metrics.advance(" ");
        let graphemes: Vec<&str> = text.graphemes(true).collect();
        self.parts = graphemes
            .iter()
            .enumerate()
            .map(|(i, g)| {
                let mut part = TextPart {
                    text: (*g).to_string(),
                    advance: 0.0,
                    kerning: graphemes
                        .get(i + 1)
                        .map_or(0.0, |next| metrics.kerning(g, next)),
                    explicit_width: None,
                    line_height: metrics.line_height(),
                    baseline: metrics.baseline(),
                    x: 0.0,
                    y: 0.0,
                };
                if !part.clears_line() && !part.clears_tabstop() {
                    part.advance = metrics.advance(g);
                }
                part
            })
            .collect();
        self.lines.clear();
    }

    /// The parts.
    pub fn parts(&self) -> &[TextPart] {
        &self.parts
    }

    /// Lines from the last layout.
    pub fn lines(&self) -> &[LineInfo] {
        &self.lines
    }

    /// The text on line `index`.
    pub fn line_text(&self, index: usize) -> Option<String> {
        let line = self.lines.get(index)?;
        Some(
            self.parts[line.start..line.end]
                .iter()
                .map(|p| p.text.as_str())
                .collect(),
        )
    }

    /// Wrap and place the parts within `explicit_width`. Returns the
    /// measured size, including padding.
    pub fn layout(&mut self, explicit_width: Option<f32>) -> Bounds {
        let pad = self.style.padding;
        let available = pad.reduce_width(explicit_width);
        for p in &mut self.parts {
            p.explicit_width = None;
        }
        self.lines.clear();
        self.break_lines(available);

        let mut lines = mem::take(&mut self.lines);
        let count = lines.len();
        let mut y = pad.top;
        let mut measured: f32 = 0.0;
        for (k, line) in lines.iter_mut().enumerate() {
            if k > 0 {
                y += self.style.vertical_gap;
            }
            line.y = y;
            self.measure_line(line);
            if k + 1 < count {
                self.justify(line, available);
            }
            measured = measured.max(line.contents_width);
            self.position_line(line, available);
            y += line.height();
        }
        self.lines = lines;
        Bounds::new(measured + pad.horizontal(), y + pad.bottom)
    }

    /// The caret index closest to `(x, y)`, from the last layout. Each part
    /// is split at its midpoint.
    pub fn selection_index(&self, x: f32, y: f32) -> usize {
        let (Some(first), Some(last)) = (self.lines.first(), self.lines.last()) else {
            return 0;
        };
        if y < first.y {
            return 0;
        }
        if y >= last.bottom() {
            return self.parts.len();
        }
        let line = self
            .lines
            .iter()
            .find(|l| y < l.bottom())
            .unwrap_or(last);
        for j in line.start..line.end {
            let p = &self.parts[j];
            if p.clears_line() || x < p.x + p.width() * 0.5 {
                return j;
            }
        }
        line.end
    }

    /// Width of a tab placed at `x`: up to the next stop, skipping a stop
    /// closer than one space.
    fn tab_width(&self, x: f32) -> f32 {
        let tab = self.space * self.style.tab_size as f32;
        if tab <= 0.0 {
            return 0.0;
        }
        let mut w = ((x / tab).floor() + 1.0) * tab - x;
        if w < self.space {
            w += tab;
        }
        w
    }

    /// Split parts into lines, setting each part's offset within its line.
    fn break_lines(&mut self, available_width: Option<f32>) {
        let n = self.parts.len();
        let mut start = 0;
        let mut x = 0.0;
        let mut i = 0;
        while i < n {
            if self.parts[i].clears_tabstop() {
                self.parts[i].explicit_width = Some(self.tab_width(x));
            }
            let p = &self.parts[i];
            let w = p.width();
            if self.style.multiline && i > start {
                let forced = self.parts[i - 1].clears_line();
                let overflow = !forced
                    && !p.overhangs()
                    && !p.clears_line()
                    && available_width.is_some_and(|av| x + w > av);
                if forced || overflow {
                    let end = if overflow { self.break_point(start, i) } else { i };
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
            let kerning = p.kerning;
            self.parts[i].x = x;
            x += w + kerning;
            i += 1;
        }
        if start < n {
            self.lines.push(LineInfo {
                end: n,
                ..LineInfo::at(start)
            });
        }
    }

    /// Where a line overflowing at `i` ends: after the last breaking part
    /// in `start..i` and the spaces that follow it, or at `i` when there is
    /// no break opportunity.
    fn break_point(&self, start: usize, i: usize) -> usize {
        let Some(j) = (start..i).rev().find(|&j| self.parts[j].is_breaking()) else {
            return i;
        };
        (j + 1..i)
            .find(|&k| !self.parts[k].overhangs())
            .unwrap_or(i)
    }

    /// Fill in a line's widths and baseline from its parts.
    fn measure_line(&self, line: &mut LineInfo) {
        line.baseline = 0.0;
        line.below_baseline = 0.0;
        line.width = 0.0;
        line.contents_width = 0.0;
        for p in &self.parts[line.start..line.end] {
            line.baseline = line.baseline.max(p.baseline);
            line.below_baseline = line.below_baseline.max(p.line_height - p.baseline);
            line.width = p.x + p.width();
            if !p.overhangs() && !p.clears_line() {
                line.contents_width = line.width;
            }
        }
    }

    /// Widen the spaces of a wrapped line so its contents fill the
    /// available width.
    fn justify(&mut self, line: &mut LineInfo, available_width: Option<f32>) {
        let Some(av) = available_width else {
            return;
        };
        if self.style.horizontal_align != FlowHAlign::Justify
            || line.is_empty()
            || self.parts[line.end - 1].clears_line()
        {
            return;
        }
        let Some(last) = (line.start..line.end)
            .rev()
            .find(|&j| !self.parts[j].overhangs())
        else {
            return;
        };
        let spaces = (line.start..last)
            .filter(|&j| self.parts[j].overhangs())
            .count();
        let remaining = av - line.contents_width;
        if spaces == 0 || remaining <= 0.0 {
            return;
        }
        let extra = remaining / spaces as f32;
        let mut x = 0.0;
        for j in line.start..line.end {
            let p = &mut self.parts[j];
            if j < last && p.overhangs() {
                p.explicit_width = Some(p.advance + extra);
            }
            p.x = x;
            x += p.width() + p.kerning;
        }
        self.measure_line(line);
    }

    /// Offset a line's parts by its alignment and vertical placement.
    fn position_line(&mut self, line: &mut LineInfo, available_width: Option<f32>) {
        let remaining = available_width.map_or(0.0, |av| av - line.contents_width);
        line.x = self.style.padding.left
            + match self.style.horizontal_align {
                FlowHAlign::Left | FlowHAlign::Justify => 0.0,
                FlowHAlign::Center => (remaining * 0.5).floor(),
                FlowHAlign::Right => remaining,
            };
        let align = self.style.vertical_align;
        let height = line.height();
        for p in &mut self.parts[line.start..line.end] {
            p.x += line.x;
            p.y = line.y
                + match align {
                    FlowVAlign::Top => 0.0,
                    FlowVAlign::Middle => ((height - p.line_height) * 0.5).round(),
                    FlowVAlign::Bottom => height - p.line_height,
                    FlowVAlign::Baseline => line.baseline - p.baseline,
                };
        }
    }
}

/// A widget that lays out and draws a run of text.
///
/// Each visible grapheme is submitted as one quad the size of its advance
/// and line height. Renderers that rasterize glyphs map the quads back to
/// [`TextFlow::parts`].
#[derive(Debug, Clone)]
pub struct Text<M = MonospaceMetrics> {
    /// The current text.
    text: String,
    /// Measurements for the font.
    metrics: M,
    /// Wrapped parts.
    flow: TextFlow,
    /// Text color.
    pub color: Color,
}

impl<M: FontMetrics + 'static> Text<M> {
    /// A text widget showing `text`.
    pub fn new(text: &str, metrics: M) -> Self {
        let mut flow = TextFlow::default();
        flow.set_text(text, &metrics);
        Self {
            text: text.to_string(),
            metrics,
            flow,
            color: Color::WHITE,
        }
    }

    /// Replace the style.
    pub fn with_style(mut self, style: TextFlowStyle) -> Self {
        self.flow.style = style;
        self
    }

    /// The current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The wrapped text from the last layout.
    pub fn flow(&self) -> &TextFlow {
        &self.flow
    }

    /// Replace the text of a text node and invalidate its measurements.
    pub fn set_text(core: &mut Core, id: TypedId<Self>, text: &str) -> Result<()> {
        let changed = core.with_widget(id, |w: &mut Self, _| {
            if w.text == text {
                return Ok(false);
            }
            w.text = text.to_string();
            w.flow.set_text(text, &w.metrics);
            Ok(true)
        })?;
        if changed {
            core.invalidate(id, SIZE_CONSTRAINTS | LAYOUT)?;
        }
        Ok(())
    }

    /// The caret index under a point in the node's local space.
    pub fn selection_index(core: &mut Core, id: TypedId<Self>, x: f32, y: f32) -> Result<usize> {
        core.validate(id, LAYOUT)?;
        core.with_widget(id, |w: &mut Self, _| Ok(w.flow.selection_index(x, y)))
    }
}

impl<M: FontMetrics + 'static> Widget for Text<M> {
    fn name(&self) -> &'static str {
        "text"
    }

    fn update_layout(
        &mut self,
        _core: &mut Core,
        _id: NodeId,
        explicit_width: Option<f32>,
        explicit_height: Option<f32>,
        out: &mut Bounds,
    ) -> Result<()> {
        let measured = self.flow.layout(explicit_width);
        out.set(
            explicit_width.unwrap_or(measured.width),
            explicit_height.unwrap_or(measured.height),
        );
        Ok(())
    }

    fn draw(
        &mut self,
        core: &mut Core,
        id: NodeId,
        _clip: Rect,
        batch: &mut dyn RenderBatch,
    ) -> Result<()> {
        let m = core.concatenated_transform(id)?;
        let color = core.concatenated_color(id)? * self.color;
        for p in self.flow.parts.iter().filter(|p| !p.is_blank()) {
            let rect = Rect::new(p.x, p.y, p.width(), p.line_height);
            batch.draw_quad(id, rect, &m, color);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(text: &str, style: TextFlowStyle) -> TextFlow {
        let mut f = TextFlow::new(style);
        f.set_text(
            text,
            &MonospaceMetrics {
                advance: 10.0,
                line_height: 20.0,
                baseline: 15.0,
            },
        );
        f
    }

    fn texts(f: &TextFlow) -> Vec<String> {
        (0..f.lines().len()).filter_map(|i| f.line_text(i)).collect()
    }

    #[test]
    fn wraps_at_spaces() {
        let mut f = flow("hello world foo", TextFlowStyle::default());
        let b = f.layout(Some(85.0));
        assert_eq!(texts(&f), ["hello ", "world ", "foo"]);
        // Trailing spaces hang and do not count toward the width.
        assert_eq!(b, Bounds::new(50.0, 60.0));
        assert_eq!(f.parts()[6].x, 0.0);
        assert_eq!(f.parts()[6].y, 20.0);
    }

    #[test]
    fn long_word_breaks_anywhere() {
        let mut f = flow("abcdef", TextFlowStyle::default());
        f.layout(Some(25.0));
        assert_eq!(texts(&f), ["ab", "cd", "ef"]);
    }

    #[test]
    fn hyphen_is_a_break() {
        let mut f = flow("ab-cd", TextFlowStyle::default());
        f.layout(Some(45.0));
        assert_eq!(texts(&f), ["ab-", "cd"]);
    }

    #[test]
    fn hard_breaks() {
        let mut f = flow("a\nb\r\nc", TextFlowStyle::default());
        let b = f.layout(None);
        assert_eq!(texts(&f), ["a\n", "b\r\n", "c"]);
        assert_eq!(b.height, 60.0);

        f.style.multiline = false;
        f.layout(None);
        assert_eq!(f.lines().len(), 1);
    }

    #[test]
    fn tab_stops() {
        let mut f = flow("a\tb\t\tc", TextFlowStyle::default());
        f.layout(None);
        let xs: Vec<f32> = f.parts().iter().map(|p| p.x).collect();
        // Stops every 40; a stop closer than one space is skipped.
        assert_eq!(xs, [0.0, 10.0, 40.0, 50.0, 80.0, 120.0]);
    }

    #[test]
    fn justify_fills_all_but_last_line() {
        let mut f = flow(
            "aa b cc dd",
            TextFlowStyle {
                horizontal_align: FlowHAlign::Justify,
                ..TextFlowStyle::default()
            },
        );
        let b = f.layout(Some(65.0));
        assert_eq!(texts(&f), ["aa b ", "cc dd"]);
        // "aa b" is 40 wide with one inner space, which takes the 25 left over.
        assert_eq!(f.parts()[3].x, 55.0);
        assert_eq!(f.parts()[8].x, 30.0);
        assert_eq!(b.width, 65.0);
    }

    #[test]
    fn alignment() {
        let mut f = flow(
            "ab",
            TextFlowStyle {
                horizontal_align: FlowHAlign::Center,
                padding: Pad::uniform(2.0),
                ..TextFlowStyle::default()
            },
        );
        let b = f.layout(Some(54.0));
        assert_eq!(f.parts()[0].x, 17.0);
        assert_eq!(f.parts()[0].y, 2.0);
        assert_eq!(b, Bounds::new(24.0, 24.0));

        f.style.horizontal_align = FlowHAlign::Right;
        f.layout(Some(54.0));
        assert_eq!(f.parts()[1].x, 42.0);
    }

    #[test]
    fn selection() {
        let mut f = flow("ab cd\nef", TextFlowStyle::default());
        f.layout(Some(35.0));
        assert_eq!(texts(&f), ["ab ", "cd\n", "ef"]);
        assert_eq!(f.selection_index(-5.0, -5.0), 0);
        assert_eq!(f.selection_index(14.0, 5.0), 1);
        assert_eq!(f.selection_index(16.0, 5.0), 2);
        // Past the end of a line ending in a newline lands before it.
        assert_eq!(f.selection_index(100.0, 25.0), 5);
        assert_eq!(f.selection_index(100.0, 45.0), 8);
        assert_eq!(f.selection_index(0.0, 500.0), 8);
    }

    #[test]
    fn idempotent() {
        let mut f = flow("the quick brown fox", TextFlowStyle::default());
        let a = f.layout(Some(60.0));
        let parts = f.parts().to_vec();
        let b = f.layout(Some(60.0));
        assert_eq!(a, b);
        assert_eq!(parts, f.parts());
    }

    #[test]
    fn text_widget() -> Result<()> {
        let mut core = Core::new();
        let t = core.create(Text::new("ab cd", MonospaceMetrics::default()))?;
        assert_eq!(core.bounds(t)?, Bounds::new(40.0, 16.0));
        core.set_width(t, Some(20.0))?;
        assert_eq!(core.height(t)?, 32.0);
        Text::set_text(&mut core, t, "a")?;
        assert_eq!(core.height(t)?, 16.0);
        assert_eq!(Text::selection_index(&mut core, t, 7.0, 4.0)?, 1);
        Ok(())
    }
}
