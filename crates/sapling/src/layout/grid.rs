use std::mem;

use serde::{Deserialize, Serialize};

use super::{
    horizontal::{h_place, v_place},
    stack::Place,
};
use crate::{
    error::{Error, Result},
    geom::{Bounds, Pad},
    layout::{HAlign, LayoutAlgorithm, LayoutElements, SizeConstraints, VAlign},
};

/// Scale limit for flexible columns when scaling up is allowed.
const MAX_SCALE_UP: f32 = 10000.0;

/// A column of a [`GridLayout`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridColumn {
    /// Fixed width.
    pub width: Option<f32>,
    /// Width as a fraction of the available width.
    pub width_percent: Option<f32>,
    /// Lower bound on the column width.
    pub min_width: Option<f32>,
    /// Default horizontal placement of cells.
    pub h_align: HAlign,
    /// Overrides whether the column flexes to fit the available width.
    /// Defaults to true when `width_percent` is set.
    pub flexible: Option<bool>,
}

impl GridColumn {
    /// A fixed-width column.
    pub fn fixed(width: f32) -> Self {
        Self {
            width: Some(width),
            ..Self::default()
        }
    }

    /// A column sized as a fraction of the available width.
    pub fn percent(percent: f32) -> Self {
        Self {
            width_percent: Some(percent),
            ..Self::default()
        }
    }

    /// True if the column flexes to fit the available width. A column needs
    /// a width or a percent to flex.
    pub fn is_flexible(&self) -> bool {
        (self.width.is_some() || self.width_percent.is_some())
            && self.flexible.unwrap_or(self.width_percent.is_some())
    }

    /// The width the column asks for, never below its minimum.
    pub fn preferred_width(&self, available: Option<f32>) -> Option<f32> {
        let w = match (self.width_percent, available) {
            (Some(p), Some(a)) => Some(p * a),
            _ => self.width,
        };
        match (w, self.min_width) {
            (Some(w), Some(min)) => Some(w.max(min)),
            (w, _) => w,
        }
    }
}

/// Style for [`GridLayout`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayoutStyle {
    /// Columns. Cells fill them left to right, then wrap to the next row.
    pub columns: Vec<GridColumn>,
    /// Space between rows.
    pub vertical_gap: f32,
    /// Space between columns.
    pub horizontal_gap: f32,
    /// Padding around the grid.
    pub padding: Pad,
    /// Default vertical placement of cells within their rows.
    pub vertical_align: VAlign,
    /// Minimum row height, and the height percent cells are sized against.
    pub row_height: Option<f32>,
    /// Let flexible columns grow past their preferred width to fill the
    /// available width.
    pub allow_scale_up: bool,
}

impl Default for GridLayoutStyle {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            vertical_gap: 5.0,
            horizontal_gap: 5.0,
            padding: Pad::default(),
            vertical_align: VAlign::Bottom,
            row_height: None,
            allow_scale_up: false,
        }
    }
}

/// Where an element sits in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    /// Row index.
    row: usize,
    /// Column index.
    col: usize,
    /// Columns spanned, clipped to the grid.
    col_span: usize,
    /// Rows spanned.
    row_span: usize,
}

/// Places elements into rows and columns.
///
/// Cells are assigned in element order. A cell with a row span keeps its
/// columns occupied for the following rows, and later cells skip occupied
/// columns. Inflexible cells are measured first; flexible (percent)
/// columns then share the remaining width, and their cells are measured
/// last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridLayout {
    /// Style.
    pub style: GridLayoutStyle,
    /// Column widths from the last layout.
    col_widths: Vec<f32>,
    /// Row heights from the last layout.
    row_heights: Vec<f32>,
    /// Working column widths for the current pass.
    preferred: Vec<Option<f32>>,
    /// Cell assignment for the current pass.
    cells: Vec<Cell>,
}

impl GridLayout {
    /// A layout with the given style.
    pub fn new(style: GridLayoutStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    /// Column widths measured by the last layout.
    pub fn measured_col_widths(&self) -> &[f32] {
        &self.col_widths
    }

    /// Row heights measured by the last layout.
    pub fn measured_row_heights(&self) -> &[f32] {
        &self.row_heights
    }

    /// Assign every element a cell, tracking how many more rows each column
    /// stays occupied.
    fn cell_walk(&mut self, elements: &dyn LayoutElements) -> Result<()> {
        let cols = self.style.columns.len();
        self.cells.clear();
        if elements.is_empty() {
            return Ok(());
        }
        if cols == 0 {
            return Err(Error::Layout("grid has no columns".into()));
        }
        let mut occupancy = vec![0usize; cols];
        let (mut row, mut col) = (0, 0);
        for i in 0..elements.len() {
            let hints = elements
                .layout_data(i)?
                .map(|d| d.grid_hints())
                .unwrap_or_default();
            let col_span = hints.col_span.clamp(1, cols - col);
            let row_span = hints.row_span.max(1);
            self.cells.push(Cell {
                row,
                col,
                col_span,
                row_span,
            });
            for o in &mut occupancy[col..col + col_span] {
                *o = (*o).max(row_span);
            }
            while occupancy[col] > 0 {
                occupancy[col] -= 1;
                col += 1;
                if col == cols {
                    col = 0;
                    row += 1;
                }
            }
        }
        Ok(())
    }

    /// True if any column the cell spans is flexible.
    fn spans_flexible(&self, cell: &Cell, available: Option<f32>) -> bool {
        available.is_some()
            && self.style.columns[cell.col..cell.col + cell.col_span]
                .iter()
                .any(GridColumn::is_flexible)
    }

    /// Combined preferred width of the cell's columns, if all are known.
    fn span_width(&self, cell: &Cell) -> Option<f32> {
        let mut total = 0.0;
        for w in &self.preferred[cell.col..cell.col + cell.col_span] {
            total += (*w)?;
        }
        Some(total + self.style.horizontal_gap * (cell.col_span - 1) as f32)
    }

    /// Size an element within its cell and grow its rows and columns to fit.
    fn measure_cell(
        &mut self,
        elements: &mut dyn LayoutElements,
        i: usize,
        cell: Cell,
        span_width: Option<f32>,
    ) -> Result<()> {
        let ld = elements.layout_data(i)?;
        elements.set_size(
            i,
            ld.and_then(|d| d.preferred_width(span_width)),
            ld.and_then(|d| d.preferred_height(self.style.row_height)),
        )?;
        let gap = self.style.vertical_gap;
        let h = (elements.height(i)? - (cell.row_span - 1) as f32 * gap) / cell.row_span as f32;
        let rows = cell.row + cell.row_span;
        if self.row_heights.len() < rows {
            self.row_heights
                .resize(rows, self.style.row_height.unwrap_or(0.0));
        }
        for r in &mut self.row_heights[cell.row..rows] {
            *r = r.max(h);
        }
        let w = elements.width(i)?;
        self.fit_into_columns(cell, w);
        Ok(())
    }

    /// Grow the spanned columns to hold `width`. A span splits the width in
    /// proportion to the columns' preferred widths, or evenly.
    fn fit_into_columns(&mut self, cell: Cell, width: f32) {
        let range = cell.col..cell.col + cell.col_span;
        if cell.col_span == 1 {
            self.col_widths[cell.col] = self.col_widths[cell.col].max(width);
            return;
        }
        let actual = width - self.style.horizontal_gap * (cell.col_span - 1) as f32;
        let even = actual / cell.col_span as f32;
        let total: f32 = self.preferred[range.clone()]
            .iter()
            .map(|p| p.unwrap_or(even))
            .sum();
        for c in range {
            let share = if total <= 0.0 {
                1.0 / cell.col_span as f32
            } else {
                self.preferred[c].unwrap_or(even) / total
            };
            self.col_widths[c] = self.col_widths[c].max(actual * share);
        }
    }

    /// Scale flexible columns into the width left over by inflexible ones.
    fn fit_flexible_columns(&mut self, available: f32) {
        let gap = self.style.horizontal_gap;
        let mut inflexible = 0.0;
        let mut flexible = 0.0;
        for (col, w) in self.style.columns.iter().zip(&self.preferred) {
            if col.is_flexible() {
                flexible += w.unwrap_or(0.0);
            } else {
                inflexible += w.unwrap_or(0.0);
            }
        }
        inflexible += gap * (self.style.columns.len().saturating_sub(1)) as f32;
        let max = if self.style.allow_scale_up {
            MAX_SCALE_UP
        } else {
            1.0
        };
        let scale = if flexible > 0.0 {
            super::clamp((available - inflexible) / flexible, 0.0, max)
        } else {
            1.0
        };
        for (i, col) in self.style.columns.iter().enumerate() {
            if col.is_flexible() {
                let w = scale * col.preferred_width(Some(available)).unwrap_or(0.0);
                self.preferred[i] = Some(w);
                self.col_widths[i] = self.col_widths[i].max(w);
            }
        }
    }

}

/// Offset of an element of `size` placed within `span`.
fn offset(span: f32, size: f32, place: Place) -> f32 {
    match place {
        Place::Start => 0.0,
        Place::Center => (span - size) * 0.5,
        Place::End => span - size,
    }
}

/// Sum of `sizes[..n]` plus a gap after each.
fn leading(sizes: &[f32], n: usize, gap: f32) -> f32 {
    sizes[..n.min(sizes.len())].iter().map(|s| s + gap).sum()
}

/// Sum of `sizes[range]` with gaps between.
fn spanned(sizes: &[f32], start: usize, len: usize, gap: f32) -> f32 {
    let end = (start + len).min(sizes.len());
    let total: f32 = sizes[start.min(end)..end].iter().sum();
    total + gap * len.saturating_sub(1) as f32
}

impl LayoutAlgorithm for GridLayout {
    fn calculate_size_constraints(
        &self,
        _elements: &mut dyn LayoutElements,
        out: &mut SizeConstraints,
    ) -> Result<()> {
        let min: f32 = self
            .style
            .columns
            .iter()
            .filter_map(|c| c.min_width)
            .sum();
        out.width.min = Some(min);
        Ok(())
    }

    fn layout(
        &mut self,
        explicit_width: Option<f32>,
        _explicit_height: Option<f32>,
        elements: &mut dyn LayoutElements,
        out: &mut Bounds,
    ) -> Result<()> {
        let pad = self.style.padding;
        let available = pad.reduce_width(explicit_width);
        self.cell_walk(elements)?;

        self.col_widths.clear();
        self.row_heights.clear();
        self.preferred.clear();
        for col in &self.style.columns {
            let preferred = col.preferred_width(available);
            let w = if available.is_some() && col.is_flexible() {
                0.0
            } else {
                preferred.unwrap_or(0.0)
            };
            self.preferred.push(preferred);
            self.col_widths.push(col.min_width.unwrap_or(0.0).max(w));
        }

        let cells = mem::take(&mut self.cells);
        for (i, cell) in cells.iter().enumerate() {
            if !self.spans_flexible(cell, available) {
                let span = self.span_width(cell);
                self.measure_cell(elements, i, *cell, span)?;
            }
        }

        for (i, col) in self.style.columns.iter().enumerate() {
            if available.is_none() || !col.is_flexible() {
                self.preferred[i] = Some(self.col_widths[i]);
            }
        }

        if let Some(av) = available {
            self.fit_flexible_columns(av);
            for (i, cell) in cells.iter().enumerate() {
                if self.spans_flexible(cell, available) {
                    let span = self.span_width(cell);
                    self.measure_cell(elements, i, *cell, span)?;
                }
            }
        }

        let (hgap, vgap) = (self.style.horizontal_gap, self.style.vertical_gap);
        for (i, cell) in cells.iter().enumerate() {
            let x = pad.left + leading(&self.col_widths, cell.col, hgap);
            let y = pad.top + leading(&self.row_heights, cell.row, vgap);
            let span_w = spanned(&self.col_widths, cell.col, cell.col_span, hgap);
            let span_h = spanned(&self.row_heights, cell.row, cell.row_span, vgap);
            let hints = elements
                .layout_data(i)?
                .map(|d| d.grid_hints())
                .unwrap_or_default();
            let h = hints
                .horizontal_align
                .unwrap_or(self.style.columns[cell.col].h_align);
            let v = hints.vertical_align.unwrap_or(self.style.vertical_align);
            let dx = offset(span_w, elements.width(i)?, h_place(h));
            let dy = offset(span_h, elements.height(i)?, v_place(v));
            elements.move_to(i, x + dx, y + dy)?;
        }

        let width = pad.horizontal()
            + spanned(&self.col_widths, 0, self.col_widths.len(), hgap);
        let height = pad.vertical()
            + spanned(&self.row_heights, 0, self.row_heights.len(), vgap);
        out.set(width, height);
        self.cells = cells;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Element, GridHints, LayoutData};

    fn grid(columns: Vec<GridColumn>) -> GridLayout {
        GridLayout::new(GridLayoutStyle {
            columns,
            vertical_gap: 0.0,
            horizontal_gap: 0.0,
            vertical_align: VAlign::Top,
            ..GridLayoutStyle::default()
        })
    }

    fn span(col_span: usize, row_span: usize) -> LayoutData {
        LayoutData::grid(GridHints {
            col_span,
            row_span,
            ..GridHints::default()
        })
    }

    fn placement(l: &GridLayout) -> Vec<(usize, usize)> {
        l.cells.iter().map(|c| (c.row, c.col)).collect()
    }

    #[test]
    fn row_span_occupies_column() -> Result<()> {
        let mut l = grid(vec![GridColumn::default(), GridColumn::default()]);
        let mut els = vec![
            Element::new(10.0, 20.0).with_data(span(1, 2)),
            Element::new(10.0, 10.0),
            Element::new(10.0, 10.0),
            Element::new(10.0, 10.0),
        ];
        let mut out = Bounds::default();
        l.layout(None, None, &mut els, &mut out)?;
        assert_eq!(placement(&l), vec![(0, 0), (0, 1), (1, 1), (2, 0)]);
        assert_eq!((els[2].x, els[2].y), (10.0, 10.0));
        assert_eq!(l.measured_row_heights(), &[10.0, 10.0, 10.0]);
        assert_eq!(out, Bounds::new(20.0, 30.0));
        Ok(())
    }

    #[test]
    fn col_span_clipped_and_split() -> Result<()> {
        let mut l = grid(vec![
            GridColumn::fixed(10.0),
            GridColumn::fixed(30.0),
            GridColumn::default(),
        ]);
        let mut els = vec![
            Element::new(80.0, 10.0).with_data(span(2, 1)),
            Element::new(5.0, 10.0).with_data(span(4, 1)),
        ];
        let mut out = Bounds::default();
        l.layout(None, None, &mut els, &mut out)?;
        assert_eq!(placement(&l), vec![(0, 0), (0, 2)]);
        assert_eq!(l.cells[1].col_span, 1);
        // 80 split 1:3 over the two spanned columns.
        assert_eq!(l.measured_col_widths(), &[20.0, 60.0, 5.0]);
        assert_eq!(els[1].x, 80.0);
        Ok(())
    }

    #[test]
    fn flexible_columns_share_remaining_width() -> Result<()> {
        let mut l = grid(vec![
            GridColumn::fixed(40.0),
            GridColumn::percent(0.5),
            GridColumn::percent(0.25),
        ]);
        l.style.horizontal_gap = 5.0;
        let fill = LayoutData::new().with_width_percent(1.0);
        let mut els = vec![
            Element::new(10.0, 10.0),
            Element::new(10.0, 10.0).with_data(fill),
            Element::new(10.0, 10.0).with_data(fill),
        ];
        let mut out = Bounds::default();
        l.layout(Some(210.0), None, &mut els, &mut out)?;
        assert_eq!(l.measured_col_widths(), &[40.0, 105.0, 52.5]);
        assert_eq!(els[1].width(), 105.0);
        assert_eq!(els[2].x, 155.0);

        // 110 left over for 120 requested.
        l.layout(Some(160.0), None, &mut els, &mut out)?;
        let w = l.measured_col_widths();
        assert!(w[1] < 80.0);
        assert!((w[1] + w[2] - 110.0).abs() < 1e-3);
        Ok(())
    }

    #[test]
    fn scale_up() -> Result<()> {
        let mut l = grid(vec![GridColumn::fixed(20.0), GridColumn::percent(0.25)]);
        let mut els = vec![Element::new(5.0, 5.0), Element::new(5.0, 5.0)];
        let mut out = Bounds::default();
        l.layout(Some(100.0), None, &mut els, &mut out)?;
        assert_eq!(l.measured_col_widths(), &[20.0, 25.0]);
        l.style.allow_scale_up = true;
        l.layout(Some(100.0), None, &mut els, &mut out)?;
        assert_eq!(l.measured_col_widths(), &[20.0, 80.0]);
        assert_eq!(out.width, 100.0);
        Ok(())
    }

    #[test]
    fn alignment() -> Result<()> {
        let mut l = grid(vec![GridColumn {
            width: Some(50.0),
            h_align: HAlign::Right,
            ..GridColumn::default()
        }]);
        l.style.vertical_align = VAlign::Middle;
        l.style.row_height = Some(30.0);
        let centered = LayoutData::grid(GridHints {
            horizontal_align: Some(HAlign::Center),
            ..GridHints::default()
        });
        let mut els = vec![
            Element::new(10.0, 10.0),
            Element::new(10.0, 10.0).with_data(centered),
        ];
        let mut out = Bounds::default();
        l.layout(None, None, &mut els, &mut out)?;
        assert_eq!((els[0].x, els[0].y), (40.0, 10.0));
        assert_eq!((els[1].x, els[1].y), (20.0, 40.0));
        Ok(())
    }

    #[test]
    fn no_columns() -> Result<()> {
        let mut l = GridLayout::default();
        let mut out = Bounds::default();
        l.layout(None, None, &mut Vec::<Element>::new(), &mut out)?;
        assert!(matches!(
            l.layout(None, None, &mut vec![Element::new(1.0, 1.0)], &mut out),
            Err(Error::Layout(_))
        ));
        Ok(())
    }

    #[test]
    fn column_rules() {
        let c = GridColumn {
            width: Some(10.0),
            flexible: Some(true),
            min_width: Some(30.0),
            ..GridColumn::default()
        };
        assert!(c.is_flexible());
        assert_eq!(c.preferred_width(None), Some(30.0));
        assert!(!GridColumn::default().is_flexible());
        assert!(GridColumn::percent(0.1).is_flexible());
        let pinned = GridColumn {
            flexible: Some(false),
            ..GridColumn::percent(0.1)
        };
        assert!(!pinned.is_flexible());
    }
}
