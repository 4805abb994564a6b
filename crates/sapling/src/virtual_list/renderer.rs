use crate::{
    core::{id::NodeId, render::RenderBatch, world::Core},
    error::Result,
    geom::{Bounds, Color, Rect},
    widget::Widget,
};

/// A widget that stands in for one index of a virtual list.
pub trait ListRenderer: Widget {
    /// The data index this renderer represents.
    fn index(&self) -> usize;

    /// Assign the data index.
    fn set_index(&mut self, index: usize);
}

/// A list renderer that displays one data item and its selection state.
pub trait ItemRenderer<E>: ListRenderer {
    /// The item being displayed.
    fn data(&self) -> Option<&E>;

    /// Assign the item. Returns true if what the renderer shows changed,
    /// in which case the list re-measures it.
    fn set_data(&mut self, data: E) -> bool;

    /// True if the item is selected.
    fn toggled(&self) -> bool;

    /// Show the item as selected or not.
    fn set_toggled(&mut self, toggled: bool);
}

/// A fixed-height row that draws one quad, highlighted while selected.
#[derive(Debug, Clone)]
pub struct ItemRow<E> {
    /// Data index.
    index: usize,
    /// Displayed item.
    data: Option<E>,
    /// Selection state.
    toggled: bool,
    /// Natural height.
    pub height: f32,
    /// Fill color.
    pub color: Color,
    /// Fill color while selected.
    pub toggled_color: Color,
}

impl<E> ItemRow<E> {
    /// A row of the given height.
    pub fn new(height: f32) -> Self {
        Self {
            index: 0,
            data: None,
            toggled: false,
            height,
            color: Color::WHITE,
            toggled_color: Color::new(0.3, 0.5, 1.0, 1.0),
        }
    }
}

impl<E: PartialEq + 'static> ListRenderer for ItemRow<E> {
    fn index(&self) -> usize {
        self.index
    }

    fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}

impl<E: PartialEq + 'static> ItemRenderer<E> for ItemRow<E> {
    fn data(&self) -> Option<&E> {
        self.data.as_ref()
    }

    fn set_data(&mut self, data: E) -> bool {
        if self.data.as_ref() == Some(&data) {
            return false;
        }
        self.data = Some(data);
        true
    }

    fn toggled(&self) -> bool {
        self.toggled
    }

    fn set_toggled(&mut self, toggled: bool) {
        self.toggled = toggled;
    }
}

impl<E: PartialEq + 'static> Widget for ItemRow<E> {
    fn name(&self) -> &'static str {
        "item_row"
    }

    fn update_layout(
        &mut self,
        _core: &mut Core,
        _id: NodeId,
        explicit_width: Option<f32>,
        explicit_height: Option<f32>,
        out: &mut Bounds,
    ) -> Result<()> {
        out.set(
            explicit_width.unwrap_or(0.0),
            explicit_height.unwrap_or(self.height),
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
        let b = core.bounds(id)?;
        let m = core.concatenated_transform(id)?;
        let fill = if self.toggled {
            self.toggled_color
        } else {
            self.color
        };
        let color = core.concatenated_color(id)? * fill;
        batch.draw_quad(id, b.rect(), &m, color);
        Ok(())
    }
}

/// A blank fixed-height row shown for missing items.
#[derive(Debug, Clone, Copy)]
pub struct NullRow {
    /// Data index.
    index: usize,
    /// Natural height.
    pub height: f32,
}

impl NullRow {
    /// A blank row of the given height.
    pub fn new(height: f32) -> Self {
        Self { index: 0, height }
    }
}

impl Default for NullRow {
    fn default() -> Self {
        Self::new(20.0)
    }
}

impl ListRenderer for NullRow {
    fn index(&self) -> usize {
        self.index
    }

    fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}

impl Widget for NullRow {
    fn name(&self) -> &'static str {
        "null_row"
    }

    fn update_layout(
        &mut self,
        _core: &mut Core,
        _id: NodeId,
        explicit_width: Option<f32>,
        explicit_height: Option<f32>,
        out: &mut Bounds,
    ) -> Result<()> {
        out.set(
            explicit_width.unwrap_or(0.0),
            explicit_height.unwrap_or(self.height),
        );
        Ok(())
    }
}
