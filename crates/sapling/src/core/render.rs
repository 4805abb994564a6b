//! Rendering interfaces and the render walk.

use std::mem;

use crate::{
    core::{
        error::Result,
        flags::ALL,
        id::NodeId,
        world::Core,
    },
    geom::{Color, Mat4, Rect},
};

/// Receives geometry from widgets during a render walk.
pub trait RenderBatch {
    /// Submit a solid quad covering `rect` in the node's local space.
    fn draw_quad(&mut self, node: NodeId, rect: Rect, transform: &Mat4, color: Color);

    /// The tint multiplied into everything submitted.
    fn color_transform(&self) -> Color;

    /// Replace the tint multiplied into everything submitted.
    fn set_color_transform(&mut self, color: Color);

    /// Flush buffered geometry.
    fn flush(&mut self) {}
}

/// A wrapper around the rendering of a node and its subtree.
///
/// Filters on a node begin in reverse registration order before the node
/// draws, and end in registration order afterwards, so the first filter
/// registered is the outermost.
pub trait RenderFilter {
    /// Called before the node draws.
    fn begin(&mut self, clip: Rect, batch: &mut dyn RenderBatch);

    /// Called after the node and its children have drawn.
    fn end(&mut self, batch: &mut dyn RenderBatch);
}

/// Multiplies a tint into the batch's color transform for a subtree.
#[derive(Debug, Clone, Copy)]
pub struct ColorTransformationFilter {
    /// The tint to apply.
    pub color: Color,
    /// The batch tint replaced at `begin`.
    previous: Color,
}

impl ColorTransformationFilter {
    /// A filter applying `color`.
    pub fn new(color: Color) -> Self {
        Self {
            color,
            previous: Color::WHITE,
        }
    }
}

impl RenderFilter for ColorTransformationFilter {
    fn begin(&mut self, _clip: Rect, batch: &mut dyn RenderBatch) {
        self.previous = batch.color_transform();
        batch.set_color_transform(self.previous * self.color);
    }

    fn end(&mut self, batch: &mut dyn RenderBatch) {
        batch.set_color_transform(self.previous);
    }
}

/// Render a node and its visible descendants.
pub(crate) fn render(
    core: &mut Core,
    id: NodeId,
    clip: Rect,
    batch: &mut dyn RenderBatch,
) -> Result<()> {
    core.validate(id, ALL)?;
    let node = core.node(id)?;
    if !node.visible || node.concatenated_color.a <= 0.0 {
        return Ok(());
    }

    let mut filters = mem::take(&mut core.node_mut(id)?.filters);
    for f in filters.iter_mut().rev().filter(|f| f.enabled) {
        f.filter.begin(clip, batch);
    }

    let drawn = draw_subtree(core, id, clip, batch);

    for f in filters.iter_mut().filter(|f| f.enabled) {
        f.filter.end(batch);
    }
    if let Ok(node) = core.node_mut(id) {
        // Keep filters added while drawing after the existing ones.
        let added = mem::replace(&mut node.filters, filters);
        node.filters.extend(added);
    }
    drawn
}

/// Draw the widget, then its visible children in order.
fn draw_subtree(
    core: &mut Core,
    id: NodeId,
    clip: Rect,
    batch: &mut dyn RenderBatch,
) -> Result<()> {
    core.call_widget(id, |w, core| w.draw(core, id, clip, batch))?;
    let children = core.children(id)?;
    for child in children {
        if core.contains(child) && core.node(child)?.visible {
            render(core, child, clip, batch)?;
        }
    }
    Ok(())
}
