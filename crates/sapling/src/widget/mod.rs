//! Widget trait: the behavior attached to nodes in the Core arena.

use std::any::{Any, type_name};

use crate::{
    core::{id::NodeId, render::RenderBatch, world::Core},
    error::Result,
    geom::{Bounds, Rect},
    layout::SizeConstraints,
};

/// Widgets are the behavior attached to nodes in the Core arena.
///
/// Every hook receives the arena and the id of the node the widget belongs
/// to. While a hook runs the widget is detached from its node, so the hook
/// may freely read and mutate other nodes, including its own node's
/// properties. Reaching this widget again through the arena in the
/// meantime fails with [`Error::ReentrantWidgetBorrow`](crate::error::Error).
pub trait Widget: Any {
    /// Widget name used in diagnostics.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    /// Called once, right after the node is inserted into the arena.
    /// Widgets register custom validation flags here.
    fn on_create(&mut self, _core: &mut Core, _id: NodeId) -> Result<()> {
        Ok(())
    }

    /// Recompute style-derived state. Runs when STYLES is validated.
    fn update_styles(&mut self, _core: &mut Core, _id: NodeId) -> Result<()> {
        Ok(())
    }

    /// Report minimum and maximum dimensions. `out` starts cleared; the
    /// node's explicit constraints are applied afterwards.
    fn update_size_constraints(
        &mut self,
        _core: &mut Core,
        _id: NodeId,
        _out: &mut SizeConstraints,
    ) -> Result<()> {
        Ok(())
    }

    /// Measure and lay out. `out` starts as the explicit size, or zero on an
    /// axis with no explicit size.
    fn update_layout(
        &mut self,
        _core: &mut Core,
        _id: NodeId,
        _explicit_width: Option<f32>,
        _explicit_height: Option<f32>,
        _out: &mut Bounds,
    ) -> Result<()> {
        Ok(())
    }

    /// Submit this widget's own geometry. Children are drawn afterwards by
    /// the core.
    fn draw(
        &mut self,
        _core: &mut Core,
        _id: NodeId,
        _clip: Rect,
        _batch: &mut dyn RenderBatch,
    ) -> Result<()> {
        Ok(())
    }

    /// Called after the node becomes active.
    fn on_activated(&mut self, _core: &mut Core, _id: NodeId) -> Result<()> {
        Ok(())
    }

    /// Called after the node becomes inactive.
    fn on_deactivated(&mut self, _core: &mut Core, _id: NodeId) -> Result<()> {
        Ok(())
    }

    /// Called once when disposal begins, before children and owned nodes are
    /// released.
    fn on_disposed(&mut self, _core: &mut Core, _id: NodeId) -> Result<()> {
        Ok(())
    }
}

/// A widget with no behavior of its own, useful for plain containers.
#[derive(Debug, Default, Clone, Copy)]
pub struct Group;

impl Widget for Group {
    fn name(&self) -> &'static str {
        "group"
    }
}

/// Placeholder that reserves a position among its container's children.
///
/// Content assigned with [`Core::set_slot`] is inserted directly after the
/// slot. The slot itself never renders and never takes part in layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct Slot {
    /// The node currently filling the slot.
    pub(crate) content: Option<NodeId>,
}

impl Slot {
    /// The node currently filling the slot.
    pub fn content(&self) -> Option<NodeId> {
        self.content
    }
}

impl Widget for Slot {
    fn name(&self) -> &'static str {
        "slot"
    }
}

/// Downcast a widget to a concrete type.
pub(crate) fn downcast_mut<W: Widget>(widget: &mut dyn Widget) -> Option<&mut W> {
    let any = widget as &mut dyn Any;
    any.downcast_mut::<W>()
}
