use std::{cell::RefCell, rc::Rc};

use crate::{
    core::{id::NodeId, render::RenderBatch, world::Core},
    error::Result,
    geom::{Bounds, Color, Rect},
    layout::SizeConstraints,
    widget::Widget,
};

/// A leaf with a natural size that draws one quad.
///
/// Without an explicit size the block measures as its natural size. Its
/// size constraints are fixed at the natural size when `rigid` is set.
#[derive(Debug, Clone, Copy)]
pub struct Block {
    /// Natural width.
    pub width: f32,
    /// Natural height.
    pub height: f32,
    /// Report the natural size as the minimum.
    pub rigid: bool,
    /// Fill color.
    pub color: Color,
}

impl Block {
    /// A block of the given natural size.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            rigid: false,
            color: Color::WHITE,
        }
    }

    /// Report the natural size as the minimum size.
    pub fn rigid(mut self) -> Self {
        self.rigid = true;
        self
    }
}

impl Widget for Block {
    fn name(&self) -> &'static str {
        "block"
    }

    fn update_size_constraints(
        &mut self,
        _core: &mut Core,
        _id: NodeId,
        out: &mut SizeConstraints,
    ) -> Result<()> {
        if self.rigid {
            out.width.min = Some(self.width);
            out.height.min = Some(self.height);
        }
        Ok(())
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
            explicit_width.unwrap_or(self.width),
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
        let color = core.concatenated_color(id)? * self.color;
        batch.draw_quad(id, b.rect(), &m, color);
        Ok(())
    }
}

/// Shared record of widget hook calls.
pub type ProbeLog = Rc<RefCell<Vec<(NodeId, &'static str)>>>;

/// A container widget that records every hook it receives.
#[derive(Debug, Clone, Default)]
pub struct Probe {
    /// Where calls are recorded.
    pub log: ProbeLog,
}

impl Probe {
    /// A probe writing to `log`.
    pub fn new(log: &ProbeLog) -> Self {
        Self {
            log: Rc::clone(log),
        }
    }

    /// Record a hook.
    fn record(&self, id: NodeId, hook: &'static str) {
        self.log.borrow_mut().push((id, hook));
    }
}

impl Widget for Probe {
    fn name(&self) -> &'static str {
        "probe"
    }

    fn on_create(&mut self, _core: &mut Core, id: NodeId) -> Result<()> {
        self.record(id, "create");
        Ok(())
    }

    fn update_styles(&mut self, _core: &mut Core, id: NodeId) -> Result<()> {
        self.record(id, "styles");
        Ok(())
    }

    fn update_size_constraints(
        &mut self,
        _core: &mut Core,
        id: NodeId,
        _out: &mut SizeConstraints,
    ) -> Result<()> {
        self.record(id, "size_constraints");
        Ok(())
    }

    fn update_layout(
        &mut self,
        _core: &mut Core,
        id: NodeId,
        _explicit_width: Option<f32>,
        _explicit_height: Option<f32>,
        _out: &mut Bounds,
    ) -> Result<()> {
        self.record(id, "layout");
        Ok(())
    }

    fn draw(
        &mut self,
        _core: &mut Core,
        id: NodeId,
        _clip: Rect,
        _batch: &mut dyn RenderBatch,
    ) -> Result<()> {
        self.record(id, "draw");
        Ok(())
    }

    fn on_activated(&mut self, _core: &mut Core, id: NodeId) -> Result<()> {
        self.record(id, "activated");
        Ok(())
    }

    fn on_deactivated(&mut self, _core: &mut Core, id: NodeId) -> Result<()> {
        self.record(id, "deactivated");
        Ok(())
    }

    fn on_disposed(&mut self, _core: &mut Core, id: NodeId) -> Result<()> {
        self.record(id, "disposed");
        Ok(())
    }
}
