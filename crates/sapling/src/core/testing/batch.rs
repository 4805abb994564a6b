use crate::{
    core::{id::NodeId, render::RenderBatch},
    geom::{Color, Mat4, Rect},
};

/// One recorded `draw_quad` call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Submitting node.
    pub node: NodeId,
    /// Quad in the node's local space.
    pub rect: Rect,
    /// The node's concatenated transform.
    pub transform: Mat4,
    /// Quad color with the batch tint applied.
    pub color: Color,
}

/// Collects draw calls in submission order.
#[derive(Debug, Clone)]
pub struct RecordingBatch {
    /// Recorded calls.
    pub calls: Vec<DrawCall>,
    /// Current tint.
    tint: Color,
    /// Number of flushes.
    pub flushes: usize,
}

impl Default for RecordingBatch {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            tint: Color::WHITE,
            flushes: 0,
        }
    }
}

impl RecordingBatch {
    /// An empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes that drew, in order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.calls.iter().map(|c| c.node).collect()
    }
}

impl RenderBatch for RecordingBatch {
    fn draw_quad(&mut self, node: NodeId, rect: Rect, transform: &Mat4, color: Color) {
        self.calls.push(DrawCall {
            node,
            rect,
            transform: *transform,
            color: self.tint * color,
        });
    }

    fn color_transform(&self) -> Color {
        self.tint
    }

    fn set_color_transform(&mut self, color: Color) {
        self.tint = color;
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}
