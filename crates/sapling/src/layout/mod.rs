//! Size constraints, layout hints, and the layout algorithms.
//!
//! A [`LayoutAlgorithm`] sizes and places a list of [`LayoutElements`]. The
//! same algorithm runs over free-standing [`Element`] vectors or over the
//! children of a node, through [`LayoutContainer`].

/// Minimum and maximum sizes.
mod constraints;
/// Per-element layout hints and alignment.
mod data;
/// Element access for algorithms.
mod element;
/// Greedy line-breaking layout.
mod flow;
/// Two-dimensional cell layout.
mod grid;
/// Single-row packing.
mod horizontal;
/// Line measurements shared by the flow layouts.
mod line;
/// Shared three-pass packing for the single-axis layouts.
mod stack;
/// Text line breaking.
pub mod text_flow;
/// Single-column packing.
mod vertical;

pub use constraints::{MinMax, SizeConstraints};
pub use data::{
    FlowHAlign, FlowHints, FlowVAlign, GridHints, HAlign, LayoutData, LayoutHints, VAlign,
};
pub use element::{ChildElements, Element, LayoutElements};
pub use flow::{FlowLayout, FlowLayoutStyle};
pub use grid::{GridColumn, GridLayout, GridLayoutStyle};
pub use horizontal::{HorizontalLayout, HorizontalLayoutStyle};
pub use line::LineInfo;
pub use vertical::{VerticalLayout, VerticalLayoutStyle};

use crate::{
    core::{flags::SIZE_CONSTRAINTS, id::{NodeId, TypedId}, world::Core},
    error::Result,
    geom::Bounds,
    widget::Widget,
};

/// Sizes and places a list of elements.
///
/// Implementations must be idempotent: running `layout` twice over the
/// same, unchanged elements produces the same sizes, positions and
/// measured bounds.
pub trait LayoutAlgorithm {
    /// Compute the smallest and largest size the layout can take. This pass
    /// must not depend on element placement.
    fn calculate_size_constraints(
        &self,
        elements: &mut dyn LayoutElements,
        out: &mut SizeConstraints,
    ) -> Result<()>;

    /// Size and place every element within the explicit size, and write
    /// the measured size of the whole layout to `out`.
    fn layout(
        &mut self,
        explicit_width: Option<f32>,
        explicit_height: Option<f32>,
        elements: &mut dyn LayoutElements,
        out: &mut Bounds,
    ) -> Result<()>;
}

/// A container widget whose children are sized and placed by a layout
/// algorithm.
///
/// Only children that should lay out (visible and included in layout) are
/// handed to the algorithm. The measured size never shrinks below the
/// container's explicit size.
#[derive(Debug, Default, Clone)]
pub struct LayoutContainer<A> {
    /// The algorithm.
    algorithm: A,
}

impl<A: LayoutAlgorithm + 'static> LayoutContainer<A> {
    /// Wrap an algorithm.
    pub fn new(algorithm: A) -> Self {
        Self { algorithm }
    }

    /// Create a container node driven by `algorithm`.
    pub fn create(core: &mut Core, algorithm: A) -> Result<TypedId<Self>> {
        core.create_container(Self::new(algorithm))
    }

    /// The algorithm.
    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    /// Mutate the algorithm of a container node, then invalidate its size
    /// constraints so the change is measured.
    pub fn configure<R>(
        core: &mut Core,
        id: TypedId<Self>,
        f: impl FnOnce(&mut A) -> R,
    ) -> Result<R> {
        let out = core.with_widget(id, |w: &mut Self, _| Ok(f(&mut w.algorithm)))?;
        core.invalidate(id, SIZE_CONSTRAINTS)?;
        Ok(out)
    }

    /// Run `f` with read access to the algorithm of a container node.
    pub fn inspect<R>(core: &mut Core, id: TypedId<Self>, f: impl FnOnce(&A) -> R) -> Result<R> {
        core.with_widget(id, |w: &mut Self, _| Ok(f(&w.algorithm)))
    }
}

impl<A: LayoutAlgorithm + 'static> Widget for LayoutContainer<A> {
    fn name(&self) -> &'static str {
        "layout"
    }

    fn update_size_constraints(
        &mut self,
        core: &mut Core,
        id: NodeId,
        out: &mut SizeConstraints,
    ) -> Result<()> {
        let mut elements = ChildElements::of(core, id)?;
        if !elements.is_empty() {
            self.algorithm
                .calculate_size_constraints(&mut elements, out)?;
        }
        Ok(())
    }

    fn update_layout(
        &mut self,
        core: &mut Core,
        id: NodeId,
        explicit_width: Option<f32>,
        explicit_height: Option<f32>,
        out: &mut Bounds,
    ) -> Result<()> {
        let mut elements = ChildElements::of(core, id)?;
        if !elements.is_empty() {
            self.algorithm
                .layout(explicit_width, explicit_height, &mut elements, out)?;
        }
        out.expand_to(explicit_width, explicit_height);
        Ok(())
    }
}

/// Clamp `v` to `[min, max]`. Unlike `f32::clamp` this never panics when
/// the bounds cross.
pub(crate) fn clamp(v: f32, min: f32, max: f32) -> f32 {
    v.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{testing::widgets::Block, widget::Group};

    #[test]
    fn container_lays_out_children() -> Result<()> {
        let mut core = Core::new();
        let row = LayoutContainer::create(&mut core, HorizontalLayout::default())?;
        let a = core.create(Block::new(10.0, 20.0))?;
        let b = core.create(Block::new(30.0, 10.0))?;
        let hidden = core.create(Block::new(100.0, 100.0))?;
        core.add_child_last(row, a)?;
        core.add_child_last(row, hidden)?;
        core.add_child_last(row, b)?;
        core.set_visible(hidden, false)?;

        assert_eq!(core.bounds(row)?, Bounds::new(45.0, 20.0));
        assert_eq!(core.position(b)?.x, 15.0);
        // Bottom aligned.
        assert_eq!(core.position(b)?.y, 10.0);

        LayoutContainer::configure(&mut core, row, |h| h.style.gap = 0.0)?;
        assert_eq!(core.width(row)?, 40.0);
        core.set_width(row, Some(100.0))?;
        assert_eq!(core.width(row)?, 100.0);
        Ok(())
    }

    #[test]
    fn child_resize_remeasures_parent() -> Result<()> {
        let mut core = Core::new();
        let col = LayoutContainer::create(&mut core, VerticalLayout::default())?;
        let a = core.create(Block::new(10.0, 20.0))?;
        core.add_child_last(col, a)?;
        assert_eq!(core.height(col)?, 20.0);
        core.set_layout_data(a, Some(LayoutData::new().with_height(50.0)))?;
        assert_eq!(core.height(col)?, 50.0);
        assert_eq!(core.explicit_height(a)?, Some(50.0));
        core.set_include_in_layout(a, false)?;
        assert_eq!(core.height(col)?, 0.0);
        Ok(())
    }

    #[test]
    fn empty_container_keeps_explicit_size() -> Result<()> {
        let mut core = Core::new();
        let row = LayoutContainer::create(&mut core, FlowLayout::default())?;
        core.set_size(row, Some(30.0), None)?;
        assert_eq!(core.bounds(row)?, Bounds::new(30.0, 0.0));
        let g = core.create(Group)?;
        let id = TypedId::new(g.id());
        assert!(LayoutContainer::<FlowLayout>::configure(&mut core, id, |_| ()).is_err());
        Ok(())
    }
}
