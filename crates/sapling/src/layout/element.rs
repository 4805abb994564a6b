use crate::{
    core::{id::NodeId, world::Core},
    error::{Error, Result},
    geom::{Bounds, Vec3},
    layout::{LayoutData, SizeConstraints},
};

/// Indexed access to the elements a layout algorithm sizes and places.
///
/// Sizes are read after they are set: `width` and `height` report the
/// element's measured size given the explicit size last passed to
/// `set_size`.
pub trait LayoutElements {
    /// Number of elements.
    fn len(&self) -> usize;

    /// True if there are no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Layout hints for element `i`.
    fn layout_data(&self, i: usize) -> Result<Option<LayoutData>>;

    /// Size constraints for element `i`.
    fn size_constraints(&mut self, i: usize) -> Result<SizeConstraints>;

    /// Measured width of element `i`.
    fn width(&mut self, i: usize) -> Result<f32>;

    /// Measured height of element `i`.
    fn height(&mut self, i: usize) -> Result<f32>;

    /// Set or clear the explicit size of element `i`.
    fn set_size(&mut self, i: usize, width: Option<f32>, height: Option<f32>) -> Result<()>;

    /// Set or clear the explicit width of element `i`, keeping its height.
    fn set_width(&mut self, i: usize, width: Option<f32>) -> Result<()>;

    /// Horizontal position of element `i`.
    fn x(&self, i: usize) -> Result<f32>;

    /// Vertical position of element `i`.
    fn y(&self, i: usize) -> Result<f32>;

    /// Place element `i`.
    fn move_to(&mut self, i: usize, x: f32, y: f32) -> Result<()>;
}

/// A free-standing layout element, for running algorithms without an arena.
///
/// An element measures as its explicit size, or its natural size on an axis
/// with no explicit size, clamped by its size constraints.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Element {
    /// Layout hints.
    pub layout_data: Option<LayoutData>,
    /// Size constraints.
    pub constraints: SizeConstraints,
    /// Size used on an axis with no explicit size.
    pub natural: Bounds,
    /// Explicit width.
    pub explicit_width: Option<f32>,
    /// Explicit height.
    pub explicit_height: Option<f32>,
    /// Position.
    pub x: f32,
    /// Position.
    pub y: f32,
}

impl Element {
    /// An element with the given natural size.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            natural: Bounds::new(width, height),
            ..Self::default()
        }
    }

    /// Attach layout hints.
    pub fn with_data(mut self, data: LayoutData) -> Self {
        self.layout_data = Some(data);
        self
    }

    /// Attach size constraints.
    pub fn with_constraints(mut self, constraints: SizeConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Measured width.
    pub fn width(&self) -> f32 {
        self.constraints
            .width
            .clamp_f32(self.explicit_width.unwrap_or(self.natural.width))
    }

    /// Measured height.
    pub fn height(&self) -> f32 {
        self.constraints
            .height
            .clamp_f32(self.explicit_height.unwrap_or(self.natural.height))
    }

    /// The right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width()
    }

    /// The bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height()
    }
}

/// Look up an element or fail with `IndexOutOfBounds`.
fn get(elements: &[Element], i: usize) -> Result<&Element> {
    elements.get(i).ok_or(Error::IndexOutOfBounds {
        index: i,
        len: elements.len(),
    })
}

/// Mutable variant of [`get`].
fn get_mut(elements: &mut [Element], i: usize) -> Result<&mut Element> {
    let len = elements.len();
    elements
        .get_mut(i)
        .ok_or(Error::IndexOutOfBounds { index: i, len })
}

impl LayoutElements for Vec<Element> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn layout_data(&self, i: usize) -> Result<Option<LayoutData>> {
        Ok(get(self, i)?.layout_data)
    }

    fn size_constraints(&mut self, i: usize) -> Result<SizeConstraints> {
        Ok(get(self, i)?.constraints)
    }

    fn width(&mut self, i: usize) -> Result<f32> {
        Ok(get(self, i)?.width())
    }

    fn height(&mut self, i: usize) -> Result<f32> {
        Ok(get(self, i)?.height())
    }

    fn set_size(&mut self, i: usize, width: Option<f32>, height: Option<f32>) -> Result<()> {
        let e = get_mut(self, i)?;
        e.explicit_width = width;
        e.explicit_height = height;
        Ok(())
    }

    fn set_width(&mut self, i: usize, width: Option<f32>) -> Result<()> {
        get_mut(self, i)?.explicit_width = width;
        Ok(())
    }

    fn x(&self, i: usize) -> Result<f32> {
        Ok(get(self, i)?.x)
    }

    fn y(&self, i: usize) -> Result<f32> {
        Ok(get(self, i)?.y)
    }

    fn move_to(&mut self, i: usize, x: f32, y: f32) -> Result<()> {
        let e = get_mut(self, i)?;
        e.x = x;
        e.y = y;
        Ok(())
    }
}

/// Child nodes of a container, seen as layout elements.
pub struct ChildElements<'a> {
    /// The arena.
    core: &'a mut Core,
    /// Children taking part in layout, in order.
    ids: Vec<NodeId>,
}

impl<'a> ChildElements<'a> {
    /// Wrap a list of nodes.
    pub fn new(core: &'a mut Core, ids: Vec<NodeId>) -> Self {
        Self { core, ids }
    }

    /// The children of `parent` that take part in layout.
    pub fn of(core: &'a mut Core, parent: NodeId) -> Result<Self> {
        let ids = core
            .children(parent)?
            .into_iter()
            .filter(|c| core.node(*c).is_ok_and(|n| n.should_layout()))
            .collect();
        Ok(Self { core, ids })
    }

    /// The wrapped node ids.
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    /// Node id of element `i`.
    fn id(&self, i: usize) -> Result<NodeId> {
        self.ids.get(i).copied().ok_or(Error::IndexOutOfBounds {
            index: i,
            len: self.ids.len(),
        })
    }
}

impl LayoutElements for ChildElements<'_> {
    fn len(&self) -> usize {
        self.ids.len()
    }

    fn layout_data(&self, i: usize) -> Result<Option<LayoutData>> {
        self.core.layout_data(self.id(i)?)
    }

    fn size_constraints(&mut self, i: usize) -> Result<SizeConstraints> {
        let id = self.id(i)?;
        self.core.size_constraints(id)
    }

    fn width(&mut self, i: usize) -> Result<f32> {
        let id = self.id(i)?;
        self.core.width(id)
    }

    fn height(&mut self, i: usize) -> Result<f32> {
        let id = self.id(i)?;
        self.core.height(id)
    }

    fn set_size(&mut self, i: usize, width: Option<f32>, height: Option<f32>) -> Result<()> {
        let id = self.id(i)?;
        self.core.set_size(id, width, height)
    }

    fn set_width(&mut self, i: usize, width: Option<f32>) -> Result<()> {
        let id = self.id(i)?;
        self.core.set_width(id, width)
    }

    fn x(&self, i: usize) -> Result<f32> {
        Ok(self.core.position(self.id(i)?)?.x)
    }

    fn y(&self, i: usize) -> Result<f32> {
        Ok(self.core.position(self.id(i)?)?.y)
    }

    fn move_to(&mut self, i: usize, x: f32, y: f32) -> Result<()> {
        let id = self.id(i)?;
        let z = self.core.position(id)?.z;
        self.core.set_position(id, Vec3::new(x, y, z))
    }
}
