use std::{any::TypeId, collections::HashMap, rc::Rc};

use serde::{Deserialize, Serialize};

use crate::{
    core::{
        attachment::Attachment,
        camera::Camera,
        config::Config,
        derived,
        error::Result,
        flags::{Flags, STANDARD},
        id::NodeId,
        render::RenderFilter,
        signal::Listeners,
        validation::ValidationGraph,
        world::Core,
    },
    geom::{Bounds, Color, Mat4, Rect, Vec3},
    layout::{LayoutData, SizeConstraints},
    widget::Widget,
};

/// Validator stored in each node's validation graph.
pub type NodeValidator = fn(&mut Core, NodeId) -> Result<()>;

/// How a node takes part in hit testing and focus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractivityMode {
    /// Neither the node nor its descendants are interactive.
    None,
    /// Descendants are interactive, the node itself is not.
    Children,
    /// The node and its descendants are interactive.
    #[default]
    All,
    /// Like `All`, and the node is hit regardless of its bounds.
    Always,
}

impl InteractivityMode {
    /// True if the node itself accepts interaction.
    pub fn is_self_interactive(self) -> bool {
        matches!(self, Self::All | Self::Always)
    }
}

/// A render filter registered on a node.
pub(crate) struct FilterEntry {
    /// The filter.
    pub(crate) filter: Box<dyn RenderFilter>,
    /// Disabled filters are skipped.
    pub(crate) enabled: bool,
}

/// Core node data stored in the arena.
pub struct Node {
    /// Widget behavior and state. `None` while a widget hook is running.
    pub(crate) widget: Option<Box<dyn Widget>>,
    /// Widget name, cached at creation.
    pub(crate) name: &'static str,
    /// Derived-state dirty flags.
    pub(crate) graph: ValidationGraph<NodeValidator>,

    /// Container holding this node.
    pub(crate) parent: Option<NodeId>,
    /// Node that disposes this one when it is disposed.
    pub(crate) owner: Option<NodeId>,
    /// Nodes owned by this one, in creation order.
    pub(crate) owned: Vec<NodeId>,
    /// Children, for containers.
    pub(crate) children: Option<Vec<NodeId>>,

    /// Flags pushed down to children.
    pub(crate) cascading: Flags,
    /// Flags pulled up from children.
    pub(crate) bubbling: Flags,
    /// Flags that make the parent re-measure.
    pub(crate) layout_invalidating: Flags,

    /// Activation state.
    pub(crate) active: bool,
    /// Set once disposal has begun.
    pub(crate) disposing: bool,
    /// Visibility.
    pub(crate) visible: bool,
    /// Whether the parent's layout includes this node.
    pub(crate) include_in_layout: bool,

    /// Explicit width.
    pub(crate) explicit_width: Option<f32>,
    /// Explicit height.
    pub(crate) explicit_height: Option<f32>,
    /// Width used when there is no explicit width.
    pub(crate) default_width: Option<f32>,
    /// Height used when there is no explicit height.
    pub(crate) default_height: Option<f32>,
    /// Caller-supplied constraints applied on top of the measured ones.
    pub(crate) explicit_constraints: SizeConstraints,
    /// Validated size constraints.
    pub(crate) size_constraints: SizeConstraints,
    /// Validated bounds.
    pub(crate) bounds: Bounds,
    /// Hints for the parent's layout.
    pub(crate) layout_data: Option<LayoutData>,

    /// Position.
    pub(crate) position: Vec3,
    /// Euler rotation in radians.
    pub(crate) rotation: Vec3,
    /// Scale.
    pub(crate) scale: Vec3,
    /// Transform origin.
    pub(crate) origin: Vec3,
    /// Replaces the composed transform when set.
    pub(crate) custom_transform: Option<Mat4>,
    /// Validated local transform.
    pub(crate) transform: Mat4,
    /// Validated transform combined with the ancestry.
    pub(crate) concatenated_transform: Mat4,
    /// Cached inverse of the concatenated transform.
    pub(crate) inverse: Option<Mat4>,

    /// Local color tint.
    pub(crate) color_tint: Color,
    /// Validated tint combined with the ancestry.
    pub(crate) concatenated_color: Color,

    /// Own interactivity mode.
    pub(crate) interactivity: InteractivityMode,
    /// Validated mode after applying the ancestry.
    pub(crate) inherited_interactivity: InteractivityMode,

    /// Camera set on this node.
    pub(crate) camera_override: Option<Rc<dyn Camera>>,
    /// Validated camera.
    pub(crate) camera: Option<Rc<dyn Camera>>,
    /// Viewport set on this node.
    pub(crate) viewport_override: Option<Rect>,
    /// Validated viewport.
    pub(crate) viewport: Rect,

    /// Whether the node can take focus.
    pub(crate) focus_enabled: bool,
    /// Sort key within the focus scope.
    pub(crate) focus_order: f32,
    /// Whether the node's subtree sorts as one focus scope.
    pub(crate) focus_container: bool,

    /// Render filters in registration order.
    pub(crate) filters: Vec<FilterEntry>,
    /// Attachments keyed by type.
    pub(crate) attachments: HashMap<TypeId, Box<dyn Attachment>>,
    /// Notification lists.
    pub(crate) listeners: Listeners,
}

impl Node {
    /// Build a node with the standard validation graph.
    pub(crate) fn new(widget: Box<dyn Widget>, container: bool, config: &Config) -> Result<Self> {
        let mut graph = ValidationGraph::new();
        for (flag, deps) in STANDARD {
            graph.add_node(flag, deps, derived::validator_for(flag))?;
        }
        Ok(Self {
            name: widget.name(),
            widget: Some(widget),
            graph,
            parent: None,
            owner: None,
            owned: Vec::new(),
            children: container.then(Vec::new),
            cascading: config.cascading_flags,
            bubbling: config.bubbling_flags,
            layout_invalidating: config.layout_invalidating_flags,
            active: false,
            disposing: false,
            visible: true,
            include_in_layout: true,
            explicit_width: None,
            explicit_height: None,
            default_width: None,
            default_height: None,
            explicit_constraints: SizeConstraints::default(),
            size_constraints: SizeConstraints::default(),
            bounds: Bounds::default(),
            layout_data: None,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            origin: Vec3::ZERO,
            custom_transform: None,
            transform: Mat4::IDENTITY,
            concatenated_transform: Mat4::IDENTITY,
            inverse: None,
            color_tint: Color::WHITE,
            concatenated_color: Color::WHITE,
            interactivity: InteractivityMode::All,
            inherited_interactivity: InteractivityMode::All,
            camera_override: None,
            camera: None,
            viewport_override: None,
            viewport: Rect::EMPTY,
            focus_enabled: false,
            focus_order: 0.0,
            focus_container: false,
            filters: Vec::new(),
            attachments: HashMap::new(),
            listeners: Listeners::default(),
        })
    }

    /// The widget's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The containing node, if any.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The owning node, if any.
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    /// Children, or an empty slice for leaves.
    pub fn children(&self) -> &[NodeId] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// True for nodes that can hold children.
    pub fn is_container(&self) -> bool {
        self.children.is_some()
    }

    /// Activation state.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Visibility.
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Whether the parent's layout includes this node.
    pub fn include_in_layout(&self) -> bool {
        self.include_in_layout
    }

    /// True if the node takes part in its parent's layout.
    pub fn should_layout(&self) -> bool {
        self.visible && self.include_in_layout
    }

    /// Hints for the parent's layout.
    pub fn layout_data(&self) -> Option<LayoutData> {
        self.layout_data
    }

    /// Explicit width, if set.
    pub fn explicit_width(&self) -> Option<f32> {
        self.explicit_width
    }

    /// Explicit height, if set.
    pub fn explicit_height(&self) -> Option<f32> {
        self.explicit_height
    }

    /// Position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Own interactivity mode.
    pub fn interactivity_mode(&self) -> InteractivityMode {
        self.interactivity
    }

    /// The validation graph.
    pub fn graph(&self) -> &ValidationGraph<NodeValidator> {
        &self.graph
    }
}
