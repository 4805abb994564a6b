use std::{
    any::{Any, TypeId, type_name},
    cell::RefCell,
    collections::HashMap,
    mem,
    rc::{Rc, Weak},
};

use slotmap::SlotMap;

use super::{container, focus, hit, lifecycle, render, time::TimeDriver};
use crate::{
    core::{
        attachment::Attachment,
        camera::Camera,
        config::Config,
        flags::{
            self, ALL, CAMERA, COLOR_TRANSFORM, CONCATENATED_COLOR_TRANSFORM,
            CONCATENATED_TRANSFORM, Flags, INTERACTIVITY_MODE, LAYOUT, LAYOUT_ENABLED,
            SIZE_CONSTRAINTS, TRANSFORM, VIEWPORT,
        },
        id::{NodeId, TypedId},
        node::{FilterEntry, InteractivityMode, Node, NodeValidator},
        render::{RenderBatch, RenderFilter},
        signal::{InvalidatedListener, ListenerId, NodeListener},
        time::{TickCallback, TickId},
        validation::{self, ValidationGraph, Validated},
    },
    error::{Error, Result},
    geom::{Bounds, Color, Mat4, Ray, Rect, Vec3},
    layout::{LayoutData, SizeConstraints},
    widget::{Slot, Widget, downcast_mut},
};

/// Construction options for a node.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeOptions {
    /// Node disposed together with the new node's owner.
    pub owner: Option<NodeId>,
    /// Whether the node can hold children.
    pub container: bool,
    /// Overrides [`Config::cascading_flags`].
    pub cascading: Option<Flags>,
    /// Overrides [`Config::bubbling_flags`].
    pub bubbling: Option<Flags>,
    /// Overrides [`Config::layout_invalidating_flags`].
    pub layout_invalidating: Option<Flags>,
}

impl NodeOptions {
    /// Options for a container node.
    pub fn container() -> Self {
        Self {
            container: true,
            ..Self::default()
        }
    }

    /// Set the owner.
    pub fn owned_by(mut self, owner: impl Into<NodeId>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Override the cascading flags.
    pub fn with_cascading(mut self, flags: Flags) -> Self {
        self.cascading = Some(flags);
        self
    }

    /// Override the bubbling flags.
    pub fn with_bubbling(mut self, flags: Flags) -> Self {
        self.bubbling = Some(flags);
        self
    }

    /// Override the layout-invalidating flags.
    pub fn with_layout_invalidating(mut self, flags: Flags) -> Self {
        self.layout_invalidating = Some(flags);
        self
    }
}

/// Queue shared between a core and its [`Invalidator`] handles.
type InvalidationQueue = RefCell<Vec<(NodeId, Flags)>>;

/// A handle that invalidates a node from code that cannot borrow the core.
///
/// Invalidations are queued and applied at the start of the next
/// `validate`, `update` or `render`, or by
/// [`Core::flush_invalidations`].
#[derive(Debug, Clone)]
pub struct Invalidator {
    /// Target node.
    node: NodeId,
    /// The core's queue. Dead once the core is dropped.
    queue: Weak<InvalidationQueue>,
}

impl Invalidator {
    /// Queue an invalidation of `flags`.
    pub fn invalidate(&self, flags: Flags) {
        if let Some(q) = self.queue.upgrade() {
            q.borrow_mut().push((self.node, flags));
        }
    }

    /// The target node.
    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// Drives validation of one node in the arena.
struct NodeValidation<'a> {
    /// The arena.
    core: &'a mut Core,
    /// Node being validated.
    id: NodeId,
    /// Step bound.
    limit: usize,
}

impl Validated for NodeValidation<'_> {
    type Validator = NodeValidator;

    fn graph(&mut self) -> Option<&mut ValidationGraph<NodeValidator>> {
        self.core.nodes.get_mut(self.id).map(|n| &mut n.graph)
    }

    fn run(&mut self, _flag: Flags, validator: NodeValidator) -> Result<()> {
        validator(self.core, self.id)
    }

    fn step_limit(&self) -> usize {
        self.limit
    }
}

/// The component arena: node storage, validation, hierarchy and focus.
pub struct Core {
    /// Node storage arena.
    pub(crate) nodes: SlotMap<NodeId, Node>,
    /// Immutable configuration.
    pub(crate) config: Config,
    /// Currently focused node.
    pub(crate) focus: Option<NodeId>,
    /// Bumped whenever focus order may have changed.
    pub(crate) focus_gen: u64,
    /// Focus orders computed since the last bump, by root.
    pub(crate) focus_orders: HashMap<NodeId, Vec<NodeId>>,
    /// Set when anything visible was invalidated.
    pub(crate) render_requested: bool,
    /// Invalidations queued through [`Invalidator`] handles.
    pub(crate) deferred: Rc<InvalidationQueue>,
    /// Tick callbacks.
    pub(crate) time: TimeDriver,
}

impl Default for Core {
    fn default() -> Self {
        Self::new()
    }
}

impl Core {
    /// A core with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// A core with the given configuration, fixed for its lifetime.
    pub fn with_config(config: Config) -> Self {
        let time = TimeDriver::new(config.tick_time, config.max_ticks_per_update);
        Self {
            nodes: SlotMap::with_key(),
            config,
            focus: None,
            focus_gen: 1,
            focus_orders: HashMap::new(),
            render_requested: false,
            deferred: Rc::new(RefCell::new(Vec::new())),
            time,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    //
    // Nodes
    //

    /// Create a leaf node.
    pub fn create<W: Widget>(&mut self, widget: W) -> Result<TypedId<W>> {
        self.create_with(widget, NodeOptions::default())
    }

    /// Create a container node.
    pub fn create_container<W: Widget>(&mut self, widget: W) -> Result<TypedId<W>> {
        self.create_with(widget, NodeOptions::container())
    }

    /// Create a node with explicit options.
    pub fn create_with<W: Widget>(&mut self, widget: W, opts: NodeOptions) -> Result<TypedId<W>> {
        let mut node = Node::new(Box::new(widget), opts.container, &self.config)?;
        if let Some(c) = opts.cascading {
            node.cascading = c;
        }
        if let Some(b) = opts.bubbling {
            node.bubbling = b;
        }
        if let Some(l) = opts.layout_invalidating {
            node.layout_invalidating = l;
        }
        if let Some(owner) = opts.owner {
            if self.node(owner)?.disposing {
                return Err(Error::Disposed(owner));
            }
            node.owner = Some(owner);
        }
        let name = node.name;
        let id = self.nodes.insert(node);
        if let Some(owner) = opts.owner {
            self.node_mut(owner)?.owned.push(id);
        }
        tracing::debug!(?id, name, "create");
        self.call_widget(id, |w, core| w.on_create(core, id))?;
        Ok(TypedId::new(id))
    }

    /// True if `id` names a live node.
    pub fn contains(&self, id: impl Into<NodeId>) -> bool {
        self.nodes.contains_key(id.into())
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Read access to a node.
    pub fn node(&self, id: impl Into<NodeId>) -> Result<&Node> {
        let id = id.into();
        self.nodes.get(id).ok_or(Error::Disposed(id))
    }

    /// Mutable access to a node.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id).ok_or(Error::Disposed(id))
    }

    /// Register a widget-specific validation flag on a node.
    pub fn add_validation_node(
        &mut self,
        id: impl Into<NodeId>,
        flag: Flags,
        dependencies: Flags,
        validator: NodeValidator,
    ) -> Result<()> {
        self.node_mut(id.into())?
            .graph
            .add_node(flag, dependencies, validator)
    }

    //
    // Widgets
    //

    /// Run `f` with the node's widget detached from the arena.
    pub(crate) fn call_widget<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut dyn Widget, &mut Self) -> Result<R>,
    ) -> Result<R> {
        let node = self.node_mut(id)?;
        let mut widget = node.widget.take().ok_or(Error::ReentrantWidgetBorrow(id))?;
        let out = f(widget.as_mut(), self);
        if let Some(node) = self.nodes.get_mut(id) {
            node.widget = Some(widget);
        }
        out
    }

    /// Execute a closure with mutable access to a widget of type `W`.
    /// Invalidations queued by the closure are flushed afterwards.
    pub fn with_widget<W, R>(
        &mut self,
        id: impl Into<NodeId>,
        f: impl FnOnce(&mut W, &mut Self) -> Result<R>,
    ) -> Result<R>
    where
        W: Widget,
    {
        let id = id.into();
        let out = self.call_widget(id, |w, core| {
            let widget = downcast_mut::<W>(w).ok_or_else(|| {
                Error::Invalid(format!("expected widget type {}", type_name::<W>()))
            })?;
            f(widget, core)
        })?;
        self.flush_invalidations()?;
        Ok(out)
    }

    //
    // Validation
    //

    /// Mark flags dirty on a node. Returns the flags that went from clean to
    /// dirty.
    ///
    /// When anything changed: a render is requested, containers cascade
    /// their cascading flags to every child, the parent is notified, and
    /// the `invalidated` listeners fire.
    pub fn invalidate(&mut self, id: impl Into<NodeId>, flags: Flags) -> Result<Flags> {
        let id = id.into();
        let node = self.node_mut(id)?;
        let changed = node.graph.invalidate(flags);
        if changed == 0 {
            return Ok(0);
        }
        let cascade = changed & node.cascading;
        let children = match (&node.children, cascade) {
            (Some(c), f) if f != 0 => c.clone(),
            _ => Vec::new(),
        };
        let parent = node.parent;
        tracing::trace!(?id, flags = %flags::describe(changed), "invalidate");
        self.render_requested = true;

        for child in children {
            if self.contains(child) {
                self.invalidate(child, cascade)?;
            }
        }
        if let Some(p) = parent
            && self.contains(p)
        {
            container::child_invalidated(self, p, id, changed)?;
        }
        let listeners = match self.nodes.get(id) {
            Some(n) => n.listeners.invalidated.snapshot(),
            None => Vec::new(),
        };
        for l in listeners {
            l(self, id, changed);
        }
        Ok(changed)
    }

    /// Resolve dirty flags on a node. A no-op for disposed nodes.
    pub fn validate(&mut self, id: impl Into<NodeId>, flags: Flags) -> Result<()> {
        let id = id.into();
        self.flush_invalidations()?;
        if !self.nodes.contains_key(id) {
            return Ok(());
        }
        let limit = self.config.max_validation_steps;
        validation::validate(
            &mut NodeValidation {
                core: self,
                id,
                limit,
            },
            flags,
        )
    }

    /// Validate everything on a node, then on its children, depth-first.
    pub fn update(&mut self, id: impl Into<NodeId>) -> Result<()> {
        let id = id.into();
        self.validate(id, ALL)?;
        for child in self.children(id)? {
            if self.contains(child) {
                self.update(child)?;
            }
        }
        Ok(())
    }

    /// Dirty flags on a node.
    pub fn invalid_flags(&self, id: impl Into<NodeId>) -> Result<Flags> {
        Ok(self.node(id)?.graph.invalid_flags())
    }

    /// True if none of `flags` is dirty on a live node.
    pub fn is_valid(&self, id: impl Into<NodeId>, flags: Flags) -> bool {
        self.node(id).is_ok_and(|n| n.graph.is_valid(flags))
    }

    /// True while the node's LAYOUT validator is running.
    pub fn is_validating_layout(&self, id: impl Into<NodeId>) -> bool {
        self.node(id)
            .is_ok_and(|n| n.graph.current_flag() == Some(LAYOUT))
    }

    /// A handle that queues invalidations of `id`.
    pub fn invalidator(&self, id: impl Into<NodeId>) -> Invalidator {
        Invalidator {
            node: id.into(),
            queue: Rc::downgrade(&self.deferred),
        }
    }

    /// Apply invalidations queued through [`Invalidator`] handles.
    pub fn flush_invalidations(&mut self) -> Result<()> {
        loop {
            let pending = mem::take(&mut *self.deferred.borrow_mut());
            if pending.is_empty() {
                return Ok(());
            }
            for (id, flags) in pending {
                if self.contains(id) {
                    self.invalidate(id, flags)?;
                }
            }
        }
    }

    //
    // Lifecycle
    //

    /// Activate a node and its subtree.
    pub fn activate(&mut self, id: impl Into<NodeId>) -> Result<()> {
        lifecycle::activate(self, id.into())
    }

    /// Deactivate a node and its subtree.
    pub fn deactivate(&mut self, id: impl Into<NodeId>) -> Result<()> {
        lifecycle::deactivate(self, id.into())
    }

    /// Dispose a detached node, its owned nodes and its attachments.
    /// Children are detached, not disposed.
    pub fn dispose(&mut self, id: impl Into<NodeId>) -> Result<()> {
        lifecycle::dispose(self, id.into())
    }

    /// Activation state.
    pub fn is_active(&self, id: impl Into<NodeId>) -> bool {
        self.node(id).is_ok_and(|n| n.active)
    }

    //
    // Listeners
    //

    /// Listen for invalidations that changed something.
    pub fn on_invalidated(
        &mut self,
        id: impl Into<NodeId>,
        f: impl Fn(&mut Self, NodeId, Flags) + 'static,
    ) -> Result<ListenerId> {
        let f: Rc<InvalidatedListener> = Rc::new(f);
        Ok(self.node_mut(id.into())?.listeners.invalidated.connect(f))
    }

    /// Listen for activation.
    pub fn on_activated(
        &mut self,
        id: impl Into<NodeId>,
        f: impl Fn(&mut Self, NodeId) + 'static,
    ) -> Result<ListenerId> {
        let f: Rc<NodeListener> = Rc::new(f);
        Ok(self.node_mut(id.into())?.listeners.activated.connect(f))
    }

    /// Listen for deactivation.
    pub fn on_deactivated(
        &mut self,
        id: impl Into<NodeId>,
        f: impl Fn(&mut Self, NodeId) + 'static,
    ) -> Result<ListenerId> {
        let f: Rc<NodeListener> = Rc::new(f);
        Ok(self.node_mut(id.into())?.listeners.deactivated.connect(f))
    }

    /// Listen for disposal.
    pub fn on_disposed(
        &mut self,
        id: impl Into<NodeId>,
        f: impl Fn(&mut Self, NodeId) + 'static,
    ) -> Result<ListenerId> {
        let f: Rc<NodeListener> = Rc::new(f);
        Ok(self.node_mut(id.into())?.listeners.disposed.connect(f))
    }

    /// Disconnect a listener of any kind. Returns false if it was not
    /// connected.
    pub fn disconnect(&mut self, id: impl Into<NodeId>, listener: ListenerId) -> Result<bool> {
        let l = &mut self.node_mut(id.into())?.listeners;
        Ok(l.invalidated.disconnect(listener)
            || l.activated.disconnect(listener)
            || l.deactivated.disconnect(listener)
            || l.disposed.disconnect(listener))
    }

    //
    // Hierarchy
    //

    /// The containing node.
    pub fn parent(&self, id: impl Into<NodeId>) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    /// The owning node.
    pub fn owner(&self, id: impl Into<NodeId>) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.owner)
    }

    /// A copy of the node's children. Empty for leaves.
    pub fn children(&self, id: impl Into<NodeId>) -> Result<Vec<NodeId>> {
        Ok(self.node(id)?.children().to_vec())
    }

    /// Number of children.
    pub fn child_count(&self, id: impl Into<NodeId>) -> Result<usize> {
        Ok(self.node(id)?.children().len())
    }

    /// Position of `child` among the children of `parent`.
    pub fn index_of_child(
        &self,
        parent: impl Into<NodeId>,
        child: impl Into<NodeId>,
    ) -> Result<Option<usize>> {
        let child = child.into();
        Ok(self.node(parent)?.children().iter().position(|c| *c == child))
    }

    /// Insert `child` at `index`. If the child already belongs to `parent` it
    /// is moved instead; `index` then refers to the list before removal.
    pub fn add_child(
        &mut self,
        parent: impl Into<NodeId>,
        index: usize,
        child: impl Into<NodeId>,
    ) -> Result<()> {
        container::add_child(self, parent.into(), index, child.into())
    }

    /// Append `child`.
    pub fn add_child_last(
        &mut self,
        parent: impl Into<NodeId>,
        child: impl Into<NodeId>,
    ) -> Result<()> {
        let parent = parent.into();
        let len = self.container_children(parent)?.len();
        container::add_child(self, parent, len, child.into())
    }

    /// Insert `child` directly after `anchor`.
    pub fn add_child_after(
        &mut self,
        parent: impl Into<NodeId>,
        child: impl Into<NodeId>,
        anchor: impl Into<NodeId>,
    ) -> Result<()> {
        let parent = parent.into();
        let index = container::anchor_index(self, parent, anchor.into())?;
        container::add_child(self, parent, index + 1, child.into())
    }

    /// Insert `child` directly before `anchor`.
    pub fn add_child_before(
        &mut self,
        parent: impl Into<NodeId>,
        child: impl Into<NodeId>,
        anchor: impl Into<NodeId>,
    ) -> Result<()> {
        let parent = parent.into();
        let index = container::anchor_index(self, parent, anchor.into())?;
        container::add_child(self, parent, index, child.into())
    }

    /// Detach and return the child at `index`.
    pub fn remove_child_at(&mut self, parent: impl Into<NodeId>, index: usize) -> Result<NodeId> {
        container::remove_child_at(self, parent.into(), index)
    }

    /// Detach `child`. Returns false if it was not a child of `parent`.
    pub fn remove_child(
        &mut self,
        parent: impl Into<NodeId>,
        child: impl Into<NodeId>,
    ) -> Result<bool> {
        container::remove_child(self, parent.into(), child.into())
    }

    /// Detach every child, last to first, optionally disposing each one.
    pub fn clear_children(&mut self, parent: impl Into<NodeId>, dispose: bool) -> Result<()> {
        container::clear_children(self, parent.into(), dispose)
    }

    /// The children of a container, or `NotAContainer`.
    pub(crate) fn container_children(&self, id: NodeId) -> Result<&Vec<NodeId>> {
        self.node(id)?
            .children
            .as_ref()
            .ok_or(Error::NotAContainer(id))
    }

    /// Append a placeholder child that reserves a position for content set
    /// later with [`set_slot`](Self::set_slot).
    pub fn create_slot(&mut self, parent: impl Into<NodeId>) -> Result<TypedId<Slot>> {
        let parent = parent.into();
        let slot = self.create_with(Slot::default(), NodeOptions::default().owned_by(parent))?;
        {
            let node = self.node_mut(slot.id())?;
            node.visible = false;
            node.include_in_layout = false;
        }
        self.add_child_last(parent, slot)?;
        Ok(slot)
    }

    /// Fill a slot, replacing its previous content. The previous content is
    /// detached, not disposed, and returned.
    pub fn set_slot(
        &mut self,
        slot: TypedId<Slot>,
        content: Option<NodeId>,
    ) -> Result<Option<NodeId>> {
        container::set_slot(self, slot.id(), content)
    }

    /// The root of the node's parent chain.
    pub fn root_of(&self, id: impl Into<NodeId>) -> Result<NodeId> {
        let mut id = id.into();
        while let Some(p) = self.node(id)?.parent {
            id = p;
        }
        Ok(id)
    }

    /// The node followed by its ancestors, nearest first.
    pub fn ancestry(&self, id: impl Into<NodeId>) -> Result<Vec<NodeId>> {
        let mut id = id.into();
        let mut out = vec![id];
        while let Some(p) = self.node(id)?.parent {
            out.push(p);
            id = p;
        }
        Ok(out)
    }

    /// True if `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor_of(&self, ancestor: impl Into<NodeId>, id: impl Into<NodeId>) -> bool {
        let ancestor = ancestor.into();
        let mut cur = self.nodes.get(id.into()).and_then(|n| n.parent);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.nodes.get(p).and_then(|n| n.parent);
        }
        false
    }

    /// True if `id` is a strict descendant of `ancestor`.
    pub fn is_descendant_of(&self, id: impl Into<NodeId>, ancestor: impl Into<NodeId>) -> bool {
        self.is_ancestor_of(ancestor, id)
    }

    /// True if `owner` owns `id`, directly or through other owned nodes.
    pub fn owns(&self, owner: impl Into<NodeId>, id: impl Into<NodeId>) -> bool {
        let owner = owner.into();
        let mut cur = self.nodes.get(id.into()).and_then(|n| n.owner);
        while let Some(o) = cur {
            if o == owner {
                return true;
            }
            cur = self.nodes.get(o).and_then(|n| n.owner);
        }
        false
    }

    //
    // Size
    //

    /// Measured width. Validates layout.
    pub fn width(&mut self, id: impl Into<NodeId>) -> Result<f32> {
        Ok(self.bounds(id)?.width)
    }

    /// Measured height. Validates layout.
    pub fn height(&mut self, id: impl Into<NodeId>) -> Result<f32> {
        Ok(self.bounds(id)?.height)
    }

    /// Measured bounds. Validates layout.
    pub fn bounds(&mut self, id: impl Into<NodeId>) -> Result<Bounds> {
        let id = id.into();
        self.validate(id, LAYOUT)?;
        Ok(self.node(id)?.bounds)
    }

    /// Explicit width.
    pub fn explicit_width(&self, id: impl Into<NodeId>) -> Result<Option<f32>> {
        Ok(self.node(id)?.explicit_width)
    }

    /// Explicit height.
    pub fn explicit_height(&self, id: impl Into<NodeId>) -> Result<Option<f32>> {
        Ok(self.node(id)?.explicit_height)
    }

    /// Set or clear the explicit width.
    pub fn set_width(&mut self, id: impl Into<NodeId>, width: Option<f32>) -> Result<()> {
        let id = id.into();
        check_size(id, width)?;
        self.set_prop(id, LAYOUT, |n| &mut n.explicit_width, width)
    }

    /// Set or clear the explicit height.
    pub fn set_height(&mut self, id: impl Into<NodeId>, height: Option<f32>) -> Result<()> {
        let id = id.into();
        check_size(id, height)?;
        self.set_prop(id, LAYOUT, |n| &mut n.explicit_height, height)
    }

    /// Set or clear both explicit dimensions.
    pub fn set_size(
        &mut self,
        id: impl Into<NodeId>,
        width: Option<f32>,
        height: Option<f32>,
    ) -> Result<()> {
        let id = id.into();
        check_size(id, width)?;
        check_size(id, height)?;
        self.set_width(id, width)?;
        self.set_height(id, height)
    }

    /// Set the size used when there is no explicit size.
    pub fn set_default_size(
        &mut self,
        id: impl Into<NodeId>,
        width: Option<f32>,
        height: Option<f32>,
    ) -> Result<()> {
        let id = id.into();
        check_size(id, width)?;
        check_size(id, height)?;
        self.set_prop(id, LAYOUT, |n| &mut n.default_width, width)?;
        self.set_prop(id, LAYOUT, |n| &mut n.default_height, height)
    }

    /// Set the caller-supplied minimum width.
    pub fn set_min_width(&mut self, id: impl Into<NodeId>, v: Option<f32>) -> Result<()> {
        self.set_prop(
            id.into(),
            SIZE_CONSTRAINTS,
            |n| &mut n.explicit_constraints.width.min,
            v,
        )
    }

    /// Set the caller-supplied maximum width.
    pub fn set_max_width(&mut self, id: impl Into<NodeId>, v: Option<f32>) -> Result<()> {
        self.set_prop(
            id.into(),
            SIZE_CONSTRAINTS,
            |n| &mut n.explicit_constraints.width.max,
            v,
        )
    }

    /// Set the caller-supplied minimum height.
    pub fn set_min_height(&mut self, id: impl Into<NodeId>, v: Option<f32>) -> Result<()> {
        self.set_prop(
            id.into(),
            SIZE_CONSTRAINTS,
            |n| &mut n.explicit_constraints.height.min,
            v,
        )
    }

    /// Set the caller-supplied maximum height.
    pub fn set_max_height(&mut self, id: impl Into<NodeId>, v: Option<f32>) -> Result<()> {
        self.set_prop(
            id.into(),
            SIZE_CONSTRAINTS,
            |n| &mut n.explicit_constraints.height.max,
            v,
        )
    }

    /// Validated size constraints.
    pub fn size_constraints(&mut self, id: impl Into<NodeId>) -> Result<SizeConstraints> {
        let id = id.into();
        self.validate(id, SIZE_CONSTRAINTS)?;
        Ok(self.node(id)?.size_constraints)
    }

    /// Layout hints.
    pub fn layout_data(&self, id: impl Into<NodeId>) -> Result<Option<LayoutData>> {
        Ok(self.node(id)?.layout_data)
    }

    /// Replace the layout hints.
    pub fn set_layout_data(
        &mut self,
        id: impl Into<NodeId>,
        data: Option<LayoutData>,
    ) -> Result<()> {
        self.set_prop(id.into(), LAYOUT, |n| &mut n.layout_data, data)
    }

    //
    // Visibility
    //

    /// Visibility.
    pub fn visible(&self, id: impl Into<NodeId>) -> Result<bool> {
        Ok(self.node(id)?.visible)
    }

    /// Show or hide a node.
    pub fn set_visible(&mut self, id: impl Into<NodeId>, visible: bool) -> Result<()> {
        let id = id.into();
        if self.node(id)?.visible != visible {
            self.invalidate_focus_order();
        }
        self.set_prop(id, LAYOUT_ENABLED, |n| &mut n.visible, visible)
    }

    /// Whether the parent's layout includes the node.
    pub fn include_in_layout(&self, id: impl Into<NodeId>) -> Result<bool> {
        Ok(self.node(id)?.include_in_layout)
    }

    /// Include or exclude the node from its parent's layout.
    pub fn set_include_in_layout(&mut self, id: impl Into<NodeId>, include: bool) -> Result<()> {
        self.set_prop(
            id.into(),
            LAYOUT_ENABLED,
            |n| &mut n.include_in_layout,
            include,
        )
    }

    /// True if the node is visible and included in layout.
    pub fn should_layout(&self, id: impl Into<NodeId>) -> Result<bool> {
        Ok(self.node(id)?.should_layout())
    }

    /// True if the node is active and it and all its ancestors are visible.
    pub fn is_rendered(&self, id: impl Into<NodeId>) -> bool {
        hit::is_rendered(self, id.into())
    }

    //
    // Transform
    //

    /// Position.
    pub fn position(&self, id: impl Into<NodeId>) -> Result<Vec3> {
        Ok(self.node(id)?.position)
    }

    /// Set the position.
    pub fn set_position(&mut self, id: impl Into<NodeId>, position: Vec3) -> Result<()> {
        self.set_prop(id.into(), TRANSFORM, |n| &mut n.position, position)
    }

    /// Move to `(x, y)`, rounded to whole units. Depth is kept.
    pub fn move_to(&mut self, id: impl Into<NodeId>, x: f32, y: f32) -> Result<()> {
        let id = id.into();
        let z = self.node(id)?.position.z;
        self.set_position(id, Vec3::new(x.round(), y.round(), z))
    }

    /// Euler rotation in radians.
    pub fn rotation(&self, id: impl Into<NodeId>) -> Result<Vec3> {
        Ok(self.node(id)?.rotation)
    }

    /// Set the euler rotation in radians.
    pub fn set_rotation(&mut self, id: impl Into<NodeId>, rotation: Vec3) -> Result<()> {
        self.set_prop(id.into(), TRANSFORM, |n| &mut n.rotation, rotation)
    }

    /// Scale.
    pub fn scale(&self, id: impl Into<NodeId>) -> Result<Vec3> {
        Ok(self.node(id)?.scale)
    }

    /// Set the scale. Components are clamped to at least 0.000001 so the
    /// transform stays invertible.
    pub fn set_scale(&mut self, id: impl Into<NodeId>, scale: Vec3) -> Result<()> {
        const MIN: f32 = 0.000_001;
        let s = Vec3::new(scale.x.max(MIN), scale.y.max(MIN), scale.z.max(MIN));
        self.set_prop(id.into(), TRANSFORM, |n| &mut n.scale, s)
    }

    /// Transform origin.
    pub fn origin(&self, id: impl Into<NodeId>) -> Result<Vec3> {
        Ok(self.node(id)?.origin)
    }

    /// Set the point rotation and scale pivot around.
    pub fn set_origin(&mut self, id: impl Into<NodeId>, origin: Vec3) -> Result<()> {
        self.set_prop(id.into(), TRANSFORM, |n| &mut n.origin, origin)
    }

    /// Replace the composed transform, or restore it with `None`.
    pub fn set_custom_transform(&mut self, id: impl Into<NodeId>, m: Option<Mat4>) -> Result<()> {
        self.set_prop(id.into(), TRANSFORM, |n| &mut n.custom_transform, m)
    }

    /// Validated local transform.
    pub fn transform(&mut self, id: impl Into<NodeId>) -> Result<Mat4> {
        let id = id.into();
        self.validate(id, TRANSFORM)?;
        Ok(self.node(id)?.transform)
    }

    /// Validated transform combined with all ancestors.
    pub fn concatenated_transform(&mut self, id: impl Into<NodeId>) -> Result<Mat4> {
        let id = id.into();
        self.validate(id, CONCATENATED_TRANSFORM)?;
        Ok(self.node(id)?.concatenated_transform)
    }

    /// Inverse of the concatenated transform. A singular transform logs a
    /// warning and yields the identity.
    pub fn concatenated_transform_inv(&mut self, id: impl Into<NodeId>) -> Result<Mat4> {
        let id = id.into();
        self.validate(id, CONCATENATED_TRANSFORM)?;
        let node = self.node_mut(id)?;
        if let Some(inv) = node.inverse {
            return Ok(inv);
        }
        let inv = node.concatenated_transform.inverse().unwrap_or_else(|| {
            tracing::warn!(?id, "singular transform; using identity");
            Mat4::IDENTITY
        });
        node.inverse = Some(inv);
        Ok(inv)
    }

    /// Map a point from the node's space to world space.
    pub fn local_to_global(&mut self, id: impl Into<NodeId>, p: Vec3) -> Result<Vec3> {
        Ok(self.concatenated_transform(id)?.transform_point(p))
    }

    /// Map a world-space point into the node's space.
    pub fn global_to_local(&mut self, id: impl Into<NodeId>, p: Vec3) -> Result<Vec3> {
        Ok(self.concatenated_transform_inv(id)?.transform_point(p))
    }

    //
    // Color
    //

    /// Local color tint.
    pub fn color_tint(&self, id: impl Into<NodeId>) -> Result<Color> {
        Ok(self.node(id)?.color_tint)
    }

    /// Set the local color tint.
    pub fn set_color_tint(&mut self, id: impl Into<NodeId>, color: Color) -> Result<()> {
        self.set_prop(id.into(), COLOR_TRANSFORM, |n| &mut n.color_tint, color)
    }

    /// Alpha of the local tint.
    pub fn alpha(&self, id: impl Into<NodeId>) -> Result<f32> {
        Ok(self.node(id)?.color_tint.a)
    }

    /// Set the alpha of the local tint.
    pub fn set_alpha(&mut self, id: impl Into<NodeId>, alpha: f32) -> Result<()> {
        self.set_prop(id.into(), COLOR_TRANSFORM, |n| &mut n.color_tint.a, alpha)
    }

    /// Validated tint combined with all ancestors.
    pub fn concatenated_color(&mut self, id: impl Into<NodeId>) -> Result<Color> {
        let id = id.into();
        self.validate(id, CONCATENATED_COLOR_TRANSFORM)?;
        Ok(self.node(id)?.concatenated_color)
    }

    //
    // Interactivity
    //

    /// Own interactivity mode.
    pub fn interactivity_mode(&self, id: impl Into<NodeId>) -> Result<InteractivityMode> {
        Ok(self.node(id)?.interactivity)
    }

    /// Set the interactivity mode. `None` blurs focus held anywhere in the
    /// subtree; `Children` blurs focus held by the node itself.
    pub fn set_interactivity_mode(
        &mut self,
        id: impl Into<NodeId>,
        mode: InteractivityMode,
    ) -> Result<()> {
        let id = id.into();
        self.set_prop(id, INTERACTIVITY_MODE, |n| &mut n.interactivity, mode)?;
        self.invalidate_focus_order();
        if let Some(f) = self.focus {
            let blur = match mode {
                InteractivityMode::None => f == id || self.is_ancestor_of(id, f),
                InteractivityMode::Children => f == id,
                _ => false,
            };
            if blur {
                self.blur();
            }
        }
        Ok(())
    }

    /// Validated mode after applying the ancestry.
    pub fn inherited_interactivity_mode(
        &mut self,
        id: impl Into<NodeId>,
    ) -> Result<InteractivityMode> {
        let id = id.into();
        self.validate(id, INTERACTIVITY_MODE)?;
        Ok(self.node(id)?.inherited_interactivity)
    }

    /// True if the node itself accepts interaction.
    pub fn interactivity_enabled(&mut self, id: impl Into<NodeId>) -> Result<bool> {
        Ok(self.inherited_interactivity_mode(id)?.is_self_interactive())
    }

    //
    // Camera and viewport
    //

    /// Set or clear the node's own camera.
    pub fn set_camera(
        &mut self,
        id: impl Into<NodeId>,
        camera: Option<Rc<dyn Camera>>,
    ) -> Result<()> {
        let id = id.into();
        self.node_mut(id)?.camera_override = camera;
        self.invalidate(id, CAMERA)?;
        Ok(())
    }

    /// The validated camera: the node's own, else the nearest ancestor's.
    pub fn camera(&mut self, id: impl Into<NodeId>) -> Result<Option<Rc<dyn Camera>>> {
        let id = id.into();
        self.validate(id, CAMERA)?;
        Ok(self.node(id)?.camera.clone())
    }

    /// Set or clear the node's own viewport.
    pub fn set_viewport(&mut self, id: impl Into<NodeId>, viewport: Option<Rect>) -> Result<()> {
        self.set_prop(id.into(), VIEWPORT, |n| &mut n.viewport_override, viewport)
    }

    /// The validated viewport.
    pub fn viewport(&mut self, id: impl Into<NodeId>) -> Result<Rect> {
        let id = id.into();
        self.validate(id, VIEWPORT)?;
        Ok(self.node(id)?.viewport)
    }

    //
    // Focus
    //

    /// Allow or forbid focusing the node.
    pub fn set_focus_enabled(&mut self, id: impl Into<NodeId>, enabled: bool) -> Result<()> {
        self.node_mut(id.into())?.focus_enabled = enabled;
        self.invalidate_focus_order();
        Ok(())
    }

    /// Set the node's sort key within its focus scope.
    pub fn set_focus_order(&mut self, id: impl Into<NodeId>, order: f32) -> Result<()> {
        self.node_mut(id.into())?.focus_order = order;
        self.invalidate_focus_order();
        Ok(())
    }

    /// Make the node's subtree sort as one focus scope.
    pub fn set_focus_container(&mut self, id: impl Into<NodeId>, container: bool) -> Result<()> {
        self.node_mut(id.into())?.focus_container = container;
        self.invalidate_focus_order();
        Ok(())
    }

    /// Focusable nodes under `root`, in focus order.
    pub fn focus_order_of(&mut self, root: impl Into<NodeId>) -> Result<Vec<NodeId>> {
        focus::focus_order_of(self, root.into())
    }

    /// Drop cached focus orders.
    pub fn invalidate_focus_order(&mut self) {
        self.focus_gen += 1;
        self.focus_orders.clear();
    }

    /// Incremented whenever focus order may have changed.
    pub fn focus_order_generation(&self) -> u64 {
        self.focus_gen
    }

    /// Focus a node.
    pub fn focus(&mut self, id: impl Into<NodeId>) -> Result<()> {
        focus::focus(self, id.into())
    }

    /// Focus the node after the focused one in the focus order of `root`,
    /// wrapping around.
    pub fn focus_next(&mut self, root: impl Into<NodeId>) -> Result<Option<NodeId>> {
        focus::focus_step(self, root.into(), true)
    }

    /// Focus the node before the focused one in the focus order of `root`,
    /// wrapping around.
    pub fn focus_prev(&mut self, root: impl Into<NodeId>) -> Result<Option<NodeId>> {
        focus::focus_step(self, root.into(), false)
    }

    /// Clear focus.
    pub fn blur(&mut self) {
        if let Some(f) = self.focus.take() {
            tracing::debug!(?f, "blur");
        }
    }

    /// The focused node.
    pub fn focused(&self) -> Option<NodeId> {
        self.focus
    }

    //
    // Filters and attachments
    //

    /// Register a render filter. Returns its index on the node.
    pub fn add_filter(
        &mut self,
        id: impl Into<NodeId>,
        filter: impl RenderFilter + 'static,
    ) -> Result<usize> {
        let node = self.node_mut(id.into())?;
        node.filters.push(FilterEntry {
            filter: Box::new(filter),
            enabled: true,
        });
        let index = node.filters.len() - 1;
        self.render_requested = true;
        Ok(index)
    }

    /// Enable or disable a render filter.
    pub fn set_filter_enabled(
        &mut self,
        id: impl Into<NodeId>,
        index: usize,
        enabled: bool,
    ) -> Result<()> {
        let node = self.node_mut(id.into())?;
        let len = node.filters.len();
        let entry = node
            .filters
            .get_mut(index)
            .ok_or(Error::IndexOutOfBounds { index, len })?;
        entry.enabled = enabled;
        self.render_requested = true;
        Ok(())
    }

    /// Store an attachment, replacing any of the same type.
    pub fn set_attachment<T: Attachment>(&mut self, id: impl Into<NodeId>, value: T) -> Result<()> {
        self.node_mut(id.into())?
            .attachments
            .insert(TypeId::of::<T>(), Box::new(value));
        Ok(())
    }

    /// The attachment of type `T`.
    pub fn attachment<T: Attachment>(&self, id: impl Into<NodeId>) -> Result<Option<&T>> {
        Ok(self
            .node(id)?
            .attachments
            .get(&TypeId::of::<T>())
            .and_then(|a| {
                let any: &dyn Any = a.as_ref();
                any.downcast_ref::<T>()
            }))
    }

    /// Mutable access to the attachment of type `T`.
    pub fn attachment_mut<T: Attachment>(
        &mut self,
        id: impl Into<NodeId>,
    ) -> Result<Option<&mut T>> {
        Ok(self
            .node_mut(id.into())?
            .attachments
            .get_mut(&TypeId::of::<T>())
            .and_then(|a| {
                let any: &mut dyn Any = a.as_mut();
                any.downcast_mut::<T>()
            }))
    }

    /// Remove and return the attachment of type `T` without disposing it.
    pub fn remove_attachment<T: Attachment>(&mut self, id: impl Into<NodeId>) -> Result<Option<T>> {
        let removed = self
            .node_mut(id.into())?
            .attachments
            .remove(&TypeId::of::<T>());
        Ok(removed.and_then(|a| {
            let any: Box<dyn Any> = a;
            any.downcast::<T>().ok().map(|b| *b)
        }))
    }

    //
    // Rendering and hit testing
    //

    /// Render a node and its visible subtree into `batch`.
    pub fn render(
        &mut self,
        id: impl Into<NodeId>,
        clip: Rect,
        batch: &mut dyn RenderBatch,
    ) -> Result<()> {
        render::render(self, id.into(), clip, batch)
    }

    /// Mark the scene as needing a render.
    pub fn request_render(&mut self) {
        self.render_requested = true;
    }

    /// Return and clear the render request.
    pub fn take_render_request(&mut self) -> bool {
        mem::take(&mut self.render_requested)
    }

    /// Nodes under the screen point `(x, y)`, deepest and topmost first.
    ///
    /// With `only_interactive`, subtrees whose inherited mode is `None` are
    /// skipped and nodes that are not themselves interactive are not
    /// reported. With `return_all`, every hit is reported instead of just
    /// the first.
    pub fn children_under_point(
        &mut self,
        root: impl Into<NodeId>,
        x: f32,
        y: f32,
        only_interactive: bool,
        return_all: bool,
    ) -> Result<Vec<NodeId>> {
        hit::children_under_point(self, root.into(), x, y, only_interactive, return_all)
    }

    /// The topmost interactive node under `(x, y)`.
    pub fn child_under_point(
        &mut self,
        root: impl Into<NodeId>,
        x: f32,
        y: f32,
    ) -> Result<Option<NodeId>> {
        Ok(hit::children_under_point(self, root.into(), x, y, true, false)?
            .into_iter()
            .next())
    }

    /// True if a world-space ray crosses the node's bounds.
    pub fn intersects_global_ray(&mut self, id: impl Into<NodeId>, ray: &Ray) -> Result<bool> {
        hit::intersects_global_ray(self, id.into(), ray)
    }

    //
    // Time
    //

    /// Call `f` once per tick while the node is active. The callback is
    /// dropped when the node is disposed.
    pub fn on_tick(
        &mut self,
        id: impl Into<NodeId>,
        f: impl FnMut(&mut Self, NodeId, f32) -> Result<()> + 'static,
    ) -> Result<TickId> {
        let id = id.into();
        self.node(id)?;
        let f: Box<TickCallback> = Box::new(f);
        Ok(self.time.add(id, f))
    }

    /// Remove a tick callback.
    pub fn remove_tick(&mut self, tick: TickId) -> bool {
        self.time.remove(tick)
    }

    /// Advance time by `dt` seconds, running whole ticks. Returns the number
    /// of ticks run.
    pub fn tick(&mut self, dt: f32) -> Result<u32> {
        TimeDriver::advance(self, dt)
    }

    //
    // Internal
    //

    /// Store a property and invalidate `flag` if it changed.
    fn set_prop<T: PartialEq>(
        &mut self,
        id: NodeId,
        flag: Flags,
        field: impl FnOnce(&mut Node) -> &mut T,
        value: T,
    ) -> Result<()> {
        let slot = field(self.node_mut(id)?);
        if *slot == value {
            return Ok(());
        }
        *slot = value;
        self.invalidate(id, flag)?;
        Ok(())
    }
}

/// Reject NaN sizes.
fn check_size(id: NodeId, v: Option<f32>) -> Result<()> {
    if v.is_some_and(f32::is_nan) {
        return Err(Error::NanSize(id));
    }
    Ok(())
}
