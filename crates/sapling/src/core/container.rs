//! Child list management and invalidation flow between parents and children.

use crate::{
    core::{
        error::{Error, Result},
        flags::{Flags, LAYOUT_ENABLED, SIZE_CONSTRAINTS},
        id::NodeId,
        lifecycle,
        world::Core,
    },
    widget::{Slot, downcast_mut},
};

/// True while the container's own LAYOUT validator is running. Child list
/// changes made by a layout pass do not re-measure the container.
fn in_layout(core: &Core, id: NodeId) -> bool {
    core.is_validating_layout(id)
}

/// Re-measure the container unless it is the one laying out.
fn invalidate_size(core: &mut Core, parent: NodeId) -> Result<()> {
    if !in_layout(core, parent) {
        core.invalidate(parent, SIZE_CONSTRAINTS)?;
    }
    Ok(())
}

/// Position of `anchor` among the children of `parent`.
pub(crate) fn anchor_index(core: &Core, parent: NodeId, anchor: NodeId) -> Result<usize> {
    core.container_children(parent)?
        .iter()
        .position(|c| *c == anchor)
        .ok_or_else(|| Error::Invalid(format!("{anchor:?} is not a child of {parent:?}")))
}

/// Insert `child` at `index`, or move it there if it already belongs to
/// `parent`.
pub(crate) fn add_child(
    core: &mut Core,
    parent: NodeId,
    index: usize,
    child: NodeId,
) -> Result<()> {
    let len = core.container_children(parent)?.len();
    if core.node(parent)?.disposing {
        return Err(Error::Disposed(parent));
    }
    let child_node = core.node(child)?;
    if child_node.disposing {
        return Err(Error::Disposed(child));
    }
    let current = child_node.parent;
    if index > len {
        return Err(Error::IndexOutOfBounds { index, len });
    }
    if child == parent || core.is_ancestor_of(child, parent) {
        return Err(Error::WouldCreateCycle { parent, child });
    }

    match current {
        Some(p) if p == parent => {
            let old = anchor_index(core, parent, child)?;
            let new = if index > old { index - 1 } else { index };
            if new == old {
                return Ok(());
            }
            let children = core
                .node_mut(parent)?
                .children
                .as_mut()
                .ok_or(Error::NotAContainer(parent))?;
            let c = children.remove(old);
            children.insert(new, c);
            tracing::trace!(?parent, ?child, old, new, "reorder child");
            let bubbling = core.node(parent)?.bubbling;
            core.invalidate(parent, bubbling)?;
            invalidate_size(core, parent)?;
            core.invalidate_focus_order();
            Ok(())
        }
        Some(_) => Err(Error::AlreadyParented(child)),
        None => {
            core.node_mut(parent)?
                .children
                .as_mut()
                .ok_or(Error::NotAContainer(parent))?
                .insert(index, child);
            core.node_mut(child)?.parent = Some(parent);
            tracing::trace!(?parent, ?child, index, "add child");
            if core.node(parent)?.active && !core.node(child)?.active {
                lifecycle::activate(core, child)?;
            }
            let parent_node = core.node(parent)?;
            let (cascading, bubbling) = (parent_node.cascading, parent_node.bubbling);
            core.invalidate(child, cascading)?;
            core.invalidate(parent, bubbling)?;
            invalidate_size(core, parent)?;
            core.invalidate_focus_order();
            Ok(())
        }
    }
}

/// Detach and return the child at `index`.
pub(crate) fn remove_child_at(core: &mut Core, parent: NodeId, index: usize) -> Result<NodeId> {
    let children = core
        .node_mut(parent)?
        .children
        .as_mut()
        .ok_or(Error::NotAContainer(parent))?;
    let len = children.len();
    if index >= len {
        return Err(Error::IndexOutOfBounds { index, len });
    }
    let child = children.remove(index);
    tracing::trace!(?parent, ?child, index, "remove child");
    if let Ok(node) = core.node_mut(child) {
        node.parent = None;
        let active = node.active;
        if active {
            lifecycle::deactivate(core, child)?;
        }
        let cascading = core.node(parent)?.cascading;
        core.invalidate(child, cascading)?;
    }
    let bubbling = core.node(parent)?.bubbling;
    core.invalidate(parent, bubbling)?;
    invalidate_size(core, parent)?;
    core.invalidate_focus_order();
    Ok(child)
}

/// Detach `child` if it belongs to `parent`.
pub(crate) fn remove_child(core: &mut Core, parent: NodeId, child: NodeId) -> Result<bool> {
    let pos = core
        .container_children(parent)?
        .iter()
        .position(|c| *c == child);
    match pos {
        Some(i) => {
            remove_child_at(core, parent, i)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Detach every child, last to first.
pub(crate) fn clear_children(core: &mut Core, parent: NodeId, dispose: bool) -> Result<()> {
    loop {
        let len = core.container_children(parent)?.len();
        if len == 0 {
            return Ok(());
        }
        let child = remove_child_at(core, parent, len - 1)?;
        if dispose && core.contains(child) {
            lifecycle::dispose(core, child)?;
        }
    }
}

/// React to `flags` having changed on `child`.
///
/// Layout-affecting changes on a child that takes part in layout make the
/// container re-measure, except while the container itself is laying out.
/// Flags in the container's bubbling set are then pulled up.
pub(crate) fn child_invalidated(
    core: &mut Core,
    parent: NodeId,
    child: NodeId,
    flags: Flags,
) -> Result<()> {
    let parent_node = core.node(parent)?;
    let bubbling = parent_node.bubbling;
    let child_node = core.node(child)?;
    if flags & child_node.layout_invalidating != 0
        && !in_layout(core, parent)
        && (child_node.should_layout() || flags & LAYOUT_ENABLED != 0)
    {
        core.invalidate(parent, SIZE_CONSTRAINTS)?;
    }
    if flags & bubbling != 0 {
        core.invalidate(parent, flags & bubbling)?;
    }
    Ok(())
}

/// Replace the content following a slot.
pub(crate) fn set_slot(
    core: &mut Core,
    slot: NodeId,
    content: Option<NodeId>,
) -> Result<Option<NodeId>> {
    let parent = core
        .node(slot)?
        .parent
        .ok_or_else(|| Error::Invalid(format!("slot {slot:?} has no parent")))?;
    let previous = core.with_widget(slot, |s: &mut Slot, _| Ok(s.content))?;
    if previous == content {
        return Ok(previous);
    }
    if let Some(prev) = previous {
        remove_child(core, parent, prev)?;
    }
    if let Some(c) = content {
        let index = anchor_index(core, parent, slot)?;
        add_child(core, parent, index + 1, c)?;
    }
    core.call_widget(slot, |w, _| {
        if let Some(s) = downcast_mut::<Slot>(w) {
            s.content = content;
        }
        Ok(())
    })?;
    Ok(previous)
}
