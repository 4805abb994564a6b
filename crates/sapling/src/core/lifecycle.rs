//! Activation and disposal.

use std::mem;

use crate::core::{
    container,
    error::{Error, Result},
    id::NodeId,
    world::Core,
};

/// Activate a node, then every inactive child.
pub(crate) fn activate(core: &mut Core, id: NodeId) -> Result<()> {
    let node = core.node_mut(id)?;
    if node.disposing {
        return Err(Error::Disposed(id));
    }
    if node.active {
        return Err(Error::AlreadyActive(id));
    }
    node.active = true;
    tracing::debug!(?id, name = node.name, "activate");
    core.invalidate_focus_order();
    core.call_widget(id, |w, core| w.on_activated(core, id))?;

    for child in core.children(id)? {
        if core.node(child).is_ok_and(|n| !n.active) {
            activate(core, child)?;
        }
    }
    if let Ok(node) = core.node(id) {
        for l in node.listeners.activated.snapshot() {
            l(core, id);
        }
    }
    Ok(())
}

/// Deactivate a node, then every active child. Focus held by the node is
/// released.
pub(crate) fn deactivate(core: &mut Core, id: NodeId) -> Result<()> {
    let node = core.node_mut(id)?;
    if !node.active {
        return Err(Error::NotActive(id));
    }
    node.active = false;
    tracing::debug!(?id, name = node.name, "deactivate");
    core.invalidate_focus_order();
    if core.focus == Some(id) {
        core.blur();
    }
    core.call_widget(id, |w, core| w.on_deactivated(core, id))?;

    for child in core.children(id)? {
        if core.node(child).is_ok_and(|n| n.active) {
            deactivate(core, child)?;
        }
    }
    if let Ok(node) = core.node(id) {
        for l in node.listeners.deactivated.snapshot() {
            l(core, id);
        }
    }
    Ok(())
}

/// Dispose a detached node.
///
/// Order: deactivate, notify and drop listeners, run the widget hook, detach
/// children without disposing them, dispose owned nodes newest first,
/// dispose attachments, then remove the node from the arena.
///
/// Every owned node, transitively, must be detached or parented within the
/// set being disposed. This is checked before anything is torn down, so a
/// failed dispose leaves the node untouched.
pub(crate) fn dispose(core: &mut Core, id: NodeId) -> Result<()> {
    let node = core.nodes.get(id).ok_or(Error::AlreadyDisposed(id))?;
    if node.disposing {
        return Err(Error::AlreadyDisposed(id));
    }
    if node.parent.is_some() {
        return Err(Error::StillAttached(id));
    }
    check_owned(core, id, id)?;
    teardown(core, id)
}

/// Fail with `StillAttached` if a node owned by `id` is parented outside the
/// nodes `root` takes down with it.
fn check_owned(core: &Core, root: NodeId, id: NodeId) -> Result<()> {
    for &o in &core.node(id)?.owned {
        let Ok(node) = core.node(o) else {
            continue;
        };
        if node.disposing {
            continue;
        }
        if let Some(p) = node.parent
            && p != root
            && !core.owns(root, p)
            && !core.node(p).is_ok_and(|n| n.disposing)
        {
            return Err(Error::StillAttached(o));
        }
        check_owned(core, root, o)?;
    }
    Ok(())
}

/// Tear down a node whose owned tree has passed `check_owned`.
fn teardown(core: &mut Core, id: NodeId) -> Result<()> {
    let node = core.node_mut(id)?;
    node.disposing = true;
    tracing::debug!(?id, name = node.name, "dispose");

    if node.active {
        deactivate(core, id)?;
    }
    let listeners = core.node(id)?.listeners.disposed.snapshot();
    for l in listeners {
        l(core, id);
    }
    core.node_mut(id)?.listeners.clear();
    core.call_widget(id, |w, core| w.on_disposed(core, id))?;

    if core.node(id)?.is_container() {
        container::clear_children(core, id, false)?;
    }

    let owned = mem::take(&mut core.node_mut(id)?.owned);
    for o in owned.into_iter().rev() {
        let Ok(node) = core.node(o) else {
            continue;
        };
        if node.disposing {
            continue;
        }
        if let Some(p) = node.parent {
            container::remove_child(core, p, o)?;
        }
        teardown(core, o)?;
    }

    let attachments = mem::take(&mut core.node_mut(id)?.attachments);
    for (_, mut a) in attachments {
        a.dispose(core, id);
    }

    core.time.remove_node(id);
    if core.focus == Some(id) {
        core.blur();
    }
    if let Some(owner) = core.node(id)?.owner
        && let Ok(o) = core.node_mut(owner)
    {
        o.owned.retain(|x| *x != id);
    }
    core.nodes.remove(id);
    core.invalidate_focus_order();
    Ok(())
}
