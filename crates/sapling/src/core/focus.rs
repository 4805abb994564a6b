//! Focus order and focus changes.

use crate::core::{
    error::{Error, Result},
    id::NodeId,
    node::InteractivityMode,
    world::Core,
};

/// A run of nodes that sorts as one unit within its scope.
type Entry = (f32, Vec<NodeId>);

/// Focusable nodes under `root` in focus order, cached until the focus order
/// is next invalidated.
///
/// Nodes are walked in pre-order. Within each scope (the root, or any focus
/// container) entries are sorted stably by their focus order, so equal orders
/// keep tree order. A focus container's subtree forms a single entry keyed by
/// the container's own order.
pub(crate) fn focus_order_of(core: &mut Core, root: NodeId) -> Result<Vec<NodeId>> {
    core.node(root)?;
    if let Some(cached) = core.focus_orders.get(&root) {
        return Ok(cached.clone());
    }
    let mut entries = Vec::new();
    collect(core, root, &mut entries);
    let order = flatten(entries);
    core.focus_orders.insert(root, order.clone());
    Ok(order)
}

/// Gather focusable entries below `id` into `entries`.
fn collect(core: &Core, id: NodeId, entries: &mut Vec<Entry>) {
    let Ok(node) = core.node(id) else {
        return;
    };
    if !node.visible || !node.active || node.interactivity == InteractivityMode::None {
        return;
    }
    let own = node.focus_enabled && node.interactivity.is_self_interactive();
    if node.focus_container {
        let mut inner = Vec::new();
        if own {
            inner.push((f32::NEG_INFINITY, vec![id]));
        }
        for c in node.children() {
            collect(core, *c, &mut inner);
        }
        entries.push((node.focus_order, flatten(inner)));
    } else {
        if own {
            entries.push((node.focus_order, vec![id]));
        }
        for c in node.children() {
            collect(core, *c, entries);
        }
    }
}

/// Sort a scope and concatenate it.
fn flatten(mut entries: Vec<Entry>) -> Vec<NodeId> {
    entries.sort_by(|a, b| a.0.total_cmp(&b.0));
    entries.into_iter().flat_map(|(_, v)| v).collect()
}

/// Focus `id`. The node must be focus-enabled, rendered and interactive.
pub(crate) fn focus(core: &mut Core, id: NodeId) -> Result<()> {
    if !core.node(id)?.focus_enabled || !core.is_rendered(id) || !core.interactivity_enabled(id)? {
        return Err(Error::Invalid(format!("node {id:?} cannot take focus")));
    }
    if core.focus != Some(id) {
        tracing::debug!(?id, "focus");
        core.focus = Some(id);
    }
    Ok(())
}

/// Move focus to the next (or previous) node in the focus order of `root`,
/// wrapping at the ends. Returns the newly focused node.
pub(crate) fn focus_step(core: &mut Core, root: NodeId, forward: bool) -> Result<Option<NodeId>> {
    let order = focus_order_of(core, root)?;
    if order.is_empty() {
        return Ok(None);
    }
    let current = core.focus.and_then(|f| order.iter().position(|n| *n == f));
    let len = order.len();
    let next = match (current, forward) {
        (Some(i), true) => (i + 1) % len,
        (Some(i), false) => (i + len - 1) % len,
        (None, true) => 0,
        (None, false) => len - 1,
    };
    let id = order[next];
    focus(core, id)?;
    Ok(Some(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::Group;

    fn focusable(core: &mut Core, parent: NodeId, order: f32) -> Result<NodeId> {
        let n = core.create(Group)?.id();
        core.set_focus_enabled(n, true)?;
        core.set_focus_order(n, order)?;
        core.add_child_last(parent, n)?;
        Ok(n)
    }

    #[test]
    fn scopes_sort_independently() -> Result<()> {
        let mut core = Core::new();
        let root = core.create_container(Group)?.id();
        core.activate(root)?;
        let a = focusable(&mut core, root, 2.0)?;
        let scope = core.create_container(Group)?.id();
        core.set_focus_container(scope, true)?;
        core.set_focus_order(scope, 1.0)?;
        core.add_child_last(root, scope)?;
        let b = focusable(&mut core, scope, 5.0)?;
        let c = focusable(&mut core, scope, 0.0)?;
        let d = focusable(&mut core, root, 1.0)?;

        assert_eq!(core.focus_order_of(root)?, vec![c, b, d, a]);
        Ok(())
    }

    #[test]
    fn hidden_and_inert_are_skipped() -> Result<()> {
        let mut core = Core::new();
        let root = core.create_container(Group)?.id();
        core.activate(root)?;
        let a = focusable(&mut core, root, 0.0)?;
        let b = focusable(&mut core, root, 0.0)?;
        let c = focusable(&mut core, root, 0.0)?;
        core.set_visible(b, false)?;
        core.set_interactivity_mode(c, InteractivityMode::None)?;
        assert_eq!(core.focus_order_of(root)?, vec![a]);
        Ok(())
    }

    #[test]
    fn step_wraps() -> Result<()> {
        let mut core = Core::new();
        let root = core.create_container(Group)?.id();
        core.activate(root)?;
        let a = focusable(&mut core, root, 0.0)?;
        let b = focusable(&mut core, root, 0.0)?;
        assert_eq!(core.focus_next(root)?, Some(a));
        assert_eq!(core.focus_next(root)?, Some(b));
        assert_eq!(core.focus_next(root)?, Some(a));
        assert_eq!(core.focus_prev(root)?, Some(b));
        Ok(())
    }

    #[test]
    fn cannot_focus_disabled() -> Result<()> {
        let mut core = Core::new();
        let n = core.create(Group)?.id();
        core.activate(n)?;
        assert!(core.focus(n).is_err());
        Ok(())
    }
}
