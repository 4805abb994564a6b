//! Hit testing against node bounds.

use crate::{
    core::{error::Result, id::NodeId, node::InteractivityMode, world::Core},
    geom::{Ray, Vec3},
};

/// True if the node is active and it and every ancestor is visible.
pub(crate) fn is_rendered(core: &Core, id: NodeId) -> bool {
    if !core.nodes.get(id).is_some_and(|n| n.active) {
        return false;
    }
    let mut cur = Some(id);
    while let Some(c) = cur {
        match core.nodes.get(c) {
            Some(n) if n.visible => cur = n.parent,
            _ => return false,
        }
    }
    true
}

/// The picking ray through a screen point, from the node's camera.
fn ray_for(core: &mut Core, id: NodeId, x: f32, y: f32) -> Result<Ray> {
    Ok(match core.camera(id)? {
        Some(c) => c.ray(x, y),
        None => Ray::orthographic(x, y),
    })
}

/// True if a world-space ray crosses the node's local bounds.
pub(crate) fn intersects_global_ray(core: &mut Core, id: NodeId, ray: &Ray) -> Result<bool> {
    let inv = core.concatenated_transform_inv(id)?;
    let local = ray.transformed(&inv);
    let b = core.bounds(id)?;
    Ok(local
        .intersect_quad(
            Vec3::ZERO,
            Vec3::new(b.width, 0.0, 0.0),
            Vec3::new(b.width, b.height, 0.0),
            Vec3::new(0.0, b.height, 0.0),
        )
        .is_some())
}

/// Nodes under a screen point, deepest and topmost first.
pub(crate) fn children_under_point(
    core: &mut Core,
    root: NodeId,
    x: f32,
    y: f32,
    only_interactive: bool,
    return_all: bool,
) -> Result<Vec<NodeId>> {
    let mut out = Vec::new();
    walk(core, root, x, y, only_interactive, return_all, &mut out)?;
    Ok(out)
}

/// Hit test one node and, for containers, its children topmost first.
fn walk(
    core: &mut Core,
    id: NodeId,
    x: f32,
    y: f32,
    only_interactive: bool,
    return_all: bool,
    out: &mut Vec<NodeId>,
) -> Result<()> {
    if !core.node(id)?.visible {
        return Ok(());
    }
    let mode = core.inherited_interactivity_mode(id)?;
    if only_interactive && mode == InteractivityMode::None {
        return Ok(());
    }
    let ray = ray_for(core, id, x, y)?;
    let always = core.node(id)?.interactivity == InteractivityMode::Always;
    if !always && !intersects_global_ray(core, id, &ray)? {
        return Ok(());
    }

    let children = core.children(id)?;
    for child in children.into_iter().rev() {
        if !return_all && !out.is_empty() {
            break;
        }
        if core.contains(child) {
            walk(core, child, x, y, only_interactive, return_all, out)?;
        }
    }

    if (return_all || out.is_empty()) && (!only_interactive || mode.is_self_interactive()) {
        out.push(id);
    }
    Ok(())
}
