//! Validators for the standard flags.
//!
//! Each function recomputes one piece of derived node state. Values inherited
//! from the parent are read through the parent's own validation, so a parent
//! that is dirty resolves itself first.

use crate::{
    core::{
        error::{Error, Result},
        flags::{
            CAMERA, CONCATENATED_COLOR_TRANSFORM, CONCATENATED_TRANSFORM, Flags,
            INTERACTIVITY_MODE, LAYOUT, SIZE_CONSTRAINTS, STYLES, TRANSFORM, VIEWPORT,
        },
        id::NodeId,
        node::{InteractivityMode, NodeValidator},
        world::Core,
    },
    geom::{Bounds, Color, Mat4, Rect, Vec3},
    layout::SizeConstraints,
};

/// The validator for a standard flag. Marker flags get a no-op.
pub(crate) fn validator_for(flag: Flags) -> NodeValidator {
    match flag {
        STYLES => update_styles,
        SIZE_CONSTRAINTS => update_size_constraints,
        LAYOUT => update_layout,
        TRANSFORM => update_transform,
        CONCATENATED_TRANSFORM => update_concatenated_transform,
        CONCATENATED_COLOR_TRANSFORM => update_concatenated_color,
        INTERACTIVITY_MODE => update_interactivity,
        CAMERA => update_camera,
        VIEWPORT => update_viewport,
        _ => marker,
    }
}

/// Flags whose only purpose is to be invalidated.
fn marker(_core: &mut Core, _id: NodeId) -> Result<()> {
    Ok(())
}

/// STYLES.
fn update_styles(core: &mut Core, id: NodeId) -> Result<()> {
    core.call_widget(id, |w, core| w.update_styles(core, id))
}

/// SIZE_CONSTRAINTS.
fn update_size_constraints(core: &mut Core, id: NodeId) -> Result<()> {
    let mut out = SizeConstraints::default();
    core.call_widget(id, |w, core| w.update_size_constraints(core, id, &mut out))?;
    let node = core.node_mut(id)?;
    out.bound(node.explicit_constraints);
    node.size_constraints = out;
    Ok(())
}

/// LAYOUT.
fn update_layout(core: &mut Core, id: NodeId) -> Result<()> {
    let node = core.node(id)?;
    let sc = node.size_constraints;
    let w = sc.width.clamp(node.explicit_width.or(node.default_width));
    let h = sc.height.clamp(node.explicit_height.or(node.default_height));
    let mut out = Bounds::new(w.unwrap_or(0.0), h.unwrap_or(0.0));
    core.call_widget(id, |widget, core| {
        widget.update_layout(core, id, w, h, &mut out)
    })?;
    if out.is_nan() {
        return Err(Error::NanSize(id));
    }
    core.node_mut(id)?.bounds = out;
    Ok(())
}

/// TRANSFORM.
fn update_transform(core: &mut Core, id: NodeId) -> Result<()> {
    let node = core.node_mut(id)?;
    node.transform = match node.custom_transform {
        Some(m) => m,
        None => compose(node.position, node.rotation, node.scale, node.origin),
    };
    Ok(())
}

/// Translate, rotate, scale, then shift by the origin.
pub(crate) fn compose(position: Vec3, rotation: Vec3, scale: Vec3, origin: Vec3) -> Mat4 {
    let mut m = Mat4::from_translation(position);
    if !rotation.is_zero() {
        m.rotate(rotation);
    }
    m.scale(scale);
    if !origin.is_zero() {
        m.translate(-origin);
    }
    m
}

/// CONCATENATED_TRANSFORM.
fn update_concatenated_transform(core: &mut Core, id: NodeId) -> Result<()> {
    let parent = core.node(id)?.parent;
    let base = match parent {
        Some(p) => {
            core.validate(p, CONCATENATED_TRANSFORM)?;
            core.node(p)?.concatenated_transform
        }
        None => Mat4::IDENTITY,
    };
    let node = core.node_mut(id)?;
    node.concatenated_transform = base * node.transform;
    node.inverse = None;
    Ok(())
}

/// CONCATENATED_COLOR_TRANSFORM.
fn update_concatenated_color(core: &mut Core, id: NodeId) -> Result<()> {
    let parent = core.node(id)?.parent;
    let base = match parent {
        Some(p) => {
            core.validate(p, CONCATENATED_COLOR_TRANSFORM)?;
            core.node(p)?.concatenated_color
        }
        None => Color::WHITE,
    };
    let node = core.node_mut(id)?;
    node.concatenated_color = base * node.color_tint;
    Ok(())
}

/// INTERACTIVITY_MODE.
fn update_interactivity(core: &mut Core, id: NodeId) -> Result<()> {
    let parent = core.node(id)?.parent;
    let parent_mode = match parent {
        Some(p) => {
            core.validate(p, INTERACTIVITY_MODE)?;
            Some(core.node(p)?.inherited_interactivity)
        }
        None => None,
    };
    let node = core.node_mut(id)?;
    node.inherited_interactivity = if parent_mode == Some(InteractivityMode::None) {
        InteractivityMode::None
    } else {
        node.interactivity
    };
    Ok(())
}

/// CAMERA.
fn update_camera(core: &mut Core, id: NodeId) -> Result<()> {
    let node = core.node(id)?;
    if let Some(c) = node.camera_override.clone() {
        core.node_mut(id)?.camera = Some(c);
        return Ok(());
    }
    let camera = match node.parent {
        Some(p) => {
            core.validate(p, CAMERA)?;
            core.node(p)?.camera.clone()
        }
        None => None,
    };
    core.node_mut(id)?.camera = camera;
    Ok(())
}

/// VIEWPORT.
fn update_viewport(core: &mut Core, id: NodeId) -> Result<()> {
    let node = core.node(id)?;
    if let Some(v) = node.viewport_override {
        core.node_mut(id)?.viewport = v;
        return Ok(());
    }
    let viewport = match node.parent {
        Some(p) => {
            core.validate(p, VIEWPORT)?;
            core.node(p)?.viewport
        }
        None => Rect::EMPTY,
    };
    core.node_mut(id)?.viewport = viewport;
    Ok(())
}
