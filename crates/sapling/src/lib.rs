//! Sapling: a retained-mode UI component core.
//!
//! Sapling keeps a tree of components in an arena. Each component carries
//! dependency-ordered dirty flags that are resolved lazily, and containers
//! measure and place their children through pluggable layout algorithms.
//!
//! # Quick Start
//!
//! The main entry points are:
//! - [`Core`] - The arena, validation and hierarchy
//! - [`Widget`] - The trait implemented by all component behavior
//! - [`layout::LayoutContainer`] - A container driven by a layout algorithm
//! - [`virtual_list::VirtualList`] - A list that only materializes visible rows
//!
//! # Module Organization
//!
//! - [`geom`] - Geometry primitives (Vec3, Mat4, Rect, Bounds, etc.)
//! - [`layout`] - Size constraints and the flow, grid, horizontal and vertical layouts
//! - [`virtual_list`] - Virtualized lists with renderer pooling and selection

#![warn(missing_docs)]

// Internal core module - re-export specific items below
mod core;

// Public modules
pub mod layout;
pub mod virtual_list;
pub mod widget;

pub use sapling_geom as geom;

// Re-export core types
pub use crate::core::{Core, Invalidator, NodeId, NodeOptions, TypedId};
pub use crate::core::{
    attachment, camera, config, error, flags, node, render, signal, testing, time, validation,
};

pub use widget::Widget;
