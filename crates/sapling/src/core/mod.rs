//! The component arena and its supporting types.

// Core modules - public
/// Per-node typed attachments.
pub mod attachment;
/// Picking cameras.
pub mod camera;
/// Process-wide configuration.
pub mod config;
/// Core error types.
pub mod error;
/// Standard validation flags.
pub mod flags;
/// Node data stored in the arena.
pub mod node;
/// Rendering interfaces.
pub mod render;
/// Listener lists.
pub mod signal;
/// Test helpers: recording widgets, batches and tracing setup.
pub mod testing;
/// Fixed-step time driver.
pub mod time;
/// Dependency-ordered dirty flags.
pub mod validation;

// Core modules - internal
/// Child list management.
mod container;
/// Validators for the standard flags.
mod derived;
/// Focus order.
mod focus;
/// Hit testing.
mod hit;
/// Node ID types.
pub mod id;
/// Activation and disposal.
mod lifecycle;
/// The arena.
pub mod world;

pub use id::{NodeId, TypedId};
pub use world::{Core, Invalidator, NodeOptions};
