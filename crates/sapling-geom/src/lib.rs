//! Geometry primitives used across sapling.
//!
//! All values are `f32`. Layout works in a y-down 2D plane embedded in 3D
//! space so that components can carry rotation and depth.

/// Size without a location.
mod bounds;
/// RGBA color tints.
mod color;
/// 4x4 column-major transform matrices.
mod mat4;
/// Padding around a box.
mod pad;
/// Rays and ray/triangle intersection.
mod ray;
/// Axis-aligned rectangles.
mod rect;
/// Two and three component vectors.
mod vec;

pub use bounds::Bounds;
pub use color::Color;
pub use mat4::Mat4;
pub use pad::Pad;
pub use ray::Ray;
pub use rect::Rect;
pub use vec::{Vec2, Vec3};

/// Tolerance used for float comparisons in geometry routines.
pub const EPSILON: f32 = 1e-6;
