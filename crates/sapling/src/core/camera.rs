use std::fmt::Debug;

use crate::geom::Ray;

/// Maps screen coordinates to world-space picking rays.
pub trait Camera: Debug {
    /// The ray through the screen point `(x, y)`.
    fn ray(&self, x: f32, y: f32) -> Ray;
}

/// A camera whose world units are screen pixels, looking down +z.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrthographicCamera;

impl Camera for OrthographicCamera {
    fn ray(&self, x: f32, y: f32) -> Ray {
        Ray::orthographic(x, y)
    }
}
