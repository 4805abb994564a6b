use serde::{Deserialize, Serialize};

use super::{EPSILON, Mat4, Vec3};

/// A half-line cast from a screen point into the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    /// Start of the ray.
    pub origin: Vec3,
    /// Direction of the ray, not necessarily normalized.
    pub direction: Vec3,
}

impl Ray {
    /// Construct a ray.
    pub const fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// A ray looking straight into the screen at (x, y), as cast by an
    /// orthographic camera whose world units equal screen pixels.
    pub fn orthographic(x: f32, y: f32) -> Self {
        Self::new(Vec3::new(x, y, -1.0), Vec3::new(0.0, 0.0, 1.0))
    }

    /// This ray mapped through a transform.
    pub fn transformed(&self, m: &Mat4) -> Self {
        Self::new(
            m.transform_point(self.origin),
            m.transform_vector(self.direction),
        )
    }

    /// Intersect with a triangle from either side. Returns the intersection
    /// point, or `None` if the ray misses or runs parallel to the triangle.
    pub fn intersect_triangle(&self, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<Vec3> {
        let e1 = v1 - v0;
        let e2 = v2 - v0;
        let p = self.direction.cross(e2);
        let det = e1.dot(p);
        if det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let t = self.origin - v0;
        let u = t.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = t.cross(e1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let dist = e2.dot(q) * inv_det;
        if dist < 0.0 {
            return None;
        }
        Some(self.origin + self.direction * dist)
    }

    /// Intersect with the quad `a b c d`, given in winding order.
    pub fn intersect_quad(&self, a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> Option<Vec3> {
        self.intersect_triangle(a, b, c)
            .or_else(|| self.intersect_triangle(a, c, d))
    }
}
