use std::ops::Mul;

use serde::{Deserialize, Serialize};

use super::{EPSILON, Vec3};

/// A 4x4 transform matrix stored in column-major order.
///
/// Composition follows the usual convention: `a * b` applies `b` first, then
/// `a`. A component's local transform is therefore built as
/// `T(position) * R(rotation) * S(scale) * T(-origin)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat4 {
    /// Matrix values, column-major.
    pub m: [f32; 16],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Read the value at `row`, `col`.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.m[col * 4 + row]
    }

    /// A translation.
    pub fn from_translation(v: Vec3) -> Self {
        let mut r = Self::IDENTITY;
        r.m[12] = v.x;
        r.m[13] = v.y;
        r.m[14] = v.z;
        r
    }

    /// A non-uniform scale.
    pub fn from_scale(v: Vec3) -> Self {
        let mut r = Self::IDENTITY;
        r.m[0] = v.x;
        r.m[5] = v.y;
        r.m[10] = v.z;
        r
    }

    /// A rotation from euler angles in radians. The x component is pitch, y is
    /// yaw and z is roll; the combined rotation is `yaw * pitch * roll`.
    pub fn from_rotation_euler(v: Vec3) -> Self {
        Self::rotation_y(v.y) * Self::rotation_x(v.x) * Self::rotation_z(v.z)
    }

    /// Rotation about the x axis.
    fn rotation_x(a: f32) -> Self {
        let (s, c) = a.sin_cos();
        let mut r = Self::IDENTITY;
        r.m[5] = c;
        r.m[6] = s;
        r.m[9] = -s;
        r.m[10] = c;
        r
    }

    /// Rotation about the y axis.
    fn rotation_y(a: f32) -> Self {
        let (s, c) = a.sin_cos();
        let mut r = Self::IDENTITY;
        r.m[0] = c;
        r.m[2] = -s;
        r.m[8] = s;
        r.m[10] = c;
        r
    }

    /// Rotation about the z axis.
    fn rotation_z(a: f32) -> Self {
        let (s, c) = a.sin_cos();
        let mut r = Self::IDENTITY;
        r.m[0] = c;
        r.m[1] = s;
        r.m[4] = -s;
        r.m[5] = c;
        r
    }

    /// Post-multiply by a translation.
    pub fn translate(&mut self, v: Vec3) {
        *self = *self * Self::from_translation(v);
    }

    /// Post-multiply by a scale.
    pub fn scale(&mut self, v: Vec3) {
        *self = *self * Self::from_scale(v);
    }

    /// Post-multiply by an euler rotation.
    pub fn rotate(&mut self, v: Vec3) {
        *self = *self * Self::from_rotation_euler(v);
    }

    /// Transform a point, applying translation and the perspective divide.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let m = &self.m;
        let x = m[0] * p.x + m[4] * p.y + m[8] * p.z + m[12];
        let y = m[1] * p.x + m[5] * p.y + m[9] * p.z + m[13];
        let z = m[2] * p.x + m[6] * p.y + m[10] * p.z + m[14];
        let w = m[3] * p.x + m[7] * p.y + m[11] * p.z + m[15];
        if w != 0.0 && w != 1.0 {
            Vec3::new(x / w, y / w, z / w)
        } else {
            Vec3::new(x, y, z)
        }
    }

    /// Transform a direction, ignoring translation.
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3::new(
            m[0] * v.x + m[4] * v.y + m[8] * v.z,
            m[1] * v.x + m[5] * v.y + m[9] * v.z,
            m[2] * v.x + m[6] * v.y + m[10] * v.z,
        )
    }

    /// The inverse of this matrix, or `None` if it is singular.
    pub fn inverse(&self) -> Option<Self> {
        // Gauss-Jordan elimination with partial pivoting over row-major copies.
        let mut a = [[0.0f32; 4]; 4];
        let mut inv = [[0.0f32; 4]; 4];
        for (r, row) in a.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = self.get(r, c);
            }
            inv[r][r] = 1.0;
        }
        for col in 0..4 {
            let mut pivot = col;
            for r in col + 1..4 {
                if a[r][col].abs() > a[pivot][col].abs() {
                    pivot = r;
                }
            }
            if a[pivot][col].abs() < EPSILON {
                return None;
            }
            a.swap(col, pivot);
            inv.swap(col, pivot);
            let d = a[col][col];
            for c in 0..4 {
                a[col][c] /= d;
                inv[col][c] /= d;
            }
            for r in 0..4 {
                if r == col {
                    continue;
                }
                let f = a[r][col];
                if f == 0.0 {
                    continue;
                }
                for c in 0..4 {
                    a[r][c] -= f * a[col][c];
                    inv[r][c] -= f * inv[col][c];
                }
            }
        }
        let mut out = Self::IDENTITY;
        for (r, row) in inv.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                out.m[c * 4 + r] = *v;
            }
        }
        Some(out)
    }

    /// Component-wise comparison within a tolerance.
    pub fn approx_eq(&self, other: &Self, tolerance: f32) -> bool {
        self.m
            .iter()
            .zip(other.m.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl Mul for Mat4 {
    type Output = Self;

    fn mul(self, o: Self) -> Self {
        let mut r = [0.0f32; 16];
        for c in 0..4 {
            for row in 0..4 {
                r[c * 4 + row] = (0..4).map(|k| self.m[k * 4 + row] * o.m[c * 4 + k]).sum();
            }
        }
        Self { m: r }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn translate_then_scale() {
        let mut m = Mat4::from_translation(Vec3::new(10.0, 20.0, 0.0));
        m.scale(Vec3::new(2.0, 2.0, 1.0));
        assert_eq!(
            m.transform_point(Vec3::new(1.0, 1.0, 0.0)),
            Vec3::new(12.0, 22.0, 0.0)
        );
    }

    #[test]
    fn rotate_z() {
        let m = Mat4::from_rotation_euler(Vec3::new(0.0, 0.0, FRAC_PI_2));
        let p = m.transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert!((p.x).abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn singular() {
        assert!(Mat4::from_scale(Vec3::new(0.0, 1.0, 1.0)).inverse().is_none());
        assert_eq!(Mat4::IDENTITY.inverse(), Some(Mat4::IDENTITY));
    }

    proptest! {
        #[test]
        fn inverse_roundtrip(
            tx in -100.0f32..100.0,
            ty in -100.0f32..100.0,
            sx in 0.1f32..10.0,
            sy in 0.1f32..10.0,
            rz in -3.0f32..3.0,
        ) {
            let mut m = Mat4::from_translation(Vec3::new(tx, ty, 0.0));
            m.rotate(Vec3::new(0.0, 0.0, rz));
            m.scale(Vec3::new(sx, sy, 1.0));
            let inv = m.inverse();
            prop_assert!(inv.is_some());
            if let Some(inv) = inv {
                prop_assert!((m * inv).approx_eq(&Mat4::IDENTITY, 1e-3));
            }
        }
    }
}
