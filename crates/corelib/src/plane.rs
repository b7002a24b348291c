//! Infinite plane used as the reflective surface.

use crate::{Mat4, Vec3};

/// Plane `normal . p == distance` with a unit normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    /// Plane through `point` facing `normal` (normalized here; zero falls back to +Z).
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.try_normalize().unwrap_or(Vec3::Z);
        Self {
            normal,
            distance: normal.dot(point),
        }
    }

    #[inline]
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) - self.distance
    }

    #[inline]
    pub fn reflect_point(&self, p: Vec3) -> Vec3 {
        p - 2.0 * self.signed_distance(p) * self.normal
    }

    #[inline]
    pub fn reflect_vector(&self, v: Vec3) -> Vec3 {
        v - 2.0 * self.normal.dot(v) * self.normal
    }

    /// Householder reflection as an affine matrix.
    pub fn reflection_matrix(&self) -> Mat4 {
        let n = self.normal;
        let d = self.distance;
        Mat4::from_cols_array(&[
            1.0 - 2.0 * n.x * n.x,
            -2.0 * n.x * n.y,
            -2.0 * n.x * n.z,
            0.0,
            -2.0 * n.y * n.x,
            1.0 - 2.0 * n.y * n.y,
            -2.0 * n.y * n.z,
            0.0,
            -2.0 * n.z * n.x,
            -2.0 * n.z * n.y,
            1.0 - 2.0 * n.z * n.z,
            0.0,
            2.0 * d * n.x,
            2.0 * d * n.y,
            2.0 * d * n.z,
            1.0,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3;

    #[test]
    fn reflection_is_involution() {
        let plane = Plane::from_point_normal(vec3(0.0, 1.0, -3.0), vec3(0.3, 0.2, 1.0));
        let p = vec3(2.0, -1.5, 7.0);
        let back = plane.reflect_point(plane.reflect_point(p));
        assert!((back - p).length() < 1e-4);
    }

    #[test]
    fn matrix_agrees_with_point_reflection() {
        let plane = Plane::from_point_normal(vec3(0.0, 0.0, -6.0), Vec3::Z);
        let p = vec3(1.0, 2.0, 20.0);
        let by_matrix = plane.reflection_matrix().transform_point3(p);
        assert!((by_matrix - plane.reflect_point(p)).length() < 1e-5);
        assert!((by_matrix - vec3(1.0, 2.0, -32.0)).length() < 1e-5);
    }

    #[test]
    fn zero_normal_falls_back_to_z() {
        let plane = Plane::from_point_normal(Vec3::ZERO, Vec3::ZERO);
        assert_eq!(plane.normal, Vec3::Z);
    }
}
