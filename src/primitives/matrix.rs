//! 3x3 matrix of 64-bit floats, used as the canonical unit-cell representation.

use super::vector::Vector3D;
use nalgebra::Matrix3;

/// A 3x3 matrix of 64-bit floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3D(Matrix3<f64>);

impl Matrix3D {
    pub const ZERO: Matrix3D = Matrix3D(Matrix3::new(
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    ));

    /// Build a matrix from its three row vectors.
    pub fn from_rows(r0: Vector3D, r1: Vector3D, r2: Vector3D) -> Self {
        Matrix3D(Matrix3::new(
            r0.x(), r0.y(), r0.z(), r1.x(), r1.y(), r1.z(), r2.x(), r2.y(), r2.z(),
        ))
    }

    pub fn identity() -> Self {
        Matrix3D(Matrix3::identity())
    }

    pub fn determinant(&self) -> f64 {
        self.0.determinant()
    }

    /// Inverse of this matrix, or `None` if it is singular (e.g. the all-zero
    /// matrix of an infinite cell).
    pub fn try_inverse(&self) -> Option<Matrix3D> {
        self.0.try_inverse().map(Matrix3D)
    }

    pub fn row(&self, i: usize) -> Vector3D {
        let r = self.0.row(i);
        Vector3D::new(r[0], r[1], r[2])
    }

    /// `M * v`, treating `v` as a column vector.
    pub fn mul_vector(&self, v: &Vector3D) -> Vector3D {
        Vector3D::from_inner(self.0 * *v.inner())
    }
}

impl Default for Matrix3D {
    fn default() -> Self {
        Matrix3D::ZERO
    }
}
