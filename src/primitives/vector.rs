//! 3-component vector of 64-bit floats.

use nalgebra::Vector3;
use std::ops::{Add, Index, IndexMut, Mul, Neg, Sub};

/// An ordered triple of 64-bit floats, used for positions, velocities, and
/// anything else that needs plain 3-vector arithmetic.
///
/// Backed by `nalgebra::Vector3<f64>` so cell/geometry code gets real linear
/// algebra (dot, cross, norm) without reimplementing it by hand.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vector3D(Vector3<f64>);

impl Vector3D {
    pub const ZERO: Vector3D = Vector3D(Vector3::new(0.0, 0.0, 0.0));

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3D(Vector3::new(x, y, z))
    }

    pub fn x(&self) -> f64 {
        self.0.x
    }

    pub fn y(&self) -> f64 {
        self.0.y
    }

    pub fn z(&self) -> f64 {
        self.0.z
    }

    pub fn dot(&self, other: &Vector3D) -> f64 {
        self.0.dot(&other.0)
    }

    pub fn cross(&self, other: &Vector3D) -> Vector3D {
        Vector3D(self.0.cross(&other.0))
    }

    pub fn norm(&self) -> f64 {
        self.0.norm()
    }

    pub fn normalize(&self) -> Vector3D {
        Vector3D(self.0.normalize())
    }

    pub(crate) fn inner(&self) -> &Vector3<f64> {
        &self.0
    }

    pub(crate) fn from_inner(v: Vector3<f64>) -> Self {
        Vector3D(v)
    }
}

impl Default for Vector3D {
    fn default() -> Self {
        Vector3D::ZERO
    }
}

impl Index<usize> for Vector3D {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

impl IndexMut<usize> for Vector3D {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.0[i]
    }
}

impl Add for Vector3D {
    type Output = Vector3D;
    fn add(self, rhs: Vector3D) -> Vector3D {
        Vector3D(self.0 + rhs.0)
    }
}

impl Sub for Vector3D {
    type Output = Vector3D;
    fn sub(self, rhs: Vector3D) -> Vector3D {
        Vector3D(self.0 - rhs.0)
    }
}

impl Mul<f64> for Vector3D {
    type Output = Vector3D;
    fn mul(self, rhs: f64) -> Vector3D {
        Vector3D(self.0 * rhs)
    }
}

impl Neg for Vector3D {
    type Output = Vector3D;
    fn neg(self) -> Vector3D {
        Vector3D(-self.0)
    }
}
