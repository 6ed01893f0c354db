//! `UnitCell`: the periodic boundary shape of a frame.

use crate::primitives::{Matrix3D, Vector3D};

/// The shape of a unit cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellShape {
    /// No periodicity.
    Infinite,
    /// Right-angle cell: diagonal matrix.
    Orthorhombic,
    /// General parallelepiped.
    Triclinic,
}

/// A periodic (or non-periodic) simulation cell, stored as a canonical 3x3
/// matrix whose rows are the cell vectors `a`, `b`, `c`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitCell {
    shape: CellShape,
    matrix: Matrix3D,
}

impl UnitCell {
    pub fn infinite() -> Self {
        UnitCell {
            shape: CellShape::Infinite,
            matrix: Matrix3D::ZERO,
        }
    }

    /// An orthorhombic cell with edge lengths `a`, `b`, `c` (angstroms).
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Self {
        UnitCell {
            shape: CellShape::Orthorhombic,
            matrix: Matrix3D::from_rows(
                Vector3D::new(a, 0.0, 0.0),
                Vector3D::new(0.0, b, 0.0),
                Vector3D::new(0.0, 0.0, c),
            ),
        }
    }

    /// A triclinic cell from lengths `a, b, c` (angstroms) and angles
    /// `alpha, beta, gamma` (degrees), following the standard
    /// crystallographic convention: `a` along x, `b` in the xy-plane.
    pub fn triclinic(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        let deg = std::f64::consts::PI / 180.0;
        let (alpha, beta, gamma) = (alpha * deg, beta * deg, gamma * deg);

        let bx = b * gamma.cos();
        let by = b * gamma.sin();

        let cx = c * beta.cos();
        let cy = if gamma.sin().abs() > 1e-12 {
            c * (alpha.cos() - beta.cos() * gamma.cos()) / gamma.sin()
        } else {
            0.0
        };
        let cz_sq = c * c - cx * cx - cy * cy;
        let cz = if cz_sq > 0.0 { cz_sq.sqrt() } else { 0.0 };

        UnitCell {
            shape: CellShape::Triclinic,
            matrix: Matrix3D::from_rows(
                Vector3D::new(a, 0.0, 0.0),
                Vector3D::new(bx, by, 0.0),
                Vector3D::new(cx, cy, cz),
            ),
        }
    }

    /// Build a cell directly from a row-major matrix of cell vectors.
    pub fn from_matrix(matrix: Matrix3D) -> Self {
        let shape = if matrix == Matrix3D::ZERO {
            CellShape::Infinite
        } else if Self::is_diagonal(&matrix) {
            CellShape::Orthorhombic
        } else {
            CellShape::Triclinic
        };
        UnitCell { shape, matrix }
    }

    fn is_diagonal(m: &Matrix3D) -> bool {
        for i in 0..3 {
            let row = m.row(i);
            for j in 0..3 {
                if i != j && row[j].abs() > 1e-9 {
                    return false;
                }
            }
        }
        true
    }

    pub fn shape(&self) -> CellShape {
        self.shape
    }

    pub fn matrix(&self) -> &Matrix3D {
        &self.matrix
    }

    pub fn lengths(&self) -> (f64, f64, f64) {
        let a = self.matrix.row(0);
        let b = self.matrix.row(1);
        let c = self.matrix.row(2);
        (a.norm(), b.norm(), c.norm())
    }

    /// Cell angles `(alpha, beta, gamma)` in degrees, between `(b,c)`,
    /// `(a,c)`, `(a,b)` respectively.
    pub fn angles(&self) -> (f64, f64, f64) {
        let a = self.matrix.row(0);
        let b = self.matrix.row(1);
        let c = self.matrix.row(2);
        let angle = |u: Vector3D, v: Vector3D| {
            let nu = u.norm();
            let nv = v.norm();
            if nu < 1e-12 || nv < 1e-12 {
                return 90.0;
            }
            (u.dot(&v) / (nu * nv)).clamp(-1.0, 1.0).acos() * 180.0 / std::f64::consts::PI
        };
        (angle(b, c), angle(a, c), angle(a, b))
    }

    /// Cell volume: zero for an infinite cell, otherwise `|det(matrix)|`.
    pub fn volume(&self) -> f64 {
        match self.shape {
            CellShape::Infinite => 0.0,
            _ => self.matrix.determinant().abs(),
        }
    }
}

impl Default for UnitCell {
    fn default() -> Self {
        UnitCell::infinite()
    }
}
