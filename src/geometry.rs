//! Geometric measurements (distance, angle, dihedral, out-of-plane) under
//! minimum-image periodic boundary conditions, and Van der Waals bond
//! guessing.

use crate::error::{Error, Result};
use crate::model::{BondOrder, Element, Frame, UnitCell};
use crate::primitives::Vector3D;

/// Displacement `b - a`, wrapped to the minimum image under `cell`. For an
/// infinite cell this is just `b - a`.
pub fn minimum_image(a: Vector3D, b: Vector3D, cell: &UnitCell) -> Vector3D {
    use crate::model::CellShape;
    let delta = b - a;
    match cell.shape() {
        CellShape::Infinite => delta,
        _ => {
            // Wrap in fractional coordinates: x_frac -= round(x_frac).
            let inv = match cell.matrix().try_inverse() {
                Some(inv) => inv,
                None => return delta,
            };
            let frac = inv.mul_vector(&delta);
            let wrapped = Vector3D::new(
                frac.x() - frac.x().round(),
                frac.y() - frac.y().round(),
                frac.z() - frac.z().round(),
            );
            cell.matrix().mul_vector(&wrapped)
        }
    }
}

/// Minimum-image distance between atoms `i` and `j` in `frame`.
pub fn distance(frame: &Frame, i: usize, j: usize) -> f64 {
    let positions = frame.positions();
    minimum_image(positions[i], positions[j], frame.cell()).norm()
}

/// Angle in radians at vertex `b`, between `a-b` and `c-b`.
pub fn angle(frame: &Frame, a: usize, b: usize, c: usize) -> f64 {
    let positions = frame.positions();
    let cell = frame.cell();
    let v1 = minimum_image(positions[b], positions[a], cell);
    let v2 = minimum_image(positions[b], positions[c], cell);
    let cos_theta = (v1.dot(&v2) / (v1.norm() * v2.norm())).clamp(-1.0, 1.0);
    cos_theta.acos()
}

/// Dihedral angle in radians around the `b-c` bond of the `a-b-c-d` chain.
pub fn dihedral(frame: &Frame, a: usize, b: usize, c: usize, d: usize) -> f64 {
    let positions = frame.positions();
    let cell = frame.cell();
    let b0 = minimum_image(positions[b], positions[a], cell);
    let b1 = minimum_image(positions[b], positions[c], cell);
    let b2 = minimum_image(positions[c], positions[d], cell);

    let b1xb2 = b1.cross(&b2);
    let b0xb1 = b0.cross(&b1);

    let x = b0xb1.dot(&b1xb2);
    let y = b0.norm() * b0xb1.dot(&b2);
    y.atan2(x)
}

/// Out-of-plane angle: the angle between the `i-m` bond and the plane
/// defined by `j`, `k`, `m`, used to validate impropers.
pub fn out_of_plane(frame: &Frame, i: usize, j: usize, k: usize, m: usize) -> f64 {
    let positions = frame.positions();
    let cell = frame.cell();
    let rji = minimum_image(positions[j], positions[i], cell);
    let rjk = minimum_image(positions[j], positions[k], cell);
    let rjm = minimum_image(positions[j], positions[m], cell);

    let normal = rjk.cross(&rjm);
    let normal_norm = normal.norm();
    if normal_norm < 1e-12 || rji.norm() < 1e-12 {
        return 0.0;
    }
    let sin_angle = (rji.dot(&normal) / (rji.norm() * normal_norm)).clamp(-1.0, 1.0);
    sin_angle.asin()
}

/// Guess bonds from interatomic distances using Van der Waals radii: a bond
/// is added between `i` and `j` when their distance falls in
/// `[0.5 * min(r_i, r_j), 0.833 * (r_i + r_j)]`. Fails if any atom's element
/// has no known radius.
pub fn guess_topology(frame: &mut Frame) -> Result<()> {
    let n = frame.size();
    let mut radii = Vec::with_capacity(n);
    for i in 0..n {
        let radius = frame
            .topology()
            .atom(i)
            .and_then(|a| Element::from_symbol(&a.r#type))
            .and_then(|e| e.vdw_radius())
            .ok_or_else(|| Error::other(format!("missing VdW radius for atom {i}")))?;
        radii.push(radius);
    }

    let mut bonds = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            let d = distance(frame, i, j);
            let upper = 0.833 * (radii[i] + radii[j]);
            let lower = 0.5 * radii[i].min(radii[j]);
            if d >= lower && d <= upper {
                bonds.push((i, j));
            }
        }
    }

    for (i, j) in bonds {
        let _ = frame.topology_mut().add_bond_with_order(i, j, BondOrder::Unknown);
    }
    Ok(())
}
