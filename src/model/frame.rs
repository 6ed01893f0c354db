//! `Frame`: one snapshot of a trajectory — positions, optional velocities, a
//! topology, a unit cell, and free-form properties.

use super::cell::UnitCell;
use super::topology::Topology;
use crate::error::{Error, Result};
use crate::primitives::{Property, Vector3D};
use rustc_hash::FxHashMap;

/// A single simulation snapshot.
///
/// `positions` (and `velocities`, when present) are always kept the same
/// length as `topology.atom_count()`; every mutator that changes atom count
/// keeps the three in lock-step.
#[derive(Debug, Clone)]
pub struct Frame {
    step: usize,
    positions: Vec<Vector3D>,
    velocities: Option<Vec<Vector3D>>,
    topology: Topology,
    cell: UnitCell,
    properties: FxHashMap<String, Property>,
}

impl Frame {
    pub fn new() -> Self {
        Frame {
            step: 0,
            positions: Vec::new(),
            velocities: None,
            topology: Topology::new(),
            cell: UnitCell::infinite(),
            properties: FxHashMap::default(),
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn set_step(&mut self, step: usize) {
        self.step = step;
    }

    pub fn size(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Vector3D] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [Vector3D] {
        &mut self.positions
    }

    pub fn velocities(&self) -> Option<&[Vector3D]> {
        self.velocities.as_deref()
    }

    pub fn velocities_mut(&mut self) -> Option<&mut [Vector3D]> {
        self.velocities.as_deref_mut()
    }

    /// Allocate a (zeroed) velocity array the same length as `positions`, or
    /// drop the existing one.
    pub fn set_has_velocities(&mut self, has: bool) {
        if has {
            if self.velocities.is_none() {
                self.velocities = Some(vec![Vector3D::ZERO; self.positions.len()]);
            }
        } else {
            self.velocities = None;
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn topology_mut(&mut self) -> &mut Topology {
        &mut self.topology
    }

    /// Replace the topology wholesale. The new topology's atom count must
    /// match `size()`, or match zero (an empty placeholder is always
    /// accepted and then resized to fit).
    pub fn set_topology(&mut self, mut topology: Topology) -> Result<()> {
        if topology.atom_count() == 0 && self.size() > 0 {
            topology.resize(self.size());
        } else if topology.atom_count() != self.size() {
            return Err(Error::configuration(format!(
                "topology has {} atoms but frame has {} positions",
                topology.atom_count(),
                self.size()
            )));
        }
        self.topology = topology;
        Ok(())
    }

    pub fn cell(&self) -> &UnitCell {
        &self.cell
    }

    pub fn set_cell(&mut self, cell: UnitCell) {
        self.cell = cell;
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Property>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn property(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Append one atom's position and a matching slot in the topology. If
    /// this frame tracks velocities, `velocity` is pushed alongside (or
    /// `Vector3D::ZERO` if omitted); if the frame doesn't track velocities,
    /// `velocity` is ignored.
    pub fn add_atom(&mut self, atom: super::atom::Atom, position: Vector3D, velocity: Option<Vector3D>) -> usize {
        self.positions.push(position);
        if let Some(velocities) = &mut self.velocities {
            velocities.push(velocity.unwrap_or(Vector3D::ZERO));
        }
        self.topology.add_atom(atom)
    }

    /// Resize positions (and velocities, and the topology) to `n` atoms.
    /// Growing pads with zeroed positions and default atoms; shrinking
    /// truncates from the end, dropping any bonds/angles/dihedrals that
    /// referenced the removed atoms.
    pub fn resize(&mut self, n: usize) {
        self.positions.resize(n, Vector3D::ZERO);
        if let Some(velocities) = &mut self.velocities {
            velocities.resize(n, Vector3D::ZERO);
        }
        self.topology.resize(n);
    }

    /// Remove the atom at `i`, shifting every higher index down by one.
    pub fn remove(&mut self, i: usize) -> Result<()> {
        if i >= self.positions.len() {
            return Err(Error::configuration(format!(
                "atom index {i} out of range for {} atoms",
                self.positions.len()
            )));
        }
        self.positions.remove(i);
        if let Some(velocities) = &mut self.velocities {
            velocities.remove(i);
        }
        self.topology.remove(i)
    }
}

impl Default for Frame {
    fn default() -> Self {
        Frame::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom::Atom;

    #[test]
    fn new_frame_is_empty() {
        let frame = Frame::new();
        assert_eq!(frame.size(), 0);
        assert!(frame.velocities().is_none());
    }

    #[test]
    fn add_atom_keeps_positions_and_topology_in_lockstep() {
        let mut frame = Frame::new();
        frame.add_atom(Atom::new("O"), Vector3D::new(0.0, 0.0, 0.0), None);
        frame.add_atom(Atom::new("H"), Vector3D::new(1.0, 0.0, 0.0), None);
        assert_eq!(frame.size(), 2);
        assert_eq!(frame.topology().atom_count(), 2);
    }

    #[test]
    fn resize_grows_and_shrinks_in_lockstep() {
        let mut frame = Frame::new();
        frame.resize(5);
        assert_eq!(frame.size(), 5);
        assert_eq!(frame.topology().atom_count(), 5);
        frame.resize(0);
        assert_eq!(frame.size(), 0);
        assert_eq!(frame.topology().atom_count(), 0);
        frame.resize(3);
        assert_eq!(frame.size(), 3);
    }

    #[test]
    fn set_topology_rejects_size_mismatch() {
        let mut frame = Frame::new();
        frame.resize(2);
        let mismatched = Topology::new();
        // Empty topology is a placeholder: it gets resized to fit.
        assert!(frame.set_topology(mismatched).is_ok());
        assert_eq!(frame.topology().atom_count(), 2);

        let mut wrong_size = Topology::new();
        wrong_size.add_atom(Atom::new("X"));
        assert!(frame.set_topology(wrong_size).is_err());
    }

    #[test]
    fn add_atom_pushes_given_velocity_when_frame_tracks_velocities() {
        let mut frame = Frame::new();
        frame.set_has_velocities(true);
        frame.add_atom(Atom::new("O"), Vector3D::new(0.0, 0.0, 0.0), Some(Vector3D::new(1.0, 2.0, 3.0)));
        frame.add_atom(Atom::new("H"), Vector3D::new(1.0, 0.0, 0.0), None);
        let velocities = frame.velocities().unwrap();
        assert_eq!(velocities[0], Vector3D::new(1.0, 2.0, 3.0));
        assert_eq!(velocities[1], Vector3D::ZERO);
    }

    #[test]
    fn velocities_toggle_and_track_size() {
        let mut frame = Frame::new();
        frame.resize(3);
        frame.set_has_velocities(true);
        assert_eq!(frame.velocities().unwrap().len(), 3);
        frame.set_has_velocities(false);
        assert!(frame.velocities().is_none());
    }

    #[test]
    fn remove_keeps_positions_and_topology_aligned() {
        let mut frame = Frame::new();
        frame.add_atom(Atom::new("A"), Vector3D::new(0.0, 0.0, 0.0), None);
        frame.add_atom(Atom::new("B"), Vector3D::new(1.0, 0.0, 0.0), None);
        frame.add_atom(Atom::new("C"), Vector3D::new(2.0, 0.0, 0.0), None);
        frame.remove(1).unwrap();
        assert_eq!(frame.size(), 2);
        assert_eq!(frame.positions()[1], Vector3D::new(2.0, 0.0, 0.0));
    }
}
