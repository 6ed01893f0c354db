//! `Topology`: atoms, residues, the bond graph, and the angle/dihedral/
//! improper sets derived from it.

use super::atom::Atom;
use super::bond::BondOrder;
use super::residue::Residue;
use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// An ordered, unordered-pair key `{i, j}` with `i < j`.
pub type BondKey = (usize, usize);

fn bond_key(i: usize, j: usize) -> BondKey {
    if i < j {
        (i, j)
    } else {
        (j, i)
    }
}

/// Atoms, residues, and connectivity for one frame's worth of a molecular
/// system. Angles, dihedrals, and impropers are a pure function of the bond
/// graph: mutating a bond marks them dirty, and they are recomputed lazily
/// the next time they're read.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    atoms: Vec<Atom>,
    residues: Vec<Residue>,
    bonds: BTreeSet<BondKey>,
    bond_orders: FxHashMap<BondKey, BondOrder>,
    dirty: bool,
    angles: Vec<(usize, usize, usize)>,
    dihedrals: Vec<(usize, usize, usize, usize)>,
    impropers: Vec<(usize, usize, usize, usize)>,
}

impl Topology {
    pub fn new() -> Self {
        Topology::default()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, i: usize) -> Option<&Atom> {
        self.atoms.get(i)
    }

    pub fn atom_mut(&mut self, i: usize) -> Option<&mut Atom> {
        self.atoms.get_mut(i)
    }

    /// Append an atom, returning its index.
    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.atoms.len() - 1
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn add_residue(&mut self, residue: Residue) -> usize {
        self.residues.push(residue);
        self.residues.len() - 1
    }

    pub fn residue_mut(&mut self, index: usize) -> Option<&mut Residue> {
        self.residues.get_mut(index)
    }

    /// The first residue (by insertion order) that claims atom `i`, if any.
    pub fn residue_for_atom(&self, i: usize) -> Option<&Residue> {
        self.residues.iter().find(|r| r.contains(i))
    }

    /// Add a bond between `i` and `j` (order defaults to `Unknown` unless
    /// `add_bond_with_order` is used). Both indices must be in range.
    pub fn add_bond(&mut self, i: usize, j: usize) -> Result<()> {
        self.add_bond_with_order(i, j, BondOrder::Unknown)
    }

    pub fn add_bond_with_order(&mut self, i: usize, j: usize, order: BondOrder) -> Result<()> {
        if i == j {
            return Err(Error::configuration("a bond cannot connect an atom to itself"));
        }
        if i >= self.atoms.len() || j >= self.atoms.len() {
            return Err(Error::configuration(format!(
                "bond references atom index out of range: ({i}, {j}) with {} atoms",
                self.atoms.len()
            )));
        }
        let key = bond_key(i, j);
        self.bonds.insert(key);
        self.bond_orders.insert(key, order);
        self.dirty = true;
        Ok(())
    }

    pub fn remove_bond(&mut self, i: usize, j: usize) {
        let key = bond_key(i, j);
        if self.bonds.remove(&key) {
            self.bond_orders.remove(&key);
            self.dirty = true;
        }
    }

    pub fn is_bonded(&self, i: usize, j: usize) -> bool {
        self.bonds.contains(&bond_key(i, j))
    }

    pub fn bond_order(&self, i: usize, j: usize) -> Option<BondOrder> {
        self.bond_orders.get(&bond_key(i, j)).copied()
    }

    /// Bonds as `(i, j, order)` triples, `i < j`, in ascending order.
    pub fn bonds(&self) -> impl Iterator<Item = (usize, usize, BondOrder)> + '_ {
        self.bonds
            .iter()
            .map(move |&(i, j)| (i, j, self.bond_orders.get(&(i, j)).copied().unwrap_or_default()))
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    fn neighbors(&self, atom: usize) -> Vec<usize> {
        let mut out = Vec::new();
        for &(i, j) in &self.bonds {
            if i == atom {
                out.push(j);
            } else if j == atom {
                out.push(i);
            }
        }
        out
    }

    fn ensure_derived(&mut self) {
        if !self.dirty {
            return;
        }
        self.recompute_derived();
        self.dirty = false;
    }

    fn recompute_derived(&mut self) {
        let mut angles = BTreeSet::new();
        let mut dihedrals = BTreeSet::new();
        let mut impropers = BTreeSet::new();

        for b in 0..self.atoms.len() {
            let neighbors = self.neighbors(b);

            // Angles: every pair of distinct neighbors of b, center b.
            for idx_a in 0..neighbors.len() {
                for idx_c in (idx_a + 1)..neighbors.len() {
                    let a = neighbors[idx_a];
                    let c = neighbors[idx_c];
                    if a == c {
                        continue;
                    }
                    let (lo, hi) = if a < c { (a, c) } else { (c, a) };
                    angles.insert((lo, b, hi));
                }
            }

            // Impropers: center b with degree >= 3, every triple of
            // neighbors sorted ascending.
            if neighbors.len() >= 3 {
                let mut sorted = neighbors.clone();
                sorted.sort_unstable();
                for i in 0..sorted.len() {
                    for k in (i + 1)..sorted.len() {
                        for m in (k + 1)..sorted.len() {
                            impropers.insert((b, sorted[i], sorted[k], sorted[m]));
                        }
                    }
                }
            }
        }

        // Dihedrals: every bond (b, c), every neighbor a of b (a != c),
        // every neighbor d of c (d != b), with a, b, c, d all distinct.
        for &(b, c) in &self.bonds {
            for &(b, c) in &[(b, c), (c, b)] {
                let a_candidates = self.neighbors(b);
                let d_candidates = self.neighbors(c);
                for &a in &a_candidates {
                    if a == c {
                        continue;
                    }
                    for &d in &d_candidates {
                        if d == b || d == a {
                            continue;
                        }
                        let (a, b2, c2, d) = if (a, b) <= (d, c) {
                            (a, b, c, d)
                        } else {
                            (d, c, b, a)
                        };
                        dihedrals.insert((a, b2, c2, d));
                    }
                }
            }
        }

        self.angles = angles.into_iter().collect();
        self.dihedrals = dihedrals.into_iter().collect();
        self.impropers = impropers.into_iter().collect();
    }

    pub fn angles(&mut self) -> &[(usize, usize, usize)] {
        self.ensure_derived();
        &self.angles
    }

    pub fn dihedrals(&mut self) -> &[(usize, usize, usize, usize)] {
        self.ensure_derived();
        &self.dihedrals
    }

    pub fn impropers(&mut self) -> &[(usize, usize, usize, usize)] {
        self.ensure_derived();
        &self.impropers
    }

    pub fn is_angle(&mut self, a: usize, b: usize, c: usize) -> bool {
        let (lo, hi) = if a < c { (a, c) } else { (c, a) };
        self.angles().contains(&(lo, b, hi))
    }

    pub fn is_dihedral(&mut self, a: usize, b: usize, c: usize, d: usize) -> bool {
        let canon = if (a, b) <= (d, c) { (a, b, c, d) } else { (d, c, b, a) };
        self.dihedrals().contains(&canon)
    }

    pub fn is_improper(&mut self, center: usize, mut leaves: [usize; 3]) -> bool {
        leaves.sort_unstable();
        self.impropers()
            .contains(&(center, leaves[0], leaves[1], leaves[2]))
    }

    /// Truncate to `n` atoms (dropping dependent residues and bonds) or pad
    /// with default atoms up to `n`.
    pub fn resize(&mut self, n: usize) {
        if n < self.atoms.len() {
            self.atoms.truncate(n);
            self.bonds.retain(|&(i, j)| i < n && j < n);
            self.bond_orders.retain(|&(i, j), _| i < n && j < n);
            for r in &mut self.residues {
                *r = {
                    let mut kept = Residue::new(r.name.clone());
                    kept.id = r.id;
                    for a in r.atoms() {
                        if a < n {
                            kept.add_atom(a);
                        }
                    }
                    kept
                };
            }
            self.residues.retain(|r| r.atom_count() > 0);
        } else {
            while self.atoms.len() < n {
                self.atoms.push(Atom::default());
            }
        }
        self.dirty = true;
    }

    /// Remove atom `i`, shifting every higher index down by one and
    /// rewriting bond endpoints and residue membership accordingly.
    pub fn remove(&mut self, i: usize) -> Result<()> {
        if i >= self.atoms.len() {
            return Err(Error::configuration(format!(
                "atom index {i} out of range for {} atoms",
                self.atoms.len()
            )));
        }
        self.atoms.remove(i);

        let mut new_bonds = BTreeSet::new();
        let mut new_orders = FxHashMap::default();
        for &(a, b) in &self.bonds {
            if a == i || b == i {
                continue;
            }
            let shift = |x: usize| if x > i { x - 1 } else { x };
            let key = bond_key(shift(a), shift(b));
            new_bonds.insert(key);
            if let Some(order) = self.bond_orders.get(&(a, b)) {
                new_orders.insert(key, *order);
            }
        }
        self.bonds = new_bonds;
        self.bond_orders = new_orders;

        for r in &mut self.residues {
            r.remove_atom_and_shift(i);
        }
        self.residues.retain(|r| r.atom_count() > 0);

        self.dirty = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: usize) -> Topology {
        let mut t = Topology::new();
        for i in 0..n {
            t.add_atom(Atom::new(format!("A{i}")));
        }
        for i in 0..n.saturating_sub(1) {
            t.add_bond(i, i + 1).unwrap();
        }
        t
    }

    #[test]
    fn bonds_are_size_invariant() {
        let mut t = chain(3);
        assert!(t.add_bond(0, 5).is_err());
        assert_eq!(t.bond_count(), 2);
    }

    #[test]
    fn angles_derive_from_bonds() {
        let mut t = chain(3);
        assert_eq!(t.angles(), &[(0, 1, 2)]);
    }

    #[test]
    fn dihedrals_derive_from_bonds() {
        let mut t = chain(4);
        assert_eq!(t.dihedrals(), &[(0, 1, 2, 3)]);
    }

    #[test]
    fn impropers_need_degree_three() {
        let mut t = Topology::new();
        for i in 0..4 {
            t.add_atom(Atom::new(format!("A{i}")));
        }
        // Star: center 0 bonded to 1, 2, 3.
        t.add_bond(0, 1).unwrap();
        t.add_bond(0, 2).unwrap();
        t.add_bond(0, 3).unwrap();
        assert_eq!(t.impropers(), &[(0, 1, 2, 3)]);
    }

    #[test]
    fn derived_sets_are_deduplicated_and_recomputed_on_mutation() {
        let mut t = chain(3);
        let first = t.angles().to_vec();
        assert_eq!(first.len(), 1);
        t.add_bond(0, 2).unwrap();
        let second = t.angles();
        assert!(second.len() >= first.len());
    }

    #[test]
    fn remove_shifts_bond_endpoints() {
        let mut t = chain(4); // bonds: (0,1) (1,2) (2,3)
        t.remove(1).unwrap();
        // Atom 1 removed; old 2 -> 1, old 3 -> 2. Bond (1,2) and (2,3)
        // referenced the removed atom or shift down.
        let bonds: Vec<_> = t.bonds().map(|(i, j, _)| (i, j)).collect();
        assert_eq!(bonds, vec![(1, 2)]);
        assert_eq!(t.atom_count(), 3);
    }

    #[test]
    fn resize_down_then_up_yields_clean_topology() {
        let mut t = chain(5);
        t.resize(0);
        assert_eq!(t.atom_count(), 0);
        assert_eq!(t.bond_count(), 0);
        t.resize(3);
        assert_eq!(t.atom_count(), 3);
        assert_eq!(t.bond_count(), 0);
    }

    #[test]
    fn residue_lookup() {
        let mut t = chain(3);
        let mut r = Residue::with_id("ALA", 1);
        r.add_atom(0);
        r.add_atom(1);
        t.add_residue(r);
        assert_eq!(t.residue_for_atom(1).unwrap().name, "ALA");
        assert!(t.residue_for_atom(2).is_none());
    }
}
