//! The `Residue` record: a named, optionally numbered group of atom indices.

use crate::primitives::Property;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// A residue: a name, an optional semantic id, and an ordered set of atom
/// indices into the owning `Topology`. A residue does not own its atoms.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Residue {
    pub name: String,
    pub id: Option<u64>,
    atoms: BTreeSet<usize>,
    properties: FxHashMap<String, Property>,
}

impl Residue {
    pub fn new(name: impl Into<String>) -> Self {
        Residue {
            name: name.into(),
            id: None,
            atoms: BTreeSet::new(),
            properties: FxHashMap::default(),
        }
    }

    pub fn with_id(name: impl Into<String>, id: u64) -> Self {
        let mut r = Residue::new(name);
        r.id = Some(id);
        r
    }

    pub fn add_atom(&mut self, index: usize) {
        self.atoms.insert(index);
    }

    pub fn contains(&self, index: usize) -> bool {
        self.atoms.contains(&index)
    }

    pub fn atoms(&self) -> impl Iterator<Item = usize> + '_ {
        self.atoms.iter().copied()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Property>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn property(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    /// Shift every atom index `>= at` down by one (used when atom `at` is
    /// removed from the owning topology), dropping the reference to `at`
    /// itself if present.
    pub(crate) fn remove_atom_and_shift(&mut self, at: usize) {
        self.atoms = self
            .atoms
            .iter()
            .filter(|&&i| i != at)
            .map(|&i| if i > at { i - 1 } else { i })
            .collect();
    }
}
