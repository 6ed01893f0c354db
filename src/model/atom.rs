//! The `Atom` record and the periodic-table data backing element lookups.

use crate::primitives::Property;
use rustc_hash::FxHashMap;

/// A single atom: a name, a type, a mass, a charge, and an open property map.
///
/// Two atoms are equal iff all of these intrinsic fields are equal; atoms do
/// not carry a position (positions live in `Frame::positions`, indexed in
/// parallel with the owning `Topology`'s atom list).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Atom {
    pub name: String,
    pub r#type: String,
    pub mass: f64,
    pub charge: f64,
    properties: FxHashMap<String, Property>,
}

impl Atom {
    /// A new atom with the given name. `type` defaults to `name`, mass and
    /// charge default to zero.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Atom {
            r#type: name.clone(),
            name,
            mass: 0.0,
            charge: 0.0,
            properties: FxHashMap::default(),
        }
    }

    /// An atom built from an element symbol, with mass and type resolved
    /// from the periodic-table table in [`Element`].
    pub fn from_element(symbol: &str) -> Self {
        let element = Element::from_symbol(symbol).unwrap_or(Element::Unknown);
        Atom {
            name: symbol.to_string(),
            r#type: symbol.to_string(),
            mass: element.mass(),
            charge: 0.0,
            properties: FxHashMap::default(),
        }
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
}

/// Chemical element, used to resolve default mass and Van der Waals radius
/// for bond guessing. Ported from the previous workspace's `core::atom::Element`,
/// trimmed to the entries bond-guessing and mass lookup actually need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Element {
    H,
    He,
    Li,
    Be,
    B,
    C,
    N,
    O,
    F,
    Ne,
    Na,
    Mg,
    Al,
    Si,
    P,
    S,
    Cl,
    Ar,
    K,
    Ca,
    Fe,
    Cu,
    Zn,
    Br,
    I,
    Unknown,
}

impl Element {
    pub fn from_symbol(s: &str) -> Option<Self> {
        Some(match s.to_uppercase().as_str() {
            "H" => Element::H,
            "HE" => Element::He,
            "LI" => Element::Li,
            "BE" => Element::Be,
            "B" => Element::B,
            "C" => Element::C,
            "N" => Element::N,
            "O" => Element::O,
            "F" => Element::F,
            "NE" => Element::Ne,
            "NA" => Element::Na,
            "MG" => Element::Mg,
            "AL" => Element::Al,
            "SI" => Element::Si,
            "P" => Element::P,
            "S" => Element::S,
            "CL" => Element::Cl,
            "AR" => Element::Ar,
            "K" => Element::K,
            "CA" => Element::Ca,
            "FE" => Element::Fe,
            "CU" => Element::Cu,
            "ZN" => Element::Zn,
            "BR" => Element::Br,
            "I" => Element::I,
            _ => return None,
        })
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Element::H => "H",
            Element::He => "He",
            Element::Li => "Li",
            Element::Be => "Be",
            Element::B => "B",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::F => "F",
            Element::Ne => "Ne",
            Element::Na => "Na",
            Element::Mg => "Mg",
            Element::Al => "Al",
            Element::Si => "Si",
            Element::P => "P",
            Element::S => "S",
            Element::Cl => "Cl",
            Element::Ar => "Ar",
            Element::K => "K",
            Element::Ca => "Ca",
            Element::Fe => "Fe",
            Element::Cu => "Cu",
            Element::Zn => "Zn",
            Element::Br => "Br",
            Element::I => "I",
            Element::Unknown => "X",
        }
    }

    pub fn mass(&self) -> f64 {
        match self {
            Element::H => 1.008,
            Element::He => 4.003,
            Element::Li => 6.941,
            Element::Be => 9.012,
            Element::B => 10.811,
            Element::C => 12.011,
            Element::N => 14.007,
            Element::O => 15.999,
            Element::F => 18.998,
            Element::Ne => 20.180,
            Element::Na => 22.990,
            Element::Mg => 24.305,
            Element::Al => 26.982,
            Element::Si => 28.086,
            Element::P => 30.974,
            Element::S => 32.065,
            Element::Cl => 35.453,
            Element::Ar => 39.948,
            Element::K => 39.098,
            Element::Ca => 40.078,
            Element::Fe => 55.845,
            Element::Cu => 63.546,
            Element::Zn => 65.38,
            Element::Br => 79.904,
            Element::I => 126.904,
            Element::Unknown => 0.0,
        }
    }

    /// Van der Waals radius in angstroms, used by `guess_topology`.
    pub fn vdw_radius(&self) -> Option<f64> {
        Some(match self {
            Element::H => 1.20,
            Element::He => 1.40,
            Element::Li => 1.82,
            Element::Be => 1.53,
            Element::B => 1.92,
            Element::C => 1.70,
            Element::N => 1.55,
            Element::O => 1.52,
            Element::F => 1.47,
            Element::Ne => 1.54,
            Element::Na => 2.27,
            Element::Mg => 1.73,
            Element::Al => 1.84,
            Element::Si => 2.10,
            Element::P => 1.80,
            Element::S => 1.80,
            Element::Cl => 1.75,
            Element::Ar => 1.88,
            Element::K => 2.75,
            Element::Ca => 2.31,
            Element::Fe => 2.04,
            Element::Cu => 1.96,
            Element::Zn => 2.01,
            Element::Br => 1.85,
            Element::I => 1.98,
            Element::Unknown => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_equality_is_structural() {
        let mut a = Atom::new("CA");
        let mut b = Atom::new("CA");
        assert_eq!(a, b);
        a.mass = 12.0;
        assert_ne!(a, b);
        b.mass = 12.0;
        assert_eq!(a, b);
    }

    #[test]
    fn from_element_resolves_mass() {
        let o = Atom::from_element("O");
        assert!((o.mass - 15.999).abs() < 1e-6);
    }

    #[test]
    fn properties_roundtrip() {
        let mut a = Atom::new("CA");
        a.set_property("flexible", true);
        assert_eq!(a.property("flexible").unwrap().as_bool().unwrap(), true);
        assert!(a.property("missing").is_none());
    }
}
