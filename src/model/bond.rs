//! Bond order: the symbolic multiplicity attached to each entry of a
//! `Topology`'s bond graph.

/// Symbolic bond multiplicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
    Quadruple,
    Quintuplet,
    Amide,
    #[default]
    Unknown,
}

impl BondOrder {
    /// The integer multiplicity used by formats that encode bond order as a
    /// small integer (SDF/MOL2 `1`/`2`/`3`/`4`; aromatic is `4` in MOL2's
    /// convention and is handled by the adapter, not here).
    pub fn multiplicity(&self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Amide => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
            BondOrder::Quintuplet => 5,
            BondOrder::Aromatic => 4,
            BondOrder::Unknown => 0,
        }
    }

    pub fn from_multiplicity(n: u8) -> Self {
        match n {
            1 => BondOrder::Single,
            2 => BondOrder::Double,
            3 => BondOrder::Triple,
            4 => BondOrder::Quadruple,
            5 => BondOrder::Quintuplet,
            _ => BondOrder::Unknown,
        }
    }
}
