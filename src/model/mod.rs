//! The frame data model: atoms, residues, topology, unit cells, and frames.

pub mod atom;
pub mod bond;
pub mod cell;
pub mod frame;
pub mod residue;
pub mod topology;

pub use atom::{Atom, Element};
pub use bond::BondOrder;
pub use cell::{CellShape, UnitCell};
pub use frame::Frame;
pub use residue::Residue;
pub use topology::Topology;
