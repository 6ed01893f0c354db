//! moltraj - read and write molecular-simulation trajectories across many
//! file formats behind one uniform frame model.
//!
//! ## Modules
//!
//! - [`model`] - atoms, residues, topology, unit cells, and frames
//! - [`primitives`] - vector/matrix/property value types
//! - [`file`] - the compressed/plain file substrate every format reads through
//! - [`registry`] - format name/extension lookup and the `Format` trait
//! - [`formats`] - the built-in format adapters (XYZ, GRO, PDB, SDF, MOL2,
//!   Tinker XYZ, LAMMPS data, Amber NetCDF, TNG, TRR/XTC)
//! - [`trajectory`] - the engine binding a file to a format for sequential
//!   or random-access reads and writes
//! - [`geometry`] - distance/angle/dihedral/out-of-plane measurement and
//!   bond guessing
//! - [`selection`] - the textual atom/pair/angle/dihedral selection language
//! - [`error`] - the crate's error type
//! - [`warning`] - the pluggable non-fatal warning sink

pub mod error;
pub mod file;
pub mod formats;
pub mod geometry;
pub mod model;
pub mod primitives;
pub mod registry;
pub mod selection;
pub mod trajectory;
pub mod warning;

pub use error::{Error, Result};
pub use model::{Atom, BondOrder, CellShape, Element, Frame, Residue, Topology, UnitCell};
pub use primitives::{Matrix3D, Property, Vector3D};
pub use registry::{format_by_extension, format_by_name, list_formats, FormatMetadata};
pub use selection::Selection;
pub use trajectory::{OpenOptions, Trajectory};

/// Crate version, as set in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn builtin_formats_are_registered() {
        assert!(!list_formats().is_empty());
    }
}
