//! Built-in format adapters and their registration with [`crate::registry`].
//!
//! Each submodule owns one file format: a `metadata()` function describing
//! its name/extensions/read-write support, and a `construct(OpenMode)`
//! function building a fresh `Box<dyn Format>` for a newly opened file.

mod amber_netcdf;
mod gro;
mod lammps_data;
mod mol2;
mod pdb;
mod sdf;
mod tinker;
mod tng;
mod trr_xtc;
mod xyz;

use crate::error::Result;
use crate::registry::{Constructor, FormatMetadata};

/// Register every built-in format with `register`. Called once, lazily, by
/// [`crate::registry::registry`].
pub(crate) fn register_builtin_formats(
    register: &mut dyn FnMut(FormatMetadata, Constructor) -> Result<()>,
) -> Result<()> {
    register(xyz::metadata(), xyz::construct as Constructor)?;
    register(gro::metadata(), gro::construct as Constructor)?;
    register(pdb::metadata(), pdb::construct as Constructor)?;
    register(sdf::metadata(), sdf::construct as Constructor)?;
    register(mol2::metadata(), mol2::construct as Constructor)?;
    register(tinker::metadata(), tinker::construct as Constructor)?;
    register(lammps_data::metadata(), lammps_data::construct as Constructor)?;
    register(amber_netcdf::metadata(), amber_netcdf::construct as Constructor)?;
    register(tng::metadata(), tng::construct as Constructor)?;
    register(trr_xtc::metadata(), trr_xtc::construct as Constructor)?;
    Ok(())
}
