//! A reduced-fidelity stand-in for Amber's NetCDF trajectory convention: a
//! small fixed header followed by one fixed-stride binary record per step.
//!
//! This does not read or write real NetCDF files (that needs the classic or
//! HDF5-backed NetCDF container format, which is out of scope here). It
//! honors the same shape — one header, N identically-sized frames, each
//! frame's positions and an optional velocity block in angstroms and
//! angstroms/picosecond — over a private binary layout, little-endian
//! throughout.

use crate::error::{Error, Result};
use crate::file::{OpenMode, Substrate};
use crate::model::{Atom, Frame, UnitCell};
use crate::primitives::Vector3D;
use crate::registry::{Format, FormatMetadata};
use byteorder::{ByteOrder, LittleEndian};

const MAGIC: &[u8; 4] = b"MTNC";
const HEADER_LEN: usize = 16;

pub(crate) fn metadata() -> FormatMetadata {
    FormatMetadata {
        name: "AmberNetCDF",
        extensions: &["nc", "ncdf"],
        description: "fixed header plus one fixed-stride binary record per step",
        supports_read: true,
        supports_write: true,
        supports_append: false,
    }
}

pub(crate) fn construct(_mode: OpenMode) -> Box<dyn Format> {
    Box::new(AmberNetCdfFormat {
        natoms: 0,
        has_velocities: false,
        header_read: false,
    })
}

pub struct AmberNetCdfFormat {
    natoms: usize,
    has_velocities: bool,
    header_read: bool,
}

impl AmberNetCdfFormat {
    fn record_len(natoms: usize, has_velocities: bool) -> usize {
        let positions = natoms * 3 * 8;
        let velocities = if has_velocities { positions } else { 0 };
        8 + 9 * 8 + positions + velocities
    }

    fn read_header(&mut self, substrate: &mut Substrate) -> Result<()> {
        let bytes = substrate.read_exact(HEADER_LEN)?;
        if &bytes[0..4] != MAGIC {
            return Err(Error::format("not an Amber NetCDF stand-in file (bad magic)"));
        }
        self.natoms = LittleEndian::read_u32(&bytes[4..8]) as usize;
        self.has_velocities = bytes[8] != 0;
        self.header_read = true;
        Ok(())
    }

    fn write_header(substrate: &mut Substrate, natoms: usize, has_velocities: bool) -> Result<()> {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(MAGIC);
        LittleEndian::write_u32(&mut bytes[4..8], natoms as u32);
        bytes[8] = has_velocities as u8;
        substrate.write_bytes(&bytes)
    }

    fn read_record(&self, substrate: &mut Substrate) -> Result<Frame> {
        let bytes = substrate.read_exact(Self::record_len(self.natoms, self.has_velocities))?;
        let step = LittleEndian::read_u64(&bytes[0..8]) as usize;

        let mut cell_rows = [Vector3D::ZERO; 3];
        for (row, chunk) in cell_rows.iter_mut().zip(bytes[8..8 + 72].chunks(24)) {
            *row = Vector3D::new(
                LittleEndian::read_f64(&chunk[0..8]),
                LittleEndian::read_f64(&chunk[8..16]),
                LittleEndian::read_f64(&chunk[16..24]),
            );
        }

        let mut frame = Frame::new();
        frame.set_cell(UnitCell::from_matrix(crate::primitives::Matrix3D::from_rows(
            cell_rows[0],
            cell_rows[1],
            cell_rows[2],
        )));
        frame.set_step(step);

        let positions_start = 8 + 72;
        for i in 0..self.natoms {
            let off = positions_start + i * 24;
            let pos = Vector3D::new(
                LittleEndian::read_f64(&bytes[off..off + 8]),
                LittleEndian::read_f64(&bytes[off + 8..off + 16]),
                LittleEndian::read_f64(&bytes[off + 16..off + 24]),
            );
            frame.add_atom(Atom::new(format!("A{i}")), pos, None);
        }

        if self.has_velocities {
            frame.set_has_velocities(true);
            let velocities_start = positions_start + self.natoms * 24;
            let velocities = frame.velocities_mut().expect("just enabled");
            for (i, v) in velocities.iter_mut().enumerate() {
                let off = velocities_start + i * 24;
                *v = Vector3D::new(
                    LittleEndian::read_f64(&bytes[off..off + 8]),
                    LittleEndian::read_f64(&bytes[off + 8..off + 16]),
                    LittleEndian::read_f64(&bytes[off + 16..off + 24]),
                );
            }
        }

        Ok(frame)
    }
}

impl Format for AmberNetCdfFormat {
    fn read(&mut self, substrate: &mut Substrate) -> Result<Frame> {
        if !self.header_read {
            self.read_header(substrate)?;
        }
        self.read_record(substrate)
    }

    fn read_step(&mut self, substrate: &mut Substrate, step: usize) -> Result<Frame> {
        if !self.header_read {
            substrate.rewind()?;
            self.read_header(substrate)?;
        }
        let offset = HEADER_LEN as u64
            + (step as u64) * Self::record_len(self.natoms, self.has_velocities) as u64;
        substrate.seekg(offset)?;
        self.read_record(substrate)
    }

    fn write(&mut self, substrate: &mut Substrate, frame: &Frame) -> Result<()> {
        if !self.header_read {
            self.natoms = frame.size();
            self.has_velocities = frame.velocities().is_some();
            Self::write_header(substrate, self.natoms, self.has_velocities)?;
            self.header_read = true;
        }

        let mut bytes = vec![0u8; Self::record_len(self.natoms, self.has_velocities)];
        LittleEndian::write_u64(&mut bytes[0..8], frame.step() as u64);

        for (row, chunk) in (0..3).zip(bytes[8..8 + 72].chunks_mut(24)) {
            let r = frame.cell().matrix().row(row);
            LittleEndian::write_f64(&mut chunk[0..8], r.x());
            LittleEndian::write_f64(&mut chunk[8..16], r.y());
            LittleEndian::write_f64(&mut chunk[16..24], r.z());
        }

        let positions_start = 8 + 72;
        for (i, pos) in frame.positions().iter().enumerate() {
            let off = positions_start + i * 24;
            LittleEndian::write_f64(&mut bytes[off..off + 8], pos.x());
            LittleEndian::write_f64(&mut bytes[off + 8..off + 16], pos.y());
            LittleEndian::write_f64(&mut bytes[off + 16..off + 24], pos.z());
        }

        if self.has_velocities {
            let velocities_start = positions_start + self.natoms * 24;
            if let Some(velocities) = frame.velocities() {
                for (i, v) in velocities.iter().enumerate() {
                    let off = velocities_start + i * 24;
                    LittleEndian::write_f64(&mut bytes[off..off + 8], v.x());
                    LittleEndian::write_f64(&mut bytes[off + 8..off + 16], v.y());
                    LittleEndian::write_f64(&mut bytes[off + 16..off + 24], v.z());
                }
            }
        }

        substrate.write_bytes(&bytes)
    }

    fn nsteps(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_positions_and_velocities() {
        let mut frame = Frame::new();
        frame.add_atom(Atom::from_element("C"), Vector3D::new(1.0, 2.0, 3.0), None);
        frame.add_atom(Atom::from_element("O"), Vector3D::new(4.0, 5.0, 6.0), None);
        frame.set_has_velocities(true);
        frame.velocities_mut().unwrap()[0] = Vector3D::new(0.1, 0.2, 0.3);
        frame.set_cell(UnitCell::orthorhombic(20.0, 20.0, 20.0));
        frame.set_step(5);

        let path = std::env::temp_dir().join(format!("moltraj-nc-{}.nc", std::process::id()));
        {
            let mut substrate = Substrate::open(&path, OpenMode::Write, crate::file::Compression::None).unwrap();
            let mut fmt = construct(OpenMode::Write);
            fmt.write(&mut substrate, &frame).unwrap();
        }
        let mut substrate = Substrate::open(&path, OpenMode::Read, crate::file::Compression::None).unwrap();
        let mut fmt = construct(OpenMode::Read);
        let read_back = fmt.read(&mut substrate).unwrap();
        assert_eq!(read_back.size(), 2);
        assert_eq!(read_back.step(), 5);
        assert!((read_back.positions()[1].x() - 4.0).abs() < 1e-9);
        assert!((read_back.velocities().unwrap()[0].x() - 0.1).abs() < 1e-9);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn read_step_seeks_by_fixed_stride() {
        let natoms = 3;
        let path = std::env::temp_dir().join(format!("moltraj-nc-seek-{}.nc", std::process::id()));
        {
            let mut substrate = Substrate::open(&path, OpenMode::Write, crate::file::Compression::None).unwrap();
            let mut fmt = construct(OpenMode::Write);
            for step in 0..3 {
                let mut frame = Frame::new();
                for i in 0..natoms {
                    frame.add_atom(Atom::from_element("C"), Vector3D::new(step as f64, i as f64, 0.0), None);
                }
                frame.set_step(step);
                fmt.write(&mut substrate, &frame).unwrap();
            }
        }
        let mut substrate = Substrate::open(&path, OpenMode::Read, crate::file::Compression::None).unwrap();
        let mut fmt = construct(OpenMode::Read);
        let frame = fmt.read_step(&mut substrate, 2).unwrap();
        assert_eq!(frame.step(), 2);
        assert!((frame.positions()[0].x() - 2.0).abs() < 1e-9);
        std::fs::remove_file(path).ok();
    }
}
