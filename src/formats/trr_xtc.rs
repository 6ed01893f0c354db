//! A reduced-fidelity stand-in for GROMACS's TRR/XTC pair: a small fixed
//! header plus one fixed-stride binary record per step, positions (and
//! optional velocities) stored as single-precision floats the way XTC
//! trades precision for size. Real XTC additionally applies a lossy
//! coordinate compression pass this adapter does not attempt.

use crate::error::{Error, Result};
use crate::file::{OpenMode, Substrate};
use crate::model::{Atom, Frame, UnitCell};
use crate::primitives::Vector3D;
use crate::registry::{Format, FormatMetadata};
use byteorder::{ByteOrder, LittleEndian};

const MAGIC: &[u8; 4] = b"MTTX";
const HEADER_LEN: usize = 16;

pub(crate) fn metadata() -> FormatMetadata {
    FormatMetadata {
        name: "TRR/XTC",
        extensions: &["trr", "xtc"],
        description: "fixed header plus one fixed-stride single-precision binary record per step",
        supports_read: true,
        supports_write: true,
        supports_append: false,
    }
}

pub(crate) fn construct(_mode: OpenMode) -> Box<dyn Format> {
    Box::new(TrrXtcFormat {
        natoms: 0,
        has_velocities: false,
        header_read: false,
    })
}

pub struct TrrXtcFormat {
    natoms: usize,
    has_velocities: bool,
    header_read: bool,
}

impl TrrXtcFormat {
    fn record_len(natoms: usize, has_velocities: bool) -> usize {
        // step(u64) + time(f64) + cell(9 f32) + positions(natoms*3 f32) + velocities
        let positions = natoms * 3 * 4;
        let velocities = if has_velocities { positions } else { 0 };
        8 + 8 + 9 * 4 + positions + velocities
    }

    fn read_header(&mut self, substrate: &mut Substrate) -> Result<()> {
        let bytes = substrate.read_exact(HEADER_LEN)?;
        if &bytes[0..4] != MAGIC {
            return Err(Error::format("not a TRR/XTC stand-in file (bad magic)"));
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
        let time = LittleEndian::read_f64(&bytes[8..16]);

        let mut cell_rows = [Vector3D::ZERO; 3];
        for (row, chunk) in cell_rows.iter_mut().zip(bytes[16..16 + 36].chunks(12)) {
            *row = Vector3D::new(
                LittleEndian::read_f32(&chunk[0..4]) as f64,
                LittleEndian::read_f32(&chunk[4..8]) as f64,
                LittleEndian::read_f32(&chunk[8..12]) as f64,
            );
        }

        let mut frame = Frame::new();
        frame.set_cell(UnitCell::from_matrix(crate::primitives::Matrix3D::from_rows(
            cell_rows[0],
            cell_rows[1],
            cell_rows[2],
        )));
        frame.set_step(step);
        frame.set_property("time", time);

        let positions_start = 16 + 36;
        for i in 0..self.natoms {
            let off = positions_start + i * 12;
            let pos = Vector3D::new(
                LittleEndian::read_f32(&bytes[off..off + 4]) as f64,
                LittleEndian::read_f32(&bytes[off + 4..off + 8]) as f64,
                LittleEndian::read_f32(&bytes[off + 8..off + 12]) as f64,
            );
            frame.add_atom(Atom::new(format!("A{i}")), pos, None);
        }

        if self.has_velocities {
            frame.set_has_velocities(true);
            let velocities_start = positions_start + self.natoms * 12;
            let velocities = frame.velocities_mut().expect("just enabled");
            for (i, v) in velocities.iter_mut().enumerate() {
                let off = velocities_start + i * 12;
                *v = Vector3D::new(
                    LittleEndian::read_f32(&bytes[off..off + 4]) as f64,
                    LittleEndian::read_f32(&bytes[off + 4..off + 8]) as f64,
                    LittleEndian::read_f32(&bytes[off + 8..off + 12]) as f64,
                );
            }
        }

        Ok(frame)
    }
}

impl Format for TrrXtcFormat {
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
        let time = frame.property("time").and_then(|p| p.as_double().ok()).unwrap_or(0.0);
        LittleEndian::write_f64(&mut bytes[8..16], time);

        for (row, chunk) in (0..3).zip(bytes[16..16 + 36].chunks_mut(12)) {
            let r = frame.cell().matrix().row(row);
            LittleEndian::write_f32(&mut chunk[0..4], r.x() as f32);
            LittleEndian::write_f32(&mut chunk[4..8], r.y() as f32);
            LittleEndian::write_f32(&mut chunk[8..12], r.z() as f32);
        }

        let positions_start = 16 + 36;
        for (i, pos) in frame.positions().iter().enumerate() {
            let off = positions_start + i * 12;
            LittleEndian::write_f32(&mut bytes[off..off + 4], pos.x() as f32);
            LittleEndian::write_f32(&mut bytes[off + 4..off + 8], pos.y() as f32);
            LittleEndian::write_f32(&mut bytes[off + 8..off + 12], pos.z() as f32);
        }

        if self.has_velocities {
            let velocities_start = positions_start + self.natoms * 12;
            if let Some(velocities) = frame.velocities() {
                for (i, v) in velocities.iter().enumerate() {
                    let off = velocities_start + i * 12;
                    LittleEndian::write_f32(&mut bytes[off..off + 4], v.x() as f32);
                    LittleEndian::write_f32(&mut bytes[off + 4..off + 8], v.y() as f32);
                    LittleEndian::write_f32(&mut bytes[off + 8..off + 12], v.z() as f32);
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
    fn round_trips_single_precision_positions() {
        let mut frame = Frame::new();
        frame.add_atom(Atom::from_element("C"), Vector3D::new(1.5, 2.5, 3.5), None);
        frame.set_cell(UnitCell::orthorhombic(10.0, 10.0, 10.0));
        frame.set_step(3);
        frame.set_property("time", 1.5);

        let path = std::env::temp_dir().join(format!("moltraj-xtc-{}.xtc", std::process::id()));
        {
            let mut substrate = Substrate::open(&path, OpenMode::Write, crate::file::Compression::None).unwrap();
            let mut fmt = construct(OpenMode::Write);
            fmt.write(&mut substrate, &frame).unwrap();
        }
        let mut substrate = Substrate::open(&path, OpenMode::Read, crate::file::Compression::None).unwrap();
        let mut fmt = construct(OpenMode::Read);
        let read_back = fmt.read(&mut substrate).unwrap();
        assert_eq!(read_back.step(), 3);
        assert!((read_back.positions()[0].x() - 1.5).abs() < 1e-5);
        assert!((read_back.property("time").unwrap().as_double().unwrap() - 1.5).abs() < 1e-9);
        std::fs::remove_file(path).ok();
    }
}
