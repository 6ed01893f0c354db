//! A reduced-fidelity stand-in for GROMACS's TNG trajectory container: one
//! small header plus one fixed-stride binary record per step. Real TNG is a
//! block-structured, optionally compressed container; this keeps only the
//! "framed binary trajectory" shape, not its block format or compression.

use crate::error::{Error, Result};
use crate::file::{OpenMode, Substrate};
use crate::model::{Atom, Frame, UnitCell};
use crate::primitives::Vector3D;
use crate::registry::{Format, FormatMetadata};
use byteorder::{ByteOrder, LittleEndian};

const MAGIC: &[u8; 4] = b"MTTG";
const HEADER_LEN: usize = 16;

pub(crate) fn metadata() -> FormatMetadata {
    FormatMetadata {
        name: "TNG",
        extensions: &["tng"],
        description: "fixed header plus one fixed-stride binary record per step",
        supports_read: true,
        supports_write: true,
        supports_append: false,
    }
}

pub(crate) fn construct(_mode: OpenMode) -> Box<dyn Format> {
    Box::new(TngFormat {
        natoms: 0,
        has_velocities: false,
        header_read: false,
    })
}

pub struct TngFormat {
    natoms: usize,
    has_velocities: bool,
    header_read: bool,
}

impl TngFormat {
    fn record_len(natoms: usize, has_velocities: bool) -> usize {
        // step(u64) + lengths(3 f64) + angles(3 f64) + positions + velocities
        let positions = natoms * 3 * 8;
        let velocities = if has_velocities { positions } else { 0 };
        8 + 6 * 8 + positions + velocities
    }

    fn read_header(&mut self, substrate: &mut Substrate) -> Result<()> {
        let bytes = substrate.read_exact(HEADER_LEN)?;
        if &bytes[0..4] != MAGIC {
            return Err(Error::format("not a TNG stand-in file (bad magic)"));
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
        let lengths: Vec<f64> = (0..3).map(|i| LittleEndian::read_f64(&bytes[8 + i * 8..16 + i * 8])).collect();
        let angles: Vec<f64> = (0..3).map(|i| LittleEndian::read_f64(&bytes[32 + i * 8..40 + i * 8])).collect();

        let mut frame = Frame::new();
        frame.set_cell(UnitCell::triclinic(
            lengths[0], lengths[1], lengths[2], angles[0], angles[1], angles[2],
        ));
        frame.set_step(step);

        let positions_start = 8 + 48;
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

impl Format for TngFormat {
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

        let (a, b, c) = frame.cell().lengths();
        let (alpha, beta, gamma) = frame.cell().angles();
        for (i, v) in [a, b, c].into_iter().enumerate() {
            LittleEndian::write_f64(&mut bytes[8 + i * 8..16 + i * 8], v);
        }
        for (i, v) in [alpha, beta, gamma].into_iter().enumerate() {
            LittleEndian::write_f64(&mut bytes[32 + i * 8..40 + i * 8], v);
        }

        let positions_start = 8 + 48;
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
    fn round_trips_cell_and_positions() {
        let mut frame = Frame::new();
        frame.add_atom(Atom::from_element("C"), Vector3D::new(1.0, 2.0, 3.0), None);
        frame.set_cell(UnitCell::triclinic(10.0, 10.0, 10.0, 80.0, 90.0, 100.0));
        frame.set_step(7);

        let path = std::env::temp_dir().join(format!("moltraj-tng-{}.tng", std::process::id()));
        {
            let mut substrate = Substrate::open(&path, OpenMode::Write, crate::file::Compression::None).unwrap();
            let mut fmt = construct(OpenMode::Write);
            fmt.write(&mut substrate, &frame).unwrap();
        }
        let mut substrate = Substrate::open(&path, OpenMode::Read, crate::file::Compression::None).unwrap();
        let mut fmt = construct(OpenMode::Read);
        let read_back = fmt.read(&mut substrate).unwrap();
        assert_eq!(read_back.step(), 7);
        let (alpha, _, gamma) = read_back.cell().angles();
        assert!((alpha - 80.0).abs() < 1e-6);
        assert!((gamma - 100.0).abs() < 1e-6);
        std::fs::remove_file(path).ok();
    }
}
