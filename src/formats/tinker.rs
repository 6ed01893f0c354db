//! The Tinker XYZ format: an XYZ-like text layout where each atom line ends
//! with the 1-based indices of its bonded neighbors, so bonds round-trip
//! without a separate CONECT-style block.

use crate::error::{Error, Result};
use crate::file::{OpenMode, Substrate};
use crate::model::{Atom, Frame};
use crate::primitives::Vector3D;
use crate::registry::{Format, FormatMetadata};

pub(crate) fn metadata() -> FormatMetadata {
    FormatMetadata {
        name: "Tinker",
        extensions: &["txyz", "arc"],
        description: "XYZ-like layout with 1-based bonded-neighbor indices per atom line",
        supports_read: true,
        supports_write: true,
        supports_append: true,
    }
}

pub(crate) fn construct(_mode: OpenMode) -> Box<dyn Format> {
    Box::new(TinkerFormat {
        offsets: Vec::new(),
        cursor: 0,
    })
}

pub struct TinkerFormat {
    offsets: Vec<u64>,
    cursor: usize,
}

impl TinkerFormat {
    fn parse_one(substrate: &mut Substrate) -> Result<Frame> {
        let header = substrate.readline()?;
        let n: usize = header
            .split_whitespace()
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| Error::format(format!("expected atom count, got {header:?}")))?;

        let mut frame = Frame::new();
        let mut bonds = Vec::new();

        for _ in 0..n {
            let line = substrate.readline()?;
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 5 {
                return Err(Error::format(format!("malformed Tinker atom line: {line:?}")));
            }
            let x: f64 = parts[2].parse().map_err(|_| Error::format(format!("invalid x: {}", parts[2])))?;
            let y: f64 = parts[3].parse().map_err(|_| Error::format(format!("invalid y: {}", parts[3])))?;
            let z: f64 = parts[4].parse().map_err(|_| Error::format(format!("invalid z: {}", parts[4])))?;

            let index = frame.add_atom(Atom::from_element(parts[1]), Vector3D::new(x, y, z), None);

            // Fields after the atom-type column (index 5) are 1-based
            // neighbor indices.
            for tok in parts.iter().skip(6) {
                if let Ok(neighbor) = tok.parse::<usize>() {
                    if neighbor >= 1 {
                        bonds.push((index, neighbor - 1));
                    }
                }
            }
        }

        for (a, b) in bonds {
            if a < b {
                let _ = frame.topology_mut().add_bond(a, b);
            }
        }

        Ok(frame)
    }
}

impl Format for TinkerFormat {
    fn index(&mut self, substrate: &mut Substrate) -> Result<()> {
        if !substrate.is_seekable() {
            return Ok(());
        }
        substrate.rewind()?;
        self.offsets.clear();
        loop {
            let offset = substrate.tellg()?;
            match Self::parse_one(substrate) {
                Ok(_) => self.offsets.push(offset),
                Err(_) => break,
            }
        }
        substrate.rewind()?;
        self.cursor = 0;
        Ok(())
    }

    fn read(&mut self, substrate: &mut Substrate) -> Result<Frame> {
        if !substrate.is_seekable() {
            return Self::parse_one(substrate);
        }
        let &offset = self
            .offsets
            .get(self.cursor)
            .ok_or_else(|| Error::file("no more steps"))?;
        substrate.seekg(offset)?;
        let frame = Self::parse_one(substrate)?;
        self.cursor += 1;
        Ok(frame)
    }

    fn read_step(&mut self, substrate: &mut Substrate, step: usize) -> Result<Frame> {
        let &offset = self
            .offsets
            .get(step)
            .ok_or_else(|| Error::file("no more steps"))?;
        substrate.seekg(offset)?;
        let frame = Self::parse_one(substrate)?;
        self.cursor = step + 1;
        Ok(frame)
    }

    fn write(&mut self, substrate: &mut Substrate, frame: &Frame) -> Result<()> {
        substrate.write_line(&format!("{}", frame.size()))?;
        for (i, (atom, pos)) in frame.topology().atoms().iter().zip(frame.positions()).enumerate() {
            let mut neighbors: Vec<usize> = Vec::new();
            for (a, b, _) in frame.topology().bonds() {
                if a == i {
                    neighbors.push(b + 1);
                } else if b == i {
                    neighbors.push(a + 1);
                }
            }
            neighbors.sort_unstable();
            let neighbor_str = neighbors
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            substrate.write_line(&format!(
                "{:>6} {:<3}{:>12.6}{:>12.6}{:>12.6} {:>4} {}",
                i + 1,
                atom.r#type,
                pos.x(),
                pos.y(),
                pos.z(),
                0,
                neighbor_str,
            ))?;
        }
        Ok(())
    }

    fn nsteps(&self) -> usize {
        self.offsets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BondOrder;

    #[test]
    fn round_trips_neighbor_list_bonds() {
        let mut frame = Frame::new();
        frame.add_atom(Atom::from_element("C"), Vector3D::new(0.0, 0.0, 0.0), None);
        frame.add_atom(Atom::from_element("O"), Vector3D::new(1.2, 0.0, 0.0), None);
        frame.topology_mut().add_bond_with_order(0, 1, BondOrder::Single).unwrap();

        let path = std::env::temp_dir().join(format!("moltraj-tinker-{}.txyz", std::process::id()));
        {
            let mut substrate = Substrate::open(&path, OpenMode::Write, crate::file::Compression::None).unwrap();
            let mut fmt = construct(OpenMode::Write);
            fmt.write(&mut substrate, &frame).unwrap();
        }
        let mut substrate = Substrate::open(&path, OpenMode::Read, crate::file::Compression::None).unwrap();
        let mut fmt = construct(OpenMode::Read);
        fmt.index(&mut substrate).unwrap();
        let read_back = fmt.read(&mut substrate).unwrap();
        assert!(read_back.topology().is_bonded(0, 1));
        std::fs::remove_file(path).ok();
    }
}
