//! The SDF / MDL molfile (V2000) format: a three-line header, a counts line,
//! an atom block, a bond block, and an `M  END` terminator. Structures are
//! separated by a `$$$$` delimiter line.

use crate::error::{Error, Result};
use crate::file::{OpenMode, Substrate};
use crate::model::{Atom, BondOrder, Frame};
use crate::primitives::Vector3D;
use crate::registry::{Format, FormatMetadata};

pub(crate) fn metadata() -> FormatMetadata {
    FormatMetadata {
        name: "SDF",
        extensions: &["sdf", "mol", "sd"],
        description: "MDL molfile V2000: header, counts line, atom block, bond block",
        supports_read: true,
        supports_write: true,
        supports_append: true,
    }
}

pub(crate) fn construct(_mode: OpenMode) -> Box<dyn Format> {
    Box::new(SdfFormat {
        offsets: Vec::new(),
        cursor: 0,
    })
}

pub struct SdfFormat {
    offsets: Vec<u64>,
    cursor: usize,
}

impl SdfFormat {
    fn parse_one(substrate: &mut Substrate) -> Result<Frame> {
        let title = substrate.readline()?;
        let _program_line = substrate.readline()?;
        let _comment_line = substrate.readline()?;
        let counts_line = substrate.readline()?;

        if counts_line.len() < 6 {
            return Err(Error::format(format!("malformed counts line: {counts_line:?}")));
        }
        let n_atoms: usize = counts_line[0..3]
            .trim()
            .parse()
            .map_err(|_| Error::format(format!("invalid atom count: {}", &counts_line[0..3])))?;
        let n_bonds: usize = counts_line[3..6]
            .trim()
            .parse()
            .map_err(|_| Error::format(format!("invalid bond count: {}", &counts_line[3..6])))?;

        let mut frame = Frame::new();
        frame.set_property("name", title.trim().to_string());

        for _ in 0..n_atoms {
            let line = substrate.readline()?;
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 {
                return Err(Error::format(format!("malformed atom line: {line:?}")));
            }
            let x: f64 = parts[0].parse().map_err(|_| Error::format(format!("invalid x: {}", parts[0])))?;
            let y: f64 = parts[1].parse().map_err(|_| Error::format(format!("invalid y: {}", parts[1])))?;
            let z: f64 = parts[2].parse().map_err(|_| Error::format(format!("invalid z: {}", parts[2])))?;
            frame.add_atom(Atom::from_element(parts[3]), Vector3D::new(x, y, z), None);
        }

        for _ in 0..n_bonds {
            let line = substrate.readline()?;
            if line.len() < 9 {
                return Err(Error::format(format!("malformed bond line: {line:?}")));
            }
            let a: usize = line[0..3].trim().parse().map_err(|_| Error::format("invalid bond atom 1"))?;
            let b: usize = line[3..6].trim().parse().map_err(|_| Error::format("invalid bond atom 2"))?;
            let order: u8 = line[6..9].trim().parse().unwrap_or(0);
            if a == 0 || b == 0 {
                return Err(Error::format("bond atom index must be 1-based and nonzero"));
            }
            frame
                .topology_mut()
                .add_bond_with_order(a - 1, b - 1, BondOrder::from_multiplicity(order))?;
        }

        // Consume the rest of the molfile block (property lines, `M  END`,
        // and a trailing `$$$$` delimiter if present) without interpreting
        // it further.
        loop {
            match substrate.readline() {
                Ok(line) => {
                    if line.trim() == "$$$$" {
                        break;
                    }
                    if line.starts_with("M  END") {
                        // Peek for a following delimiter line; if absent
                        // (last structure in the file, no trailing marker)
                        // that's fine too.
                        continue;
                    }
                }
                Err(_) => break,
            }
        }

        Ok(frame)
    }
}

impl Format for SdfFormat {
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
        let title = match frame.property("name") {
            Some(p) => p.as_str().unwrap_or("").to_string(),
            None => String::new(),
        };
        substrate.write_line(&title)?;
        substrate.write_line("  moltraj")?;
        substrate.write_line("")?;

        let bonds: Vec<_> = frame.topology().bonds().collect();
        substrate.write_line(&format!("{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000", frame.size(), bonds.len()))?;

        for (atom, pos) in frame.topology().atoms().iter().zip(frame.positions()) {
            substrate.write_line(&format!(
                "{:10.4}{:10.4}{:10.4} {:<3} 0  0  0  0  0  0  0  0  0  0  0  0",
                pos.x(),
                pos.y(),
                pos.z(),
                atom.r#type,
            ))?;
        }

        for (i, j, order) in bonds {
            substrate.write_line(&format!("{:>3}{:>3}{:>3}  0", i + 1, j + 1, order.multiplicity()))?;
        }

        substrate.write_line("M  END")?;
        substrate.write_line("$$$$")?;
        Ok(())
    }

    fn nsteps(&self) -> usize {
        self.offsets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_counts_and_bond_block_per_scenario() {
        let mut frame = Frame::new();
        frame.add_atom(Atom::from_element("O"), Vector3D::new(1.0, 2.0, 3.0), None);
        frame.add_atom(Atom::from_element("N"), Vector3D::new(1.0, 2.0, 3.0), None);
        frame.add_atom(Atom::from_element("C"), Vector3D::new(1.0, 2.0, 3.0), None);
        frame.add_atom(Atom::from_element("F"), Vector3D::new(1.0, 2.0, 3.0), None);
        frame.topology_mut().add_bond_with_order(0, 2, BondOrder::Single).unwrap();
        frame.topology_mut().add_bond_with_order(1, 2, BondOrder::Double).unwrap();
        frame.topology_mut().add_bond_with_order(2, 3, BondOrder::Triple).unwrap();

        let path = std::env::temp_dir().join(format!("moltraj-sdf-{}.sdf", std::process::id()));
        {
            let mut substrate = Substrate::open(&path, OpenMode::Write, crate::file::Compression::None).unwrap();
            let mut fmt = construct(OpenMode::Write);
            fmt.write(&mut substrate, &frame).unwrap();
        }
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("  4  3  0"));
        assert!(contents.contains("  1  3  1"));
        assert!(contents.contains("  2  3  2"));
        assert!(contents.contains("  3  4  3"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn round_trips_bonds() {
        let mut frame = Frame::new();
        frame.add_atom(Atom::from_element("C"), Vector3D::new(0.0, 0.0, 0.0), None);
        frame.add_atom(Atom::from_element("O"), Vector3D::new(1.2, 0.0, 0.0), None);
        frame.topology_mut().add_bond_with_order(0, 1, BondOrder::Double).unwrap();

        let path = std::env::temp_dir().join(format!("moltraj-sdf-rt-{}.sdf", std::process::id()));
        {
            let mut substrate = Substrate::open(&path, OpenMode::Write, crate::file::Compression::None).unwrap();
            let mut fmt = construct(OpenMode::Write);
            fmt.write(&mut substrate, &frame).unwrap();
        }
        let mut substrate = Substrate::open(&path, OpenMode::Read, crate::file::Compression::None).unwrap();
        let mut fmt = construct(OpenMode::Read);
        fmt.index(&mut substrate).unwrap();
        let read_back = fmt.read(&mut substrate).unwrap();
        assert_eq!(read_back.size(), 2);
        assert_eq!(read_back.topology().bond_order(0, 1), Some(BondOrder::Double));
        std::fs::remove_file(path).ok();
    }
}
