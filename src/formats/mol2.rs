//! The Tripos MOL2 format: `@<TRIPOS>MOLECULE`/`ATOM`/`BOND` sections.
//! Structures are separated by the next `@<TRIPOS>MOLECULE` marker.

use crate::error::{Error, Result};
use crate::file::{OpenMode, Substrate};
use crate::model::{Atom, BondOrder, Frame, Residue};
use crate::primitives::Vector3D;
use crate::registry::{Format, FormatMetadata};
use rustc_hash::FxHashMap;

pub(crate) fn metadata() -> FormatMetadata {
    FormatMetadata {
        name: "MOL2",
        extensions: &["mol2"],
        description: "Tripos MOL2: MOLECULE/ATOM/BOND sections",
        supports_read: true,
        supports_write: true,
        supports_append: true,
    }
}

pub(crate) fn construct(_mode: OpenMode) -> Box<dyn Format> {
    Box::new(Mol2Format {
        offsets: Vec::new(),
        cursor: 0,
        pending_header: None,
    })
}

pub struct Mol2Format {
    offsets: Vec<u64>,
    cursor: usize,
    /// A `@<TRIPOS>MOLECULE` line read while looking for the end of the
    /// previous structure, and not yet consumed.
    pending_header: Option<String>,
}

fn bond_order_from_token(tok: &str) -> BondOrder {
    match tok {
        "1" => BondOrder::Single,
        "2" => BondOrder::Double,
        "3" => BondOrder::Triple,
        "4" => BondOrder::Quadruple,
        "ar" => BondOrder::Aromatic,
        "am" => BondOrder::Amide,
        _ => BondOrder::Unknown,
    }
}

fn bond_order_to_token(order: BondOrder) -> &'static str {
    match order {
        BondOrder::Single => "1",
        BondOrder::Double => "2",
        BondOrder::Triple => "3",
        BondOrder::Quadruple => "4",
        BondOrder::Aromatic => "ar",
        BondOrder::Amide => "am",
        _ => "1",
    }
}

impl Mol2Format {
    fn parse_one(&mut self, substrate: &mut Substrate) -> Result<Frame> {
        let header_line = match self.pending_header.take() {
            Some(line) => line,
            None => {
                let mut line = substrate.readline()?;
                while line.trim() != "@<TRIPOS>MOLECULE" {
                    line = substrate.readline()?;
                }
                line
            }
        };
        let _ = header_line;

        let name = substrate.readline()?;
        let counts_line = substrate.readline()?;
        let n_atoms: usize = counts_line
            .split_whitespace()
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| Error::format(format!("invalid MOL2 counts line: {counts_line:?}")))?;
        let n_bonds: usize = counts_line
            .split_whitespace()
            .nth(1)
            .and_then(|t| t.parse().ok())
            .unwrap_or(0);

        let mut frame = Frame::new();
        frame.set_property("name", name.trim().to_string());

        // Skip to @<TRIPOS>ATOM.
        loop {
            let line = substrate.readline()?;
            if line.trim() == "@<TRIPOS>ATOM" {
                break;
            }
        }

        let mut residues: FxHashMap<String, usize> = FxHashMap::default();

        for _ in 0..n_atoms {
            let line = substrate.readline()?;
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 6 {
                return Err(Error::format(format!("malformed MOL2 atom line: {line:?}")));
            }
            let name = parts[1];
            let x: f64 = parts[2].parse().map_err(|_| Error::format(format!("invalid x: {}", parts[2])))?;
            let y: f64 = parts[3].parse().map_err(|_| Error::format(format!("invalid y: {}", parts[3])))?;
            let z: f64 = parts[4].parse().map_err(|_| Error::format(format!("invalid z: {}", parts[4])))?;
            let sybyl_type = parts[5];
            let element = sybyl_type.split('.').next().unwrap_or(sybyl_type);

            let mut atom = Atom::from_element(element);
            atom.name = name.to_string();
            atom.r#type = sybyl_type.to_string();
            if let Some(charge_tok) = parts.get(8) {
                if let Ok(charge) = charge_tok.parse() {
                    atom.charge = charge;
                }
            }
            let index = frame.add_atom(atom, Vector3D::new(x, y, z), None);

            if let Some(resname) = parts.get(7) {
                let resname = resname.to_string();
                let residue_index = *residues.entry(resname.clone()).or_insert_with(|| {
                    frame.topology_mut().add_residue(Residue::new(resname.clone()))
                });
                if let Some(residue) = frame.topology_mut().residue_mut(residue_index) {
                    residue.add_atom(index);
                }
            }
        }

        // Skip to @<TRIPOS>BOND, if present (n_bonds may legitimately be 0).
        if n_bonds > 0 {
            loop {
                let line = substrate.readline()?;
                if line.trim() == "@<TRIPOS>BOND" {
                    break;
                }
            }
            for _ in 0..n_bonds {
                let line = substrate.readline()?;
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 4 {
                    return Err(Error::format(format!("malformed MOL2 bond line: {line:?}")));
                }
                let a: usize = parts[1].parse().map_err(|_| Error::format("invalid bond atom 1"))?;
                let b: usize = parts[2].parse().map_err(|_| Error::format("invalid bond atom 2"))?;
                let order = bond_order_from_token(parts[3]);
                frame.topology_mut().add_bond_with_order(a - 1, b - 1, order)?;
            }
        }

        // Look ahead for the next molecule marker so `nsteps`/offsets stay
        // correct without consuming the next structure's header twice.
        loop {
            match substrate.readline() {
                Ok(line) if line.trim() == "@<TRIPOS>MOLECULE" => {
                    self.pending_header = Some(line);
                    break;
                }
                Ok(_) => continue,
                Err(_) => break,
            }
        }

        Ok(frame)
    }
}

impl Format for Mol2Format {
    fn index(&mut self, substrate: &mut Substrate) -> Result<()> {
        if !substrate.is_seekable() {
            return Ok(());
        }
        substrate.rewind()?;
        self.offsets.clear();
        self.pending_header = None;
        loop {
            let offset = substrate.tellg()?;
            match self.parse_one(substrate) {
                Ok(_) => self.offsets.push(offset),
                Err(_) => break,
            }
        }
        substrate.rewind()?;
        self.pending_header = None;
        self.cursor = 0;
        Ok(())
    }

    fn read(&mut self, substrate: &mut Substrate) -> Result<Frame> {
        if !substrate.is_seekable() {
            return self.parse_one(substrate);
        }
        let &offset = self
            .offsets
            .get(self.cursor)
            .ok_or_else(|| Error::file("no more steps"))?;
        substrate.seekg(offset)?;
        self.pending_header = None;
        let frame = self.parse_one(substrate)?;
        self.cursor += 1;
        Ok(frame)
    }

    fn read_step(&mut self, substrate: &mut Substrate, step: usize) -> Result<Frame> {
        let &offset = self
            .offsets
            .get(step)
            .ok_or_else(|| Error::file("no more steps"))?;
        substrate.seekg(offset)?;
        self.pending_header = None;
        let frame = self.parse_one(substrate)?;
        self.cursor = step + 1;
        Ok(frame)
    }

    fn write(&mut self, substrate: &mut Substrate, frame: &Frame) -> Result<()> {
        let name = match frame.property("name") {
            Some(p) => p.as_str().unwrap_or("MOLECULE").to_string(),
            None => "MOLECULE".to_string(),
        };
        let bonds: Vec<_> = frame.topology().bonds().collect();

        substrate.write_line("@<TRIPOS>MOLECULE")?;
        substrate.write_line(&name)?;
        substrate.write_line(&format!("{} {} 0 0 0", frame.size(), bonds.len()))?;
        substrate.write_line("SMALL")?;
        substrate.write_line("NO_CHARGES")?;

        substrate.write_line("@<TRIPOS>ATOM")?;
        for (i, (atom, pos)) in frame.topology().atoms().iter().zip(frame.positions()).enumerate() {
            substrate.write_line(&format!(
                "{:>7} {:<8}{:>10.4}{:>10.4}{:>10.4} {:<8}1 UNL1 {:.4}",
                i + 1,
                atom.name,
                pos.x(),
                pos.y(),
                pos.z(),
                if atom.r#type.is_empty() { &atom.name } else { &atom.r#type },
                atom.charge,
            ))?;
        }

        if !bonds.is_empty() {
            substrate.write_line("@<TRIPOS>BOND")?;
            for (bond_id, (i, j, order)) in bonds.into_iter().enumerate() {
                substrate.write_line(&format!(
                    "{:>6} {:>5} {:>5} {}",
                    bond_id + 1,
                    i + 1,
                    j + 1,
                    bond_order_to_token(order),
                ))?;
            }
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

    #[test]
    fn round_trips_atoms_and_bond_order() {
        let mut frame = Frame::new();
        frame.add_atom(Atom::from_element("C"), Vector3D::new(0.0, 0.0, 0.0), None);
        frame.add_atom(Atom::from_element("O"), Vector3D::new(1.2, 0.0, 0.0), None);
        frame.topology_mut().add_bond_with_order(0, 1, BondOrder::Double).unwrap();

        let path = std::env::temp_dir().join(format!("moltraj-mol2-{}.mol2", std::process::id()));
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
