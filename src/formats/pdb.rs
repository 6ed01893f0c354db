//! The Protein Data Bank format: fixed-column `ATOM`/`HETATM` records, an
//! optional `CRYST1` cell, `CONECT` bonds, and `MODEL`/`ENDMDL` framing for
//! multi-step files.

use crate::error::{Error, Result};
use crate::file::{OpenMode, Substrate};
use crate::model::{Atom, BondOrder, Frame, Residue, UnitCell};
use crate::primitives::Vector3D;
use crate::registry::{Format, FormatMetadata};
use crate::warning;
use rustc_hash::FxHashMap;

pub(crate) fn metadata() -> FormatMetadata {
    FormatMetadata {
        name: "PDB",
        extensions: &["pdb", "ent"],
        description: "fixed-column ATOM/HETATM records, CRYST1 cell, CONECT bonds, MODEL framing",
        supports_read: true,
        supports_write: true,
        supports_append: true,
    }
}

pub(crate) fn construct(_mode: OpenMode) -> Box<dyn Format> {
    Box::new(PdbFormat {
        offsets: Vec::new(),
        cursor: 0,
    })
}

pub struct PdbFormat {
    offsets: Vec<u64>,
    cursor: usize,
}

impl PdbFormat {
    fn parse_one(substrate: &mut Substrate) -> Result<Frame> {
        let mut frame = Frame::new();
        let mut residues: FxHashMap<(i64, String), usize> = FxHashMap::default();
        let mut serial_to_index: FxHashMap<i64, usize> = FxHashMap::default();
        let mut pending_bonds: Vec<(i64, i64)> = Vec::new();
        let mut seen_any_record = false;
        let mut in_model = false;

        loop {
            let line = match substrate.readline() {
                Ok(line) => line,
                Err(_) if seen_any_record => break,
                Err(e) => return Err(e),
            };
            if line.len() < 6 {
                continue;
            }
            let record = line[0..6].trim();
            match record {
                "MODEL" => {
                    if in_model {
                        break;
                    }
                    in_model = true;
                }
                "CRYST1" if line.len() >= 54 => {
                    seen_any_record = true;
                    let a: Option<f64> = line[6..15].trim().parse().ok();
                    let b: Option<f64> = line[15..24].trim().parse().ok();
                    let c: Option<f64> = line[24..33].trim().parse().ok();
                    let alpha: Option<f64> = line.get(33..40).and_then(|s| s.trim().parse().ok());
                    let beta: Option<f64> = line.get(40..47).and_then(|s| s.trim().parse().ok());
                    let gamma: Option<f64> = line.get(47..54).and_then(|s| s.trim().parse().ok());
                    if let (Some(a), Some(b), Some(c), Some(alpha), Some(beta), Some(gamma)) =
                        (a, b, c, alpha, beta, gamma)
                    {
                        frame.set_cell(UnitCell::triclinic(a, b, c, alpha, beta, gamma));
                    }
                }
                "ATOM" | "HETATM" if line.len() >= 54 => {
                    seen_any_record = true;
                    let serial: i64 = line[6..11]
                        .trim()
                        .parse()
                        .map_err(|_| Error::format(format!("invalid serial: {}", &line[6..11])))?;
                    let name = line[12..16].trim().to_string();
                    let resname = line.get(17..20).unwrap_or("UNK").trim().to_string();
                    let resid: i64 = line.get(22..26).and_then(|s| s.trim().parse().ok()).unwrap_or(1);
                    let x: f64 = line[30..38]
                        .trim()
                        .parse()
                        .map_err(|_| Error::format(format!("invalid x: {}", &line[30..38])))?;
                    let y: f64 = line[38..46]
                        .trim()
                        .parse()
                        .map_err(|_| Error::format(format!("invalid y: {}", &line[38..46])))?;
                    let z: f64 = line[46..54]
                        .trim()
                        .parse()
                        .map_err(|_| Error::format(format!("invalid z: {}", &line[46..54])))?;

                    let element = element_from_name(&name);
                    let atom = Atom::from_element(&element);
                    let index = frame.add_atom(atom, Vector3D::new(x, y, z), None);
                    serial_to_index.insert(serial, index);

                    let key = (resid, resname.clone());
                    let residue_index = *residues.entry(key).or_insert_with(|| {
                        frame.topology_mut().add_residue(Residue::with_id(resname.clone(), resid.max(0) as u64))
                    });
                    if let Some(residue) = frame.topology_mut().residue_mut(residue_index) {
                        residue.add_atom(index);
                    }
                }
                "CONECT" => {
                    seen_any_record = true;
                    let parts: Vec<i64> = line.split_whitespace().skip(1).filter_map(|s| s.parse().ok()).collect();
                    if let Some((&first, rest)) = parts.split_first() {
                        for &other in rest {
                            pending_bonds.push((first, other));
                        }
                    }
                }
                "ENDMDL" | "END" => {
                    if seen_any_record {
                        break;
                    }
                }
                "TER" => {}
                _ => {}
            }
        }

        if !seen_any_record {
            return Err(Error::file("no more steps"));
        }

        for (a, b) in pending_bonds {
            if let (Some(&ia), Some(&ib)) = (serial_to_index.get(&a), serial_to_index.get(&b)) {
                let _ = frame.topology_mut().add_bond_with_order(ia, ib, BondOrder::Unknown);
            }
        }

        Ok(frame)
    }
}

fn element_from_name(name: &str) -> String {
    let trimmed = name.trim();
    if let Some(sym) = crate::model::Element::from_symbol(trimmed).map(|_| trimmed.to_string()) {
        return sym;
    }
    if trimmed.len() >= 2 {
        let two = &trimmed[..2];
        if crate::model::Element::from_symbol(two).is_some() {
            return two.to_string();
        }
    }
    if let Some(first) = trimmed.chars().next() {
        let one = first.to_string();
        if crate::model::Element::from_symbol(&one).is_some() {
            return one;
        }
    }
    warning::warn(format!("unknown element for PDB atom name: {name}"));
    "C".to_string()
}

impl Format for PdbFormat {
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
        let (a, b, c) = frame.cell().lengths();
        let (alpha, beta, gamma) = frame.cell().angles();
        substrate.write_line(&format!(
            "CRYST1{a:9.3}{b:9.3}{c:9.3}{alpha:7.2}{beta:7.2}{gamma:7.2} P 1           1"
        ))?;

        for (i, (atom, pos)) in frame.topology().atoms().iter().zip(frame.positions()).enumerate() {
            let residue = frame.topology().residue_for_atom(i);
            let (resid, resname) = match residue {
                Some(r) => (r.id.unwrap_or(1), r.name.clone()),
                None => (1, "UNK".to_string()),
            };
            substrate.write_line(&format!(
                "ATOM  {:>5} {:<4} {:<3} A{:>4}    {:8.3}{:8.3}{:8.3}  1.00  0.00          {:>2}",
                i + 1,
                atom.name,
                resname,
                resid,
                pos.x(),
                pos.y(),
                pos.z(),
                atom.r#type,
            ))?;
        }
        substrate.write_line("TER")?;

        for (i, j, _) in frame.topology().bonds() {
            substrate.write_line(&format!("CONECT{:>5}{:>5}", i + 1, j + 1))?;
        }
        substrate.write_line("END")?;
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
    fn parses_atoms_and_conect() {
        let content = "ATOM      1  N   ALA A   1      11.104  13.207   2.102  1.00  0.00           N\nATOM      2  CA  ALA A   1      12.560  13.207   2.102  1.00  0.00           C\nCONECT    1    2\nEND\n";
        let path = std::env::temp_dir().join(format!("moltraj-pdb-{}.pdb", std::process::id()));
        std::fs::write(&path, content).unwrap();
        let mut substrate = Substrate::open(&path, OpenMode::Read, crate::file::Compression::None).unwrap();
        let mut fmt = construct(OpenMode::Read);
        fmt.index(&mut substrate).unwrap();
        let frame = fmt.read(&mut substrate).unwrap();
        assert_eq!(frame.size(), 2);
        assert!(frame.topology().is_bonded(0, 1));
        std::fs::remove_file(path).ok();
    }
}
