//! The GROMACS GRO format: a title line, an atom count, fixed-width atom
//! records (`resid|resname|name|index|x|y|z[|vx|vy|vz]`), and a trailing box
//! line. Distances are stored in nanometers on disk, angstroms in memory.

use crate::error::{Error, Result};
use crate::file::{OpenMode, Substrate};
use crate::model::{Atom, Frame, Residue, UnitCell};
use crate::primitives::Vector3D;
use crate::registry::{Format, FormatMetadata};
use crate::warning;
use rustc_hash::FxHashMap;

const NM_TO_ANGSTROM: f64 = 10.0;

pub(crate) fn metadata() -> FormatMetadata {
    FormatMetadata {
        name: "GRO",
        extensions: &["gro"],
        description: "title line, atom count, fixed-width atom records, trailing box line",
        supports_read: true,
        supports_write: true,
        supports_append: true,
    }
}

pub(crate) fn construct(_mode: OpenMode) -> Box<dyn Format> {
    Box::new(GroFormat {
        offsets: Vec::new(),
        cursor: 0,
    })
}

pub struct GroFormat {
    offsets: Vec<u64>,
    cursor: usize,
}

impl GroFormat {
    fn parse_one(substrate: &mut Substrate) -> Result<Frame> {
        let title = substrate.readline()?;
        let count_line = substrate.readline()?;
        let n: usize = count_line
            .trim()
            .parse()
            .map_err(|_| Error::format(format!("expected atom count, got {count_line:?}")))?;

        let mut frame = Frame::new();
        frame.set_property("name", title.trim().to_string());

        let mut residues: FxHashMap<(i64, String), usize> = FxHashMap::default();

        let mut lines = Vec::with_capacity(n);
        for _ in 0..n {
            lines.push(substrate.readline()?);
        }
        let has_velocities = lines.first().map(|l| l.len() >= 68).unwrap_or(false);
        if has_velocities {
            frame.set_has_velocities(true);
        }

        for line in &lines {
            if line.len() < 44 {
                return Err(Error::format(format!(
                    "GRO atom line too short ({} chars, need >= 44): {line:?}",
                    line.len()
                )));
            }
            let resid_str = line[0..5].trim();
            let resid: i64 = resid_str.parse().unwrap_or(-1);
            let resname = line[5..10].trim().to_string();
            let atom_name = line[10..15].trim().to_string();

            let x: f64 = line[20..28]
                .trim()
                .parse()
                .map_err(|_| Error::format(format!("invalid x: {}", &line[20..28])))?;
            let y: f64 = line[28..36]
                .trim()
                .parse()
                .map_err(|_| Error::format(format!("invalid y: {}", &line[28..36])))?;
            let z: f64 = line[36..44]
                .trim()
                .parse()
                .map_err(|_| Error::format(format!("invalid z: {}", &line[36..44])))?;
            let position = Vector3D::new(
                x * NM_TO_ANGSTROM,
                y * NM_TO_ANGSTROM,
                z * NM_TO_ANGSTROM,
            );

            let velocity = if has_velocities && line.len() >= 68 {
                let vx: Option<f64> = line[44..52].trim().parse().ok();
                let vy: Option<f64> = line[52..60].trim().parse().ok();
                let vz: Option<f64> = line[60..68].trim().parse().ok();
                match (vx, vy, vz) {
                    (Some(vx), Some(vy), Some(vz)) => {
                        Some(Vector3D::new(vx * NM_TO_ANGSTROM, vy * NM_TO_ANGSTROM, vz * NM_TO_ANGSTROM))
                    }
                    _ => None,
                }
            } else {
                None
            };

            let atom = Atom::from_element(&element_symbol_from_name(&atom_name));
            let index = frame.add_atom(atom, position, velocity);

            let key = (resid, resname.clone());
            let residue_index = *residues.entry(key).or_insert_with(|| {
                frame
                    .topology_mut()
                    .add_residue(Residue::with_id(resname.clone(), resid.max(0) as u64))
            });
            if let Some(residue) = frame.topology_mut().residue_mut(residue_index) {
                residue.add_atom(index);
            }
        }

        let box_line = substrate.readline().unwrap_or_default();
        let parts: Vec<f64> = box_line
            .split_whitespace()
            .filter_map(|t| t.parse().ok())
            .collect();
        if parts.len() >= 9 {
            let v = |i: usize| parts[i] * NM_TO_ANGSTROM;
            frame.set_cell(UnitCell::from_matrix(crate::primitives::Matrix3D::from_rows(
                Vector3D::new(v(0), v(3), v(4)),
                Vector3D::new(v(5), v(1), v(6)),
                Vector3D::new(v(7), v(8), v(2)),
            )));
        } else if parts.len() >= 3 {
            frame.set_cell(UnitCell::orthorhombic(
                parts[0] * NM_TO_ANGSTROM,
                parts[1] * NM_TO_ANGSTROM,
                parts[2] * NM_TO_ANGSTROM,
            ));
        }

        Ok(frame)
    }
}

fn element_symbol_from_name(atom_name: &str) -> String {
    let trimmed = atom_name.trim_start_matches(|c: char| c.is_ascii_digit());
    if trimmed.len() >= 2 {
        let two = &trimmed[..2];
        if crate::model::Element::from_symbol(two).is_some() {
            return two.to_string();
        }
    }
    if let Some(one) = trimmed.chars().next() {
        if crate::model::Element::from_symbol(&one.to_string()).is_some() {
            return one.to_string();
        }
    }
    warning::warn(format!("unknown element for atom name: {atom_name}"));
    "X".to_string()
}

impl Format for GroFormat {
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
            Some(p) => p.as_str().unwrap_or("generated by moltraj").to_string(),
            None => "generated by moltraj".to_string(),
        };
        substrate.write_line(&title)?;
        substrate.write_line(&frame.size().to_string())?;

        for (i, (atom, pos)) in frame
            .topology()
            .atoms()
            .iter()
            .zip(frame.positions())
            .enumerate()
        {
            let residue = frame.topology().residue_for_atom(i);
            let (resid, resname) = match residue {
                Some(r) => (r.id.unwrap_or(1), r.name.clone()),
                None => (1, "UNK".to_string()),
            };

            let resid_field = if resid > 99999 {
                warning::warn(format!("residue id {resid} overflows GRO's 5-column field"));
                "*****".to_string()
            } else {
                format!("{resid:>5}")
            };
            let index_field = if i + 1 > 99999 {
                warning::warn(format!("atom index {} overflows GRO's 5-column field", i + 1));
                "*****".to_string()
            } else {
                format!("{:>5}", i + 1)
            };

            match frame.velocities() {
                Some(velocities) => {
                    let v = velocities[i];
                    substrate.write_line(&format!(
                        "{resid_field}{:<5}{:<5}{index_field}{:8.3}{:8.3}{:8.3}{:8.4}{:8.4}{:8.4}",
                        truncate5(&resname),
                        truncate5(&atom.name),
                        pos.x() / NM_TO_ANGSTROM,
                        pos.y() / NM_TO_ANGSTROM,
                        pos.z() / NM_TO_ANGSTROM,
                        v.x() / NM_TO_ANGSTROM,
                        v.y() / NM_TO_ANGSTROM,
                        v.z() / NM_TO_ANGSTROM,
                    ))?;
                }
                None => {
                    substrate.write_line(&format!(
                        "{resid_field}{:<5}{:<5}{index_field}{:8.3}{:8.3}{:8.3}",
                        truncate5(&resname),
                        truncate5(&atom.name),
                        pos.x() / NM_TO_ANGSTROM,
                        pos.y() / NM_TO_ANGSTROM,
                        pos.z() / NM_TO_ANGSTROM,
                    ))?;
                }
            }
        }

        let (a, b, c) = frame.cell().lengths();
        substrate.write_line(&format!(
            "{:10.5}{:10.5}{:10.5}",
            a / NM_TO_ANGSTROM,
            b / NM_TO_ANGSTROM,
            c / NM_TO_ANGSTROM,
        ))?;
        Ok(())
    }

    fn nsteps(&self) -> usize {
        self.offsets.len()
    }
}

fn truncate5(s: &str) -> String {
    if s.len() > 5 {
        s[..5].to_string()
    } else {
        s.to_string()
    }
}
