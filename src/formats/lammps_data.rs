//! LAMMPS `.data` file: a single-step structure file with a header block
//! (`N atoms`, box bounds) followed by `Masses`/`Atoms`/`Velocities`
//! sections. Being single-step, `nsteps` is always 0 or 1.

use crate::error::{Error, Result};
use crate::file::{OpenMode, Substrate};
use crate::model::{Atom, Frame, UnitCell};
use crate::primitives::Vector3D;
use crate::registry::{Format, FormatMetadata};
use rustc_hash::FxHashMap;

pub(crate) fn metadata() -> FormatMetadata {
    FormatMetadata {
        name: "LAMMPSData",
        extensions: &["data", "lmp"],
        description: "single-step structure file: header, Masses/Atoms/Velocities sections",
        supports_read: true,
        supports_write: true,
        supports_append: false,
    }
}

pub(crate) fn construct(_mode: OpenMode) -> Box<dyn Format> {
    Box::new(LammpsDataFormat { read_done: false })
}

pub struct LammpsDataFormat {
    read_done: bool,
}

impl LammpsDataFormat {
    fn parse_one(substrate: &mut Substrate) -> Result<Frame> {
        let _comment = substrate.readline()?;

        let mut n_atoms = 0usize;
        let mut bounds = [(0.0f64, 0.0f64); 3];
        let mut masses: FxHashMap<usize, f64> = FxHashMap::default();
        let mut frame = Frame::new();
        let mut positions: FxHashMap<usize, (usize, Vector3D)> = FxHashMap::default();
        let mut velocities: FxHashMap<usize, Vector3D> = FxHashMap::default();

        loop {
            let line = match substrate.readline() {
                Ok(line) => line,
                Err(_) => break,
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if trimmed.ends_with("atoms") {
                n_atoms = trimmed
                    .split_whitespace()
                    .next()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(0);
            } else if trimmed.ends_with("xlo xhi") {
                bounds[0] = parse_bounds(trimmed)?;
            } else if trimmed.ends_with("ylo yhi") {
                bounds[1] = parse_bounds(trimmed)?;
            } else if trimmed.ends_with("zlo zhi") {
                bounds[2] = parse_bounds(trimmed)?;
            } else if trimmed == "Masses" {
                substrate.readline().ok();
                for _ in 0..count_types(&masses, n_atoms) {
                    let l = substrate.readline()?;
                    let parts: Vec<&str> = l.split_whitespace().collect();
                    if parts.len() < 2 {
                        break;
                    }
                    if let (Ok(t), Ok(m)) = (parts[0].parse::<usize>(), parts[1].parse::<f64>()) {
                        masses.insert(t, m);
                    } else {
                        break;
                    }
                }
            } else if trimmed == "Atoms" || trimmed.starts_with("Atoms ") {
                substrate.readline().ok();
                for _ in 0..n_atoms {
                    let l = substrate.readline()?;
                    let parts: Vec<&str> = l.split_whitespace().collect();
                    if parts.len() < 5 {
                        return Err(Error::format(format!("malformed Atoms line: {l:?}")));
                    }
                    let id: usize = parts[0].parse().map_err(|_| Error::format("invalid atom id"))?;
                    let atom_type: usize = parts[1].parse().map_err(|_| Error::format("invalid atom type"))?;
                    // Skip an optional charge column: coordinates are
                    // always the last three numeric fields before any
                    // image flags.
                    let coord_start = parts.len().saturating_sub(3).max(2);
                    let x: f64 = parts[coord_start].parse().map_err(|_| Error::format("invalid x"))?;
                    let y: f64 = parts[coord_start + 1].parse().map_err(|_| Error::format("invalid y"))?;
                    let z: f64 = parts[coord_start + 2].parse().map_err(|_| Error::format("invalid z"))?;
                    positions.insert(id, (atom_type, Vector3D::new(x, y, z)));
                }
            } else if trimmed == "Velocities" {
                substrate.readline().ok();
                for _ in 0..n_atoms {
                    let l = substrate.readline()?;
                    let parts: Vec<&str> = l.split_whitespace().collect();
                    if parts.len() < 4 {
                        return Err(Error::format(format!("malformed Velocities line: {l:?}")));
                    }
                    let id: usize = parts[0]
                        .parse()
                        .map_err(|_| Error::format("invalid velocity atom id"))?;
                    let vx: f64 = parts[1].parse().map_err(|_| Error::format("invalid vx"))?;
                    let vy: f64 = parts[2].parse().map_err(|_| Error::format("invalid vy"))?;
                    let vz: f64 = parts[3].parse().map_err(|_| Error::format("invalid vz"))?;
                    velocities.insert(id, Vector3D::new(vx, vy, vz));
                }
            }
        }

        if n_atoms == 0 && positions.is_empty() {
            return Err(Error::file("no more steps"));
        }

        let mut ids: Vec<usize> = positions.keys().copied().collect();
        ids.sort_unstable();
        if !velocities.is_empty() {
            frame.set_has_velocities(true);
        }
        for id in ids {
            let (atom_type, position) = positions[&id];
            let mass = masses.get(&atom_type).copied().unwrap_or(0.0);
            let mut atom = Atom::new(format!("type{atom_type}"));
            atom.mass = mass;
            let velocity = velocities.get(&id).copied();
            frame.add_atom(atom, position, velocity);
        }

        frame.set_cell(UnitCell::orthorhombic(
            bounds[0].1 - bounds[0].0,
            bounds[1].1 - bounds[1].0,
            bounds[2].1 - bounds[2].0,
        ));

        Ok(frame)
    }
}

fn count_types(masses: &FxHashMap<usize, f64>, n_atoms: usize) -> usize {
    // The mass table's row count isn't known ahead of time from the header
    // alone; in practice it's small and bounded by the number of atom
    // types, which is at most the atom count.
    let _ = masses;
    n_atoms.max(1)
}

fn parse_bounds(line: &str) -> Result<(f64, f64)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(Error::format(format!("malformed bounds line: {line:?}")));
    }
    let lo: f64 = parts[0].parse().map_err(|_| Error::format("invalid bound"))?;
    let hi: f64 = parts[1].parse().map_err(|_| Error::format("invalid bound"))?;
    Ok((lo, hi))
}

impl Format for LammpsDataFormat {
    fn read(&mut self, substrate: &mut Substrate) -> Result<Frame> {
        if self.read_done {
            return Err(Error::file("no more steps"));
        }
        let frame = Self::parse_one(substrate)?;
        self.read_done = true;
        Ok(frame)
    }

    fn read_step(&mut self, substrate: &mut Substrate, step: usize) -> Result<Frame> {
        if step != 0 {
            return Err(Error::format("LAMMPS data files hold exactly one step"));
        }
        substrate.rewind()?;
        self.read_done = false;
        self.read(substrate)
    }

    fn write(&mut self, substrate: &mut Substrate, frame: &Frame) -> Result<()> {
        substrate.write_line("LAMMPS data file written by moltraj")?;
        substrate.write_line("")?;
        substrate.write_line(&format!("{} atoms", frame.size()))?;
        substrate.write_line("1 atom types")?;
        substrate.write_line("")?;
        let (a, b, c) = frame.cell().lengths();
        substrate.write_line(&format!("0.0 {a:.6} xlo xhi"))?;
        substrate.write_line(&format!("0.0 {b:.6} ylo yhi"))?;
        substrate.write_line(&format!("0.0 {c:.6} zlo zhi"))?;
        substrate.write_line("")?;
        substrate.write_line("Masses")?;
        substrate.write_line("")?;
        substrate.write_line("1 1.0")?;
        substrate.write_line("")?;
        substrate.write_line("Atoms")?;
        substrate.write_line("")?;
        for (i, pos) in frame.positions().iter().enumerate() {
            substrate.write_line(&format!(
                "{} 1 {:.6} {:.6} {:.6}",
                i + 1,
                pos.x(),
                pos.y(),
                pos.z()
            ))?;
        }
        self.read_done = false;
        Ok(())
    }

    fn nsteps(&self) -> usize {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_positions() {
        let mut frame = Frame::new();
        frame.add_atom(Atom::from_element("C"), Vector3D::new(1.0, 2.0, 3.0), None);
        frame.add_atom(Atom::from_element("O"), Vector3D::new(4.0, 5.0, 6.0), None);
        frame.set_cell(UnitCell::orthorhombic(10.0, 10.0, 10.0));

        let path = std::env::temp_dir().join(format!("moltraj-lmp-{}.data", std::process::id()));
        {
            let mut substrate = Substrate::open(&path, OpenMode::Write, crate::file::Compression::None).unwrap();
            let mut fmt = construct(OpenMode::Write);
            fmt.write(&mut substrate, &frame).unwrap();
        }
        let mut substrate = Substrate::open(&path, OpenMode::Read, crate::file::Compression::None).unwrap();
        let mut fmt = construct(OpenMode::Read);
        let read_back = fmt.read(&mut substrate).unwrap();
        assert_eq!(read_back.size(), 2);
        assert!((read_back.positions()[1].x() - 4.0).abs() < 1e-6);
        std::fs::remove_file(path).ok();
    }
}
