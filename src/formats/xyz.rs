//! The XYZ format: line 1 is the atom count, line 2 a free-form comment,
//! followed by one `symbol x y z` line per atom. No bonds, no cell.

use crate::error::{Error, Result};
use crate::file::{OpenMode, Substrate};
use crate::model::{Atom, Frame};
use crate::primitives::Vector3D;
use crate::registry::{Format, FormatMetadata};

pub(crate) fn metadata() -> FormatMetadata {
    FormatMetadata {
        name: "XYZ",
        extensions: &["xyz"],
        description: "atom count, comment line, `symbol x y z [vx vy vz]` per atom",
        supports_read: true,
        supports_write: true,
        supports_append: true,
    }
}

pub(crate) fn construct(_mode: OpenMode) -> Box<dyn Format> {
    Box::new(XyzFormat {
        offsets: Vec::new(),
        cursor: 0,
    })
}

pub struct XyzFormat {
    offsets: Vec<u64>,
    cursor: usize,
}

impl XyzFormat {
    fn parse_one(substrate: &mut Substrate) -> Result<Frame> {
        let header = substrate.readline()?;
        let n: usize = header
            .trim()
            .parse()
            .map_err(|_| Error::format(format!("expected atom count, got {header:?}")))?;

        let comment = substrate.readline()?;
        let mut frame = Frame::new();
        frame.set_property("name", comment.trim().to_string());

        let mut lines = Vec::with_capacity(n);
        for _ in 0..n {
            lines.push(substrate.readline()?);
        }
        let has_velocities = lines
            .first()
            .map(|l| l.split_whitespace().count() >= 7)
            .unwrap_or(false);
        if has_velocities {
            frame.set_has_velocities(true);
        }

        for line in &lines {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 {
                return Err(Error::format(format!(
                    "expected `symbol x y z`, got: {line:?}"
                )));
            }
            let x: f64 = parts[1]
                .parse()
                .map_err(|_| Error::format(format!("invalid x coordinate: {}", parts[1])))?;
            let y: f64 = parts[2]
                .parse()
                .map_err(|_| Error::format(format!("invalid y coordinate: {}", parts[2])))?;
            let z: f64 = parts[3]
                .parse()
                .map_err(|_| Error::format(format!("invalid z coordinate: {}", parts[3])))?;

            let velocity = if has_velocities && parts.len() >= 7 {
                let vx: f64 = parts[4]
                    .parse()
                    .map_err(|_| Error::format(format!("invalid vx: {}", parts[4])))?;
                let vy: f64 = parts[5]
                    .parse()
                    .map_err(|_| Error::format(format!("invalid vy: {}", parts[5])))?;
                let vz: f64 = parts[6]
                    .parse()
                    .map_err(|_| Error::format(format!("invalid vz: {}", parts[6])))?;
                Some(Vector3D::new(vx, vy, vz))
            } else {
                None
            };

            frame.add_atom(Atom::from_element(parts[0]), Vector3D::new(x, y, z), velocity);
        }

        Ok(frame)
    }
}

impl Format for XyzFormat {
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
        substrate.write_line(&frame.size().to_string())?;
        let comment = match frame.property("name") {
            Some(p) => p.as_str().unwrap_or("").to_string(),
            None => String::new(),
        };
        substrate.write_line(&comment)?;
        for (i, (atom, pos)) in frame.topology().atoms().iter().zip(frame.positions()).enumerate() {
            match frame.velocities() {
                Some(velocities) => {
                    let v = velocities[i];
                    substrate.write_line(&format!(
                        "{} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6}",
                        atom.r#type,
                        pos.x(),
                        pos.y(),
                        pos.z(),
                        v.x(),
                        v.y(),
                        v.z(),
                    ))?;
                }
                None => {
                    substrate.write_line(&format!(
                        "{} {:.6} {:.6} {:.6}",
                        atom.r#type,
                        pos.x(),
                        pos.y(),
                        pos.z()
                    ))?;
                }
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
    fn round_trip_through_temp_file() {
        let path = std::env::temp_dir().join(format!("moltraj-xyz-{}.xyz", std::process::id()));
        {
            let mut substrate =
                Substrate::open(&path, OpenMode::Write, crate::file::Compression::None).unwrap();
            let mut fmt = construct(OpenMode::Write);
            let mut frame = Frame::new();
            frame.set_property("name", "generated".to_string());
            frame.add_atom(Atom::from_element("O"), Vector3D::new(0.0, 0.0, 0.0), None);
            frame.add_atom(Atom::from_element("H"), Vector3D::new(0.96, 0.0, 0.0), None);
            fmt.write(&mut substrate, &frame).unwrap();
        }
        {
            let mut substrate =
                Substrate::open(&path, OpenMode::Read, crate::file::Compression::None).unwrap();
            let mut fmt = construct(OpenMode::Read);
            fmt.index(&mut substrate).unwrap();
            let frame = fmt.read(&mut substrate).unwrap();
            assert_eq!(frame.size(), 2);
            assert_eq!(frame.positions()[1], Vector3D::new(0.96, 0.0, 0.0));
            assert_eq!(
                frame.property("name").and_then(|p| p.as_str()),
                Some("generated")
            );
        }
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn velocities_round_trip_iff_originally_present() {
        let path =
            std::env::temp_dir().join(format!("moltraj-xyz-vel-{}.xyz", std::process::id()));
        {
            let mut substrate =
                Substrate::open(&path, OpenMode::Write, crate::file::Compression::None).unwrap();
            let mut fmt = construct(OpenMode::Write);
            let mut frame = Frame::new();
            frame.set_property("name", "with velocities".to_string());
            frame.set_has_velocities(true);
            frame.add_atom(
                Atom::from_element("O"),
                Vector3D::new(0.0, 0.0, 0.0),
                Some(Vector3D::new(1.0, 2.0, 3.0)),
            );
            frame.add_atom(
                Atom::from_element("H"),
                Vector3D::new(0.96, 0.0, 0.0),
                Some(Vector3D::new(-1.0, 0.0, 0.5)),
            );
            fmt.write(&mut substrate, &frame).unwrap();
        }
        {
            let mut substrate =
                Substrate::open(&path, OpenMode::Read, crate::file::Compression::None).unwrap();
            let mut fmt = construct(OpenMode::Read);
            fmt.index(&mut substrate).unwrap();
            let frame = fmt.read(&mut substrate).unwrap();
            let velocities = frame.velocities().unwrap();
            assert_eq!(velocities[0], Vector3D::new(1.0, 2.0, 3.0));
            assert_eq!(velocities[1], Vector3D::new(-1.0, 0.0, 0.5));
        }
        std::fs::remove_file(path).ok();
    }
}
