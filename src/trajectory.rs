//! `Trajectory`: the engine that binds a [`Substrate`] to a registered
//! [`Format`] and drives sequential or random-access reads and writes.

use crate::error::{Error, Result};
use crate::file::{infer_compression, strip_compression_suffix, Compression, OpenMode, Substrate};
use crate::model::{Frame, Topology};
use crate::registry::{self, Format};
use crate::warning;
use std::path::Path;

/// Builder carrying the optional format hint, compression hint, and warning
/// sink for a `Trajectory::open_with` call.
#[derive(Default)]
pub struct OpenOptions {
    format: Option<String>,
    compression: Option<Compression>,
    warning_sink: Option<Box<dyn Fn(&str) + Send + Sync>>,
}

impl OpenOptions {
    pub fn new() -> Self {
        OpenOptions::default()
    }

    /// Force a specific registered format name instead of inferring it from
    /// the path's extension.
    pub fn format(mut self, name: impl Into<String>) -> Self {
        self.format = Some(name.into());
        self
    }

    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = Some(compression);
        self
    }

    /// Install a callback invoked (alongside `tracing::warn!`) for every
    /// warning raised while this trajectory is open.
    pub fn warning_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.warning_sink = Some(Box::new(sink));
        self
    }
}

/// An ordered sequence of frames stored in a file, read or written one step
/// at a time through a registered [`Format`].
pub struct Trajectory {
    substrate: Substrate,
    format: Box<dyn Format>,
    step_index: usize,
    done: bool,
    topology_override: Option<Topology>,
    cell_override: Option<crate::model::UnitCell>,
    closed: bool,
}

impl Trajectory {
    /// Open `path` for `mode`, inferring format and compression from the
    /// path's extension.
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        Self::open_with(path, mode, OpenOptions::new())
    }

    /// Open `path` for `mode` with explicit overrides.
    pub fn open_with(path: impl AsRef<Path>, mode: OpenMode, options: OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        if let Some(sink) = options.warning_sink {
            warning::set_warning_sink(Some(move |msg: &str| sink(msg)));
        }

        let compression = options
            .compression
            .unwrap_or_else(|| infer_compression(path));

        let format_name = match options.format {
            Some(name) => name,
            None => {
                let inner_path = strip_compression_suffix(path);
                let extension = inner_path
                    .extension()
                    .and_then(|e| e.to_str())
                    .ok_or_else(|| Error::format(format!("cannot infer format from path: {}", path.display())))?;
                registry::name_for_extension(extension)?.to_string()
            }
        };

        let mut substrate = Substrate::open(path, mode, compression)?;
        let mut format = registry::format_by_name(&format_name, mode)?;
        if mode == OpenMode::Read {
            format.index(&mut substrate)?;
        }

        Ok(Trajectory {
            substrate,
            format,
            step_index: 0,
            done: false,
            topology_override: None,
            cell_override: None,
            closed: false,
        })
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::file("trajectory is closed"));
        }
        Ok(())
    }

    /// Number of steps known to the underlying format.
    pub fn nsteps(&self) -> Result<usize> {
        self.check_open()?;
        Ok(self.format.nsteps())
    }

    fn apply_overrides(&self, frame: &mut Frame) -> Result<()> {
        if let Some(topology) = &self.topology_override {
            frame.set_topology(topology.clone())?;
        }
        if let Some(cell) = &self.cell_override {
            frame.set_cell(cell.clone());
        }
        Ok(())
    }

    /// Read the next step, advancing `step_index`. `open`/`open_with` already
    /// ran the format's upfront index scan, so `nsteps()` is accurate for
    /// seekable substrates; `done` is still set from the format's `Err`
    /// rather than a step-count comparison, since non-seekable substrates
    /// (bzip2/xz) skip indexing and only learn EOF by reading.
    pub fn read(&mut self) -> Result<Frame> {
        self.check_open()?;
        if self.done {
            return Err(Error::file("no more steps"));
        }
        let result = self.format.read(&mut self.substrate);
        let mut frame = match result {
            Ok(frame) => frame,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };
        frame.set_step(self.step_index);
        self.step_index += 1;
        self.apply_overrides(&mut frame)?;
        Ok(frame)
    }

    /// Read step `i` directly.
    pub fn read_step(&mut self, i: usize) -> Result<Frame> {
        self.check_open()?;
        let mut frame = self.format.read_step(&mut self.substrate, i)?;
        frame.set_step(i);
        self.step_index = i + 1;
        self.done = false;
        self.apply_overrides(&mut frame)?;
        Ok(frame)
    }

    /// True once a sequential `read()` has exhausted the trajectory.
    pub fn done(&self) -> bool {
        self.done
    }

    /// Replace the format-provided topology on every subsequent read. Not
    /// validated against `frame.size()` until the next `read`/`read_step`.
    pub fn set_topology(&mut self, topology: Topology) {
        self.topology_override = Some(topology);
    }

    /// Load a topology from another trajectory file and use it as the
    /// override, the same way `set_topology` does.
    pub fn set_topology_from(&mut self, path: impl AsRef<Path>, format: Option<&str>) -> Result<()> {
        let mut options = OpenOptions::new();
        if let Some(format) = format {
            options = options.format(format);
        }
        let mut source = Trajectory::open_with(path, OpenMode::Read, options)?;
        let frame = source.read()?;
        self.topology_override = Some(frame.topology().clone());
        Ok(())
    }

    /// Replace the format-provided cell on every subsequent read.
    pub fn set_cell(&mut self, cell: crate::model::UnitCell) {
        self.cell_override = Some(cell);
    }

    /// Append one frame.
    pub fn write(&mut self, frame: &Frame) -> Result<()> {
        self.check_open()?;
        self.format.write(&mut self.substrate, frame)
    }

    /// Flush and release the underlying file. Subsequent operations fail.
    pub fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.substrate.flush()?;
            self.closed = true;
        }
        Ok(())
    }

}

impl Drop for Trajectory {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Atom;
    use crate::primitives::Vector3D;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("moltraj-traj-{}-{name}", std::process::id()))
    }

    #[test]
    fn write_then_read_back_xyz() {
        let path = temp_path("roundtrip.xyz");
        {
            let mut traj = Trajectory::open(&path, OpenMode::Write).unwrap();
            let mut frame = Frame::new();
            frame.add_atom(Atom::from_element("O"), Vector3D::new(0.0, 0.0, 0.0), None);
            frame.add_atom(Atom::from_element("H"), Vector3D::new(0.96, 0.0, 0.0), None);
            traj.write(&frame).unwrap();
            traj.close().unwrap();
        }
        let mut traj = Trajectory::open(&path, OpenMode::Read).unwrap();
        let frame = traj.read().unwrap();
        assert_eq!(frame.size(), 2);
        assert!(traj.read().is_err());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn topology_override_applies_after_read() {
        let path = temp_path("override.xyz");
        {
            let mut traj = Trajectory::open(&path, OpenMode::Write).unwrap();
            let mut frame = Frame::new();
            frame.add_atom(Atom::from_element("C"), Vector3D::new(0.0, 0.0, 0.0), None);
            frame.add_atom(Atom::from_element("O"), Vector3D::new(1.2, 0.0, 0.0), None);
            traj.write(&frame).unwrap();
        }
        let mut traj = Trajectory::open(&path, OpenMode::Read).unwrap();
        let mut topology = Topology::new();
        topology.add_atom(Atom::from_element("C"));
        topology.add_atom(Atom::from_element("O"));
        topology.add_bond(0, 1).unwrap();
        traj.set_topology(topology);
        let frame = traj.read().unwrap();
        assert!(frame.topology().is_bonded(0, 1));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn operations_after_close_fail() {
        let path = temp_path("closed.xyz");
        let mut traj = Trajectory::open(&path, OpenMode::Write).unwrap();
        let frame = Frame::new();
        traj.write(&frame).unwrap();
        traj.close().unwrap();
        assert!(traj.write(&frame).is_err());
        std::fs::remove_file(path).ok();
    }
}
