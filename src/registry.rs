//! The format registry: maps a format name or file extension to the
//! constructor for the adapter that reads/writes it.

use crate::error::{Error, Result};
use crate::file::{OpenMode, Substrate};
use crate::model::Frame;
use rustc_hash::FxHashMap;
use std::sync::{OnceLock, RwLock};

/// A stateful format adapter, constructed once per open trajectory.
///
/// Implementors own whatever per-file bookkeeping they need (frame offsets,
/// a pending header, a step counter) between calls.
pub trait Format: Send {
    /// Perform any upfront indexing this format needs to answer `nsteps()`
    /// correctly and support random access before the first `read`/
    /// `read_step` call, e.g. a linear forward scan of a text file to
    /// record each step's byte offset. Called once, right after opening,
    /// for formats opened in `OpenMode::Read`. Default: no-op, for formats
    /// that already know their step count from a fixed header.
    fn index(&mut self, _substrate: &mut Substrate) -> Result<()> {
        Ok(())
    }

    /// Read the next frame, advancing internal position.
    fn read(&mut self, substrate: &mut Substrate) -> Result<Frame>;

    /// Read the frame at `step` directly. The default implementation
    /// returns a "not supported" error; formats that support random access
    /// (most text formats, since the substrate itself is seekable) should
    /// override it.
    fn read_step(&mut self, _substrate: &mut Substrate, _step: usize) -> Result<Frame> {
        Err(Error::format("this format does not support random-access reads"))
    }

    /// Append `frame` to the trajectory.
    fn write(&mut self, substrate: &mut Substrate, frame: &Frame) -> Result<()>;

    /// Number of frames already known to exist (for formats that can count
    /// cheaply, e.g. by file size or an index block); `0` if unknown ahead
    /// of a full read.
    fn nsteps(&self) -> usize;
}

/// Static information about a registered format, independent of any
/// particular open file.
#[derive(Debug, Clone, Copy)]
pub struct FormatMetadata {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
    pub description: &'static str,
    pub supports_read: bool,
    pub supports_write: bool,
    pub supports_append: bool,
}

pub type Constructor = fn(OpenMode) -> Box<dyn Format>;

struct Entry {
    metadata: FormatMetadata,
    constructor: Constructor,
}

#[derive(Default)]
struct Registry {
    by_name: FxHashMap<&'static str, Entry>,
    by_extension: FxHashMap<&'static str, &'static str>,
}

impl Registry {
    /// Register `metadata`/`constructor` under `metadata.name` and each of
    /// its extensions. Fails if the name or any extension is already
    /// claimed by a different format.
    fn register(&mut self, metadata: FormatMetadata, constructor: Constructor) -> Result<()> {
        if self.by_name.contains_key(metadata.name) {
            return Err(Error::format(format!(
                "format already registered: {}",
                metadata.name
            )));
        }
        for ext in metadata.extensions {
            if let Some(&existing) = self.by_extension.get(ext) {
                return Err(Error::format(format!(
                    "extension .{ext} already registered to format {existing}"
                )));
            }
        }
        for ext in metadata.extensions {
            self.by_extension.insert(ext, metadata.name);
        }
        self.by_name.insert(
            metadata.name,
            Entry {
                metadata,
                constructor,
            },
        );
        Ok(())
    }
}

static REGISTRY: OnceLock<RwLock<Registry>> = OnceLock::new();

fn registry() -> &'static RwLock<Registry> {
    REGISTRY.get_or_init(|| {
        let mut registry = Registry::default();
        crate::formats::register_builtin_formats(&mut |metadata, constructor| {
            registry.register(metadata, constructor)
        })
        .expect("built-in formats must register without conflict");
        RwLock::new(registry)
    })
}

/// Register a format so it becomes available to `format_by_name`/
/// `format_by_extension`/`list_formats`. Fails if `metadata.name` or any of
/// its extensions is already claimed by a different format.
pub fn register(metadata: FormatMetadata, constructor: Constructor) -> Result<()> {
    registry()
        .write()
        .expect("format registry poisoned")
        .register(metadata, constructor)
}

/// Look up a format by its canonical name (e.g. `"XYZ"`) and construct an
/// adapter instance for `mode`.
pub fn format_by_name(name: &str, mode: OpenMode) -> Result<Box<dyn Format>> {
    let registry = registry().read().expect("format registry poisoned");
    let entry = registry
        .by_name
        .get(name)
        .ok_or_else(|| Error::format(format!("unknown format: {name}")))?;
    Ok((entry.constructor)(mode))
}

/// Resolve a file extension (without the leading dot, case-insensitive) to
/// a canonical format name.
pub fn name_for_extension(extension: &str) -> Result<&'static str> {
    let extension = extension.to_ascii_lowercase();
    let registry = registry().read().expect("format registry poisoned");
    registry
        .by_extension
        .get(extension.as_str())
        .copied()
        .ok_or_else(|| Error::format(format!("no format registered for extension: .{extension}")))
}

/// Construct an adapter by extension directly.
pub fn format_by_extension(extension: &str, mode: OpenMode) -> Result<Box<dyn Format>> {
    let name = name_for_extension(extension)?;
    format_by_name(name, mode)
}

/// Metadata for every registered format, sorted by name.
pub fn list_formats() -> Vec<FormatMetadata> {
    let registry = registry().read().expect("format registry poisoned");
    let mut formats: Vec<_> = registry.by_name.values().map(|e| e.metadata).collect();
    formats.sort_by_key(|m| m.name);
    formats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_formats_resolve_by_extension_and_name() {
        let name = name_for_extension("xyz").unwrap();
        assert_eq!(name, "XYZ");
        let _adapter = format_by_name("XYZ", OpenMode::Read).unwrap();
    }

    #[test]
    fn unknown_format_errors() {
        assert!(format_by_name("NOT_A_FORMAT", OpenMode::Read).is_err());
        assert!(name_for_extension("not_an_ext").is_err());
    }

    struct NullFormat;

    impl Format for NullFormat {
        fn read(&mut self, _substrate: &mut Substrate) -> Result<Frame> {
            Err(Error::file("no more steps"))
        }
        fn write(&mut self, _substrate: &mut Substrate, _frame: &Frame) -> Result<()> {
            Ok(())
        }
        fn nsteps(&self) -> usize {
            0
        }
    }

    fn construct_null(_mode: OpenMode) -> Box<dyn Format> {
        Box::new(NullFormat)
    }

    fn null_metadata(name: &'static str, extensions: &'static [&'static str]) -> FormatMetadata {
        FormatMetadata {
            name,
            extensions,
            description: "test-only format",
            supports_read: true,
            supports_write: true,
            supports_append: false,
        }
    }

    #[test]
    fn duplicate_name_registration_is_rejected() {
        register(null_metadata("NullFormatA", &["nulla"]), construct_null).unwrap();
        assert!(register(null_metadata("NullFormatA", &["nullb"]), construct_null).is_err());
    }

    #[test]
    fn conflicting_extension_registration_is_rejected() {
        register(null_metadata("NullFormatB", &["nullc"]), construct_null).unwrap();
        assert!(register(null_metadata("NullFormatD", &["nullc"]), construct_null).is_err());
    }

    #[test]
    fn list_formats_is_non_empty_and_sorted() {
        let formats = list_formats();
        assert!(!formats.is_empty());
        let mut names: Vec<_> = formats.iter().map(|m| m.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        names.dedup();
        assert_eq!(names.len(), formats.len());
    }
}
