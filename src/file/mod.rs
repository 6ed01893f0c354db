//! The file substrate: one handle that reads/writes text lines or raw bytes
//! and hides whatever compression sits on top of the underlying file.
//!
//! Every format adapter goes through a [`Substrate`] instead of touching
//! `std::fs` directly, the same way every parser in the workspace this crate
//! grew out of funneled its I/O through a `BufReader<File>` — this just makes
//! that funnel uniform across plain, gzip, bzip2, and xz/lzma files.

use crate::error::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bzip2::read::BzDecoder;
use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression as GzLevel;
use xz2::read::XzDecoder;

/// How the file should be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
    Append,
}

/// Which compression sits on top of the file, or `Auto` to infer it from the
/// path's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Auto,
    None,
    Gzip,
    Bzip2,
    Lzma,
}

/// Infer compression from a trailing `.gz`/`.bz2`/`.xz`/`.lzma` suffix.
pub fn infer_compression(path: &Path) -> Compression {
    match path.extension().and_then(|e| e.to_str()) {
        Some("gz") => Compression::Gzip,
        Some("bz2") => Compression::Bzip2,
        Some("xz") | Some("lzma") => Compression::Lzma,
        _ => Compression::None,
    }
}

/// The path with its compression suffix stripped, so format dispatch can look
/// at the *inner* extension (`water.xyz.gz` -> `water.xyz`).
pub fn strip_compression_suffix(path: &Path) -> PathBuf {
    match infer_compression(path) {
        Compression::None => path.to_path_buf(),
        _ => path.with_extension(""),
    }
}

enum Backend {
    PlainRead(BufReader<File>),
    PlainWrite(BufWriter<File>),
    GzipRead(Cursor<Vec<u8>>),
    GzipWrite(GzEncoder<BufWriter<File>>),
    Bzip2Read(BufReader<BzDecoder<File>>),
    XzRead(BufReader<XzDecoder<File>>),
}

/// A single handle over a (possibly compressed) file, exposing both
/// line-oriented text operations and raw binary operations. Which set of
/// operations makes sense depends on the backend and the format using it;
/// calling the wrong one for the mode fails with a typed error rather than
/// panicking.
pub struct Substrate {
    backend: Backend,
    mode: OpenMode,
    compression: Compression,
}

impl Substrate {
    /// Open `path` in `mode` with `compression` (or `Compression::Auto` to
    /// infer it from the extension).
    pub fn open(path: &Path, mode: OpenMode, compression: Compression) -> Result<Self> {
        let compression = match compression {
            Compression::Auto => infer_compression(path),
            other => other,
        };

        let backend = match (mode, compression) {
            (OpenMode::Read, Compression::None) => {
                let f = File::open(path).map_err(|e| Error::file(format!("{}: {e}", path.display())))?;
                Backend::PlainRead(BufReader::new(f))
            }
            (OpenMode::Read, Compression::Gzip) => {
                let f = File::open(path).map_err(|e| Error::file(format!("{}: {e}", path.display())))?;
                let mut decoder = GzDecoder::new(BufReader::new(f));
                let mut buf = Vec::new();
                decoder
                    .read_to_end(&mut buf)
                    .map_err(|e| Error::file(format!("gzip decode failed: {e}")))?;
                Backend::GzipRead(Cursor::new(buf))
            }
            (OpenMode::Read, Compression::Bzip2) => {
                let f = File::open(path).map_err(|e| Error::file(format!("{}: {e}", path.display())))?;
                Backend::Bzip2Read(BufReader::new(BzDecoder::new(f)))
            }
            (OpenMode::Read, Compression::Lzma) => {
                let f = File::open(path).map_err(|e| Error::file(format!("{}: {e}", path.display())))?;
                Backend::XzRead(BufReader::new(XzDecoder::new(f)))
            }
            (OpenMode::Write, Compression::None) => {
                let f = File::create(path).map_err(|e| Error::file(format!("{}: {e}", path.display())))?;
                Backend::PlainWrite(BufWriter::new(f))
            }
            (OpenMode::Append, Compression::None) => {
                let f = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| Error::file(format!("{}: {e}", path.display())))?;
                Backend::PlainWrite(BufWriter::new(f))
            }
            (OpenMode::Write, Compression::Gzip) => {
                let f = File::create(path).map_err(|e| Error::file(format!("{}: {e}", path.display())))?;
                Backend::GzipWrite(GzEncoder::new(BufWriter::new(f), GzLevel::default()))
            }
            (OpenMode::Append, Compression::Gzip) => {
                // A second gzip member appended to the file decompresses
                // transparently, since gzip streams may be concatenated.
                let f = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| Error::file(format!("{}: {e}", path.display())))?;
                Backend::GzipWrite(GzEncoder::new(BufWriter::new(f), GzLevel::default()))
            }
            (OpenMode::Write | OpenMode::Append, Compression::Bzip2 | Compression::Lzma) => {
                return Err(Error::format(
                    "writing bzip2/xz/lzma is not supported; only gzip compression on write",
                ));
            }
            (OpenMode::Read, Compression::Auto) => unreachable!("resolved above"),
        };

        Ok(Substrate {
            backend,
            mode,
            compression,
        })
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// True if `tellg`/`seekg`/`rewind` work on this handle. Plain and
    /// gzip-backed reads are seekable (gzip is fully inflated into memory
    /// first); bzip2 and xz streams are read forward-only.
    pub fn is_seekable(&self) -> bool {
        matches!(self.backend, Backend::PlainRead(_) | Backend::GzipRead(_))
    }

    /// Read one line, stripping a trailing `\n` or `\r\n`. Fails with
    /// `FileError` at EOF (no more data to read).
    pub fn readline(&mut self) -> Result<String> {
        let mut line = String::new();
        let n = match &mut self.backend {
            Backend::PlainRead(r) => r.read_line(&mut line)?,
            Backend::GzipRead(r) => r.read_line(&mut line)?,
            Backend::Bzip2Read(r) => r.read_line(&mut line)?,
            Backend::XzRead(r) => r.read_line(&mut line)?,
            _ => return Err(Error::format("readline on a write handle")),
        };
        if n == 0 {
            return Err(Error::file("no more steps"));
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }

    /// Read exactly `n` lines, or fail with `FileError` if fewer remain.
    pub fn readlines(&mut self, n: usize) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.readline()?);
        }
        Ok(out)
    }

    /// True once the next `readline`/`read_exact` would report EOF.
    pub fn eof(&mut self) -> bool {
        let peek = match &mut self.backend {
            Backend::PlainRead(r) => r.fill_buf(),
            Backend::GzipRead(r) => {
                let pos = r.position();
                let len = r.get_ref().len() as u64;
                return pos >= len;
            }
            Backend::Bzip2Read(r) => r.fill_buf(),
            Backend::XzRead(r) => r.fill_buf(),
            _ => return true,
        };
        matches!(peek, Ok(buf) if buf.is_empty())
    }

    /// Current stream offset (in bytes of the *decompressed* stream).
    pub fn tellg(&mut self) -> Result<u64> {
        match &mut self.backend {
            Backend::PlainRead(r) => Ok(r.stream_position()?),
            Backend::GzipRead(r) => Ok(r.position()),
            _ => Err(Error::file("not seekable")),
        }
    }

    /// Seek to an absolute offset previously returned by `tellg`.
    pub fn seekg(&mut self, pos: u64) -> Result<()> {
        match &mut self.backend {
            Backend::PlainRead(r) => {
                r.seek(SeekFrom::Start(pos))?;
                Ok(())
            }
            Backend::GzipRead(r) => {
                r.set_position(pos);
                Ok(())
            }
            _ => Err(Error::file("not seekable")),
        }
    }

    /// Seek back to the beginning of the stream.
    pub fn rewind(&mut self) -> Result<()> {
        self.seekg(0)
    }

    /// Read exactly `n` raw bytes.
    pub fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        match &mut self.backend {
            Backend::PlainRead(r) => r.read_exact(&mut buf)?,
            Backend::GzipRead(r) => r.read_exact(&mut buf)?,
            Backend::Bzip2Read(r) => r.read_exact(&mut buf)?,
            Backend::XzRead(r) => r.read_exact(&mut buf)?,
            _ => return Err(Error::format("read_exact on a write handle")),
        };
        Ok(buf)
    }

    /// Read raw bytes up to and including the first occurrence of `delim`.
    pub fn read_until(&mut self, delim: u8) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let n = match &mut self.backend {
            Backend::PlainRead(r) => r.read_until(delim, &mut buf)?,
            Backend::GzipRead(r) => r.read_until(delim, &mut buf)?,
            Backend::Bzip2Read(r) => r.read_until(delim, &mut buf)?,
            Backend::XzRead(r) => r.read_until(delim, &mut buf)?,
            _ => return Err(Error::format("read_until on a write handle")),
        };
        if n == 0 {
            return Err(Error::file("no more steps"));
        }
        Ok(buf)
    }

    /// Write raw bytes. Buffered; call `flush`/drop the handle to guarantee
    /// durability.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        match &mut self.backend {
            Backend::PlainWrite(w) => w.write_all(bytes)?,
            Backend::GzipWrite(w) => w.write_all(bytes)?,
            _ => return Err(Error::format("write on a read handle")),
        };
        Ok(())
    }

    /// Write a line followed by `\n`.
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.write_bytes(line.as_bytes())?;
        self.write_bytes(b"\n")
    }

    /// Flush buffered writes. Called automatically on drop, but callers
    /// wanting to observe I/O errors on close should call this explicitly.
    pub fn flush(&mut self) -> Result<()> {
        match &mut self.backend {
            Backend::PlainWrite(w) => w.flush()?,
            Backend::GzipWrite(w) => w.flush()?,
            _ => {}
        };
        Ok(())
    }
}

impl Drop for Substrate {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
