//! Crate-wide error type.
//!
//! Every fallible operation in this crate returns [`Result<T>`], an alias over
//! a single [`Error`] enum. Variants mirror the error kinds a format adapter,
//! the file substrate, the registry, or the selection engine can raise; none
//! of them are swallowed silently.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The crate-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O failure, EOF, unreadable compression, or a non-seekable stream.
    #[error("file error: {0}")]
    FileError(String),

    /// Malformed file content, an unsupported operation on a format, or an
    /// unknown extension/format name at dispatch time.
    #[error("format error: {0}")]
    FormatError(String),

    /// Allocation failure.
    #[error("memory error: {0}")]
    MemoryError(String),

    /// Selection-language lexical/syntax error, or reference to an unknown
    /// identifier. Carries the byte offset where the error was detected.
    #[error("selection error at byte {offset}: {message}")]
    SelectionError { offset: usize, message: String },

    /// A size mismatch on `set_topology`, a negative mass, or similar
    /// structural misconfiguration of a `Frame`/`Topology`.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// Generic fallback, used when none of the above kinds fit.
    #[error("{0}")]
    Other(String),

    /// Wraps a lower-level `std::io::Error` without discarding it.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn file(msg: impl Into<String>) -> Self {
        Error::FileError(msg.into())
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Error::FormatError(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::ConfigurationError(msg.into())
    }

    pub fn selection(offset: usize, msg: impl Into<String>) -> Self {
        Error::SelectionError {
            offset,
            message: msg.into(),
        }
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}
