use std::fmt;
use std::io;

use thiserror::Error;

/// The pipeline stage that was running when a decode failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Identification,
    FileHeader,
    SectionHeaders,
    SectionNames,
    SectionContents,
    ProgramHeaders,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Identification => "identification",
            Stage::FileHeader => "file header",
            Stage::SectionHeaders => "section header table",
            Stage::SectionNames => "section names",
            Stage::SectionContents => "section contents",
            Stage::ProgramHeaders => "program header table",
        };
        f.write_str(name)
    }
}

/// Why a decode failed.
///
/// Every kind is fatal for the current decode attempt: the input is a fixed
/// buffer, so decoding it again would fail the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("invalid ELF magic {0:02x?}")]
    InvalidMagic([u8; 4]),

    #[error("unsupported ELF class {0}")]
    UnsupportedClass(u8),

    #[error("unsupported data encoding {0}")]
    UnsupportedEncoding(u8),

    #[error("reading {len} bytes would run past the end of a {limit}-byte range")]
    OutOfBounds { len: u64, limit: u64 },

    #[error("inconsistent table: {0}")]
    InconsistentTable(String),
}

/// A failed read that has not yet been attributed to a pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadError {
    pub offset: u64,
    pub kind: ErrorKind,
}

impl ReadError {
    pub fn new(offset: u64, kind: ErrorKind) -> Self {
        Self { offset, kind }
    }

    pub fn out_of_bounds(offset: u64, len: u64, limit: u64) -> Self {
        Self::new(offset, ErrorKind::OutOfBounds { len, limit })
    }

    pub fn inconsistent(offset: u64, reason: impl Into<String>) -> Self {
        Self::new(offset, ErrorKind::InconsistentTable(reason.into()))
    }

    /// Attributes this failure to `stage`.
    pub fn during(self, stage: Stage) -> DecodeError {
        DecodeError {
            stage,
            offset: self.offset,
            kind: self.kind,
        }
    }
}

/// A decode failure, identifying the stage, the byte offset involved, and the reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} failed at offset {offset:#x}: {kind}")]
pub struct DecodeError {
    pub stage: Stage,
    pub offset: u64,
    #[source]
    pub kind: ErrorKind,
}

impl DecodeError {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

/// Errors from [`DecodedImage::open`](crate::DecodedImage::open).
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type Result<T, E = DecodeError> = std::result::Result<T, E>;
