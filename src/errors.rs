//! Error types for EDS parsing, querying, and transformation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed EDS text. `pos` is the byte offset of the first offending
    /// byte in the input, after any leading whitespace.
    #[error("invalid EDS format at byte {pos}: {reason}")]
    Parse { pos: usize, reason: &'static str },

    /// Malformed source (sEDS) text.
    #[error("invalid source format at byte {pos}: {reason}")]
    ParseSources { pos: usize, reason: &'static str },

    /// The source file holds a different number of sets than the EDS has
    /// alternative strings.
    #[error("source count ({found}) does not match EDS cardinality ({expected})")]
    SourceCardinality { found: usize, expected: usize },

    /// Malformed collaborator input (MSA, VCF, FASTA).
    #[error("invalid {format} input: {reason}")]
    InvalidInput { format: &'static str, reason: String },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("{what} {value} out of range (valid: 0..{bound})")]
    OutOfRange {
        what: &'static str,
        value: usize,
        bound: usize,
    },

    /// A full-mode-only operation was invoked on a metadata-only instance.
    #[error("{op} requires full storage mode; reload without StorageMode::MetadataOnly")]
    ModeForbidden { op: &'static str },

    #[error("failed to {action} \"{file}\": {source}")]
    FileIo {
        action: &'static str,
        file: String,
        source: std::io::Error,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Linear merge found no pair of alternatives with intersecting sources.
    #[error("merging symbols {pos1} and {pos2} would produce an empty set (no source intersections)")]
    EmptyMerge { pos1: usize, pos2: usize },

    #[error("no convergence after {0} merge waves")]
    NoConvergence(usize),

    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}

/// Coarse classification of errors, one kind per failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInputFormat,
    InvalidParameter,
    OutOfRange,
    ModeForbidden,
    IoFailure,
    NoConvergence,
    Unsupported,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            Parse { .. } | ParseSources { .. } | SourceCardinality { .. }
            | InvalidInput { .. } => ErrorKind::InvalidInputFormat,
            InvalidParameter(_) | EmptyMerge { .. } => ErrorKind::InvalidParameter,
            OutOfRange { .. } => ErrorKind::OutOfRange,
            ModeForbidden { .. } => ErrorKind::ModeForbidden,
            FileIo { .. } | Io(_) => ErrorKind::IoFailure,
            NoConvergence(_) => ErrorKind::NoConvergence,
            Unsupported(_) => ErrorKind::Unsupported,
        }
    }
}
