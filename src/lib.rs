//! Rust library for elastic-degenerate strings (EDS).
//!
//! # Overview
//! An elastic-degenerate string is a sequence of positions where each
//! position holds a set of alternative strings. EDS compactly represent
//! pangenomes and other variant-aware sequences:
//!
//! ```text
//! {ACGT}{A,ACA}{CGT}{T,TG}
//! ```
//!
//! Position 1 here is *degenerate*: a reading of the EDS passes through
//! either `A` or `ACA`. The compact form writes brackets only around
//! degenerate positions: `ACGT{A,ACA}CGT{T,TG}`.
//!
//! ## Parsing and storage modes
//! [`Eds`] instances are built from text, readers, or files. Large inputs
//! can be loaded metadata-only, keeping just the index in memory and
//! streaming symbols from the backing file on demand:
//!
//! ```
//! use edseq::Eds;
//!
//! let eds = Eds::from_bytes("{ACGT}{A,ACA}{CGT}{T,TG}")?;
//! assert_eq!(eds.len(), 4);          // symbols
//! assert_eq!(eds.cardinality(), 6);  // alternative strings
//! assert_eq!(eds.char_count(), 14);  // characters
//! # Ok::<(), edseq::errors::Error>(())
//! ```
//!
//! ## Sources
//! Each alternative may carry a *source set*: the path identifiers of the
//! sequences that exhibit it, with `{0}` as the universal marker meaning
//! "every path". Source-aware operations intersect these sets to keep
//! only readings that some path actually supports.
//!
//! ## Queries
//! [`Eds::check_position`] decides whether a pattern occurs at a common
//! position under a given vector of degenerate choices, honoring source
//! intersections. [`Eds::extract`] reconstructs a concrete string from a
//! choice vector and [`Eds::generate_patterns`] samples random patterns
//! for benchmarking.
//!
//! ## Transformations
//! [`Eds::merge_adjacent`] combines two neighboring positions into one
//! (cartesian, or source-filtered "linear" when sources are loaded). The
//! [`transform`] module drives repeated merges to produce an *l-EDS*, in
//! which every internal non-degenerate position meets a length floor, and
//! converts multiple sequence alignments and reference+VCF data into EDS
//! form.

pub mod eds;
pub mod errors;
pub mod generate;
pub mod transform;

mod parse_utils;

// commonly used functions and types

pub use crate::eds::*;
pub use crate::generate::*;
