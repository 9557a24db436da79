//! Transformations into and between EDS forms: the l-EDS convergence
//! driver, and converters from multiple sequence alignments and
//! reference-plus-variants data.

mod leds;
pub use leds::*;

mod msa;
pub use msa::*;

mod vcf;
pub use vcf::*;
