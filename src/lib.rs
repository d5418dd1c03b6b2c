//! Overlap-layout-consensus assembly of sequence fragments.
//!
//! Pairwise alignments between fragments, read from SAM, are turned
//! into an overlap graph whose vertices are fragment ends. The graph is
//! cleaned of conflicting overlaps and cycles, split into simple paths,
//! and each path is folded into a contig.

pub mod aligner;
pub mod assembly;
pub mod builder;
pub mod cigar;
pub mod contig;
pub mod error;
pub mod graph;
pub mod linearize;
pub mod optfields;
pub mod parser;
pub mod sequence;
pub mod store;
pub mod walker;
pub mod writer;

pub use self::assembly::{assemble, AssemblyConfig, AssemblyReport};
pub use self::error::{AssemblyError, AssemblyResult, GraphInconsistency};
