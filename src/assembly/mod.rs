//! Contig construction over a canonical de Bruijn graph
//!
//! **Graph**: `graph.rs` - node store, extension links, compaction
//! **Contigs**: `ambiguity.rs` → `path_tracer.rs`, orchestrated by `contig_builder.rs`
//! **Defaults**: `parameters.rs` - k-mer length and coverage threshold estimation

pub mod ambiguity;
pub mod contig_builder;
pub mod error;
pub mod graph;
pub mod parameters;
pub mod path_tracer;

pub use ambiguity::{exclude_ambiguous_extensions, AmbiguityReport};
pub use contig_builder::SimplePathContigBuilder;
pub use error::AssemblyError;
pub use graph::{DeBruijnGraph, Extension, GraphNode, NodeId, Side};
pub use parameters::{estimate_coverage_threshold, estimate_kmer_length};
pub use path_tracer::{SimplePath, SimplePathTracer, TraceMode};
