//! Read-to-contig alignment
//!
//! `kmer_index.rs` indexes the reads, `contig_indexer.rs` projects that index
//! onto one contig, `read_mapper.rs` merges hits into spans, and
//! `read_aligner.rs` drives the three in parallel.

pub mod contig_indexer;
pub mod kmer_index;
pub mod read_aligner;
pub mod read_mapper;

pub use contig_indexer::ContigIndex;
pub use kmer_index::KmerReadIndex;
pub use read_aligner::{align_reads_to_contigs, ReadContigAligner};
pub use read_mapper::{map_read, ReadMap};
