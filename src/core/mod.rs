pub mod data_structures;
pub mod kmer;

// Re-export key types for assembly and alignment
pub use data_structures::{
    AssembledSequence,
    Contig,
    ContigStats,
    KmerOccurrence,
    Sequence,
};
pub use kmer::{reverse_complement, KmerValue, MAX_KMER_LENGTH};
