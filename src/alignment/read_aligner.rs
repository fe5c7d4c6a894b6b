//! Read-Contig Aligner
//! ===================
//!
//! Places the original reads back onto finished contigs:
//! index read k-mers once, index each contig against them, then merge the
//! hits of every read into spans. Contigs are processed in parallel, and the
//! reads of one contig fan out over the same rayon pool.

use crate::alignment::contig_indexer::ContigIndex;
use crate::alignment::kmer_index::KmerReadIndex;
use crate::alignment::read_mapper::map_read;
use crate::assembly::error::AssemblyError;
use crate::core::data_structures::{AssembledSequence, Contig, Sequence};
use anyhow::Result;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy)]
pub struct ReadContigAligner {
    kmer_length: usize,
}

impl ReadContigAligner {
    pub fn new(kmer_length: usize) -> Result<Self> {
        if kmer_length == 0 {
            return Err(AssemblyError::ZeroKmerLength.into());
        }
        Ok(Self { kmer_length })
    }

    pub fn kmer_length(&self) -> usize {
        self.kmer_length
    }

    /// One `Contig` per input contig, in input order, carrying every read
    /// span found on it. Reads or contigs shorter than the k-mer length
    /// produce no spans.
    #[instrument(skip_all, fields(contigs = contigs.len(), reads = reads.len()))]
    pub fn align(&self, contigs: &[Sequence], reads: &[Sequence]) -> Result<Vec<Contig>> {
        let start = Instant::now();
        let k = self.kmer_length;
        let index = KmerReadIndex::build(reads, k)?;

        let aligned: Vec<Contig> = contigs
            .par_iter()
            .map(|consensus| {
                let contig_index = ContigIndex::build(consensus, &index);
                let matches = contig_index.matches();

                let assembled_sequences: Vec<AssembledSequence> = contig_index
                    .first_occurrences()
                    .into_par_iter()
                    .flat_map_iter(|(offset, read_index)| {
                        let read = &reads[read_index];
                        map_read(matches, offset, read_index, k)
                            .into_iter()
                            .map(move |map| map.to_assembled_sequence(read_index, consensus, read))
                    })
                    .collect();

                debug!(
                    "Contig {} ({} bp): {} read spans",
                    consensus.id,
                    consensus.len(),
                    assembled_sequences.len()
                );

                Contig {
                    consensus: consensus.clone(),
                    assembled_sequences,
                }
            })
            .collect();

        let spans: usize = aligned.iter().map(|c| c.assembled_sequences.len()).sum();
        info!(
            "📍 Aligned {} reads to {} contigs: {} spans in {:.2?}",
            reads.len(),
            aligned.len(),
            spans,
            start.elapsed()
        );
        Ok(aligned)
    }
}

/// Convenience wrapper around [`ReadContigAligner::align`]
pub fn align_reads_to_contigs(
    contigs: &[Sequence],
    reads: &[Sequence],
    kmer_length: usize,
) -> Result<Vec<Contig>> {
    ReadContigAligner::new(kmer_length)?.align(contigs, reads)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seqs(prefix: &str, items: &[&str]) -> Vec<Sequence> {
        items
            .iter()
            .enumerate()
            .map(|(i, s)| Sequence::from_str_with_id(format!("{prefix}{i}"), s))
            .collect()
    }

    #[test]
    fn test_forward_read_single_span() {
        let contigs = seqs("c", &["TCTGATAAGG"]);
        let reads = seqs("r", &["CTGATAAGG"]);
        let aligned = align_reads_to_contigs(&contigs, &reads, 6).unwrap();

        assert_eq!(aligned.len(), 1);
        assert_eq!(aligned[0].consensus, contigs[0]);
        assert_eq!(
            aligned[0].assembled_sequences,
            vec![AssembledSequence {
                read_index: 0,
                position: 1,
                read_position: 0,
                length: 9,
                is_reversed: false,
                is_complemented: false,
            }]
        );
    }

    #[test]
    fn test_zero_kmer_length_rejected() {
        let err = ReadContigAligner::new(0).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AssemblyError>(),
            Some(&AssemblyError::ZeroKmerLength)
        );
    }

    #[test]
    fn test_empty_inputs() {
        let contigs = seqs("c", &["TCTGATAAGG", "ACG"]);
        let aligned = align_reads_to_contigs(&contigs, &[], 6).unwrap();
        assert_eq!(aligned.len(), 2);
        assert!(aligned.iter().all(|c| c.assembled_sequences.is_empty()));

        let reads = seqs("r", &["CTGATAAGG"]);
        assert!(align_reads_to_contigs(&[], &reads, 6).unwrap().is_empty());
    }
}
