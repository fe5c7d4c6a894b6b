//! Contig K-mer Indexer
//!
//! For each k-mer window of a contig, the reads that share it on either
//! strand.

use crate::alignment::kmer_index::KmerReadIndex;
use crate::core::data_structures::{KmerOccurrence, Sequence};
use crate::core::kmer::reverse_complement;
use ahash::AHashSet;

/// Read matches at every k-mer offset of one contig
#[derive(Debug, Clone)]
pub struct ContigIndex<'a> {
    contig: &'a Sequence,
    matches: Vec<&'a [KmerOccurrence]>,
}

impl<'a> ContigIndex<'a> {
    /// Look up each window first as written, then as its reverse complement.
    /// Offsets with no match hold an empty list, so `matches()[i]` always
    /// refers to contig offset `i`.
    pub fn build(contig: &'a Sequence, reads: &'a KmerReadIndex) -> Self {
        let k = reads.kmer_length();
        let matches = contig
            .as_bytes()
            .windows(k)
            .map(|kmer| {
                reads
                    .get(kmer)
                    .or_else(|| reads.get(&reverse_complement(kmer)))
                    .unwrap_or(&[])
            })
            .collect();

        Self { contig, matches }
    }

    pub fn contig(&self) -> &'a Sequence {
        self.contig
    }

    pub fn matches(&self) -> &[&'a [KmerOccurrence]] {
        &self.matches
    }

    /// `(offset, read_index)` for the first offset at which each read
    /// appears, in order of appearance
    pub fn first_occurrences(&self) -> Vec<(usize, usize)> {
        let mut seen = AHashSet::new();
        let mut firsts = Vec::new();
        for (offset, occurrences) in self.matches.iter().enumerate() {
            for occurrence in occurrences.iter() {
                if seen.insert(occurrence.read_index) {
                    firsts.push((offset, occurrence.read_index));
                }
            }
        }
        firsts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reads(seqs: &[&str]) -> Vec<Sequence> {
        seqs.iter()
            .enumerate()
            .map(|(i, s)| Sequence::from_str_with_id(format!("r{i}"), s))
            .collect()
    }

    #[test]
    fn test_matches_cover_every_offset() {
        let index = KmerReadIndex::build(&reads(&["CTGATAAGG"]), 6).unwrap();
        let contig = Sequence::from_str_with_id("c", "TCTGATAAGG");
        let contig_index = ContigIndex::build(&contig, &index);

        let matches = contig_index.matches();
        assert_eq!(matches.len(), 5);
        assert!(matches[0].is_empty());
        for (offset, occurrences) in matches.iter().enumerate().skip(1) {
            assert_eq!(occurrences.len(), 1);
            assert_eq!(occurrences[0].positions, vec![offset - 1]);
        }
        assert_eq!(contig_index.first_occurrences(), vec![(1, 0)]);
    }

    #[test]
    fn test_reverse_strand_lookup() {
        let index = KmerReadIndex::build(&reads(&["CCTTATCAG"]), 6).unwrap();
        let contig = Sequence::from_str_with_id("c", "TCTGATAAGG");
        let contig_index = ContigIndex::build(&contig, &index);

        // CTGATA (offset 1) is found as TATCAG at read offset 3
        assert_eq!(contig_index.matches()[1][0].positions, vec![3]);
        assert_eq!(contig_index.matches()[4][0].positions, vec![0]);
    }

    #[test]
    fn test_first_occurrences_in_order_of_appearance() {
        let index =
            KmerReadIndex::build(&reads(&["GATCTGATAA", "ATCTGATAAG", "TCTGATAAGG"]), 6).unwrap();
        let contig = Sequence::from_str_with_id("c", "GATCTGATAAGG");
        let contig_index = ContigIndex::build(&contig, &index);
        assert_eq!(contig_index.first_occurrences(), vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn test_contig_shorter_than_kmer() {
        let index = KmerReadIndex::build(&reads(&["ACGTACGT"]), 6).unwrap();
        let contig = Sequence::from_str_with_id("c", "ACGT");
        let contig_index = ContigIndex::build(&contig, &index);
        assert!(contig_index.matches().is_empty());
        assert!(contig_index.first_occurrences().is_empty());
    }
}
