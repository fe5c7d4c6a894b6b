//! K-mer Read Index
//!
//! Exact k-mer text → every read that contains it, with all offsets inside
//! that read. Keys are upper-cased; no canonicalisation is applied, so
//! callers probe both strands.

use crate::assembly::error::AssemblyError;
use crate::core::data_structures::{KmerOccurrence, Sequence};
use ahash::AHashMap;
use anyhow::Result;
use rayon::prelude::*;
use tracing::debug;

type OccurrenceMap = AHashMap<Vec<u8>, Vec<KmerOccurrence>>;

#[derive(Debug, Clone)]
pub struct KmerReadIndex {
    kmer_length: usize,
    index: OccurrenceMap,
}

impl KmerReadIndex {
    /// Index every k-mer window of every read. Reads shorter than
    /// `kmer_length` contribute nothing. Occurrence lists are ordered by
    /// read index.
    pub fn build(reads: &[Sequence], kmer_length: usize) -> Result<Self> {
        if kmer_length == 0 {
            return Err(AssemblyError::ZeroKmerLength.into());
        }

        let mut index = reads
            .par_iter()
            .enumerate()
            .fold(OccurrenceMap::new, |mut acc, (read_index, read)| {
                for (kmer, positions) in read_kmer_positions(read.as_bytes(), kmer_length) {
                    acc.entry(kmer).or_default().push(KmerOccurrence {
                        read_index,
                        positions,
                    });
                }
                acc
            })
            .reduce(OccurrenceMap::new, |mut left, right| {
                for (kmer, occurrences) in right {
                    left.entry(kmer).or_default().extend(occurrences);
                }
                left
            });

        for occurrences in index.values_mut() {
            occurrences.sort_unstable_by_key(|o| o.read_index);
        }

        debug!(
            "Indexed {} distinct {}-mers from {} reads",
            index.len(),
            kmer_length,
            reads.len()
        );

        Ok(Self { kmer_length, index })
    }

    pub fn kmer_length(&self) -> usize {
        self.kmer_length
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Occurrences of exactly this k-mer (case-insensitive)
    pub fn get(&self, kmer: &[u8]) -> Option<&[KmerOccurrence]> {
        if kmer.iter().any(u8::is_ascii_lowercase) {
            self.index.get(&kmer.to_ascii_uppercase()).map(Vec::as_slice)
        } else {
            self.index.get(kmer).map(Vec::as_slice)
        }
    }
}

/// Group window offsets of one read by k-mer text
fn read_kmer_positions(read: &[u8], k: usize) -> AHashMap<Vec<u8>, Vec<usize>> {
    let mut positions: AHashMap<Vec<u8>, Vec<usize>> = AHashMap::new();
    for (offset, window) in read.windows(k).enumerate() {
        positions
            .entry(window.to_ascii_uppercase())
            .or_default()
            .push(offset);
    }
    positions
}
