//! Read Mapper
//! ===========
//!
//! Merges the per-offset k-mer hits of one read into maximal spans against a
//! contig. A span grows by one symbol each time the next contig offset
//! carries a hit that continues it, either advancing through the read
//! (forward strand) or stepping back through it (reverse strand).

use crate::core::data_structures::{AssembledSequence, KmerOccurrence, Sequence};

/// Span under construction: `length` symbols from `contig_start` in the
/// contig against `length` symbols from `read_start` in the read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadMap {
    pub contig_start: usize,
    pub read_start: usize,
    pub length: usize,
}

impl ReadMap {
    pub fn new(contig_start: usize, read_start: usize, kmer_length: usize) -> Self {
        Self {
            contig_start,
            read_start,
            length: kmer_length,
        }
    }

    /// Contig offset of the k-mer that would extend this span by one symbol
    fn next_contig_offset(&self, kmer_length: usize) -> usize {
        self.contig_start + self.length + 1 - kmer_length
    }

    /// Hit at `contig_offset` continues the span forward through the read
    pub fn is_continuous_right(
        &self,
        contig_offset: usize,
        read_offset: usize,
        kmer_length: usize,
    ) -> bool {
        self.next_contig_offset(kmer_length) == contig_offset
            && self.read_start + self.length + 1 - kmer_length == read_offset
    }

    /// Hit at `contig_offset` continues the span backward through the read
    pub fn is_continuous_left(
        &self,
        contig_offset: usize,
        read_offset: usize,
        kmer_length: usize,
    ) -> bool {
        self.next_contig_offset(kmer_length) == contig_offset
            && self.read_start.checked_sub(1) == Some(read_offset)
    }

    fn extend(&mut self, read_offset: usize) {
        self.length += 1;
        self.read_start = self.read_start.min(read_offset);
    }

    /// Final placement. A span whose symbols differ between contig and read
    /// was matched through the reverse complement.
    pub fn to_assembled_sequence(
        &self,
        read_index: usize,
        contig: &Sequence,
        read: &Sequence,
    ) -> AssembledSequence {
        let contig_span = contig.subsequence(self.contig_start, self.length);
        let read_span = read.subsequence(self.read_start, self.length);
        let forward = match (contig_span, read_span) {
            (Some(c), Some(r)) => c.eq_ignore_ascii_case(r),
            _ => false,
        };

        AssembledSequence {
            read_index,
            position: self.contig_start,
            read_position: self.read_start,
            length: self.length,
            is_reversed: !forward,
            is_complemented: !forward,
        }
    }
}

/// Collect the spans of `read_index` from its first hit at `start` onwards.
/// `matches[i]` lists the read hits at contig offset `i`.
pub fn map_read(
    matches: &[&[KmerOccurrence]],
    start: usize,
    read_index: usize,
    kmer_length: usize,
) -> Vec<ReadMap> {
    let mut maps = Vec::new();
    for (offset, occurrences) in matches.iter().enumerate().skip(start) {
        for occurrence in occurrences.iter().filter(|o| o.read_index == read_index) {
            find_continuous(&mut maps, &occurrence.positions, offset, kmer_length);
        }
    }
    maps
}

/// Merge the read offsets hit at `contig_offset` into the running spans,
/// opening a new span for every offset that continues none of them.
pub fn find_continuous(
    maps: &mut Vec<ReadMap>,
    read_offsets: &[usize],
    contig_offset: usize,
    kmer_length: usize,
) {
    if maps.is_empty() {
        maps.extend(
            read_offsets
                .iter()
                .map(|&p| ReadMap::new(contig_offset, p, kmer_length)),
        );
        return;
    }

    for &read_offset in read_offsets {
        let continued = maps.iter_mut().find(|m| {
            m.is_continuous_right(contig_offset, read_offset, kmer_length)
                || m.is_continuous_left(contig_offset, read_offset, kmer_length)
        });
        match continued {
            Some(map) => map.extend(read_offset),
            None => maps.push(ReadMap::new(contig_offset, read_offset, kmer_length)),
        }
    }
}
