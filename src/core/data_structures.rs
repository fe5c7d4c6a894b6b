use crate::core::kmer::{is_unambiguous_dna, reverse_complement};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Core data structures shared by contig construction and read placement

/// Ordered nucleotide sequence with an identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sequence {
    pub id: String,
    symbols: Vec<u8>,
}

impl Sequence {
    pub fn new(id: impl Into<String>, symbols: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            symbols: symbols.into(),
        }
    }

    /// Convenience constructor for sequences given as text
    pub fn from_str_with_id(id: impl Into<String>, symbols: &str) -> Self {
        Self::new(id, symbols.as_bytes().to_vec())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.symbols
    }

    pub fn symbol(&self, index: usize) -> Option<u8> {
        self.symbols.get(index).copied()
    }

    /// `length` symbols starting at `start`, or `None` when out of range
    pub fn subsequence(&self, start: usize, length: usize) -> Option<&[u8]> {
        let end = start.checked_add(length)?;
        self.symbols.get(start..end)
    }

    pub fn reverse_complement(&self) -> Sequence {
        Sequence::new(self.id.clone(), reverse_complement(&self.symbols))
    }

    /// Only `ACGT` (either case)
    pub fn is_unambiguous_dna(&self) -> bool {
        is_unambiguous_dna(&self.symbols)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.symbols
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.symbols))
    }
}

/// Placement of one read interval on a contig.
///
/// `is_reversed` and `is_complemented` are always set together: a span that
/// does not match the contig verbatim was found through the reverse complement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssembledSequence {
    /// Index of the source read in the read set passed to the aligner
    pub read_index: usize,
    /// Start offset in the contig
    pub position: usize,
    /// Start offset in the read
    pub read_position: usize,
    pub length: usize,
    pub is_reversed: bool,
    pub is_complemented: bool,
}

/// Contig consensus plus the reads placed on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contig {
    pub consensus: Sequence,
    pub assembled_sequences: Vec<AssembledSequence>,
}

impl Contig {
    pub fn new(consensus: Sequence) -> Self {
        Self {
            consensus,
            assembled_sequences: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.consensus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consensus.is_empty()
    }

    /// Aligned read symbols per consensus symbol
    pub fn read_coverage(&self) -> f64 {
        if self.consensus.is_empty() {
            return 0.0;
        }
        let aligned: usize = self.assembled_sequences.iter().map(|s| s.length).sum();
        aligned as f64 / self.consensus.len() as f64
    }

    /// Distinct reads with at least one span on this contig
    pub fn read_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .assembled_sequences
            .iter()
            .map(|s| s.read_index)
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

/// Every position of one k-mer within one read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KmerOccurrence {
    pub read_index: usize,
    pub positions: Vec<usize>,
}

/// Summary statistics over a contig set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContigStats {
    pub num_contigs: usize,
    pub total_length: usize,
    pub largest_contig: usize,
    pub n50: usize,
    pub gc_content: f64,
}

impl ContigStats {
    pub fn from_sequences(contigs: &[Sequence]) -> Self {
        if contigs.is_empty() {
            return Self::default();
        }

        let mut lengths: Vec<usize> = contigs.iter().map(Sequence::len).collect();
        lengths.sort_unstable_by(|a, b| b.cmp(a));

        let total_length: usize = lengths.iter().sum();
        let half = total_length.div_ceil(2);
        let mut running = 0;
        let mut n50 = 0;
        for &len in &lengths {
            running += len;
            if running >= half {
                n50 = len;
                break;
            }
        }

        let gc: usize = contigs
            .iter()
            .flat_map(|c| c.as_bytes())
            .filter(|&&b| matches!(b, b'G' | b'C' | b'g' | b'c'))
            .count();

        Self {
            num_contigs: contigs.len(),
            total_length,
            largest_contig: lengths[0],
            n50,
            gc_content: if total_length > 0 {
                gc as f64 / total_length as f64
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_accessors() {
        let seq = Sequence::from_str_with_id("r1", "GATTACA");
        assert_eq!(seq.len(), 7);
        assert_eq!(seq.symbol(3), Some(b'T'));
        assert_eq!(seq.symbol(7), None);
        assert_eq!(seq.subsequence(1, 3), Some(&b"ATT"[..]));
        assert_eq!(seq.subsequence(5, 3), None);
        assert_eq!(seq.subsequence(usize::MAX, 2), None);
        assert_eq!(seq.reverse_complement().to_string(), "TGTAATC");
        assert!(seq.is_unambiguous_dna());
        assert!(!Sequence::from_str_with_id("r2", "GANNA").is_unambiguous_dna());
    }

    #[test]
    fn test_contig_read_coverage() {
        let mut contig = Contig::new(Sequence::from_str_with_id("c", "ACGTACGTAC"));
        assert_eq!(contig.read_coverage(), 0.0);
        for (read_index, length) in [(0, 10), (1, 5), (0, 5)] {
            contig.assembled_sequences.push(AssembledSequence {
                read_index,
                position: 0,
                read_position: 0,
                length,
                is_reversed: false,
                is_complemented: false,
            });
        }
        assert!((contig.read_coverage() - 2.0).abs() < f64::EPSILON);
        assert_eq!(contig.read_indices(), vec![0, 1]);
    }

    #[test]
    fn test_contig_stats() {
        let contigs = vec![
            Sequence::from_str_with_id("a", "GGGGGGGGGG"),
            Sequence::from_str_with_id("b", "AAAAAA"),
            Sequence::from_str_with_id("c", "ATAT"),
        ];
        let stats = ContigStats::from_sequences(&contigs);
        assert_eq!(stats.num_contigs, 3);
        assert_eq!(stats.total_length, 20);
        assert_eq!(stats.largest_contig, 10);
        assert_eq!(stats.n50, 10);
        assert!((stats.gc_content - 0.5).abs() < 1e-9);

        assert_eq!(ContigStats::from_sequences(&[]), ContigStats::default());
    }
}
