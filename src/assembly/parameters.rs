//! Assembly parameter estimation
//!
//! Defaults used when the configuration leaves the k-mer length or the
//! coverage threshold unset.

use crate::assembly::error::AssemblyError;
use crate::assembly::graph::DeBruijnGraph;
use crate::core::data_structures::Sequence;
use crate::core::kmer::MAX_KMER_LENGTH;
use anyhow::Result;
use tracing::debug;

/// Coverage threshold used when no node is deeper than `MIN_COUNTED_DEPTH`
pub const DEFAULT_COVERAGE_THRESHOLD: f64 = 2.0;

/// Nodes at or below this depth are ignored when estimating the threshold
const MIN_COUNTED_DEPTH: u32 = 2;

/// Pick a k-mer length from the read length distribution.
///
/// Starts at the midpoint of `[longest / 2, shortest]`, is forced odd so that
/// no k-mer can be its own reverse complement, and is capped at
/// [`MAX_KMER_LENGTH`].
pub fn estimate_kmer_length(reads: &[Sequence]) -> Result<usize> {
    if reads.is_empty() {
        return Err(AssemblyError::EmptyInput("reads").into());
    }

    let (shortest, longest) = reads
        .iter()
        .map(Sequence::len)
        .fold((usize::MAX, 0), |(lo, hi), len| (lo.min(len), hi.max(len)));

    let lower = (longest / 2).max(1) as i64;
    let upper = shortest as i64;

    let mut k = if lower < upper {
        (lower + upper + 1) / 2
    } else {
        upper
    };

    if k % 2 == 0 {
        k += 1;
        if k > upper {
            k -= 2;
        }
        if k <= 0 {
            k = 1;
        }
    }

    if upper < k {
        return Err(AssemblyError::ReadsTooShort {
            shortest,
            required: k as usize,
        }
        .into());
    }

    let k = (k as usize).min(MAX_KMER_LENGTH);
    debug!(
        "Estimated k={} from read lengths {}..={}",
        k, shortest, longest
    );
    Ok(k)
}

/// Square root of the median depth over nodes deeper than 2, or
/// [`DEFAULT_COVERAGE_THRESHOLD`] when there are none.
pub fn estimate_coverage_threshold(graph: &DeBruijnGraph) -> f64 {
    let mut depths: Vec<u32> = graph
        .nodes()
        .iter()
        .map(|n| n.depth())
        .filter(|&d| d > MIN_COUNTED_DEPTH)
        .collect();

    if depths.is_empty() {
        return DEFAULT_COVERAGE_THRESHOLD;
    }

    depths.sort_unstable();
    let mid = depths.len() / 2;
    let median = if depths.len() % 2 == 1 {
        f64::from(depths[mid])
    } else {
        (f64::from(depths[mid - 1]) + f64::from(depths[mid])) / 2.0
    };

    let threshold = median.sqrt();
    debug!(
        "Estimated coverage threshold {:.3} from median depth {} over {} nodes",
        threshold,
        median,
        depths.len()
    );
    threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reads_of_lengths(lengths: &[usize]) -> Vec<Sequence> {
        lengths
            .iter()
            .enumerate()
            .map(|(i, &n)| Sequence::new(format!("r{i}"), vec![b'A'; n]))
            .collect()
    }

    #[test]
    fn test_kmer_length_is_odd_midpoint() {
        // [50, 100] -> 75
        assert_eq!(estimate_kmer_length(&reads_of_lengths(&[100, 100])).unwrap(), 31);
        // [10, 20] -> 15
        assert_eq!(estimate_kmer_length(&reads_of_lengths(&[20, 20])).unwrap(), 15);
        // [9, 18] -> ceil(13.5) = 14 -> 15
        assert_eq!(estimate_kmer_length(&reads_of_lengths(&[18])).unwrap(), 15);
        // [10, 12] -> 11
        assert_eq!(estimate_kmer_length(&reads_of_lengths(&[12, 20])).unwrap(), 11);
    }

    #[test]
    fn test_kmer_length_when_reads_vary_widely() {
        // lower bound 30 exceeds the shortest read: fall back to 10 -> 11 -> 9
        assert_eq!(estimate_kmer_length(&reads_of_lengths(&[10, 60])).unwrap(), 9);
        assert_eq!(estimate_kmer_length(&reads_of_lengths(&[1])).unwrap(), 1);
    }

    #[test]
    fn test_kmer_length_errors() {
        let err = estimate_kmer_length(&[]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AssemblyError>(),
            Some(&AssemblyError::EmptyInput("reads"))
        );

        let err = estimate_kmer_length(&reads_of_lengths(&[0, 8])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AssemblyError>(),
            Some(AssemblyError::ReadsTooShort { shortest: 0, .. })
        ));
    }

    #[test]
    fn test_coverage_threshold_from_median() {
        let mut reads = vec![Sequence::from_str_with_id("a", "ACGTTG"); 9];
        reads.extend(vec![Sequence::from_str_with_id("b", "GGGCCA"); 4]);
        let graph = DeBruijnGraph::build(&reads, 6).unwrap();
        // depths {9, 4}: median 6.5
        let threshold = estimate_coverage_threshold(&graph);
        assert!((threshold - 6.5f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_coverage_threshold_defaults_for_shallow_graphs() {
        let reads = vec![Sequence::from_str_with_id("a", "ACGTTGCA"); 2];
        let graph = DeBruijnGraph::build(&reads, 5).unwrap();
        assert_eq!(estimate_coverage_threshold(&graph), DEFAULT_COVERAGE_THRESHOLD);
    }
}
