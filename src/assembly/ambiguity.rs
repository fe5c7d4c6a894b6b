//! Ambiguity exclusion
//!
//! Invalidates every extension that would make a walk through the graph
//! ambiguous: branching sides, self-loops, and all links of palindromic
//! k-mers. Only invalid flags are written, never cleared, so concurrent
//! workers touching the same edge store identical values.

use crate::assembly::graph::{DeBruijnGraph, GraphNode, NodeId, Side};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Counts from one exclusion pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AmbiguityReport {
    /// Sides cleared because of branching or a palindromic k-mer
    pub ambiguous_sides: usize,
    /// One-node self-loops removed
    pub self_loops: usize,
    pub palindromes: usize,
}

/// Mark branching, self-looping and palindromic extensions invalid on both
/// endpoints. Decisions use the raw extension count of each side, so the
/// outcome does not depend on the order workers run in.
pub fn exclude_ambiguous_extensions(graph: &DeBruijnGraph) -> AmbiguityReport {
    let k = graph.kmer_length();
    let ambiguous_sides = AtomicUsize::new(0);
    let self_loops = AtomicUsize::new(0);
    let palindromes = AtomicUsize::new(0);

    graph
        .nodes()
        .par_iter()
        .enumerate()
        .for_each(|(id, node)| {
            let is_palindrome = node.is_palindrome(k);
            if is_palindrome {
                palindromes.fetch_add(1, Ordering::Relaxed);
            }

            for side in [Side::Left, Side::Right] {
                let extensions = node.extensions(side);
                if is_palindrome || extensions.len() > 1 {
                    if !extensions.is_empty() {
                        ambiguous_sides.fetch_add(1, Ordering::Relaxed);
                    }
                    invalidate_side(graph, id, node, side);
                } else if extensions.len() == 1 && extensions[0].target() == id {
                    extensions[0].mark_invalid();
                    self_loops.fetch_add(1, Ordering::Relaxed);
                }
            }
        });

    let report = AmbiguityReport {
        ambiguous_sides: ambiguous_sides.into_inner(),
        self_loops: self_loops.into_inner(),
        palindromes: palindromes.into_inner(),
    };
    debug!(
        "Ambiguity exclusion: {} ambiguous sides, {} self-loops, {} palindromes",
        report.ambiguous_sides, report.self_loops, report.palindromes
    );
    report
}

/// Invalidate every extension on `side` together with its reciprocal on the
/// neighbour.
fn invalidate_side(graph: &DeBruijnGraph, id: NodeId, node: &GraphNode, side: Side) {
    for ext in node.extensions(side) {
        ext.mark_invalid();

        // a same-orientation neighbour sees us on its opposite side,
        // an opposite-orientation neighbour on the same side
        let reciprocal = if ext.is_same_orientation() {
            side.opposite()
        } else {
            side
        };
        graph.node(ext.target()).mark_side_extension_invalid(
            reciprocal,
            id,
            ext.is_same_orientation(),
        );
    }
}
