//! De Bruijn Graph
//! ===============
//!
//! Node store consumed by the contig builder. Each node is a canonical k-mer
//! with a depth count and up to four extensions per side. An extension records
//! whether the neighbour overlaps the node's stored orientation directly
//! (`same_orientation`) or through its reverse complement.
//!
//! Validity, deletion and visit markers are atomics so that the parallel
//! ambiguity and tracing passes can share `&DeBruijnGraph` across workers.
//! Every writer of a marker stores the same value, so relaxed ordering is
//! sufficient.

use crate::assembly::error::AssemblyError;
use crate::core::data_structures::Sequence;
use crate::core::kmer::{kmer_mask, KmerValue, PackedKmers, MAX_KMER_LENGTH};
use ahash::AHashMap;
use anyhow::Result;
use dashmap::DashMap;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Index of a node in the graph's node array
pub type NodeId = usize;

/// Depth counts saturate at this value
pub const MAX_DEPTH: u8 = u8::MAX;

/// Side of a node an extension hangs off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Side that continues a walk heading `forward` through a node met in
    /// `same_orientation`
    pub fn of_walk(forward: bool, same_orientation: bool) -> Side {
        if forward ^ same_orientation {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// Directed link to a neighbouring node
#[derive(Debug)]
pub struct Extension {
    target: NodeId,
    same_orientation: bool,
    invalid: AtomicBool,
}

impl Extension {
    pub fn new(target: NodeId, same_orientation: bool) -> Self {
        Self {
            target,
            same_orientation,
            invalid: AtomicBool::new(false),
        }
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn is_same_orientation(&self) -> bool {
        self.same_orientation
    }

    pub fn is_valid(&self) -> bool {
        !self.invalid.load(Ordering::Relaxed)
    }

    pub fn mark_invalid(&self) {
        self.invalid.store(true, Ordering::Relaxed);
    }

    fn clear_invalid(&self) {
        self.invalid.store(false, Ordering::Relaxed);
    }
}

/// Graph vertex for one canonical k-mer
#[derive(Debug)]
pub struct GraphNode {
    value: KmerValue,
    depth: u8,
    left: Vec<Extension>,
    right: Vec<Extension>,
    marked_for_delete: AtomicBool,
    visited: AtomicBool,
}

impl GraphNode {
    pub fn new(value: KmerValue, depth: u8) -> Self {
        Self {
            value,
            depth,
            left: Vec::new(),
            right: Vec::new(),
            marked_for_delete: AtomicBool::new(false),
            visited: AtomicBool::new(false),
        }
    }

    pub fn value(&self) -> KmerValue {
        self.value
    }

    /// Number of read occurrences of this k-mer (saturating)
    pub fn depth(&self) -> u32 {
        u32::from(self.depth)
    }

    pub fn add_extension(&mut self, side: Side, target: NodeId, same_orientation: bool) {
        self.side_mut(side).push(Extension::new(target, same_orientation));
    }

    /// All extensions on a side, including invalidated ones
    pub fn extensions(&self, side: Side) -> &[Extension] {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut Vec<Extension> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    pub fn valid_extensions(&self, side: Side) -> impl Iterator<Item = &Extension> {
        self.extensions(side).iter().filter(|e| e.is_valid())
    }

    pub fn valid_extension_count(&self, side: Side) -> usize {
        self.valid_extensions(side).count()
    }

    /// Invalidate every extension on `side` that points at `target` with the
    /// given orientation. Returns whether any matched.
    pub fn mark_side_extension_invalid(
        &self,
        side: Side,
        target: NodeId,
        same_orientation: bool,
    ) -> bool {
        let mut found = false;
        for ext in self.extensions(side) {
            if ext.target == target && ext.same_orientation == same_orientation {
                ext.mark_invalid();
                found = true;
            }
        }
        found
    }

    /// Invalidate the extensions pointing at `target`, looking on the right
    /// side first and falling back to the left.
    pub fn mark_extension_invalid(&self, target: NodeId) -> bool {
        for side in [Side::Right, Side::Left] {
            let mut found = false;
            for ext in self.extensions(side).iter().filter(|e| e.target == target) {
                ext.mark_invalid();
                found = true;
            }
            if found {
                return true;
            }
        }
        false
    }

    /// Permanently drop invalidated extensions
    pub fn purge_invalid_extensions(&mut self) {
        self.left.retain(Extension::is_valid);
        self.right.retain(Extension::is_valid);
    }

    pub fn mark_for_delete(&self) {
        self.marked_for_delete.store(true, Ordering::Relaxed);
    }

    pub fn is_marked_for_delete(&self) -> bool {
        self.marked_for_delete.load(Ordering::Relaxed)
    }

    pub fn mark_visited(&self) {
        self.visited.store(true, Ordering::Relaxed);
    }

    pub fn is_visited(&self) -> bool {
        self.visited.load(Ordering::Relaxed)
    }

    fn set_visited(&self, state: bool) {
        self.visited.store(state, Ordering::Relaxed);
    }

    pub fn is_palindrome(&self, kmer_length: usize) -> bool {
        self.value.is_palindrome(kmer_length)
    }
}

/// Canonical de Bruijn graph over a read set
#[derive(Debug)]
pub struct DeBruijnGraph {
    kmer_length: usize,
    nodes: Vec<GraphNode>,
    index: AHashMap<KmerValue, NodeId>,
    processed_sequences: usize,
    skipped_sequences: usize,
}

impl DeBruijnGraph {
    /// Empty graph for hand-assembled node sets
    pub fn new(kmer_length: usize) -> Result<Self> {
        check_kmer_length(kmer_length)?;
        Ok(Self {
            kmer_length,
            nodes: Vec::new(),
            index: AHashMap::new(),
            processed_sequences: 0,
            skipped_sequences: 0,
        })
    }

    /// Build the graph from reads: count canonical k-mers, then link every
    /// pair of nodes overlapping by `k - 1` symbols.
    ///
    /// Reads with symbols outside `ACGT` are skipped.
    pub fn build(reads: &[Sequence], kmer_length: usize) -> Result<Self> {
        check_kmer_length(kmer_length)?;
        let k = kmer_length;

        let counts: DashMap<u64, u32, ahash::RandomState> =
            DashMap::with_hasher(ahash::RandomState::new());

        let skipped = reads
            .par_iter()
            .filter(|read| {
                if !read.is_unambiguous_dna() {
                    return true;
                }
                for (_, bits) in PackedKmers::new(read.as_bytes(), k) {
                    let (canonical, _) = KmerValue::canonical(bits, k);
                    *counts.entry(canonical.bits()).or_insert(0) += 1;
                }
                false
            })
            .count();

        if skipped > 0 {
            warn!("Skipped {} reads containing non-ACGT symbols", skipped);
        }

        let mut values: Vec<(u64, u32)> = counts.into_iter().collect();
        values.sort_unstable_by_key(|&(bits, _)| bits);

        let nodes: Vec<GraphNode> = values
            .into_iter()
            .map(|(bits, count)| {
                let depth = count.min(u32::from(MAX_DEPTH)) as u8;
                GraphNode::new(KmerValue::from_bits(bits), depth)
            })
            .collect();

        let mut graph = Self {
            kmer_length: k,
            index: AHashMap::with_capacity(nodes.len()),
            nodes,
            processed_sequences: reads.len(),
            skipped_sequences: skipped,
        };
        graph.rebuild_index();
        graph.generate_links();

        info!(
            "🔗 Built de Bruijn graph: {} nodes from {} reads (k={})",
            graph.nodes.len(),
            reads.len() - skipped,
            k
        );

        Ok(graph)
    }

    /// Add a node by hand. Returns its id, or the existing id if the k-mer is
    /// already present.
    pub fn add_node(&mut self, value: KmerValue, depth: u8) -> NodeId {
        if let Some(&id) = self.index.get(&value) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(GraphNode::new(value, depth));
        self.index.insert(value, id);
        id
    }

    /// Add a one-sided link by hand. `validate` reports dangling targets.
    pub fn add_extension(
        &mut self,
        from: NodeId,
        side: Side,
        target: NodeId,
        same_orientation: bool,
    ) -> Result<()> {
        let node_count = self.nodes.len();
        let node = self
            .nodes
            .get_mut(from)
            .ok_or(AssemblyError::MalformedGraph {
                node: from,
                reason: format!("no such node (graph has {})", node_count),
            })?;
        node.add_extension(side, target, same_orientation);
        Ok(())
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (id, node) in self.nodes.iter().enumerate() {
            self.index.insert(node.value, id);
        }
    }

    fn generate_links(&mut self) {
        let k = self.kmer_length;
        let shift = 2 * (k - 1);
        let right_mask = !(0b11u64 << shift) & kmer_mask(k);
        let index = &self.index;

        let links: Vec<(Vec<Extension>, Vec<Extension>)> = self
            .nodes
            .par_iter()
            .map(|node| {
                let bits = node.value.bits();

                // drop the first symbol, append each candidate on the right
                let suffix = (bits & right_mask) << 2;
                let right = (0..4u64)
                    .filter_map(|b| {
                        let (candidate, same) = KmerValue::canonical(suffix | b, k);
                        index.get(&candidate).map(|&id| Extension::new(id, same))
                    })
                    .collect();

                // drop the last symbol, prepend each candidate on the left
                let prefix = bits >> 2;
                let left = (0..4u64)
                    .filter_map(|b| {
                        let (candidate, same) = KmerValue::canonical((b << shift) | prefix, k);
                        index.get(&candidate).map(|&id| Extension::new(id, same))
                    })
                    .collect();

                (left, right)
            })
            .collect();

        for (node, (left, right)) in self.nodes.iter_mut().zip(links) {
            node.left = left;
            node.right = right;
        }
    }

    /// Structural check: k-mer length in range, node values fit in `2k` bits,
    /// every extension target exists.
    pub fn validate(&self) -> Result<(), AssemblyError> {
        if self.kmer_length == 0 || self.kmer_length > MAX_KMER_LENGTH {
            return Err(AssemblyError::InvalidKmerLength {
                k: self.kmer_length,
                max: MAX_KMER_LENGTH,
            });
        }

        let mask = kmer_mask(self.kmer_length);
        for (id, node) in self.nodes.iter().enumerate() {
            if node.value.bits() & !mask != 0 {
                return Err(AssemblyError::MalformedGraph {
                    node: id,
                    reason: format!("value {} exceeds k={}", node.value, self.kmer_length),
                });
            }
            for side in [Side::Left, Side::Right] {
                if let Some(ext) = node
                    .extensions(side)
                    .iter()
                    .find(|e| e.target >= self.nodes.len())
                {
                    return Err(AssemblyError::MalformedGraph {
                        node: id,
                        reason: format!("{:?} extension targets missing node {}", side, ext.target),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn kmer_length(&self) -> usize {
        self.kmer_length
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &GraphNode {
        &self.nodes[id]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn processed_sequences(&self) -> usize {
        self.processed_sequences
    }

    pub fn skipped_sequences(&self) -> usize {
        self.skipped_sequences
    }

    /// Node holding `kmer` in either orientation
    pub fn find(&self, kmer: &[u8]) -> Option<NodeId> {
        if kmer.len() != self.kmer_length {
            return None;
        }
        let (value, _) = KmerValue::from_sequence(kmer).ok()?;
        self.index.get(&value).copied()
    }

    /// Symbols of the node's stored orientation
    pub fn sequence_of(&self, id: NodeId) -> Vec<u8> {
        self.nodes[id].value.symbols(self.kmer_length)
    }

    /// Symbol a node contributes when a walk reaches it: the last symbol when
    /// walking forward, the first when walking backward, read from the
    /// reverse complement when the node is met in opposite orientation.
    pub fn next_symbol_from(&self, id: NodeId, forward: bool, same_orientation: bool) -> u8 {
        let value = self.nodes[id].value;
        if forward {
            value.last_symbol(self.kmer_length, same_orientation)
        } else {
            value.first_symbol(self.kmer_length, same_orientation)
        }
    }

    pub fn set_visit_state(&self, state: bool) {
        self.nodes.par_iter().for_each(|n| n.set_visited(state));
    }

    pub fn unvisited_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.is_visited())
            .map(|(id, _)| id)
    }

    pub fn purge_invalid_extensions(&mut self) {
        self.nodes
            .par_iter_mut()
            .for_each(GraphNode::purge_invalid_extensions);
    }

    /// Restore extensions invalidated by ambiguity resolution, dropping only
    /// links to nodes marked for deletion.
    pub fn undo_ambiguous_extensions(&mut self) {
        let marked: Vec<bool> = self.nodes.iter().map(GraphNode::is_marked_for_delete).collect();
        self.nodes.par_iter_mut().for_each(|node| {
            if !node.is_marked_for_delete() {
                let keep = |e: &Extension| !marked.get(e.target).copied().unwrap_or(true);
                node.left.retain(keep);
                node.right.retain(keep);
            }
            for ext in node.left.iter().chain(node.right.iter()) {
                ext.clear_invalid();
            }
        });
    }

    /// Drop every node marked for deletion, compacting the node array and
    /// re-indexing the surviving extensions. Returns the number removed.
    pub fn remove_marked_nodes(&mut self) -> usize {
        let mut remap: Vec<Option<NodeId>> = Vec::with_capacity(self.nodes.len());
        let mut next = 0;
        for node in &self.nodes {
            if node.is_marked_for_delete() {
                remap.push(None);
            } else {
                remap.push(Some(next));
                next += 1;
            }
        }

        let removed = self.nodes.len() - next;
        if removed == 0 {
            return 0;
        }

        self.nodes.retain(|n| !n.is_marked_for_delete());
        self.nodes.par_iter_mut().for_each(|node| {
            for side in [Side::Left, Side::Right] {
                let exts = std::mem::take(node.side_mut(side));
                *node.side_mut(side) = exts
                    .into_iter()
                    .filter_map(|mut ext| {
                        let target = remap.get(ext.target).copied().flatten()?;
                        ext.target = target;
                        Some(ext)
                    })
                    .collect();
            }
        });
        self.rebuild_index();

        debug!("Removed {} marked nodes, {} remain", removed, self.nodes.len());
        removed
    }
}

fn check_kmer_length(k: usize) -> Result<(), AssemblyError> {
    if k == 0 || k > MAX_KMER_LENGTH {
        return Err(AssemblyError::InvalidKmerLength {
            k,
            max: MAX_KMER_LENGTH,
        });
    }
    Ok(())
}
