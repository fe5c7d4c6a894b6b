//! Simple Path Tracer
//! ==================
//!
//! Walks unbranched chains of nodes after ambiguity exclusion. Every start
//! node (one valid extension on exactly one side) is traced in parallel;
//! isolated nodes become single k-mer contigs. Closed cycles, which have no
//! start node, are picked up by a sequential pass over unvisited nodes.
//!
//! A linear path is reachable from both of its ends, so it is only emitted by
//! the walk whose first node has the larger k-mer value.

use crate::assembly::graph::{DeBruijnGraph, NodeId, Side};
use ahash::AHashSet;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// What the tracer does with a finished path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceMode {
    /// Collect the consensus sequence of every path
    Sequences,
    /// Mark the nodes of paths whose mean depth is below `threshold`
    Coverage { threshold: f64 },
}

impl TraceMode {
    fn builds_sequences(self) -> bool {
        matches!(self, TraceMode::Sequences)
    }
}

/// Loop-free chain of nodes in walk order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplePath {
    pub nodes: Vec<NodeId>,
    /// Consensus symbols, `None` when tracing for coverage only
    pub sequence: Option<Vec<u8>>,
}

impl SimplePath {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn mean_depth(&self, graph: &DeBruijnGraph) -> f64 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        let total: u64 = self
            .nodes
            .iter()
            .map(|&id| u64::from(graph.node(id).depth()))
            .sum();
        total as f64 / self.nodes.len() as f64
    }
}

pub struct SimplePathTracer<'g> {
    graph: &'g DeBruijnGraph,
    mode: TraceMode,
    contigs: Mutex<Vec<Vec<u8>>>,
}

impl<'g> SimplePathTracer<'g> {
    pub fn new(graph: &'g DeBruijnGraph, mode: TraceMode) -> Self {
        Self {
            graph,
            mode,
            contigs: Mutex::new(Vec::new()),
        }
    }

    /// Trace every simple path of the graph. Returns the collected sequences
    /// (always empty in coverage mode).
    pub fn trace_all(self) -> Vec<Vec<u8>> {
        let graph = self.graph;
        graph.set_visit_state(false);

        (0..graph.node_count())
            .into_par_iter()
            .for_each(|id| self.trace_from(id));

        let mut cycles = 0usize;
        for id in 0..graph.node_count() {
            let node = graph.node(id);
            if node.is_visited() {
                continue;
            }
            let forward = node.valid_extension_count(Side::Right) > 0;
            let path = self.walk(id, forward);
            self.emit(path, false);
            cycles += 1;
        }

        let contigs = self.contigs.into_inner();
        debug!(
            "Traced {} nodes: {} sequences, {} cycles",
            graph.node_count(),
            contigs.len(),
            cycles
        );
        contigs
    }

    fn trace_from(&self, id: NodeId) {
        let node = self.graph.node(id);
        let left = node.valid_extension_count(Side::Left);
        let right = node.valid_extension_count(Side::Right);

        match (left, right) {
            (0, 0) => {
                node.mark_visited();
                match self.mode {
                    TraceMode::Sequences => self.push(self.graph.sequence_of(id)),
                    TraceMode::Coverage { threshold } => {
                        if f64::from(node.depth()) < threshold {
                            node.mark_for_delete();
                        }
                    }
                }
            }
            (1, 0) => {
                let path = self.walk(id, false);
                self.emit(path, true);
            }
            (0, 1) => {
                let path = self.walk(id, true);
                self.emit(path, true);
            }
            _ => {}
        }
    }

    /// Follow the unique valid extension chain from `start`, heading right
    /// when `forward`. Stops at a node without a further extension or before
    /// re-entering a node already on the path.
    pub fn walk(&self, start: NodeId, forward: bool) -> SimplePath {
        let graph = self.graph;
        let build = self.mode.builds_sequences();

        let mut sequence: VecDeque<u8> = if build {
            graph.sequence_of(start).into()
        } else {
            VecDeque::new()
        };
        let mut nodes = vec![start];
        let mut on_path = AHashSet::new();
        on_path.insert(start);

        let start_node = graph.node(start);
        start_node.mark_visited();
        let first_side = if forward { Side::Right } else { Side::Left };

        let mut next = start_node
            .valid_extensions(first_side)
            .next()
            .map(|ext| (ext.target(), ext.is_same_orientation()));

        while let Some((id, same_orientation)) = next {
            let node = graph.node(id);
            node.mark_visited();
            if !on_path.insert(id) {
                trace!("Path from {} closes a loop at {}", start, id);
                break;
            }
            nodes.push(id);

            if build {
                let symbol = graph.next_symbol_from(id, forward, same_orientation);
                if forward {
                    sequence.push_back(symbol);
                } else {
                    sequence.push_front(symbol);
                }
            }

            next = node
                .valid_extensions(Side::of_walk(forward, same_orientation))
                .next()
                .map(|ext| (ext.target(), same_orientation == ext.is_same_orientation()));
        }

        SimplePath {
            nodes,
            sequence: build.then(|| sequence.into()),
        }
    }

    fn emit(&self, path: SimplePath, duplicates_possible: bool) {
        let (Some(&first), Some(&last)) = (path.nodes.first(), path.nodes.last()) else {
            return;
        };
        if duplicates_possible
            && self.graph.node(first).value() < self.graph.node(last).value()
        {
            return;
        }

        match self.mode {
            TraceMode::Sequences => {
                if let Some(sequence) = path.sequence {
                    trace!("Emitting path of {} nodes from {}", path.nodes.len(), first);
                    self.push(sequence);
                }
            }
            TraceMode::Coverage { threshold } => {
                let mean = path.mean_depth(self.graph);
                if mean < threshold {
                    trace!(
                        "Marking {} nodes with mean depth {:.2} below {}",
                        path.nodes.len(),
                        mean,
                        threshold
                    );
                    for &id in &path.nodes {
                        self.graph.node(id).mark_for_delete();
                    }
                }
            }
        }
    }

    fn push(&self, sequence: Vec<u8>) {
        self.contigs.lock().push(sequence);
    }
}
