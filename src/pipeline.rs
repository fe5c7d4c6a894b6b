//! Assembly Pipeline
//! =================
//!
//! End-to-end driver: choose k → build the graph → drop low-coverage paths →
//! build contigs → place reads back on them. Every stage runs inside the
//! assembler's own rayon pool.

use crate::alignment::read_aligner::ReadContigAligner;
use crate::assembly::contig_builder::SimplePathContigBuilder;
use crate::assembly::error::AssemblyError;
use crate::assembly::graph::DeBruijnGraph;
use crate::assembly::parameters::{estimate_coverage_threshold, estimate_kmer_length};
use crate::core::data_structures::{Contig, ContigStats, Sequence};
use crate::utils::configuration::AssemblerConfig;
use crate::utils::thread_pool::build_pool;
use anyhow::Result;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Output of one assembly run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyResult {
    pub kmer_length: usize,
    pub contigs: Vec<Sequence>,
    /// Contigs with read placements; empty when alignment is disabled
    pub aligned_contigs: Vec<Contig>,
    pub coverage_threshold: Option<f64>,
    pub nodes_removed: usize,
    pub skipped_reads: usize,
    pub stats: ContigStats,
}

pub struct ContigAssembler {
    config: AssemblerConfig,
    builder: SimplePathContigBuilder,
    pool: ThreadPool,
}

impl ContigAssembler {
    pub fn new(config: AssemblerConfig) -> Result<Self> {
        config.validate()?;
        let pool = build_pool(config.thread_count())?;
        Ok(Self {
            config,
            builder: SimplePathContigBuilder::new(),
            pool,
        })
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Assemble contigs from raw reads
    #[instrument(skip_all, fields(reads = reads.len()))]
    pub fn assemble(&self, reads: &[Sequence]) -> Result<AssemblyResult> {
        if reads.is_empty() {
            return Err(AssemblyError::EmptyInput("reads").into());
        }

        self.pool.install(|| {
            info!("🚀 Starting contig assembly");
            info!("   📊 Input: {} reads", reads.len());
            info!("   ⚙️  Threads: {}", self.pool.current_num_threads());

            let k = match self.config.assembly.kmer_length {
                Some(k) => k,
                None => estimate_kmer_length(reads)?,
            };
            info!("   🧬 K-mer length: {}", k);

            let stage = Instant::now();
            let mut graph = DeBruijnGraph::build(reads, k)?;
            debug!("Graph construction took {:.2?}", stage.elapsed());

            self.assemble_graph(&mut graph, reads)
        })
    }

    /// Run the contig and alignment stages on a graph built elsewhere.
    /// `reads` are the reads to place on the contigs.
    #[instrument(skip_all, fields(nodes = graph.node_count()))]
    pub fn assemble_graph(
        &self,
        graph: &mut DeBruijnGraph,
        reads: &[Sequence],
    ) -> Result<AssemblyResult> {
        let k = graph.kmer_length();
        if let Some(requested) = self.config.assembly.kmer_length {
            if requested != k {
                return Err(AssemblyError::InconsistentKmerLength {
                    graph: k,
                    requested,
                }
                .into());
            }
        }

        self.pool.install(|| {
            let start = Instant::now();

            let coverage_threshold = self.coverage_threshold(graph);
            let nodes_removed = match coverage_threshold {
                Some(threshold) => self.builder.remove_low_coverage_contigs(graph, threshold)?,
                None => 0,
            };

            let stage = Instant::now();
            let contigs = self.builder.build(graph)?;
            debug!("Contig construction took {:.2?}", stage.elapsed());

            let aligned_contigs = if self.config.alignment.enabled {
                let aligner =
                    ReadContigAligner::new(self.config.alignment.kmer_length.unwrap_or(k))?;
                aligner.align(&contigs, reads)?
            } else {
                Vec::new()
            };

            let stats = ContigStats::from_sequences(&contigs);
            info!(
                "✅ Assembly complete: {} contigs, {} bp total, largest {} bp, N50 {} in {:.2?}",
                stats.num_contigs,
                stats.total_length,
                stats.largest_contig,
                stats.n50,
                start.elapsed()
            );

            Ok(AssemblyResult {
                kmer_length: k,
                contigs,
                aligned_contigs,
                coverage_threshold,
                nodes_removed,
                skipped_reads: graph.skipped_sequences(),
                stats,
            })
        })
    }

    fn coverage_threshold(&self, graph: &DeBruijnGraph) -> Option<f64> {
        let assembly = &self.config.assembly;
        if !assembly.remove_low_coverage {
            return None;
        }
        match assembly.coverage_threshold {
            Some(threshold) => Some(threshold),
            None if assembly.estimate_coverage_threshold => {
                Some(estimate_coverage_threshold(graph))
            }
            None => None,
        }
    }
}
