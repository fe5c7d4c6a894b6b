//! # ContigForge - Contig Construction and Read Placement
//!
//! Builds contigs from a canonical de Bruijn graph by tracing its unbranched
//! paths, filters low-coverage paths, and aligns the original reads back onto
//! the finished contigs for downstream scaffolding and consensus calling.

pub mod alignment;
pub mod assembly;
pub mod core;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types at crate level
pub use crate::alignment::{align_reads_to_contigs, ReadContigAligner};
pub use crate::assembly::{AssemblyError, DeBruijnGraph, SimplePathContigBuilder};
pub use crate::core::data_structures::*;
pub use crate::pipeline::{AssemblyResult, ContigAssembler};
pub use crate::utils::configuration::AssemblerConfig;

/// Result type used throughout the crate
pub type Result<T> = anyhow::Result<T>;

/// Error type used throughout the crate
pub type Error = anyhow::Error;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_result_type() -> Result<()> {
        let success: Result<i32> = Ok(42);
        let error: Result<i32> = Err(anyhow::anyhow!("test error"));

        assert_eq!(success?, 42);
        assert!(error.unwrap_err().to_string().contains("test error"));
        Ok(())
    }

    #[test]
    fn test_typed_errors_convert_into_crate_error() {
        let error: Error = AssemblyError::InvalidCoverageThreshold(-1.0).into();
        assert!(format!("{error}").contains("-1"));
        assert!(error.downcast_ref::<AssemblyError>().is_some());
    }

    #[test]
    fn test_module_exports() -> Result<()> {
        let reads = vec![Sequence::from_str_with_id("r", "GATTACA")];
        let mut graph = DeBruijnGraph::build(&reads, 7)?;
        let contigs = SimplePathContigBuilder::new().build(&mut graph)?;
        assert_eq!(contigs.len(), 1);

        let aligned = align_reads_to_contigs(&contigs, &reads, 5)?;
        let contig: &Contig = &aligned[0];
        assert_eq!(contig.read_indices(), vec![0]);
        Ok(())
    }
}
