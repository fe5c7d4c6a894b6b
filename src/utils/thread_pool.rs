//! Rayon pool sized from configuration

use anyhow::{anyhow, Result};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

/// Dedicated pool with `threads` workers named `contig-forge-<n>`
pub fn build_pool(threads: usize) -> Result<ThreadPool> {
    if threads == 0 {
        return Err(anyhow!("Thread pool needs at least one worker"));
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("contig-forge-{i}"))
        .build()
        .map_err(|e| anyhow!("Failed to build thread pool: {}", e))?;

    debug!("Thread pool ready with {} workers", threads);
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_runs_with_requested_workers() {
        let pool = build_pool(2).unwrap();
        assert_eq!(pool.current_num_threads(), 2);
        assert_eq!(pool.install(rayon::current_num_threads), 2);
        assert!(build_pool(0).is_err());
    }
}
