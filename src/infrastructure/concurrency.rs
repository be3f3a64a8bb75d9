/// Concurrency management for LegacyGraph.
/// Configures the rayon pool used for multi-file extraction.

use anyhow::Result;
use tracing::info;

/// Worker count for a machine with `cores` cores: half of them, at least one.
pub fn worker_count(cores: usize) -> usize {
    std::cmp::max(1, cores / 2)
}

/// Initialize the global rayon thread pool with controlled worker count.
/// Reserves ~50% of CPU capacity for the process driving the analysis.
pub fn init_thread_pool() -> Result<()> {
    let cores = num_cpus::get();
    let workers = worker_count(cores);

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()?;

    info!(workers, cores, "initialized extraction thread pool");

    Ok(())
}
