/// Worker pool setup for tree transforms.

use anyhow::Result;

/// Number of workers used when none is requested: half the cores, at least one.
pub fn default_workers() -> usize {
    std::cmp::max(1, num_cpus::get() / 2)
}

/// Initialize the global rayon thread pool.
///
/// Fails if the global pool was already built.
pub fn init_thread_pool(jobs: Option<usize>) -> Result<usize> {
    let workers = jobs.filter(|&n| n > 0).unwrap_or_else(default_workers);

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()?;

    tracing::debug!(
        "initialized thread pool: {} workers (system has {} cores)",
        workers,
        num_cpus::get()
    );

    Ok(workers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_workers_is_positive() {
        assert!(default_workers() >= 1);
    }
}
