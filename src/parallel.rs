//! Rayon thread-pool setup
//!
//! Interpolation and pixel fills run on the global pool; its size is fixed
//! once at startup from `--threads`.

use crate::errors::{Result, Ww3VisError};
use rayon::ThreadPoolBuilder;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct ParallelConfig {
    /// None leaves rayon's default (one thread per core)
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Configuration that uses every available core
    pub fn all_cores() -> Self {
        Self {
            num_threads: Some(num_cpus::get()),
        }
    }

    /// Build the global pool. Can only succeed once per process.
    pub fn setup_global_pool(&self) -> Result<()> {
        match self.num_threads {
            Some(0) => Err(Ww3VisError::ThreadPool(
                "thread count must be at least 1".to_string(),
            )),
            Some(num_threads) => {
                ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build_global()
                    .map_err(|e| {
                        Ww3VisError::ThreadPool(format!(
                            "failed to initialize thread pool with {num_threads} threads: {e}"
                        ))
                    })?;
                info!(threads = num_threads, "Configured parallel processing");
                Ok(())
            }
            None => {
                debug!(
                    threads = rayon::current_num_threads(),
                    cores = num_cpus::get(),
                    "Using default thread pool"
                );
                Ok(())
            }
        }
    }

    pub fn current_threads(&self) -> usize {
        rayon::current_num_threads()
    }
}
