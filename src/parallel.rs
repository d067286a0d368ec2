//! Parallel processing configuration and management
//!
//! This module configures Rayon's global thread pool and builds scoped pools
//! for work that should not touch the global one (the per-slice regridding
//! fan-out, tests).

use crate::errors::{Result, RuFeDiagError};
use log::info;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Configuration for parallel processing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParallelConfig {
    /// `None` keeps Rayon's default (one thread per logical core)
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    /// Create a new parallel configuration
    #[must_use]
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Create a configuration that uses a specific number of threads
    #[must_use]
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads),
        }
    }

    /// Create a configuration that uses all available CPU cores
    #[must_use]
    pub fn all_cores() -> Self {
        Self::with_threads(num_cpus::get())
    }

    /// Set up the global Rayon thread pool with the specified configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the thread count is zero or the global pool has
    /// already been initialised.
    pub fn setup_global_pool(&self) -> Result<()> {
        match self.num_threads {
            Some(num_threads) => {
                self.check_threads()?;
                ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build_global()
                    .map_err(|e| {
                        RuFeDiagError::ThreadPoolError(format!(
                            "Failed to initialize thread pool with {num_threads} threads: {e}"
                        ))
                    })?;
                info!("✅ Configured parallel processing with {num_threads} threads");
            }
            None => info!("✅ Using default thread pool configuration"),
        }
        Ok(())
    }

    /// Run `op` inside a pool built from this configuration
    ///
    /// Without an explicit thread count `op` runs on the current pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be built.
    pub fn install<R, F>(&self, op: F) -> Result<R>
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match self.build_pool()? {
            Some(pool) => Ok(pool.install(op)),
            None => Ok(op()),
        }
    }

    /// Get the current number of threads being used
    #[must_use]
    pub fn current_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(rayon::current_num_threads)
    }

    fn build_pool(&self) -> Result<Option<ThreadPool>> {
        let Some(num_threads) = self.num_threads else {
            return Ok(None);
        };
        self.check_threads()?;
        ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map(Some)
            .map_err(|e| {
                RuFeDiagError::ThreadPoolError(format!(
                    "Failed to build a pool with {num_threads} threads: {e}"
                ))
            })
    }

    fn check_threads(&self) -> Result<()> {
        if self.num_threads == Some(0) {
            return Err(RuFeDiagError::ThreadPoolError(
                "Thread count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Get information about the current parallel configuration
#[must_use]
pub fn get_parallel_info() -> ParallelInfo {
    ParallelInfo {
        current_threads: rayon::current_num_threads(),
        available_cores: num_cpus::get(),
        available_parallelism: std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1),
    }
}

/// Information about the parallel processing environment
#[derive(Debug, Clone)]
pub struct ParallelInfo {
    pub current_threads: usize,
    pub available_cores: usize,
    pub available_parallelism: usize,
}

impl ParallelInfo {
    /// Log parallel processing information
    pub fn log_info(&self) {
        info!("📊 Parallel Processing Information:");
        info!("   Current threads: {}", self.current_threads);
        info!("   Available CPU cores: {}", self.available_cores);
        info!("   Available parallelism: {}", self.available_parallelism);
    }
}
