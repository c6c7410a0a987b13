use std::{
    env, io,
    num::NonZeroUsize,
    sync::Arc,
    thread::{self, JoinHandle},
};

use crate::formula::Cnf;
use crate::prelude::*;

use self::{state::SearchState, worker::Worker};

use super::Solver;

mod queue;
mod state;
mod worker;

/// Environment variable overriding the number of worker threads.
pub const WORKERS_ENV: &str = "SPLITSAT_WORKERS";

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("{} must be a positive integer, found '{}'", WORKERS_ENV, value))]
    InvalidWorkers {
        value: String,
        source: std::num::ParseIntError,
    },
    #[snafu(display("{} must be at least 1", WORKERS_ENV))]
    ZeroWorkers,
    #[snafu(display("{} is not valid unicode", WORKERS_ENV))]
    NotUnicode,
}

/// Configuration for the parallel solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Number of worker threads.
    pub workers: usize,
}

impl ParallelConfig {
    /// A zero worker count is treated as one.
    pub fn with_workers(workers: usize) -> Self {
        ParallelConfig {
            workers: workers.max(1),
        }
    }

    /// Reads the worker count from `SPLITSAT_WORKERS`, falling back to
    /// [`ParallelConfig::default`] when it is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var(WORKERS_ENV) {
            Ok(value) => {
                let workers = value
                    .trim()
                    .parse::<usize>()
                    .context(InvalidWorkers { value })?;
                ensure!(workers > 0, ZeroWorkers);
                Ok(ParallelConfig { workers })
            }
            Err(env::VarError::NotPresent) => Ok(ParallelConfig::default()),
            Err(env::VarError::NotUnicode(_)) => NotUnicode.fail(),
        }
    }

    /// Deepest level at which tasks are still split into child tasks.
    pub fn max_depth(&self) -> usize {
        max_depth(self.workers)
    }

    /// Room for every task the decomposition can create, so pushing
    /// never blocks.
    pub fn queue_capacity(&self) -> usize {
        1 << (self.max_depth() + 1)
    }
}

impl Default for ParallelConfig {
    /// One worker per available processing unit.
    fn default() -> Self {
        let workers = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        ParallelConfig { workers }
    }
}

/// Smallest `d` such that `2^d >= workers`.
pub fn max_depth(workers: usize) -> usize {
    workers.max(1).next_power_of_two().trailing_zeros() as usize
}

/// Starts `count` workers on `state` through `spawn`.
///
/// If a spawn fails, the search is aborted and the workers started so far
/// are joined before the error is returned.
fn spawn_workers<F>(
    state: &Arc<SearchState>,
    count: usize,
    max_depth: usize,
    mut spawn: F,
) -> io::Result<Vec<JoinHandle<()>>>
where
    F: FnMut(usize, Worker) -> io::Result<JoinHandle<()>>,
{
    let mut handles = Vec::with_capacity(count);

    for id in 0..count {
        let worker = Worker::new(id, Arc::clone(state), max_depth);
        match spawn(id, worker) {
            Ok(handle) => handles.push(handle),
            Err(error) => {
                error!("Failed to spawn worker {}: {}", id, error);
                state.abort();
                for handle in handles {
                    let _ = handle.join();
                }
                return Err(error);
            }
        }
    }

    Ok(handles)
}

/// DPLL search split into independent tasks over a pool of threads.
///
/// Tasks shallower than [`ParallelConfig::max_depth`] are split on their
/// branching variable into two child tasks; deeper ones are decided by
/// [`DpllSolver`](super::DpllSolver) on the worker that picked them up.
#[derive(Debug)]
pub struct ParallelSolver {
    formula: Cnf,
    config: ParallelConfig,
}

impl ParallelSolver {
    pub fn with_config(formula: Cnf, config: ParallelConfig) -> Self {
        ParallelSolver {
            formula,
            config: ParallelConfig::with_workers(config.workers),
        }
    }
}

impl Solver for ParallelSolver {
    fn new(formula: Cnf) -> Self {
        ParallelSolver::with_config(formula, ParallelConfig::default())
    }

    fn solve(self) -> bool {
        let max_depth = self.config.max_depth();
        let queue_capacity = self.config.queue_capacity();
        info!(
            "Starting {} workers, split depth {}, queue capacity {}",
            self.config.workers, max_depth, queue_capacity
        );

        let state = Arc::new(SearchState::new(self.formula, queue_capacity));

        let workers = spawn_workers(&state, self.config.workers, max_depth, |id, worker| {
            thread::Builder::new()
                .name(format!("splitsat-worker-{}", id))
                .spawn(move || worker.run())
        })
        .expect("Failed to spawn worker thread");

        for handle in workers {
            handle.join().expect("Worker thread panicked");
        }

        state
            .verdict()
            .expect("all workers exited without delivering a verdict")
    }
}
