use crate::formula::Cnf;

mod dpll;
mod parallel;

pub use dpll::DpllSolver;
pub use parallel::{max_depth, ConfigError, ParallelConfig, ParallelSolver, WORKERS_ENV};

pub trait Solver {
    /// Creates a new solver instance.
    fn new(formula: Cnf) -> Self;

    /// Solves a CNF SAT problem with the solver.
    /// Returns `true` if satisfiable, `false` otherwise.
    fn solve(self) -> bool;
}

/// Decides `formula` with the sequential DPLL search.
pub fn solve(formula: &Cnf) -> bool {
    DpllSolver::new(formula.clone()).solve()
}

/// Decides `formula` by splitting the search over `workers` threads.
///
/// All worker threads have exited by the time this returns.
pub fn parallel_solve(formula: &Cnf, workers: usize) -> bool {
    ParallelSolver::with_config(formula.clone(), ParallelConfig::with_workers(workers)).solve()
}
