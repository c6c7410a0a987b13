use std::sync::Arc;

use crate::formula::Status;
use crate::solver::{DpllSolver, Solver};

use super::state::{SearchState, Task};

/// One thread of the pool: drains tasks until the queue closes.
pub struct Worker {
    id: usize,
    state: Arc<SearchState>,
    max_depth: usize,
}

impl Worker {
    pub fn new(id: usize, state: Arc<SearchState>, max_depth: usize) -> Self {
        Worker {
            id,
            state,
            max_depth,
        }
    }

    pub fn run(self) {
        let mut processed = 0usize;

        while let Some(task) = self.state.next_task() {
            processed += 1;

            if self.state.found() {
                // draining after a success
                self.state.resolve();
                continue;
            }

            self.process(task);
        }

        trace!("Worker {} exiting after {} tasks", self.id, processed);
    }

    fn process(&self, task: Task) {
        let variable = match task.formula.status() {
            Status::Satisfied => {
                debug!("Worker {} found a satisfied task at depth {}", self.id, task.depth);
                self.state.announce_satisfied();
                self.state.resolve();
                return;
            }
            Status::Conflict => {
                trace!("Worker {} refuted a task at depth {}", self.id, task.depth);
                self.state.resolve();
                return;
            }
            Status::Branch(variable) => variable,
        };

        for &value in &[true, false] {
            if self.state.found() {
                break;
            }

            let child = task.formula.simplify(variable, value);

            if task.depth < self.max_depth {
                trace!(
                    "Worker {} splits on {}={} at depth {}",
                    self.id,
                    variable,
                    value,
                    task.depth
                );
                self.state.spawn(task.child(child));
            } else if DpllSolver::new(child).solve() {
                debug!(
                    "Worker {} found a satisfying branch {}={} below depth {}",
                    self.id, variable, value, task.depth
                );
                self.state.announce_satisfied();
                break;
            }
        }

        // exactly once per task, whichever way the loop ended
        self.state.resolve();
    }
}
