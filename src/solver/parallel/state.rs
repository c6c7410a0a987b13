//! Coordination state shared by the workers of one parallel search.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::formula::Cnf;

use super::queue::TaskQueue;

/// A subtree of the search, rooted at `formula`.
#[derive(Debug)]
pub struct Task {
    pub formula: Cnf,
    /// Number of decomposition levels between the root and this task.
    pub depth: usize,
}

impl Task {
    pub fn root(formula: Cnf) -> Self {
        Task { formula, depth: 0 }
    }

    pub fn child(&self, formula: Cnf) -> Self {
        Task {
            formula,
            depth: self.depth + 1,
        }
    }
}

/// Queue, counters and flags of a single `ParallelSolver::solve` call.
///
/// `outstanding` counts tasks that were created and not yet resolved. It
/// starts at one for the root task and only reaches zero once every branch
/// has been refuted.
#[derive(Debug)]
pub struct SearchState {
    queue: TaskQueue<Task>,
    outstanding: AtomicUsize,
    found: AtomicBool,
    delivered: AtomicBool,
    verdict: AtomicBool,
}

impl SearchState {
    /// Creates the state and enqueues the root task.
    pub fn new(formula: Cnf, queue_capacity: usize) -> Self {
        let state = SearchState {
            queue: TaskQueue::new(queue_capacity),
            outstanding: AtomicUsize::new(1),
            found: AtomicBool::new(false),
            delivered: AtomicBool::new(false),
            verdict: AtomicBool::new(false),
        };

        // Capacity is positive and nobody can have closed the queue yet.
        state
            .queue
            .push(Task::root(formula))
            .expect("fresh task queue rejected the root task");

        state
    }

    /// Blocks until a task is available. `None` means the search is over.
    pub fn next_task(&self) -> Option<Task> {
        self.queue.pop()
    }

    /// Whether some worker has already found a satisfying branch.
    pub fn found(&self) -> bool {
        self.found.load(Ordering::SeqCst)
    }

    /// Accounts for `task` and then makes it visible to the other workers.
    pub fn spawn(&self, task: Task) {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        trace!(
            "Queueing task at depth {} ({} queued, {} outstanding)",
            task.depth,
            self.queue.len(),
            self.outstanding()
        );

        if let Err(task) = self.queue.push(task) {
            // Only happens once a verdict is out; nobody waits on the count.
            trace!("Dropping task at depth {}, search is over", task.depth);
        }
    }

    /// Records a satisfying branch. Only the first call delivers.
    pub fn announce_satisfied(&self) {
        if self
            .found
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.deliver(true);
        }
    }

    /// Marks one task as fully explored.
    ///
    /// The worker resolving the last outstanding task delivers
    /// unsatisfiability, unless a success has been recorded.
    pub fn resolve(&self) {
        let previous = self.outstanding.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "resolved more tasks than were created");

        if previous == 1 && !self.found() {
            self.deliver(false);
        }
    }

    fn deliver(&self, verdict: bool) {
        if self
            .delivered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.verdict.store(verdict, Ordering::SeqCst);
            info!("Verdict: {}", if verdict { "SAT" } else { "UNSAT" });

            self.queue.close();
        }
    }

    /// Ends the search without a verdict, releasing every blocked worker.
    pub fn abort(&self) {
        warn!("Aborting search with {} outstanding tasks", self.outstanding());
        self.queue.close();
    }

    /// The delivered verdict, if any.
    pub fn verdict(&self) -> Option<bool> {
        if self.delivered.load(Ordering::SeqCst) {
            Some(self.verdict.load(Ordering::SeqCst))
        } else {
            None
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{Clause, Literal};

    fn unit(raw: i32) -> Cnf {
        Cnf::from_clauses(vec![Clause::new(vec![Literal::from_dimacs(raw).unwrap()])])
    }

    #[test]
    fn last_resolve_delivers_unsat() {
        let state = SearchState::new(unit(1), 4);
        let root = state.next_task().unwrap();

        state.spawn(root.child(unit(2)));
        state.spawn(root.child(unit(3)));
        state.resolve();
        assert_eq!(state.outstanding(), 2);
        assert_eq!(state.verdict(), None);

        state.next_task().unwrap();
        state.resolve();
        assert_eq!(state.verdict(), None);

        state.next_task().unwrap();
        state.resolve();
        assert_eq!(state.outstanding(), 0);
        assert_eq!(state.verdict(), Some(false));
        assert_eq!(state.next_task().map(|task| task.depth), None);
    }

    #[test]
    fn success_is_delivered_once_and_wins_over_exhaustion() {
        let state = SearchState::new(unit(1), 4);
        state.next_task().unwrap();

        state.announce_satisfied();
        state.announce_satisfied();
        assert!(state.found());
        assert_eq!(state.verdict(), Some(true));

        state.resolve();
        assert_eq!(state.verdict(), Some(true));
    }

    #[test]
    fn spawn_after_verdict_keeps_queue_closed() {
        let state = SearchState::new(unit(1), 4);
        let root = state.next_task().unwrap();
        state.announce_satisfied();

        state.spawn(root.child(unit(2)));
        assert_eq!(state.next_task().map(|task| task.depth), None);
    }
}
