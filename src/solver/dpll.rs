use crate::formula::{Cnf, Status, Variable};

use super::Solver;

/// Plain DPLL without propagation or learning.
///
/// Each branch works on its own simplified copy of the formula. Formulas
/// whose `false` branch is still unexplored are kept on an explicit stack,
/// so search depth is not limited by the thread's stack size.
#[derive(Debug)]
pub struct DpllSolver {
    formula: Cnf,
    /// Parent formulas and the variable still to be tried as `false`.
    pending: Vec<(Cnf, Variable)>,
}

impl DpllSolver {
    /// Moves to the `false` branch of the most recent decision.
    /// Returns `None` once every decision has been exhausted.
    fn backtrack(&mut self) -> Option<Cnf> {
        let (parent, variable) = self.pending.pop()?;
        Some(parent.simplify(variable, false))
    }
}

impl Solver for DpllSolver {
    fn new(formula: Cnf) -> Self {
        DpllSolver {
            formula,
            pending: Vec::new(),
        }
    }

    fn solve(mut self) -> bool {
        let mut current = std::mem::replace(&mut self.formula, Cnf::new(0));

        loop {
            match current.status() {
                Status::Satisfied => return true,
                Status::Conflict => match self.backtrack() {
                    Some(next) => current = next,
                    None => return false,
                },
                Status::Branch(variable) => {
                    // true first, false only after the true subtree fails
                    let next = current.simplify(variable, true);
                    self.pending.push((current, variable));
                    current = next;
                }
            }
        }
    }
}
