/*!
A module to represent conjunctive normal form formula.
*/

use std::{
    convert::TryFrom,
    fmt::Display,
    num::{NonZeroI32, NonZeroU32},
    str::FromStr,
};

use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum LiteralParseError {
    #[snafu(display("Failed to parse literal"))]
    InvalidNumber { source: std::num::ParseIntError },
    #[snafu(display("Literal must be non-zero"))]
    ZeroLiteral,
    #[snafu(display(
        "Variable ID {} is out of range (must be within 1 to {})",
        num,
        Variable::MAX_VARIABLE_ID
    ))]
    RangeError { num: i64 },
}

/// Newtype wrapper for variable ID.
/// Invariant: 0 < ID <= MAX_VARIABLE_ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(NonZeroU32);

impl Variable {
    /// Every variable needs a negative literal, so IDs stop at `i32::MAX`.
    pub const MAX_VARIABLE_ID: usize = i32::MAX as usize;

    /// Creates a variable from its 1-based DIMACS ID.
    pub fn new(id: u32) -> Option<Self> {
        if id as usize > Variable::MAX_VARIABLE_ID {
            return None;
        }
        NonZeroU32::new(id).map(Variable)
    }

    pub fn id(&self) -> u32 {
        self.0.get()
    }

    pub fn as_index(&self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Signed variable reference. The sign is the polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Literal(NonZeroI32);

impl Literal {
    pub fn new(variable: Variable, positive: bool) -> Self {
        // `Variable` never exceeds `i32::MAX`, so neither conversion can fail.
        let id = variable.id() as i32;
        let raw = if positive { id } else { -id };
        Literal(NonZeroI32::new(raw).unwrap())
    }

    /// Creates a literal from a DIMACS integer.
    /// Returns `None` for zero and for `i32::MIN`, which has no variable.
    pub fn from_dimacs(raw: i32) -> Option<Self> {
        if raw == i32::MIN {
            return None;
        }
        NonZeroI32::new(raw).map(Literal)
    }

    pub fn to_dimacs(&self) -> i32 {
        self.0.get()
    }

    pub fn variable(&self) -> Variable {
        Variable(NonZeroU32::new(self.0.get().unsigned_abs()).unwrap())
    }

    pub fn positive(&self) -> bool {
        self.0.get() > 0
    }
}

impl FromStr for Literal {
    type Err = LiteralParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let num = s.parse::<i64>().context(InvalidNumber)?;
        ensure!(num != 0, ZeroLiteral);

        let raw = i32::try_from(num).ok().context(RangeError { num })?;
        Literal::from_dimacs(raw).context(RangeError { num })
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            if self.positive() { "" } else { "¬" },
            self.variable()
        )
    }
}

impl std::ops::Not for Literal {
    type Output = Literal;

    fn not(self) -> Self::Output {
        Literal(-self.0)
    }
}

/// Disjunction of literals. An empty clause can never be satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new(literals: Vec<Literal>) -> Self {
        Self { literals }
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn first(&self) -> Option<Literal> {
        self.literals.first().copied()
    }

    pub fn contains(&self, literal: Literal) -> bool {
        self.literals.contains(&literal)
    }

    pub fn iter(&self) -> impl Iterator<Item = Literal> + '_ {
        self.literals.iter().copied()
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;

        let mut iter = self.literals.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for literal in iter {
            write!(f, " ∨ {}", literal)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

/// Where a DPLL search stands on a formula, checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No clauses are left.
    Satisfied,
    /// Some clause has become empty.
    Conflict,
    /// Search must continue by branching on this variable.
    Branch(Variable),
}

/// Formula representation in Conjunctive Normal Form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cnf {
    num_variables: usize,
    clauses: Vec<Clause>,
}

impl Cnf {
    pub fn new(num_variables: usize) -> Self {
        assert!(num_variables <= Variable::MAX_VARIABLE_ID);

        Cnf {
            num_variables,
            clauses: Vec::new(),
        }
    }

    /// Builds a formula from clauses, declaring every variable they mention.
    pub fn from_clauses(clauses: Vec<Clause>) -> Self {
        let num_variables = clauses
            .iter()
            .flat_map(|clause| clause.iter())
            .map(|literal| literal.variable().id() as usize)
            .max()
            .unwrap_or(0);

        Cnf {
            num_variables,
            clauses,
        }
    }

    /// Number of variables declared by the problem line.
    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn clauses(&self) -> &Vec<Clause> {
        &self.clauses
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn add_clause(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    /// Classifies the formula for the next DPLL step.
    ///
    /// The branching variable is always the variable of the first literal
    /// of the first clause, so sequential and parallel searches visit
    /// branches in the same order.
    pub fn status(&self) -> Status {
        match self.clauses.first() {
            None => Status::Satisfied,
            Some(_) if self.clauses.iter().any(Clause::is_empty) => Status::Conflict,
            Some(first) => Status::Branch(first.first().unwrap().variable()),
        }
    }

    /// Returns the formula left after assigning `value` to `variable`.
    ///
    /// Clauses satisfied by the assignment are dropped, and the falsified
    /// literal is removed from the rest. Clause and literal order is kept.
    pub fn simplify(&self, variable: Variable, value: bool) -> Cnf {
        let satisfied = Literal::new(variable, value);
        let falsified = !satisfied;

        let clauses = self
            .clauses
            .iter()
            .filter(|clause| !clause.contains(satisfied))
            .map(|clause| Clause::new(clause.iter().filter(|&lit| lit != falsified).collect()))
            .collect();

        Cnf {
            num_variables: self.num_variables,
            clauses,
        }
    }
}

impl Display for Cnf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CNF with {} variables (", self.num_variables)?;

        let mut iter = self.clauses.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for clause in iter {
            write!(f, " ∧ {}", clause)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cnf(clauses: &[&[i32]]) -> Cnf {
        Cnf::from_clauses(
            clauses
                .iter()
                .map(|clause| {
                    Clause::new(
                        clause
                            .iter()
                            .map(|&raw| Literal::from_dimacs(raw).unwrap())
                            .collect(),
                    )
                })
                .collect(),
        )
    }

    fn var(id: u32) -> Variable {
        Variable::new(id).unwrap()
    }

    #[test]
    fn literal_parsing() {
        let literal: Literal = "-3".parse().unwrap();
        assert_eq!(literal.variable(), var(3));
        assert!(!literal.positive());
        assert_eq!((!literal).to_dimacs(), 3);

        assert!(matches!(
            "0".parse::<Literal>(),
            Err(LiteralParseError::ZeroLiteral)
        ));
        assert!(matches!(
            "abc".parse::<Literal>(),
            Err(LiteralParseError::InvalidNumber { .. })
        ));
        assert!(matches!(
            "-2147483648".parse::<Literal>(),
            Err(LiteralParseError::RangeError { .. })
        ));
        assert!(matches!(
            "4294967296".parse::<Literal>(),
            Err(LiteralParseError::RangeError { .. })
        ));
    }

    #[test]
    fn status_is_checked_in_order() {
        assert_eq!(cnf(&[]).status(), Status::Satisfied);
        assert_eq!(cnf(&[&[]]).status(), Status::Conflict);
        assert_eq!(cnf(&[&[1], &[2], &[]]).status(), Status::Conflict);
        assert_eq!(cnf(&[&[-4, 1], &[2]]).status(), Status::Branch(var(4)));
    }

    #[test]
    fn simplify_drops_satisfied_and_strips_falsified() {
        let formula = cnf(&[&[1, -2], &[2], &[3, 2, -1], &[-2, 3]]);

        let positive = formula.simplify(var(2), true);
        assert_eq!(positive.clauses(), cnf(&[&[1], &[3]]).clauses());

        let negative = formula.simplify(var(2), false);
        assert_eq!(negative.clauses(), cnf(&[&[], &[3, -1]]).clauses());

        // the input is left untouched
        assert_eq!(formula.num_clauses(), 4);
        assert_eq!(positive.num_variables(), formula.num_variables());
    }

    #[test]
    fn simplify_is_idempotent() {
        let formula = cnf(&[&[1, -2, 3], &[-1, 2], &[-3], &[2, 3]]);
        for id in 1..=4 {
            for &value in &[true, false] {
                let once = formula.simplify(var(id), value);
                let twice = once.simplify(var(id), value);
                assert_eq!(once, twice);
                assert!(once.num_clauses() <= formula.num_clauses());
            }
        }
    }

    #[test]
    fn display() {
        let formula = cnf(&[&[1, -2], &[2]]);
        assert_eq!(formula.to_string(), "CNF with 2 variables ((x1 ∨ ¬x2) ∧ (x2))");
    }
}
