/*!
DIMACS CNF reader.
*/

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::formula::{Clause, Cnf, Literal, LiteralParseError, Variable};
use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("I/O error occurred while reading CNF file '{}'", path.display()))]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to parse line '{}' as clause", clause))]
    MalformedClause { clause: String },
    #[snafu(display("Invalid literal found in clause '{}'", clause))]
    MalformedLiteral {
        clause: String,
        source: LiteralParseError,
    },
    #[snafu(display("Problem line 'p cnf <num_variables> <num_clauses>' is not found"))]
    MalformedProblemDefinition,
    #[snafu(display(
        "Clause '{}' uses variable {} but the problem line declares {} variables",
        clause,
        variable,
        declared
    ))]
    VariableOutOfRange {
        clause: String,
        variable: usize,
        declared: usize,
    },
    #[snafu(display(
        "The number of clauses ({}) does not match the clauses number in the problem definition ({})",
        found,
        expected,
    ))]
    ClauseCountMismatch { expected: usize, found: usize },
}

/// Parse a line to a clause
fn parse_line(line: &str, num_variables: usize) -> Result<Clause, Error> {
    let splitted = line.split_whitespace().collect::<Vec<_>>();

    ensure!(
        splitted.last() == Some(&"0"),
        MalformedClause {
            clause: line.to_owned(),
        }
    );

    let mut literals = Vec::with_capacity(splitted.len() - 1);
    for s in &splitted[..splitted.len() - 1] {
        let literal = s.parse::<Literal>().with_context(|| MalformedLiteral {
            clause: line.to_owned(),
        })?;

        let variable = literal.variable().id() as usize;
        ensure!(
            variable <= num_variables,
            VariableOutOfRange {
                clause: line.to_owned(),
                variable,
                declared: num_variables,
            }
        );

        literals.push(literal);
    }

    Ok(Clause::new(literals))
}

/// Parses the `p cnf <num_variables> <num_clauses>` line.
fn parse_problem_line(line: &str) -> Result<(usize, usize), Error> {
    let splitted = line.split_whitespace().collect::<Vec<_>>();

    // We only support CNF DIMACS format
    ensure!(
        splitted.len() == 4 && splitted[0] == "p" && splitted[1] == "cnf",
        MalformedProblemDefinition
    );

    match (splitted[2].parse::<usize>(), splitted[3].parse::<usize>()) {
        (Ok(num_variables), Ok(num_clauses)) if num_variables <= Variable::MAX_VARIABLE_ID => {
            Ok((num_variables, num_clauses))
        }
        _ => MalformedProblemDefinition.fail(),
    }
}

/// Parses CNF formula from DIMACS text.
///
/// A line holding only `0` is an empty clause. A line starting with `%`
/// ends the formula, as in SATLIB benchmark files.
pub fn parse_str(text: &str) -> Result<Cnf, Error> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('c'));

    let prob_line = lines
        .next()
        .ok_or_else(|| MalformedProblemDefinition.build())?;
    let (num_variables, num_clauses) = parse_problem_line(prob_line)?;

    let mut cnf = Cnf::new(num_variables);

    for line in lines.take_while(|line| !line.starts_with('%')) {
        cnf.add_clause(parse_line(line, num_variables)?);
    }

    ensure!(
        cnf.num_clauses() == num_clauses,
        ClauseCountMismatch {
            found: cnf.num_clauses(),
            expected: num_clauses,
        }
    );

    Ok(cnf)
}

/// Parses CNF formula from a file
pub fn parse_file(path: impl AsRef<Path>) -> Result<Cnf, Error> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).context(IoError {
        path: path.to_owned(),
    })?;

    let cnf = parse_str(&text)?;
    debug!(
        "Parsed '{}': {} variables, {} clauses",
        path.display(),
        cnf.num_variables(),
        cnf.num_clauses()
    );

    Ok(cnf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comments_and_problem_line() {
        let cnf = parse_str(
            "c a comment
c another one
p cnf 3 2
1 -2 0

-3  2 0
",
        )
        .unwrap();

        assert_eq!(cnf.num_variables(), 3);
        assert_eq!(cnf.num_clauses(), 2);
        let first: Vec<_> = cnf.clauses()[0].iter().map(|l| l.to_dimacs()).collect();
        assert_eq!(first, vec![1, -2]);
    }

    #[test]
    fn zero_line_is_empty_clause() {
        let cnf = parse_str("p cnf 0 1\n0\n").unwrap();
        assert_eq!(cnf.num_clauses(), 1);
        assert!(cnf.clauses()[0].is_empty());
    }

    #[test]
    fn percent_ends_the_formula() {
        let cnf = parse_str("p cnf 2 1\n1 2 0\n%\n0\n\n").unwrap();
        assert_eq!(cnf.num_clauses(), 1);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            parse_str("1 2 0\n"),
            Err(Error::MalformedProblemDefinition)
        ));
        assert!(matches!(
            parse_str(""),
            Err(Error::MalformedProblemDefinition)
        ));
        assert!(matches!(
            parse_str("p cnf 2 1\n1 2\n"),
            Err(Error::MalformedClause { .. })
        ));
        assert!(matches!(
            parse_str("p cnf 2 1\n1 x 0\n"),
            Err(Error::MalformedLiteral { .. })
        ));
        assert!(matches!(
            parse_str("p cnf 2 1\n1 3 0\n"),
            Err(Error::VariableOutOfRange { variable: 3, .. })
        ));
        assert!(matches!(
            parse_str("p cnf 2 2\n1 2 0\n"),
            Err(Error::ClauseCountMismatch {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn satlib_file_without_problem_line() {
        let text = "c SATLIB style, problem line dropped
1 -2 3 0
-1 2 0
%
0
";
        assert!(matches!(
            parse_str(text),
            Err(Error::MalformedProblemDefinition)
        ));

        let cnf = parse_str(&format!("p cnf 3 2\n{}", text)).unwrap();
        assert_eq!(cnf.num_clauses(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            parse_file("testcases/does-not-exist.cnf"),
            Err(Error::IoError { .. })
        ));
    }
}
