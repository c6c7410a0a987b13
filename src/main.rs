use std::{
    env::args,
    path::Path,
    time::{Duration, Instant},
};

use log::error;
use pretty_env_logger::formatted_builder;
use splitsat::{
    formula::Cnf,
    parser::{self, parse_file},
    prelude::*,
    report::Report,
    solver::{self, DpllSolver, ParallelConfig, ParallelSolver, Solver, WORKERS_ENV},
};

fn usage_string() -> String {
    format!(
        "Usage: {0} <solver_name> <command>
       {0} compare <file_name>

solver_name: dpll, parallel

command:
    check <file_name> - solve the given file and print SAT or UNSAT
    time <file_name> - same as check, and print the elapsed time

compare runs both solvers on the same file and prints the speedup.
The parallel solver uses one worker per CPU unless {1} is set.",
        args().next().unwrap_or_else(|| "splitsat".to_owned()),
        WORKERS_ENV
    )
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Unknown solver '{}'\n\n{}", name, usage_string()))]
    UnknownSolver { name: String },
    #[snafu(display("Unknown command '{}'\n\n{}", name, usage_string()))]
    UnknownCommand { name: String },
    #[snafu(display("Failed to parse CNF"))]
    ParserError { source: parser::Error },
    #[snafu(display("Invalid parallel solver configuration"))]
    ConfigError { source: solver::ConfigError },
    #[snafu(display("Required argument does not exist\n\n{}", usage_string()))]
    MissingArgument,
}

fn verdict_string(satisfiable: bool) -> &'static str {
    if satisfiable {
        "SAT"
    } else {
        "UNSAT"
    }
}

fn timed<T: Solver>(build: impl Fn(Cnf) -> T, formula: Cnf) -> (bool, Duration) {
    let start = Instant::now();
    let satisfiable = build(formula).solve();
    (satisfiable, start.elapsed())
}

fn load(args: &[String]) -> Result<Cnf, Error> {
    let path = args.get(1).context(MissingArgument)?;
    parse_file(Path::new(path)).context(ParserError)
}

fn dispatch_command<T: Solver>(build: impl Fn(Cnf) -> T, args: Vec<String>) -> Result<(), Error> {
    match args.get(0).map(|s| s.as_str()) {
        Some("check") => {
            let formula = load(&args)?;
            println!("{}", verdict_string(build(formula).solve()));
        }
        Some("time") => {
            let formula = load(&args)?;
            let (satisfiable, elapsed) = timed(build, formula);
            println!("{}", verdict_string(satisfiable));
            println!("Time: {:.6} s", elapsed.as_secs_f64());
        }
        Some(name) => UnknownCommand {
            name: name.to_owned(),
        }
        .fail()?,
        None => MissingArgument.fail()?,
    }

    Ok(())
}

fn compare(config: ParallelConfig, path: Option<&String>) -> Result<(), Error> {
    let formula = parse_file(Path::new(path.context(MissingArgument)?)).context(ParserError)?;
    println!("Clauses: {}", formula.num_clauses());

    let (sequential, sequential_time) = timed(DpllSolver::new, formula.clone());
    println!(
        "dpll:     {:<5} {:.6} s",
        verdict_string(sequential),
        sequential_time.as_secs_f64()
    );

    let (parallel, parallel_time) = timed(
        |formula| ParallelSolver::with_config(formula, config),
        formula,
    );
    println!(
        "parallel: {:<5} {:.6} s ({} workers, split depth {})",
        verdict_string(parallel),
        parallel_time.as_secs_f64(),
        config.workers,
        config.max_depth()
    );

    if sequential != parallel {
        error!("Solvers disagree: dpll says {}, parallel says {}", sequential, parallel);
    }

    println!(
        "Speedup: x{:.2}",
        sequential_time.as_secs_f64() / parallel_time.as_secs_f64().max(f64::EPSILON)
    );

    Ok(())
}

fn init_logger() {
    let mut builder = formatted_builder();

    if let Ok(s) = ::std::env::var("RUST_LOG") {
        builder.parse_filters(&s);
    } else if cfg!(debug_assertions) {
        builder.parse_filters("splitsat=debug");
    } else {
        builder.parse_filters("splitsat=warn");
    }

    builder.try_init().expect("Failed to initialize the logger");
}

fn main() -> Result<(), Report> {
    init_logger();

    let mut args = args();

    // drop arg[0]
    args.next();

    // solver name
    let solver_name = args.next();
    let remaining: Vec<_> = args.collect();

    match solver_name.as_deref() {
        Some("dpll") => dispatch_command(DpllSolver::new, remaining)?,
        Some("parallel") => {
            let config = ParallelConfig::from_env().context(ConfigError)?;
            dispatch_command(
                |formula| ParallelSolver::with_config(formula, config),
                remaining,
            )?
        }
        Some("compare") => {
            let config = ParallelConfig::from_env().context(ConfigError)?;
            compare(config, remaining.get(0))?
        }
        Some(name) => UnknownSolver {
            name: name.to_owned(),
        }
        .fail()?,
        None => {
            println!("{}", usage_string());
        }
    }

    Ok(())
}
