//! A Sudoku solver built on a constraint-tracking board and recursive
//! backtracking.
//!
//! This program:
//! 1. Parses a puzzle from a text file (grid or flat format)
//! 2. Solves it with the selected cell-ordering strategy under a wall-clock
//!    timeout
//! 3. Reports the outcome and optionally saves the solved board
//!
//! Batch mode iterates a directory of puzzle files instead and aggregates
//! solve statistics.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use sudoku_solver::batch;
use sudoku_solver::format::{self, BoardFormat};
use sudoku_solver::solver::{Solver, Strategy};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "sudoku-solver",
    version,
    about = "A constraint-pruned backtracking Sudoku solver"
)]
struct Cli {
    /// Enable debug output, including per-decision search tracing.
    #[arg(short, long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Solve a single puzzle file.
    Solve {
        /// Path to the puzzle file (.txt).
        input: PathBuf,

        /// Input format of the puzzle file.
        #[arg(long, default_value_t = BoardFormat::Grid)]
        format: BoardFormat,

        /// Cell-ordering strategy for the search.
        #[arg(long, default_value_t = Strategy::MostConstrained)]
        strategy: Strategy,

        /// Wall-clock timeout in seconds.
        #[arg(long, default_value_t = 10.0)]
        timeout: f64,

        /// Optional path to save the solved board (.txt).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Solve every puzzle file in a directory and report statistics.
    Batch {
        /// Directory to scan recursively for .txt puzzle files.
        dir: PathBuf,

        /// Input format of the puzzle files.
        #[arg(long, default_value_t = BoardFormat::Grid)]
        format: BoardFormat,

        /// Cell-ordering strategy for the search.
        #[arg(long, default_value_t = Strategy::MostConstrained)]
        strategy: Strategy,

        /// Wall-clock timeout in seconds, applied per board.
        #[arg(long, default_value_t = 10.0)]
        timeout: f64,

        /// Print the statistics as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_file(cli.debug)
        .with_line_number(cli.debug)
        .with_target(false)
        .with_ansi(true)
        .init();

    match cli.command {
        Commands::Solve {
            input,
            format,
            strategy,
            timeout,
            output,
        } => run_solve(&input, format, strategy, timeout, output.as_deref()),
        Commands::Batch {
            dir,
            format,
            strategy,
            timeout,
            json,
        } => run_batch(&dir, format, strategy, timeout, json),
    }
}

fn build_solver(strategy: Strategy, timeout: f64) -> Option<Solver> {
    if !timeout.is_finite() || timeout < 0.0 {
        error!("Timeout must be a non-negative number of seconds, got {timeout}");
        return None;
    }
    Some(Solver::new(strategy).with_timeout(Duration::from_secs_f64(timeout)))
}

fn run_solve(
    input: &std::path::Path,
    format: BoardFormat,
    strategy: Strategy,
    timeout: f64,
    output: Option<&std::path::Path>,
) -> ExitCode {
    let Some(solver) = build_solver(strategy, timeout) else {
        return ExitCode::FAILURE;
    };

    let mut board = match format::parse_file(input, format) {
        Ok(board) => board,
        Err(e) => {
            error!("Failed to parse {}: {}", input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    info!("Input board:");
    println!("{board}");

    let (solution, status) = solver.solve(&mut board);
    info!("{status}");

    let Some(grid) = solution else {
        return ExitCode::FAILURE;
    };

    info!("Solved board:");
    println!("{board}");

    if let Some(path) = output {
        match format::save_file(&grid, format, path) {
            Ok(()) => info!("Solution saved to {}", path.display()),
            Err(e) => {
                error!("Failed to save solution: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

fn run_batch(
    dir: &std::path::Path,
    format: BoardFormat,
    strategy: Strategy,
    timeout: f64,
    json: bool,
) -> ExitCode {
    let Some(solver) = build_solver(strategy, timeout) else {
        return ExitCode::FAILURE;
    };

    let results = match batch::run_batch(dir, format, &solver) {
        Ok(results) => results,
        Err(e) => {
            error!("Batch run failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if json {
        match results.to_json() {
            Ok(text) => println!("{text}"),
            Err(e) => {
                error!("Failed to serialize results: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        results.print_results();
    }

    ExitCode::SUCCESS
}
