use crate::format::{self, BoardFormat};
use crate::solver::{SolveStatus, Solver};
use crate::{Result, SudokuError};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Aggregated results from a batch run.
#[derive(Debug, Serialize)]
pub struct BatchResults {
    pub total_files: usize,
    pub solved: usize,
    pub no_solution: usize,
    pub timed_out: usize,
    pub unparseable: usize,
    pub total_duration: Duration,
    pub average_duration: Duration,
    pub min_duration: Duration,
    pub max_duration: Duration,
}

impl BatchResults {
    /// Share of files that were solved, as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.total_files == 0 {
            return 0.0;
        }
        (self.solved as f64 / self.total_files as f64) * 100.0
    }

    /// Pretty prints the batch results.
    pub fn print_results(&self) {
        println!("\n=== Batch Results ===");
        println!("Total Files: {}", self.total_files);
        println!("Solved: {} ({:.1}%)", self.solved, self.success_rate());
        println!("No Solution: {}", self.no_solution);
        println!("Timed Out: {}", self.timed_out);
        println!("Unparseable: {}", self.unparseable);
        println!("Total Duration: {:?}", self.total_duration);
        println!("Average Solve: {:?}", self.average_duration);
        println!("Min Solve: {:?}", self.min_duration);
        println!("Max Solve: {:?}", self.max_duration);
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SudokuError::BatchError(e.to_string()))
    }
}

/// Solves every `.txt` puzzle file under `dir` and aggregates statistics.
///
/// Files are discovered recursively and processed in parallel, one board
/// and one solve per file; the search inside each solve stays
/// single-threaded. A file that fails to parse is skipped and counted.
pub fn run_batch(dir: &Path, format: BoardFormat, solver: &Solver) -> Result<BatchResults> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("txt"))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(SudokuError::BatchError(format!(
            "no .txt puzzle files found under {}",
            dir.display()
        )));
    }

    info!("Solving {} boards from {}", files.len(), dir.display());
    let started = Instant::now();

    let outcomes: Vec<Option<(SolveStatus, Duration)>> = files
        .par_iter()
        .map(|path| {
            let mut board = match format::parse_file(path, format) {
                Ok(board) => board,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    return None;
                }
            };

            let solve_started = Instant::now();
            let (_, status) = solver.solve(&mut board);
            let elapsed = solve_started.elapsed();
            debug!("{}: {} in {:?}", path.display(), status, elapsed);
            Some((status, elapsed))
        })
        .collect();

    let mut solved = 0;
    let mut no_solution = 0;
    let mut timed_out = 0;
    let mut unparseable = 0;
    let mut solve_time = Duration::ZERO;
    let mut min_duration = Duration::MAX;
    let mut max_duration = Duration::ZERO;

    for outcome in &outcomes {
        match outcome {
            None => unparseable += 1,
            Some((status, elapsed)) => {
                solve_time += *elapsed;
                min_duration = min_duration.min(*elapsed);
                max_duration = max_duration.max(*elapsed);
                match status {
                    SolveStatus::Solved => solved += 1,
                    SolveStatus::NoSolution => no_solution += 1,
                    SolveStatus::TimedOut => timed_out += 1,
                }
            }
        }
    }

    let attempts = outcomes.len() - unparseable;
    Ok(BatchResults {
        total_files: files.len(),
        solved,
        no_solution,
        timed_out,
        unparseable,
        total_duration: started.elapsed(),
        average_duration: if attempts == 0 {
            Duration::ZERO
        } else {
            solve_time / attempts as u32
        },
        min_duration: if attempts == 0 {
            Duration::ZERO
        } else {
            min_duration
        },
        max_duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::Strategy;
    use std::fs;

    const EASY_GRID_TEXT: &str = "\
910|000|427
000|003|915
254|700|680
---+---+---
470|086|032
060|400|008
500|012|060
---+---+---
340|620|001
000|300|000
026|008|009
";

    const SOLVED_GRID_TEXT: &str = "\
534|678|912
672|195|348
198|342|567
---+---+---
859|761|423
426|853|791
713|924|856
---+---+---
961|537|284
287|419|635
345|286|179
";

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sudoku_batch_{name}_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn aggregates_counts_over_a_directory() {
        let dir = scratch_dir("counts");
        fs::write(dir.join("easy_1.txt"), EASY_GRID_TEXT).unwrap();
        fs::write(dir.join("complete.txt"), SOLVED_GRID_TEXT).unwrap();
        fs::write(dir.join("broken.txt"), "not a sudoku board\n").unwrap();
        fs::write(dir.join("ignored.md"), "readme").unwrap();

        let solver = Solver::new(Strategy::MostConstrained).with_timeout(Duration::from_secs(10));
        let results = run_batch(&dir, BoardFormat::Grid, &solver).unwrap();

        assert_eq!(results.total_files, 3);
        assert_eq!(results.solved, 2);
        assert_eq!(results.no_solution, 0);
        assert_eq!(results.timed_out, 0);
        assert_eq!(results.unparseable, 1);
        assert!(results.min_duration <= results.max_duration);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = scratch_dir("empty");
        let solver = Solver::new(Strategy::FirstEmpty);
        assert!(matches!(
            run_batch(&dir, BoardFormat::Grid, &solver),
            Err(SudokuError::BatchError(_))
        ));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn success_rate_guards_against_empty_results() {
        let results = BatchResults {
            total_files: 0,
            solved: 0,
            no_solution: 0,
            timed_out: 0,
            unparseable: 0,
            total_duration: Duration::ZERO,
            average_duration: Duration::ZERO,
            min_duration: Duration::ZERO,
            max_duration: Duration::ZERO,
        };
        assert_eq!(results.success_rate(), 0.0);

        let results = BatchResults {
            total_files: 4,
            solved: 3,
            ..results
        };
        assert_eq!(results.success_rate(), 75.0);
    }

    #[test]
    fn json_output_contains_counts() {
        let results = BatchResults {
            total_files: 2,
            solved: 2,
            no_solution: 0,
            timed_out: 0,
            unparseable: 0,
            total_duration: Duration::from_millis(5),
            average_duration: Duration::from_millis(2),
            min_duration: Duration::from_millis(1),
            max_duration: Duration::from_millis(4),
        };
        let json = results.to_json().unwrap();
        assert!(json.contains("\"total_files\": 2"));
        assert!(json.contains("\"solved\": 2"));
    }
}
