use crate::board::{ConstraintBoard, DigitSet};
use crate::SudokuError;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Cell-ordering policy for the backtracking search.
///
/// Both strategies accept and solve the same set of well-posed puzzles;
/// `MostConstrained` only changes how quickly the search tree collapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Always branch on the first empty cell in row-major order, trying
    /// digits 1-9 filtered by a legality check per candidate.
    FirstEmpty,
    /// Branch on the empty cell with the fewest candidates, iterating only
    /// its precomputed candidate set.
    #[default]
    MostConstrained,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::FirstEmpty => f.write_str("first-empty"),
            Strategy::MostConstrained => f.write_str("most-constrained"),
        }
    }
}

impl FromStr for Strategy {
    type Err = SudokuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first-empty" => Ok(Strategy::FirstEmpty),
            "most-constrained" => Ok(Strategy::MostConstrained),
            other => Err(SudokuError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Terminal outcome of a solve attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Solved,
    NoSolution,
    TimedOut,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Solved => f.write_str("Solved"),
            SolveStatus::NoSolution => f.write_str("Board has no solution"),
            SolveStatus::TimedOut => f.write_str("Timeout occurred"),
        }
    }
}

/// Outcome of one recursive step, propagated through return values rather
/// than unwinding.
enum Search {
    Solved,
    Exhausted,
    TimedOut,
}

/// Depth-first backtracking search over a `ConstraintBoard`.
///
/// The solver owns no board state of its own; each `solve` call resets the
/// board, captures a fresh start timestamp, and runs to one of the three
/// terminal outcomes. A solver must not be shared across two boards that
/// are being solved at the same time.
pub struct Solver {
    strategy: Strategy,
    timeout: Option<Duration>,
}

impl Solver {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            timeout: None,
        }
    }

    /// Bounds each solve attempt by a wall-clock deadline, checked at the
    /// top of every recursive call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Solves the board in place.
    ///
    /// Returns the solved grid and `Solved` on success (the grid is
    /// identical to the input when the input was already complete). On
    /// exhaustion the board is back at its original state and `None` is
    /// returned with `NoSolution`. On timeout the board is deliberately
    /// left mid-search; call `reset` before reusing it.
    pub fn solve(&self, board: &mut ConstraintBoard) -> (Option<Vec<Vec<i32>>>, SolveStatus) {
        board.reset();
        let started = Instant::now();
        debug!(
            strategy = %self.strategy,
            empty = board.next_empty_cells().len(),
            "starting search"
        );

        match self.backtrack(board, started) {
            Search::Solved => {
                debug!(elapsed = ?started.elapsed(), "search succeeded");
                (Some(board.to_grid()), SolveStatus::Solved)
            }
            Search::Exhausted => {
                debug!(elapsed = ?started.elapsed(), "search exhausted all branches");
                // Every failed branch undid its placements, so exhaustion
                // leaves the board at its original state.
                debug_assert!(board.is_unchanged());
                (None, SolveStatus::NoSolution)
            }
            Search::TimedOut => {
                debug!(elapsed = ?started.elapsed(), "search timed out");
                (None, SolveStatus::TimedOut)
            }
        }
    }

    fn backtrack(&self, board: &mut ConstraintBoard, started: Instant) -> Search {
        if let Some(limit) = self.timeout {
            if started.elapsed() >= limit {
                trace!("deadline reached, unwinding");
                return Search::TimedOut;
            }
        }

        let target = match self.strategy {
            Strategy::FirstEmpty => board
                .next_empty_cells()
                .first()
                .map(|&(row, col)| (row, col, DigitSet::all())),
            Strategy::MostConstrained => most_constrained_cell(board),
        };

        // No empty cells left: the board is complete.
        let Some((row, col, candidates)) = target else {
            return Search::Solved;
        };

        for digit in candidates.iter() {
            // FirstEmpty carries the full digit set and filters here;
            // MostConstrained precomputed a legal-only candidate set.
            if self.strategy == Strategy::FirstEmpty && !board.is_legal(row, col, digit) {
                continue;
            }

            trace!("placing {digit} at ({row}, {col})");
            board.place(row, col, digit);
            match self.backtrack(board, started) {
                Search::Solved => return Search::Solved,
                // A timed-out frame must not mutate the board any further.
                Search::TimedOut => return Search::TimedOut,
                Search::Exhausted => board.remove(row, col, digit),
            }
        }

        Search::Exhausted
    }
}

/// The empty cell with the fewest candidates, ties broken by row-major
/// scan order. `None` means the board is complete.
fn most_constrained_cell(board: &ConstraintBoard) -> Option<(usize, usize, DigitSet)> {
    let mut best: Option<(usize, usize, DigitSet)> = None;
    for (row, col) in board.next_empty_cells() {
        let candidates = board.candidates(row, col);
        match best {
            Some((_, _, current)) if current.len() <= candidates.len() => {}
            _ => best = Some((row, col, candidates)),
        }
    }
    best
}
