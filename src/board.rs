use crate::{Result, SudokuError};
use std::fmt;
use tracing::warn;

/// A set of digits 1-9 backed by a u16 bitmask.
///
/// Bit `d - 1` is set iff digit `d` is in the set, so row/column/box
/// membership tests and candidate computation are single bitwise operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DigitSet(u16);

impl DigitSet {
    const ALL: u16 = 0b1_1111_1111;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(Self::ALL)
    }

    fn bit(digit: i32) -> u16 {
        debug_assert!((1..=9).contains(&digit));
        1 << (digit - 1)
    }

    pub fn contains(self, digit: i32) -> bool {
        self.0 & Self::bit(digit) != 0
    }

    fn insert(&mut self, digit: i32) {
        self.0 |= Self::bit(digit);
    }

    fn remove(&mut self, digit: i32) {
        self.0 &= !Self::bit(digit);
    }

    fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    fn complement(self) -> Self {
        Self(!self.0 & Self::ALL)
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the digits in the set in ascending order.
    pub fn iter(self) -> impl Iterator<Item = i32> {
        (1..=9).filter(move |&digit| self.contains(digit))
    }
}

/// Non-fatal observations made while constructing a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    /// The puzzle has fewer than 17 clues, so it cannot have a unique
    /// solution: https://arxiv.org/abs/1201.0749
    FewClues { filled: usize },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::FewClues { filled } => write!(
                f,
                "puzzle has only {filled} clues; at least 17 are required for a unique solution"
            ),
        }
    }
}

/// A 9x9 Sudoku board that tracks row, column, and box membership sets
/// alongside the grid, so legality checks and candidate computation never
/// rescan the grid.
///
/// The original input grid is kept as an immutable snapshot for `reset` and
/// for checking whether a search changed anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintBoard {
    cells: [[i32; 9]; 9],
    original: [[i32; 9]; 9],
    rows: [DigitSet; 9],
    cols: [DigitSet; 9],
    boxes: [DigitSet; 9],
    filled: usize,
    advisories: Vec<Advisory>,
}

/// Index of the 3x3 box containing (row, col), numbered row-major.
fn box_index(row: usize, col: usize) -> usize {
    (row / 3) * 3 + col / 3
}

impl ConstraintBoard {
    /// Builds a board from a 9x9 grid where 0 marks an empty cell.
    ///
    /// Validates the shape, the value range, and the absence of duplicate
    /// digits per row, column, and box, populating the membership sets in
    /// the same scan. A puzzle with fewer than 17 clues still constructs
    /// but records an advisory.
    pub fn from_grid(grid: &[Vec<i32>]) -> Result<Self> {
        if grid.len() != 9 || grid.iter().any(|row| row.len() != 9) {
            return Err(SudokuError::InvalidShape);
        }

        let mut board = Self {
            cells: [[0; 9]; 9],
            original: [[0; 9]; 9],
            rows: [DigitSet::empty(); 9],
            cols: [DigitSet::empty(); 9],
            boxes: [DigitSet::empty(); 9],
            filled: 0,
            advisories: Vec::new(),
        };

        for row in 0..9 {
            for col in 0..9 {
                let value = grid[row][col];
                if !(0..=9).contains(&value) {
                    return Err(SudokuError::InvalidValue { row, col, value });
                }
                if value == 0 {
                    continue;
                }

                let b = box_index(row, col);
                if board.rows[row].contains(value) {
                    return Err(SudokuError::DuplicateDigit {
                        digit: value,
                        unit: "row",
                        index: row,
                    });
                }
                if board.cols[col].contains(value) {
                    return Err(SudokuError::DuplicateDigit {
                        digit: value,
                        unit: "column",
                        index: col,
                    });
                }
                if board.boxes[b].contains(value) {
                    return Err(SudokuError::DuplicateDigit {
                        digit: value,
                        unit: "box",
                        index: b,
                    });
                }

                board.cells[row][col] = value;
                board.rows[row].insert(value);
                board.cols[col].insert(value);
                board.boxes[b].insert(value);
                board.filled += 1;
            }
        }

        board.original = board.cells;

        if board.filled < 17 {
            let advisory = Advisory::FewClues {
                filled: board.filled,
            };
            warn!("{advisory}");
            board.advisories.push(advisory);
        }

        Ok(board)
    }

    /// True iff `digit` is absent from the row, column, and box of the cell.
    ///
    /// # Panics
    ///
    /// Panics if `digit` is outside 1-9; that is a caller bug, not a
    /// recoverable condition.
    pub fn is_legal(&self, row: usize, col: usize, digit: i32) -> bool {
        assert!(
            (1..=9).contains(&digit),
            "digit must be between 1 and 9, got {digit}"
        );
        !self.rows[row].contains(digit)
            && !self.cols[col].contains(digit)
            && !self.boxes[box_index(row, col)].contains(digit)
    }

    /// Writes `digit` into an empty cell and updates the membership sets.
    ///
    /// The caller must have checked `is_legal` first; placing an illegal
    /// digit would corrupt the set invariant.
    pub fn place(&mut self, row: usize, col: usize, digit: i32) {
        debug_assert_eq!(self.cells[row][col], 0, "cell ({row}, {col}) is already filled");
        debug_assert!(
            self.is_legal(row, col, digit),
            "illegal placement of {digit} at ({row}, {col})"
        );
        self.cells[row][col] = digit;
        self.rows[row].insert(digit);
        self.cols[col].insert(digit);
        self.boxes[box_index(row, col)].insert(digit);
        self.filled += 1;
    }

    /// Inverse of `place`: clears the cell and the set entries for `digit`.
    ///
    /// # Panics
    ///
    /// Panics if the cell does not currently hold `digit`.
    pub fn remove(&mut self, row: usize, col: usize, digit: i32) {
        assert_eq!(
            self.cells[row][col], digit,
            "cell ({row}, {col}) does not hold {digit}"
        );
        self.cells[row][col] = 0;
        self.rows[row].remove(digit);
        self.cols[col].remove(digit);
        self.boxes[box_index(row, col)].remove(digit);
        self.filled -= 1;
    }

    /// Digits that can legally go in an empty cell: {1..9} minus the union
    /// of the cell's row, column, and box sets.
    pub fn candidates(&self, row: usize, col: usize) -> DigitSet {
        debug_assert_eq!(
            self.cells[row][col], 0,
            "candidates are only defined for empty cells"
        );
        self.rows[row]
            .union(self.cols[col])
            .union(self.boxes[box_index(row, col)])
            .complement()
    }

    /// All empty cells in row-major order. An empty result means the board
    /// is completely filled.
    pub fn next_empty_cells(&self) -> Vec<(usize, usize)> {
        let mut cells = Vec::with_capacity(81 - self.filled);
        for row in 0..9 {
            for col in 0..9 {
                if self.cells[row][col] == 0 {
                    cells.push((row, col));
                }
            }
        }
        cells
    }

    /// Restores the grid to the original input and rebuilds the membership
    /// sets. The original was validated at construction, so no re-validation
    /// happens here.
    pub fn reset(&mut self) {
        self.cells = self.original;
        self.rows = [DigitSet::empty(); 9];
        self.cols = [DigitSet::empty(); 9];
        self.boxes = [DigitSet::empty(); 9];
        self.filled = 0;

        for row in 0..9 {
            for col in 0..9 {
                let value = self.cells[row][col];
                if value != 0 {
                    self.rows[row].insert(value);
                    self.cols[col].insert(value);
                    self.boxes[box_index(row, col)].insert(value);
                    self.filled += 1;
                }
            }
        }
    }

    pub fn value(&self, row: usize, col: usize) -> i32 {
        self.cells[row][col]
    }

    pub fn filled_count(&self) -> usize {
        self.filled
    }

    /// True when the current grid is identical to the original input.
    pub fn is_unchanged(&self) -> bool {
        self.cells == self.original
    }

    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    /// Copies the grid out for serialization.
    pub fn to_grid(&self) -> Vec<Vec<i32>> {
        self.cells.iter().map(|row| row.to_vec()).collect()
    }
}

impl fmt::Display for ConstraintBoard {
    /// Renders the board with `.` for empty cells and separators between
    /// the 3x3 boxes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..9 {
            for col in 0..9 {
                if self.cells[row][col] == 0 {
                    f.write_str(".")?;
                } else {
                    write!(f, "{}", self.cells[row][col])?;
                }
                if (col + 1) % 3 == 0 && col < 8 {
                    f.write_str(" | ")?;
                } else if col < 8 {
                    f.write_str(" ")?;
                }
            }
            if (row + 1) % 3 == 0 && row < 8 {
                f.write_str("\n------+-------+------\n")?;
            } else {
                f.write_str("\n")?;
            }
        }
        Ok(())
    }
}
