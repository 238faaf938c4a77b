use crate::board::ConstraintBoard;
use crate::{Result, SudokuError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

static NUMBER_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{3}\|\d{3}\|\d{3}$").unwrap());
static SEPARATOR_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^---\+---\+---$").unwrap());
static ALTERNATE_NUMBER_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\D?\d{3}\D\d{3}\D\d{3}\D?$").unwrap());
static DIGIT_TRIPLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{3}").unwrap());

/// Text representations of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoardFormat {
    /// Eleven lines: nine `123|456|789` number rows with a `---+---+---`
    /// separator after every third one.
    #[default]
    Grid,
    /// A single string of 81 digits, row-major.
    Flat,
}

impl fmt::Display for BoardFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardFormat::Grid => f.write_str("grid"),
            BoardFormat::Flat => f.write_str("flat"),
        }
    }
}

impl FromStr for BoardFormat {
    type Err = SudokuError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "grid" => Ok(BoardFormat::Grid),
            "flat" => Ok(BoardFormat::Flat),
            other => Err(SudokuError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Strips whitespace inside lines, drops empty lines, and replaces the
/// `.` empty-cell notation with `0`. Warns when the input was altered,
/// since downstream errors then refer to the cleaned-up lines.
fn preprocess(input: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut altered = false;

    for raw in input.lines() {
        let stripped: String = raw.split_whitespace().collect();
        if stripped.is_empty() {
            altered = true;
            continue;
        }
        if stripped != raw {
            altered = true;
        }
        lines.push(stripped.replace('.', "0"));
    }

    if altered {
        warn!("removed whitespace or empty lines from the input");
    }
    lines
}

fn parse_grid(mut lines: Vec<String>) -> Result<Vec<Vec<i32>>> {
    if lines.len() != 11 {
        let mut message = String::from("input does not have 11 rows\ninput:\n");
        for (i, row) in lines.iter().enumerate() {
            message.push_str(&format!("{}: {row}\n", i + 1));
        }
        return Err(SudokuError::FormatError(message));
    }

    let mut corrected = Vec::new();
    for (i, line) in lines.iter_mut().enumerate() {
        if i % 4 == 3 {
            if !SEPARATOR_ROW.is_match(line) {
                // A malformed separator is only recoverable when it carries
                // no digits; anything else may be a misplaced number row.
                if line.chars().any(|c| c.is_ascii_digit()) {
                    return Err(SudokuError::FormatError(format!(
                        "separator row does not match an acceptable pattern\nfound: {line}\nexpected: ---+---+---"
                    )));
                }
                *line = "---+---+---".to_string();
                corrected.push(i + 1);
            }
        } else if !NUMBER_ROW.is_match(line) {
            if ALTERNATE_NUMBER_ROW.is_match(line) {
                let triplets: Vec<&str> =
                    DIGIT_TRIPLET.find_iter(line).map(|m| m.as_str()).collect();
                *line = triplets.join("|");
                corrected.push(i + 1);
            } else {
                return Err(SudokuError::FormatError(format!(
                    "number row does not match an acceptable pattern\nfound: {line}\nexpected format: 123|456|789"
                )));
            }
        }
    }

    if !corrected.is_empty() {
        warn!(lines = ?corrected, "input corrected to match the expected format");
    }

    let mut grid = Vec::with_capacity(9);
    for (i, line) in lines.iter().enumerate() {
        if i % 4 == 3 {
            continue;
        }
        let row: Vec<i32> = line
            .chars()
            .filter_map(|c| c.to_digit(10))
            .map(|d| d as i32)
            .collect();
        grid.push(row);
    }
    Ok(grid)
}

fn parse_flat(lines: Vec<String>) -> Result<Vec<Vec<i32>>> {
    let input = lines.into_iter().next().unwrap_or_default();

    if !input.chars().all(|c| c.is_ascii_digit()) {
        return Err(SudokuError::FormatError(
            "flat input must contain only digits".to_string(),
        ));
    }
    if input.len() != 81 {
        return Err(SudokuError::FormatError(format!(
            "flat input must be exactly 81 digits, found {}",
            input.len()
        )));
    }

    let digits: Vec<i32> = input
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| d as i32)
        .collect();
    Ok(digits.chunks(9).map(<[i32]>::to_vec).collect())
}

/// Parses a board from text in the given format. Rule validation (shape,
/// range, duplicates) happens once, in `ConstraintBoard::from_grid`.
pub fn parse_str(input: &str, format: BoardFormat) -> Result<ConstraintBoard> {
    let lines = preprocess(input);
    let grid = match format {
        BoardFormat::Grid => parse_grid(lines)?,
        BoardFormat::Flat => parse_flat(lines)?,
    };
    ConstraintBoard::from_grid(&grid)
}

/// Reads and parses a puzzle file. Only `.txt` files are supported.
pub fn parse_file(path: &Path, format: BoardFormat) -> Result<ConstraintBoard> {
    check_txt_extension(path)?;
    let contents = fs::read_to_string(path)?;
    parse_str(&contents, format)
}

fn check_txt_extension(path: &Path) -> Result<()> {
    if path.extension().and_then(|e| e.to_str()) != Some("txt") {
        return Err(SudokuError::FormatError(format!(
            "only .txt files are supported, got: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Renders a grid back into the given text format.
pub fn serialize(grid: &[Vec<i32>], format: BoardFormat) -> String {
    match format {
        BoardFormat::Grid => {
            let mut out = String::new();
            for (i, row) in grid.iter().enumerate() {
                for (j, &value) in row.iter().enumerate() {
                    out.push(char::from_digit(value as u32, 10).unwrap_or('0'));
                    if (j + 1) % 3 == 0 && j < 8 {
                        out.push('|');
                    }
                }
                out.push('\n');
                if (i + 1) % 3 == 0 && i < 8 {
                    out.push_str("---+---+---\n");
                }
            }
            out
        }
        BoardFormat::Flat => grid
            .iter()
            .flatten()
            .map(|&value| char::from_digit(value as u32, 10).unwrap_or('0'))
            .collect(),
    }
}

/// Serializes a grid to a `.txt` file.
pub fn save_file(grid: &[Vec<i32>], format: BoardFormat, path: &Path) -> Result<()> {
    check_txt_extension(path)?;
    fs::write(path, serialize(grid, format))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

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

    const EASY_FLAT_TEXT: &str =
        "910000427000003915254700680470086032060400008500012060340620001000300000026008009";

    fn easy_grid() -> Vec<Vec<i32>> {
        vec![
            vec![9, 1, 0, 0, 0, 0, 4, 2, 7],
            vec![0, 0, 0, 0, 0, 3, 9, 1, 5],
            vec![2, 5, 4, 7, 0, 0, 6, 8, 0],
            vec![4, 7, 0, 0, 8, 6, 0, 3, 2],
            vec![0, 6, 0, 4, 0, 0, 0, 0, 8],
            vec![5, 0, 0, 0, 1, 2, 0, 6, 0],
            vec![3, 4, 0, 6, 2, 0, 0, 0, 1],
            vec![0, 0, 0, 3, 0, 0, 0, 0, 0],
            vec![0, 2, 6, 0, 0, 8, 0, 0, 9],
        ]
    }

    #[test]
    fn parses_well_formed_grid_input() {
        let input = "\
000|007|000
000|009|504
000|050|169
---+---+---
080|000|305
075|000|290
406|000|080
---+---+---
762|080|000
103|900|000
000|600|000
";
        let expected = vec![
            vec![0, 0, 0, 0, 0, 7, 0, 0, 0],
            vec![0, 0, 0, 0, 0, 9, 5, 0, 4],
            vec![0, 0, 0, 0, 5, 0, 1, 6, 9],
            vec![0, 8, 0, 0, 0, 0, 3, 0, 5],
            vec![0, 7, 5, 0, 0, 0, 2, 9, 0],
            vec![4, 0, 6, 0, 0, 0, 0, 8, 0],
            vec![7, 6, 2, 0, 8, 0, 0, 0, 0],
            vec![1, 0, 3, 9, 0, 0, 0, 0, 0],
            vec![0, 0, 0, 6, 0, 0, 0, 0, 0],
        ];

        let board = parse_str(input, BoardFormat::Grid).unwrap();
        assert_eq!(board.to_grid(), expected);
    }

    #[test]
    fn tolerates_whitespace_blank_lines_and_dots() {
        let input = "\
  910 | 000 | 427

000|003|915
2 5 4 | 7 . . | 6 8 .
---+---+---
470|086|032
060|400|008
500|012|060
---+---+---
340|620|001
...|3..|...
026|008|009
";
        let board = parse_str(input, BoardFormat::Grid).unwrap();
        assert_eq!(board.to_grid(), easy_grid());
    }

    #[test]
    fn corrects_alternate_delimiters() {
        let input = "\
910,000,427
000,003,915
254,700,680
-----------
470,086,032
060,400,008
500,012,060
-----------
340,620,001
000,300,000
026,008,009
";
        let board = parse_str(input, BoardFormat::Grid).unwrap();
        assert_eq!(board.to_grid(), easy_grid());
    }

    #[test]
    fn display_output_parses_back() {
        let board = ConstraintBoard::from_grid(&easy_grid()).unwrap();
        let reparsed = parse_str(&board.to_string(), BoardFormat::Grid).unwrap();
        assert_eq!(reparsed.to_grid(), easy_grid());
    }

    #[test]
    fn rejects_wrong_row_count() {
        let input = "910|000|427\n000|003|915\n";
        assert!(matches!(
            parse_str(input, BoardFormat::Grid),
            Err(SudokuError::FormatError(_))
        ));
    }

    #[test]
    fn rejects_garbage_number_row() {
        let mut input = EASY_GRID_TEXT.to_string();
        input = input.replace("910|000|427", "91a|000|427");
        assert!(matches!(
            parse_str(&input, BoardFormat::Grid),
            Err(SudokuError::FormatError(_))
        ));
    }

    #[test]
    fn rejects_separator_with_digits() {
        let mut input = EASY_GRID_TEXT.to_string();
        input = input.replace("---+---+---\n470", "123+456+789\n470");
        assert!(matches!(
            parse_str(&input, BoardFormat::Grid),
            Err(SudokuError::FormatError(_))
        ));
    }

    #[test]
    fn parses_flat_input() {
        let board = parse_str(EASY_FLAT_TEXT, BoardFormat::Flat).unwrap();
        assert_eq!(board.to_grid(), easy_grid());
    }

    #[test]
    fn rejects_bad_flat_input() {
        assert!(matches!(
            parse_str("123", BoardFormat::Flat),
            Err(SudokuError::FormatError(_))
        ));

        let with_letter = format!("x{}", &EASY_FLAT_TEXT[1..]);
        assert!(matches!(
            parse_str(&with_letter, BoardFormat::Flat),
            Err(SudokuError::FormatError(_))
        ));
    }

    #[test]
    fn serializes_grid_format() {
        assert_eq!(serialize(&easy_grid(), BoardFormat::Grid), EASY_GRID_TEXT);
    }

    #[test]
    fn serializes_flat_format() {
        assert_eq!(serialize(&easy_grid(), BoardFormat::Flat), EASY_FLAT_TEXT);
    }

    #[test]
    fn serialize_round_trips() {
        for format in [BoardFormat::Grid, BoardFormat::Flat] {
            let text = serialize(&easy_grid(), format);
            let board = parse_str(&text, format).unwrap();
            assert_eq!(board.to_grid(), easy_grid(), "{format} round trip");
        }
    }

    #[test]
    fn saves_and_reloads_file() {
        let path = std::env::temp_dir().join("sudoku_format_save_test.txt");
        save_file(&easy_grid(), BoardFormat::Grid, &path).unwrap();

        let board = parse_file(&path, BoardFormat::Grid).unwrap();
        assert_eq!(board.to_grid(), easy_grid());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rejects_non_txt_files() {
        let path = std::env::temp_dir().join("sudoku_format_save_test.csv");
        assert!(matches!(
            save_file(&easy_grid(), BoardFormat::Grid, &path),
            Err(SudokuError::FormatError(_))
        ));
        assert!(matches!(
            parse_file(&path, BoardFormat::Grid),
            Err(SudokuError::FormatError(_))
        ));
    }

    #[test]
    fn format_parses_from_str() {
        assert_eq!("grid".parse::<BoardFormat>().unwrap(), BoardFormat::Grid);
        assert_eq!("flat".parse::<BoardFormat>().unwrap(), BoardFormat::Flat);
        assert!(matches!(
            "json".parse::<BoardFormat>(),
            Err(SudokuError::UnsupportedFormat(_))
        ));
    }
}
