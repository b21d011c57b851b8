//! Puzzle grids: parsing, validation and the free-cell index.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

/// A cell value. `0` marks an undetermined cell.
pub type Value = u16;

/// Errors raised while loading a puzzle.
#[derive(Debug, Error)]
pub enum PuzzleError {
    #[error("failed to read puzzle file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("puzzle is empty")]
    Empty,

    #[error("line {line}: `{token}` is not a cell value")]
    InvalidToken { line: usize, token: String },

    #[error("row {row} has {found} cells, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("grid side {0} is not a perfect square")]
    NotPerfectSquare(usize),

    #[error("cell ({row}, {col}) holds {value}, expected 0..={max}")]
    ValueOutOfRange {
        row: usize,
        col: usize,
        value: Value,
        max: usize,
    },

    #[error("value {value} is given {count} times, at most {max} allowed")]
    ValueOverflow {
        value: Value,
        count: usize,
        max: usize,
    },
}

/// An N×N Sudoku instance with N = k².
///
/// Immutable once built. The free (zero) cells are enumerated in
/// row-major order; that enumeration is the index space every
/// [`Candidate`](super::Candidate) of this puzzle assigns values to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    grid: Vec<Value>,
    size: usize,
    block_size: usize,
    free_cells: Vec<(usize, usize)>,
    free_index: Vec<Option<usize>>,
}

impl Puzzle {
    /// Builds a puzzle from its rows.
    pub fn new(rows: Vec<Vec<Value>>) -> Result<Self, PuzzleError> {
        let size = rows.len();
        if size == 0 {
            return Err(PuzzleError::Empty);
        }
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != size {
                return Err(PuzzleError::RowLength {
                    row,
                    expected: size,
                    found: cells.len(),
                });
            }
        }

        let block_size = (size as f64).sqrt().round() as usize;
        if block_size * block_size != size {
            return Err(PuzzleError::NotPerfectSquare(size));
        }

        let mut counts = vec![0usize; size + 1];
        for (row, cells) in rows.iter().enumerate() {
            for (col, &value) in cells.iter().enumerate() {
                if value as usize > size {
                    return Err(PuzzleError::ValueOutOfRange {
                        row,
                        col,
                        value,
                        max: size,
                    });
                }
                counts[value as usize] += 1;
            }
        }
        if let Some((value, &count)) = counts
            .iter()
            .enumerate()
            .skip(1)
            .find(|&(_, &count)| count > size)
        {
            return Err(PuzzleError::ValueOverflow {
                value: value as Value,
                count,
                max: size,
            });
        }

        let grid: Vec<Value> = rows.into_iter().flatten().collect();
        let mut free_cells = Vec::new();
        let mut free_index = vec![None; size * size];
        for (cell, &value) in grid.iter().enumerate() {
            if value == 0 {
                free_index[cell] = Some(free_cells.len());
                free_cells.push((cell / size, cell % size));
            }
        }

        Ok(Self {
            grid,
            size,
            block_size,
            free_cells,
            free_index,
        })
    }

    /// Reads a puzzle from a text file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PuzzleError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PuzzleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    /// Grid side N.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Block side k.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// The given value of a cell, `0` if the cell is free.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    pub fn given(&self, row: usize, col: usize) -> Value {
        self.grid[row * self.size + col]
    }

    pub fn is_fixed(&self, row: usize, col: usize) -> bool {
        self.given(row, col) != 0
    }

    /// Free cells in row-major order.
    pub fn free_cells(&self) -> &[(usize, usize)] {
        &self.free_cells
    }

    pub fn free_count(&self) -> usize {
        self.free_cells.len()
    }

    /// Position of a free cell in the assignment sequence.
    ///
    /// `None` for fixed or out-of-bounds cells.
    pub fn free_index(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.size || col >= self.size {
            return None;
        }
        self.free_index[row * self.size + col]
    }

    /// How many times each value is given; index 0 counts free cells.
    pub fn given_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.size + 1];
        for &value in &self.grid {
            counts[value as usize] += 1;
        }
        counts
    }

    /// The puzzle as rows, free cells as `0`.
    pub fn rows(&self) -> Vec<Vec<Value>> {
        self.grid.chunks(self.size).map(Vec::from).collect()
    }
}

impl FromStr for Puzzle {
    type Err = PuzzleError;

    /// Whitespace-separated integers, one row per non-empty line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rows = Vec::new();
        for (line_no, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let row = line
                .split_whitespace()
                .map(|token| {
                    token.parse::<Value>().map_err(|_| PuzzleError::InvalidToken {
                        line: line_no + 1,
                        token: token.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }
        Puzzle::new(rows)
    }
}

/// Renders in the same format [`FromStr`] accepts.
impl fmt::Display for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_grid(f, &self.rows())
    }
}

pub(crate) fn write_grid(f: &mut fmt::Formatter<'_>, rows: &[Vec<Value>]) -> fmt::Result {
    let width = rows.len().to_string().len();
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            writeln!(f)?;
        }
        for (j, value) in row.iter().enumerate() {
            if j > 0 {
                write!(f, " ")?;
            }
            write!(f, "{value:>width$}")?;
        }
    }
    Ok(())
}
