//! Candidate assignments over a puzzle's free cells.

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use thiserror::Error;

use super::conflicts::count_conflicts;
use super::puzzle::{write_grid, Puzzle, Value};

/// Errors raised when building or editing a [`Candidate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CandidateError {
    #[error("expected {expected} values, got {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("value {value} out of range 1..={max}")]
    ValueOutOfRange { value: Value, max: usize },

    #[error("cell ({row}, {col}) is fixed by the puzzle")]
    FixedCell { row: usize, col: usize },

    #[error("cell ({row}, {col}) is outside a {size}x{size} grid")]
    OutOfBounds { row: usize, col: usize, size: usize },
}

/// A value for every free cell of a shared [`Puzzle`].
///
/// `values[i]` belongs to `puzzle.free_cells()[i]`. Fixed cells are read
/// from the puzzle and can never be edited through a candidate. Cloning
/// copies the values and shares the puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    puzzle: Arc<Puzzle>,
    values: Vec<Value>,
}

impl Candidate {
    /// Balanced random assignment.
    ///
    /// Fills the free cells with exactly the values needed for every value
    /// `1..=N` to appear `N` times in the whole grid, in random order.
    /// Rows, columns and blocks are not balanced.
    pub fn random<R: Rng>(puzzle: Arc<Puzzle>, rng: &mut R) -> Self {
        let n = puzzle.size();
        let given = puzzle.given_counts();

        let mut values = Vec::with_capacity(puzzle.free_count());
        for value in 1..=n {
            let missing = n.saturating_sub(given[value]);
            values.extend(std::iter::repeat_n(value as Value, missing));
        }
        u_numflow::random::shuffle(&mut values, rng);

        Self { puzzle, values }
    }

    /// Independent uniform value in `1..=N` for every free cell.
    pub fn uniform<R: Rng>(puzzle: Arc<Puzzle>, rng: &mut R) -> Self {
        let n = puzzle.size() as Value;
        let values = (0..puzzle.free_count())
            .map(|_| rng.random_range(1..=n))
            .collect();
        Self { puzzle, values }
    }

    /// Explicit assignment, one value per free cell in row-major order.
    pub fn with_values(puzzle: Arc<Puzzle>, values: Vec<Value>) -> Result<Self, CandidateError> {
        if values.len() != puzzle.free_count() {
            return Err(CandidateError::LengthMismatch {
                expected: puzzle.free_count(),
                found: values.len(),
            });
        }
        let max = puzzle.size();
        if let Some(&value) = values.iter().find(|&&v| v == 0 || v as usize > max) {
            return Err(CandidateError::ValueOutOfRange { value, max });
        }
        Ok(Self { puzzle, values })
    }

    pub fn puzzle(&self) -> &Arc<Puzzle> {
        &self.puzzle
    }

    /// The assignment sequence.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value of a cell: the given value if fixed, else the assigned one.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are out of bounds.
    pub fn value_at(&self, row: usize, col: usize) -> Value {
        match self.puzzle.free_index(row, col) {
            Some(index) => self.values[index],
            None => self.puzzle.given(row, col),
        }
    }

    pub fn row(&self, row: usize) -> Vec<Value> {
        (0..self.puzzle.size())
            .map(|col| self.value_at(row, col))
            .collect()
    }

    pub fn column(&self, col: usize) -> Vec<Value> {
        (0..self.puzzle.size())
            .map(|row| self.value_at(row, col))
            .collect()
    }

    /// The k² values of block `(block_row, block_col)`, row by row.
    pub fn block(&self, block_row: usize, block_col: usize) -> Vec<Value> {
        let k = self.puzzle.block_size();
        let mut values = Vec::with_capacity(k * k);
        for row in block_row * k..(block_row + 1) * k {
            for col in block_col * k..(block_col + 1) * k {
                values.push(self.value_at(row, col));
            }
        }
        values
    }

    /// The complete grid with free cells filled in.
    pub fn full_grid(&self) -> Vec<Vec<Value>> {
        let mut grid = self.puzzle.rows();
        for (&(row, col), &value) in self.puzzle.free_cells().iter().zip(&self.values) {
            grid[row][col] = value;
        }
        grid
    }

    /// Assigns a free cell.
    pub fn set_value(
        &mut self,
        row: usize,
        col: usize,
        value: Value,
    ) -> Result<(), CandidateError> {
        let size = self.puzzle.size();
        if row >= size || col >= size {
            return Err(CandidateError::OutOfBounds { row, col, size });
        }
        if value == 0 || value as usize > size {
            return Err(CandidateError::ValueOutOfRange { value, max: size });
        }
        let index = self
            .puzzle
            .free_index(row, col)
            .ok_or(CandidateError::FixedCell { row, col })?;
        self.values[index] = value;
        Ok(())
    }

    /// Swaps two entries of the assignment sequence.
    ///
    /// # Panics
    ///
    /// Panics if either index is not below the free cell count.
    pub fn swap(&mut self, i: usize, j: usize) {
        self.values.swap(i, j);
    }

    /// A copy with the values of two distinct random free cells swapped.
    ///
    /// With fewer than two free cells the copy is unchanged. The multiset
    /// of assigned values is always preserved.
    pub fn neighbor<R: Rng>(&self, rng: &mut R) -> Self {
        let mut neighbor = self.clone();
        let m = self.values.len();
        if m < 2 {
            return neighbor;
        }
        let i = rng.random_range(0..m);
        let mut j = rng.random_range(0..m - 1);
        if j >= i {
            j += 1;
        }
        neighbor.swap(i, j);
        neighbor
    }

    /// Total row/column/block conflicts.
    pub fn conflicts(&self) -> usize {
        count_conflicts(self)
    }

    pub fn is_solved(&self) -> bool {
        self.conflicts() == 0
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_grid(f, &self.full_grid())
    }
}
