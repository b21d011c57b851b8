//! Sudoku as an annealing problem.

use std::sync::Arc;

use rand::Rng;

use super::candidate::Candidate;
use super::puzzle::Puzzle;
use crate::sa::SaProblem;

/// Conflict minimization over a shared puzzle.
///
/// Solutions are balanced random candidates; the neighborhood swaps the
/// values of two free cells; the cost is the conflict count and the
/// search stops once it reaches zero.
#[derive(Debug, Clone)]
pub struct SudokuProblem {
    puzzle: Arc<Puzzle>,
}

impl SudokuProblem {
    pub fn new(puzzle: impl Into<Arc<Puzzle>>) -> Self {
        Self {
            puzzle: puzzle.into(),
        }
    }

    pub fn puzzle(&self) -> &Arc<Puzzle> {
        &self.puzzle
    }
}

impl SaProblem for SudokuProblem {
    type Solution = Candidate;

    fn size(&self) -> usize {
        self.puzzle.size()
    }

    fn initial_solution<R: Rng>(&self, rng: &mut R) -> Candidate {
        Candidate::random(Arc::clone(&self.puzzle), rng)
    }

    fn cost(&self, solution: &Candidate) -> f64 {
        solution.conflicts() as f64
    }

    fn neighbor<R: Rng>(&self, solution: &Candidate, rng: &mut R) -> Candidate {
        solution.neighbor(rng)
    }

    fn target_cost(&self) -> Option<f64> {
        Some(0.0)
    }
}
