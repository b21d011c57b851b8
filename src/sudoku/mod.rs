//! Sudoku by simulated annealing.
//!
//! A [`Puzzle`] is parsed once and shared. A [`Candidate`] assigns a value
//! to every free cell; its fitness is the number of duplicate values over
//! all rows, columns and blocks. [`SudokuProblem`] plugs candidates into
//! the generic [`sa`](crate::sa) engine, and [`SudokuSolver`] drives a run
//! from a puzzle to a [`SudokuReport`].
//!
//! # Examples
//!
//! ```
//! use u_anneal::sa::SaConfig;
//! use u_anneal::sudoku::{Puzzle, SudokuConfig, SudokuSolver};
//!
//! let puzzle: Puzzle = "1 0 0 4\n0 4 1 0\n2 0 0 3\n0 3 2 0".parse().unwrap();
//! let config = SudokuConfig::default()
//!     .with_annealing(SaConfig::default().with_max_iterations(10_000).with_seed(42));
//!
//! let report = SudokuSolver::new(puzzle, config).solve().unwrap();
//! assert!(report.is_solved());
//! ```

mod candidate;
mod conflicts;
mod problem;
mod puzzle;
mod solver;

pub use candidate::{Candidate, CandidateError};
pub use conflicts::{count_conflicts, grid_conflicts, group_conflicts};
pub use problem::SudokuProblem;
pub use puzzle::{Puzzle, PuzzleError, Value};
pub use solver::{SolveError, SudokuConfig, SudokuReport, SudokuSolver};
