//! Sudoku driver: initial temperature, annealing run, report.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rand::Rng;
use thiserror::Error;
use tracing::info;
use u_numflow::random::create_rng;

use super::candidate::Candidate;
use super::problem::SudokuProblem;
use super::puzzle::{Puzzle, PuzzleError, Value};
use crate::sa::{RunState, SaConfig, SaError, SaProblem, SaRunner};

/// Errors surfaced by [`SudokuSolver`].
#[derive(Debug, Error)]
pub enum SolveError {
    #[error(transparent)]
    Puzzle(#[from] PuzzleError),

    #[error(transparent)]
    Config(#[from] SaError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "serde")]
    #[error("invalid configuration file: {0}")]
    ConfigFile(#[from] toml::de::Error),
}

/// Run configuration for [`SudokuSolver`].
///
/// `annealing.initial_temperature` is replaced at run time: by
/// `initial_temperature` if set, otherwise by `temperature_ratio` times
/// the conflict count of one balanced random candidate.
///
/// # Examples
///
/// ```
/// use u_anneal::sa::CoolingSchedule;
/// use u_anneal::sudoku::SudokuConfig;
///
/// let config = SudokuConfig::default()
///     .with_cooling(CoolingSchedule::slow())
///     .with_seed(42);
/// assert_eq!(config.annealing.max_iterations, 250_000);
/// assert_eq!(config.temperature_ratio, 0.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SudokuConfig {
    /// Fixed initial temperature; sampled when `None`.
    pub initial_temperature: Option<f64>,

    /// Fraction of a random candidate's conflicts used as initial temperature.
    pub temperature_ratio: f64,

    /// Annealing parameters.
    pub annealing: SaConfig,
}

impl Default for SudokuConfig {
    fn default() -> Self {
        Self {
            initial_temperature: None,
            temperature_ratio: 0.5,
            annealing: SaConfig::default(),
        }
    }
}

impl SudokuConfig {
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = Some(t);
        self
    }

    pub fn with_temperature_ratio(mut self, ratio: f64) -> Self {
        self.temperature_ratio = ratio;
        self
    }

    pub fn with_annealing(mut self, annealing: SaConfig) -> Self {
        self.annealing = annealing;
        self
    }

    pub fn with_cooling(mut self, cooling: crate::sa::CoolingSchedule) -> Self {
        self.annealing.cooling = cooling;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.annealing.seed = Some(seed);
        self
    }

    /// Parses a TOML document; missing keys take their defaults.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(s: &str) -> Result<Self, SolveError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads a TOML configuration file.
    #[cfg(feature = "serde")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SolveError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SolveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

/// Outcome of a solver run.
#[derive(Debug, Clone)]
pub struct SudokuReport {
    /// Best candidate found.
    pub solution: Candidate,

    /// Its conflict count; `0` means solved.
    pub conflicts: usize,

    /// Iterations consumed.
    pub iterations: usize,

    /// Why the run stopped.
    pub state: RunState,

    pub initial_temperature: f64,
    pub final_temperature: f64,
}

impl SudokuReport {
    pub fn is_solved(&self) -> bool {
        self.conflicts == 0
    }

    pub fn grid(&self) -> Vec<Vec<Value>> {
        self.solution.full_grid()
    }
}

/// Solves one puzzle by simulated annealing.
pub struct SudokuSolver {
    problem: SudokuProblem,
    config: SudokuConfig,
}

impl SudokuSolver {
    pub fn new(puzzle: impl Into<Arc<Puzzle>>, config: SudokuConfig) -> Self {
        Self {
            problem: SudokuProblem::new(puzzle),
            config,
        }
    }

    /// Loads the puzzle file before any search starts.
    pub fn from_file(path: impl AsRef<Path>, config: SudokuConfig) -> Result<Self, SolveError> {
        let puzzle = Puzzle::from_file(path)?;
        Ok(Self::new(puzzle, config))
    }

    pub fn puzzle(&self) -> &Arc<Puzzle> {
        self.problem.puzzle()
    }

    pub fn config(&self) -> &SudokuConfig {
        &self.config
    }

    /// Initial temperature for a run drawing from `rng`.
    ///
    /// A sampled temperature that does not exceed the floor (the sample was
    /// already conflict-free) falls back to `max(1, 2 * floor)`. An explicit
    /// temperature is used as given.
    pub fn initial_temperature<R: Rng>(&self, rng: &mut R) -> f64 {
        if let Some(t) = self.config.initial_temperature {
            return t;
        }
        let floor = self.config.annealing.min_temperature;
        let sample = self.problem.initial_solution(rng);
        let t0 = self.config.temperature_ratio * self.problem.cost(&sample);
        if t0 > floor {
            t0
        } else {
            (2.0 * floor).max(1.0)
        }
    }

    pub fn solve(&self) -> Result<SudokuReport, SolveError> {
        self.solve_with_cancel(None)
    }

    /// Runs one annealing; the seed drives both temperature sampling and search.
    pub fn solve_with_cancel(
        &self,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SudokuReport, SolveError> {
        self.solve_seeded(self.config.annealing.seed, cancel)
    }

    /// Runs `runs` independent annealings, one report each.
    ///
    /// With a configured seed `s`, run `i` uses seed `s + i`, so the whole
    /// batch is reproducible; otherwise every run draws a fresh seed.
    pub fn solve_runs(&self, runs: usize) -> Result<Vec<SudokuReport>, SolveError> {
        let mut reports = Vec::with_capacity(runs);
        for run in 0..runs {
            let seed = self
                .config
                .annealing
                .seed
                .map(|seed| seed.wrapping_add(run as u64));
            let report = self.solve_seeded(seed, None)?;
            info!(
                event = "run_end",
                run,
                conflicts = report.conflicts,
                iterations = report.iterations,
                state = %report.state,
            );
            reports.push(report);
        }
        Ok(reports)
    }

    fn solve_seeded(
        &self,
        seed: Option<u64>,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SudokuReport, SolveError> {
        let mut rng = match seed {
            Some(seed) => create_rng(seed),
            None => create_rng(rand::random()),
        };

        let initial_temperature = self.initial_temperature(&mut rng);
        let annealing = self
            .config
            .annealing
            .clone()
            .with_initial_temperature(initial_temperature);

        let puzzle = self.problem.puzzle();
        info!(
            event = "solve_start",
            size = puzzle.size(),
            free_cells = puzzle.free_count(),
            initial_temperature,
        );

        let result = SaRunner::run_with_rng(&self.problem, &annealing, rng, cancel)?;
        let conflicts = result.best.conflicts();

        info!(
            event = "solve_end",
            state = %result.state,
            conflicts,
            iterations = result.iterations,
        );

        Ok(SudokuReport {
            solution: result.best,
            conflicts,
            iterations: result.iterations,
            state: result.state,
            initial_temperature,
            final_temperature: result.final_temperature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sa::CoolingSchedule;

    const FOUR: &str = "1 0 0 4\n0 4 1 0\n2 0 0 3\n0 3 2 0";

    fn four_config(seed: u64) -> SudokuConfig {
        SudokuConfig::default().with_annealing(
            SaConfig::default()
                .with_cooling(CoolingSchedule::Geometric { alpha: 0.85 })
                .with_trials_factor(2.0)
                .with_trial_growth(1.15)
                .with_max_iterations(10_000)
                .with_seed(seed),
        )
    }

    #[test]
    fn test_solves_four_by_four() {
        let puzzle: Puzzle = FOUR.parse().unwrap();
        let solver = SudokuSolver::new(puzzle, four_config(42));
        let report = solver.solve().unwrap();

        assert!(report.is_solved(), "conflicts left: {}", report.conflicts);
        assert_eq!(report.state, RunState::Converged);
        assert!(report.iterations <= 10_000);
        assert_eq!(
            report.grid(),
            vec![
                vec![1, 2, 3, 4],
                vec![3, 4, 1, 2],
                vec![2, 1, 4, 3],
                vec![4, 3, 2, 1],
            ]
        );
    }

    #[test]
    fn test_same_seed_same_run() {
        let puzzle: Arc<Puzzle> = Arc::new(FOUR.parse().unwrap());
        let a = SudokuSolver::new(puzzle.clone(), four_config(9))
            .solve()
            .unwrap();
        let b = SudokuSolver::new(puzzle, four_config(9)).solve().unwrap();
        assert_eq!(a.iterations, b.iterations);
        assert_eq!(a.solution, b.solution);
        assert_eq!(a.initial_temperature, b.initial_temperature);
    }

    #[test]
    fn test_complete_grid_converges_immediately() {
        let puzzle: Puzzle = "1 2 3 4\n3 4 1 2\n2 1 4 3\n4 3 2 1".parse().unwrap();
        let report = SudokuSolver::new(puzzle, four_config(1)).solve().unwrap();

        assert!(report.is_solved());
        assert_eq!(report.state, RunState::Converged);
        assert_eq!(report.iterations, 0);
        assert!(report.initial_temperature > 0.0);
    }

    #[test]
    fn test_fixed_cells_survive_the_run() {
        let puzzle: Puzzle = "\
0 5 2 0 0 0 0 1 4
8 0 1 0 9 0 2 0 0
0 0 7 4 0 0 0 8 9
1 2 0 0 8 0 6 3 0
0 0 0 1 0 6 0 0 0
0 6 4 0 7 0 0 5 8
5 1 0 0 0 7 4 0 0
0 0 6 0 5 0 7 0 1
2 7 0 0 0 0 8 9 0"
            .parse()
            .unwrap();
        let annealing = SaConfig::default().with_max_iterations(2_000).with_seed(5);
        let config = SudokuConfig::default().with_annealing(annealing);
        let solver = SudokuSolver::new(puzzle, config);
        let report = solver.solve().unwrap();

        let grid = report.grid();
        let puzzle = solver.puzzle();
        for row in 0..9 {
            for col in 0..9 {
                if puzzle.is_fixed(row, col) {
                    assert_eq!(grid[row][col], puzzle.given(row, col));
                }
            }
        }
        assert_eq!(report.conflicts, report.solution.conflicts());
        if report.state == RunState::Exhausted {
            assert!(report.iterations >= 2_000);
        }
    }

    #[test]
    fn test_repeated_runs_follow_consecutive_seeds() {
        let puzzle: Arc<Puzzle> = Arc::new(FOUR.parse().unwrap());
        let solver = SudokuSolver::new(puzzle.clone(), four_config(20));
        let reports = solver.solve_runs(3).unwrap();

        assert_eq!(reports.len(), 3);
        for (i, report) in reports.iter().enumerate() {
            let single = SudokuSolver::new(puzzle.clone(), four_config(20 + i as u64))
                .solve()
                .unwrap();
            assert_eq!(report.iterations, single.iterations);
            assert_eq!(report.solution, single.solution);
            assert!(report.is_solved());
        }
        assert!(solver.solve_runs(0).unwrap().is_empty());
    }

    #[test]
    fn test_explicit_initial_temperature() {
        let puzzle: Puzzle = FOUR.parse().unwrap();
        let solver = SudokuSolver::new(puzzle, four_config(3).with_initial_temperature(7.5));
        let mut rng = create_rng(0);
        assert_eq!(solver.initial_temperature(&mut rng), 7.5);
    }

    #[test]
    fn test_invalid_annealing_config_is_reported() {
        let puzzle: Puzzle = FOUR.parse().unwrap();
        let config = four_config(1).with_cooling(CoolingSchedule::Geometric { alpha: 1.0 });
        let err = SudokuSolver::new(puzzle, config).solve().unwrap_err();
        assert!(matches!(err, SolveError::Config(SaError::Alpha { .. })));
    }

    #[test]
    fn test_missing_puzzle_file() {
        let err = SudokuSolver::from_file("/no/such/puzzle.txt", SudokuConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, SolveError::Puzzle(PuzzleError::Io { .. })));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_from_toml() {
        let config = SudokuConfig::from_toml_str(
            r#"
            temperature_ratio = 0.25

            [annealing]
            max_iterations = 5000
            seed = 3

            [annealing.cooling]
            type = "slow"
            alpha = 0.001
            "#,
        )
        .unwrap();

        assert_eq!(config.temperature_ratio, 0.25);
        assert_eq!(config.initial_temperature, None);
        assert_eq!(config.annealing.max_iterations, 5000);
        assert_eq!(config.annealing.seed, Some(3));
        assert_eq!(
            config.annealing.cooling,
            CoolingSchedule::Slow { alpha: 0.001 }
        );
        assert_eq!(config.annealing.trial_growth, 1.15);
    }
}
