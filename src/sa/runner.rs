//! SA execution loop.
//!
//! # Algorithm
//!
//! 1. Generate an initial solution; it is both current and best
//! 2. At each temperature level, run `N_trials` trials:
//!    a. Generate a neighbor and evaluate it
//!    b. Accept it by the Metropolis criterion
//!    c. Update the best solution if improved
//!    d. Stop the level as soon as the target cost is reached
//! 3. Cool the temperature and grow `N_trials` by the growth factor
//! 4. Repeat while `T > T_min`, the target is not reached and the
//!    iteration budget is not consumed

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info};
use u_numflow::random::create_rng;

use super::config::{SaConfig, SaError};
use super::types::SaProblem;

/// Best cost is recorded into the history every this many iterations.
const HISTORY_INTERVAL: usize = 100;

/// State of an annealing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// The outer loop continues.
    Running,
    /// The best cost reached the problem's target cost.
    Converged,
    /// The iteration budget was consumed.
    Exhausted,
    /// The temperature fell to or below the floor.
    Frozen,
    /// Stopped by an external cancellation flag.
    Cancelled,
}

impl RunState {
    /// Whether the run has stopped.
    pub fn is_terminal(self) -> bool {
        self != RunState::Running
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Running => "running",
            RunState::Converged => "converged",
            RunState::Exhausted => "exhausted",
            RunState::Frozen => "frozen",
            RunState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Outcome of a single inner-loop trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Keep going.
    Continue,
    /// The best cost reached the target; no further trials are needed.
    Converged,
}

/// Metropolis acceptance criterion.
///
/// Non-worsening moves (`delta <= 0`) are always accepted, whatever the
/// draw. A worsening move is accepted iff `draw < exp(-delta / T)`, where
/// `draw` is uniform in `[0, 1)`.
pub fn metropolis_accept(delta: f64, temperature: f64, draw: f64) -> bool {
    if delta <= 0.0 {
        return true;
    }
    if temperature <= 0.0 {
        return false;
    }
    draw < (-delta / temperature).exp()
}

/// Result of a Simulated Annealing run.
#[derive(Debug, Clone)]
pub struct SaResult<S: Clone> {
    /// The best solution found.
    pub best: S,

    /// Cost of the best solution.
    pub best_cost: f64,

    /// Total number of iterations (neighbor evaluations).
    pub iterations: usize,

    /// Final temperature when the algorithm stopped.
    pub final_temperature: f64,

    /// Number of accepted moves (including improvements).
    pub accepted_moves: usize,

    /// Number of improving moves.
    pub improving_moves: usize,

    /// Why the run stopped.
    pub state: RunState,

    /// Best cost sampled at regular intervals for history tracking.
    pub cost_history: Vec<f64>,
}

impl<S: Clone> SaResult<S> {
    /// Whether the run reached the problem's target cost.
    pub fn converged(&self) -> bool {
        self.state == RunState::Converged
    }
}

/// Explicit annealing state machine.
///
/// Owns the cooling state (temperature, trial count, iteration counter)
/// and the current/best solutions for one run. [`SaRunner`] drives it;
/// it can also be stepped by hand.
pub struct Annealer<'a, P: SaProblem, R: Rng> {
    problem: &'a P,
    config: &'a SaConfig,
    rng: R,
    target: Option<f64>,

    current: P::Solution,
    current_cost: f64,
    best: P::Solution,
    best_cost: f64,

    temperature: f64,
    trials: usize,
    level: usize,
    iteration: usize,
    accepted_moves: usize,
    improving_moves: usize,
    cost_history: Vec<f64>,
}

impl<'a, P: SaProblem, R: Rng> Annealer<'a, P, R> {
    /// Validates `config`, seeds a fresh solution and enters `Running`.
    pub fn new(problem: &'a P, config: &'a SaConfig, mut rng: R) -> Result<Self, SaError> {
        config.validate()?;

        let current = problem.initial_solution(&mut rng);
        let current_cost = problem.cost(&current);
        let best = current.clone();

        Ok(Self {
            problem,
            config,
            rng,
            target: problem.target_cost(),
            current,
            current_cost,
            best,
            best_cost: current_cost,
            temperature: config.initial_temperature,
            trials: config.initial_trials(problem.size()),
            level: 0,
            iteration: 0,
            accepted_moves: 0,
            improving_moves: 0,
            cost_history: vec![current_cost],
        })
    }

    /// Evaluates the outer-loop guard.
    pub fn state(&self) -> RunState {
        if self.target_reached() {
            RunState::Converged
        } else if self.budget_exhausted() {
            RunState::Exhausted
        } else if self.temperature <= self.config.min_temperature {
            RunState::Frozen
        } else {
            RunState::Running
        }
    }

    /// Runs one inner-loop trial.
    pub fn step(&mut self) -> StepOutcome {
        let neighbor = self.problem.neighbor(&self.current, &mut self.rng);
        let neighbor_cost = self.problem.cost(&neighbor);
        let delta = neighbor_cost - self.current_cost;

        // Only worsening moves consume a draw.
        let draw = if delta > 0.0 {
            self.rng.random::<f64>()
        } else {
            0.0
        };

        if delta < 0.0 {
            self.improving_moves += 1;
        }

        if metropolis_accept(delta, self.temperature, draw) {
            self.current = neighbor;
            self.current_cost = neighbor_cost;
            self.accepted_moves += 1;

            if self.current_cost < self.best_cost {
                self.best = self.current.clone();
                self.best_cost = self.current_cost;
            }
        }

        self.iteration += 1;
        if self.iteration.is_multiple_of(HISTORY_INTERVAL) {
            self.cost_history.push(self.best_cost);
        }

        if self.target_reached() {
            StepOutcome::Converged
        } else {
            StepOutcome::Continue
        }
    }

    /// Runs the inner loop of the current temperature level.
    ///
    /// Stops early only when the target is reached. The iteration budget
    /// is checked between levels, so a level may run past it.
    pub fn run_level(&mut self) -> StepOutcome {
        for _ in 0..self.trials {
            if self.step() == StepOutcome::Converged {
                return StepOutcome::Converged;
            }
        }
        StepOutcome::Continue
    }

    /// Moves to the next temperature level.
    pub fn cool(&mut self) {
        self.temperature = self.config.cooling.next_temperature(self.temperature);
        self.trials = ((self.trials as f64 * self.config.trial_growth).floor() as usize).max(1);
        self.level += 1;
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Trial count of the current level.
    pub fn trials(&self) -> usize {
        self.trials
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn current_cost(&self) -> f64 {
        self.current_cost
    }

    pub fn best_cost(&self) -> f64 {
        self.best_cost
    }

    pub fn best(&self) -> &P::Solution {
        &self.best
    }

    /// Consumes the annealer into a result tagged with `state`.
    pub fn into_result(mut self, state: RunState) -> SaResult<P::Solution> {
        if self
            .cost_history
            .last()
            .is_none_or(|&last| (last - self.best_cost).abs() > 1e-15)
        {
            self.cost_history.push(self.best_cost);
        }

        SaResult {
            best: self.best,
            best_cost: self.best_cost,
            iterations: self.iteration,
            final_temperature: self.temperature,
            accepted_moves: self.accepted_moves,
            improving_moves: self.improving_moves,
            state,
            cost_history: self.cost_history,
        }
    }

    fn target_reached(&self) -> bool {
        self.target.is_some_and(|target| self.best_cost <= target)
    }

    fn budget_exhausted(&self) -> bool {
        self.config.max_iterations > 0 && self.iteration >= self.config.max_iterations
    }
}

/// Executes the Simulated Annealing algorithm.
pub struct SaRunner;

impl SaRunner {
    /// Runs SA optimization.
    pub fn run<P: SaProblem>(
        problem: &P,
        config: &SaConfig,
    ) -> Result<SaResult<P::Solution>, SaError> {
        Self::run_with_cancel(problem, config, None)
    }

    /// Runs SA with an optional cancellation token.
    ///
    /// The flag is checked once per temperature level.
    pub fn run_with_cancel<P: SaProblem>(
        problem: &P,
        config: &SaConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SaResult<P::Solution>, SaError> {
        let rng = match config.seed {
            Some(seed) => create_rng(seed),
            None => create_rng(rand::random()),
        };
        Self::run_with_rng(problem, config, rng, cancel)
    }

    /// Runs SA drawing every random decision from `rng`.
    ///
    /// `config.seed` is ignored.
    pub fn run_with_rng<P: SaProblem, R: Rng>(
        problem: &P,
        config: &SaConfig,
        rng: R,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SaResult<P::Solution>, SaError> {
        let mut annealer = Annealer::new(problem, config, rng)?;

        info!(
            event = "anneal_start",
            cooling = %config.cooling,
            temperature = annealer.temperature(),
            trials = annealer.trials(),
            cost = annealer.best_cost(),
        );

        let state = loop {
            let state = annealer.state();
            if state.is_terminal() {
                break state;
            }
            if cancel
                .as_ref()
                .is_some_and(|flag| flag.load(Ordering::Relaxed))
            {
                break RunState::Cancelled;
            }

            let outcome = annealer.run_level();

            debug!(
                event = "level_end",
                level = annealer.level(),
                temperature = annealer.temperature(),
                trials = annealer.trials(),
                iteration = annealer.iteration(),
                current_cost = annealer.current_cost(),
                best_cost = annealer.best_cost(),
                converged = outcome == StepOutcome::Converged,
            );

            // A converged level still cools; the guard then reports it.
            annealer.cool();
        };

        info!(
            event = "anneal_end",
            state = %state,
            best_cost = annealer.best_cost(),
            iterations = annealer.iteration(),
            temperature = annealer.temperature(),
        );

        Ok(annealer.into_result(state))
    }

    /// Runs one independent annealing per seed in parallel and keeps the
    /// result with the lowest best cost.
    #[cfg(feature = "parallel")]
    pub fn run_portfolio<P: SaProblem>(
        problem: &P,
        config: &SaConfig,
        seeds: &[u64],
    ) -> Result<SaResult<P::Solution>, SaError> {
        use rayon::prelude::*;

        config.validate()?;

        let results = seeds
            .par_iter()
            .map(|&seed| Self::run(problem, &config.clone().with_seed(seed)))
            .collect::<Result<Vec<_>, _>>()?;

        results
            .into_iter()
            .min_by(|a, b| a.best_cost.total_cmp(&b.best_cost))
            .ok_or(SaError::EmptyPortfolio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sa::CoolingSchedule;
    use rand::RngCore;

    // ---- Quadratic minimization: f(x) = x^2, minimum at 0 ----

    struct QuadraticProblem;

    impl SaProblem for QuadraticProblem {
        type Solution = f64;

        fn size(&self) -> usize {
            25
        }

        fn initial_solution<R: Rng>(&self, rng: &mut R) -> f64 {
            rng.random_range(-10.0..10.0)
        }

        fn cost(&self, x: &f64) -> f64 {
            x * x
        }

        fn neighbor<R: Rng>(&self, x: &f64, rng: &mut R) -> f64 {
            x + rng.random_range(-1.0..1.0)
        }
    }

    // ---- Discrete: permutation sorting with a known optimum ----

    struct PermSortProblem {
        n: usize,
    }

    impl SaProblem for PermSortProblem {
        type Solution = Vec<usize>;

        fn size(&self) -> usize {
            self.n
        }

        fn initial_solution<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
            let mut perm: Vec<usize> = (0..self.n).collect();
            u_numflow::random::shuffle(&mut perm, rng);
            perm
        }

        fn cost(&self, perm: &Vec<usize>) -> f64 {
            perm.iter().enumerate().filter(|&(i, &v)| i != v).count() as f64
        }

        fn neighbor<R: Rng>(&self, perm: &Vec<usize>, rng: &mut R) -> Vec<usize> {
            let mut new = perm.clone();
            let i = rng.random_range(0..self.n);
            let j = rng.random_range(0..self.n);
            new.swap(i, j);
            new
        }

        fn target_cost(&self) -> Option<f64> {
            Some(0.0)
        }
    }

    /// Every move has the same cost.
    struct FlatProblem;

    impl SaProblem for FlatProblem {
        type Solution = u32;

        fn size(&self) -> usize {
            5
        }

        fn initial_solution<R: Rng>(&self, _rng: &mut R) -> u32 {
            0
        }

        fn cost(&self, _x: &u32) -> f64 {
            1.0
        }

        fn neighbor<R: Rng>(&self, x: &u32, _rng: &mut R) -> u32 {
            x + 1
        }
    }

    /// Always draws the largest value; `random::<f64>()` is just below 1.
    struct MaxRng;

    impl RngCore for MaxRng {
        fn next_u32(&mut self) -> u32 {
            u32::MAX
        }

        fn next_u64(&mut self) -> u64 {
            u64::MAX
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0xff);
        }
    }

    #[test]
    fn test_metropolis_non_worsening_always_accepted() {
        let draw = 1.0 - f64::EPSILON;
        assert!(metropolis_accept(0.0, 1e-9, draw));
        assert!(metropolis_accept(-3.0, 1e-9, draw));
        assert!(metropolis_accept(0.0, 0.0, draw));
    }

    #[test]
    fn test_metropolis_worsening() {
        // exp(-1) ~ 0.3679
        assert!(metropolis_accept(1.0, 1.0, 0.36));
        assert!(!metropolis_accept(1.0, 1.0, 0.37));
        assert!(!metropolis_accept(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_equal_moves_accepted_with_near_one_draw() {
        let config = SaConfig::default()
            .with_initial_temperature(1e-3)
            .with_min_temperature(1e-4)
            .with_max_iterations(200);

        let result = SaRunner::run_with_rng(&FlatProblem, &config, MaxRng, None).unwrap();

        assert!(result.iterations > 0);
        assert_eq!(result.accepted_moves, result.iterations);
        assert_eq!(result.best, 0, "equal moves never replace the best");
        assert_eq!(result.improving_moves, 0);
    }

    #[test]
    fn test_sa_quadratic_geometric() {
        let config = SaConfig::default()
            .with_initial_temperature(100.0)
            .with_min_temperature(0.001)
            .with_cooling(CoolingSchedule::Geometric { alpha: 0.95 })
            .with_trial_growth(1.01)
            .with_max_iterations(0)
            .with_seed(42);

        let result = SaRunner::run(&QuadraticProblem, &config).unwrap();

        assert!(
            result.best_cost < 1.0,
            "expected near-zero cost, got {}",
            result.best_cost
        );
        assert_eq!(result.state, RunState::Frozen);
        assert!(result.final_temperature <= 0.001);
        assert!(result.improving_moves > 0);
        assert!(result.accepted_moves > result.improving_moves);
    }

    #[test]
    fn test_sa_quadratic_slow() {
        let config = SaConfig::default()
            .with_initial_temperature(100.0)
            .with_min_temperature(0.01)
            .with_cooling(CoolingSchedule::Slow { alpha: 0.05 })
            .with_trial_growth(1.01)
            .with_max_iterations(50_000)
            .with_seed(42);

        let result = SaRunner::run(&QuadraticProblem, &config).unwrap();

        assert!(
            result.best_cost < 1.0,
            "expected near-zero cost, got {}",
            result.best_cost
        );
    }

    #[test]
    fn test_sa_max_iterations_limit() {
        let config = SaConfig::default()
            .with_initial_temperature(1e10)
            .with_min_temperature(1e-15)
            .with_max_iterations(100)
            .with_seed(42);

        let result = SaRunner::run(&QuadraticProblem, &config).unwrap();

        // Levels of 50 and 57 trials; the second one finishes past the budget.
        assert_eq!(result.iterations, 107);
        assert_eq!(result.state, RunState::Exhausted);
    }

    #[test]
    fn test_first_level_runs_past_budget() {
        let config = SaConfig::default()
            .with_initial_temperature(1e10)
            .with_min_temperature(1e-15)
            .with_max_iterations(30)
            .with_seed(7);

        let result = SaRunner::run(&QuadraticProblem, &config).unwrap();

        assert_eq!(config.initial_trials(QuadraticProblem.size()), 50);
        assert_eq!(result.iterations, 50);
        assert_eq!(result.state, RunState::Exhausted);
    }

    #[test]
    fn test_sa_invalid_config_is_an_error() {
        let config = SaConfig::default().with_initial_temperature(0.0);
        let result = SaRunner::run(&QuadraticProblem, &config);
        assert!(matches!(result, Err(SaError::InitialTemperature(_))));
    }

    #[test]
    fn test_sa_cancellation() {
        let config = SaConfig::default()
            .with_initial_temperature(1e10)
            .with_min_temperature(1e-15)
            .with_seed(42);

        // Flag set before running, so cancellation is deterministic.
        let cancel = Arc::new(AtomicBool::new(true));

        let result = SaRunner::run_with_cancel(&QuadraticProblem, &config, Some(cancel)).unwrap();
        assert_eq!(result.state, RunState::Cancelled);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_trials_grow_each_level() {
        let config = SaConfig::default()
            .with_initial_temperature(10.0)
            .with_trials_factor(2.0)
            .with_trial_growth(1.15);
        let mut annealer = Annealer::new(&QuadraticProblem, &config, create_rng(1)).unwrap();

        assert_eq!(annealer.trials(), 50);
        annealer.cool();
        assert_eq!(annealer.trials(), 57);
        annealer.cool();
        assert_eq!(annealer.trials(), 65);
        assert!((annealer.temperature() - 10.0 * 0.85 * 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_best_cost_never_increases() {
        let config = SaConfig::default()
            .with_initial_temperature(50.0)
            .with_min_temperature(0.01)
            .with_max_iterations(20_000)
            .with_seed(3);
        let mut annealer = Annealer::new(&QuadraticProblem, &config, create_rng(3)).unwrap();

        let mut previous = annealer.best_cost();
        while !annealer.state().is_terminal() {
            for _ in 0..annealer.trials() {
                annealer.step();
                assert!(annealer.best_cost() <= previous);
                assert!(annealer.best_cost() <= annealer.current_cost());
                previous = annealer.best_cost();
            }
            annealer.cool();
        }
    }

    #[test]
    fn test_sa_cost_history_non_increasing() {
        let config = SaConfig::default()
            .with_initial_temperature(50.0)
            .with_min_temperature(0.01)
            .with_cooling(CoolingSchedule::Geometric { alpha: 0.95 })
            .with_seed(42);

        let result = SaRunner::run(&QuadraticProblem, &config).unwrap();

        for window in result.cost_history.windows(2) {
            assert!(
                window[1] <= window[0] + 1e-10,
                "best cost history should be non-increasing: {} > {}",
                window[1],
                window[0]
            );
        }
    }

    #[test]
    fn test_sa_permutation_sort_converges_early() {
        let problem = PermSortProblem { n: 8 };
        let config = SaConfig::default()
            .with_initial_temperature(5.0)
            .with_min_temperature(1e-4)
            .with_cooling(CoolingSchedule::Geometric { alpha: 0.9 })
            .with_max_iterations(200_000)
            .with_seed(42);

        let result = SaRunner::run(&problem, &config).unwrap();

        assert!(result.converged(), "got cost {}", result.best_cost);
        assert_eq!(result.best_cost, 0.0);
        assert_eq!(result.best, (0..8).collect::<Vec<_>>());
        assert!(result.iterations < 200_000);
    }

    #[test]
    fn test_sa_metropolis_accepts_uphill() {
        // At very high temperature, almost all moves should be accepted
        let config = SaConfig::default()
            .with_initial_temperature(1e8)
            .with_min_temperature(1e7)
            .with_cooling(CoolingSchedule::Geometric { alpha: 0.99 })
            .with_trials_factor(40.0)
            .with_seed(42);

        let result = SaRunner::run(&QuadraticProblem, &config).unwrap();

        let acceptance_ratio = result.accepted_moves as f64 / result.iterations as f64;
        assert!(
            acceptance_ratio > 0.8,
            "expected high acceptance at high temp, got {acceptance_ratio}"
        );
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_portfolio_keeps_best_seed() {
        let config = SaConfig::default()
            .with_initial_temperature(50.0)
            .with_min_temperature(0.01);
        let seeds = [1, 2, 3, 4];

        let best = SaRunner::run_portfolio(&QuadraticProblem, &config, &seeds).unwrap();
        for &seed in &seeds {
            let single = SaRunner::run(&QuadraticProblem, &config.clone().with_seed(seed)).unwrap();
            assert!(best.best_cost <= single.best_cost);
        }

        assert_eq!(
            SaRunner::run_portfolio(&QuadraticProblem, &config, &[]).unwrap_err(),
            SaError::EmptyPortfolio
        );
    }
}
