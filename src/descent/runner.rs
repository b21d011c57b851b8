//! Bit-flip descent loop.
//!
//! # Algorithm
//!
//! 1. Draw a random bit string and evaluate it
//! 2. Scan the single-bit flips in the order the strategy dictates
//! 3. Move to the selected strictly improving flip
//! 4. Repeat until no flip improves or the move budget is spent

use rand::Rng;
use tracing::{debug, info};
use u_numflow::random::create_rng;

use super::config::{DescentConfig, DescentStrategy};
use super::types::BinaryProblem;

/// Result of a descent run.
#[derive(Debug, Clone)]
pub struct DescentResult {
    /// Final bit string.
    pub bits: Vec<bool>,

    /// `bits` decoded into a point.
    pub point: Vec<f64>,

    /// Function value at `point`.
    pub value: f64,

    /// Function evaluations, including the initial one.
    pub evaluations: usize,

    /// Moves made.
    pub iterations: usize,

    /// Whether the run stopped at a local optimum rather than the budget.
    pub local_optimum: bool,
}

/// Executes bit-flip descent on a [`BinaryProblem`].
pub struct DescentRunner;

impl DescentRunner {
    pub fn run(problem: &BinaryProblem, config: &DescentConfig) -> DescentResult {
        let mut rng = match config.seed {
            Some(seed) => create_rng(seed),
            None => create_rng(rand::random()),
        };
        Self::run_with_rng(problem, config, &mut rng)
    }

    pub fn run_with_rng<R: Rng>(
        problem: &BinaryProblem,
        config: &DescentConfig,
        rng: &mut R,
    ) -> DescentResult {
        let bits = problem.random_bits(rng);
        Self::run_from(problem, config, bits, rng)
    }

    /// Descends from a given starting string.
    ///
    /// # Panics
    ///
    /// Panics if `bits` does not have the problem's length.
    pub fn run_from<R: Rng>(
        problem: &BinaryProblem,
        config: &DescentConfig,
        mut bits: Vec<bool>,
        rng: &mut R,
    ) -> DescentResult {
        assert_eq!(bits.len(), problem.total_bits(), "solution length");

        let mut value = problem.evaluate(&bits);
        let mut evaluations = 1;
        let mut iterations = 0;
        let mut local_optimum = false;

        info!(
            event = "descent_start",
            function = %problem.function(),
            dimension = problem.dimension(),
            bits = problem.codec().bits(),
            strategy = %config.strategy,
            value,
        );

        while iterations < config.max_iterations {
            let (flip, flip_value, scanned) = match config.strategy {
                DescentStrategy::Steepest => best_flip(problem, &mut bits, value),
                DescentStrategy::First => {
                    let order: Vec<usize> = (0..bits.len()).collect();
                    first_flip(problem, &mut bits, value, &order)
                }
                DescentStrategy::Random => {
                    let mut order: Vec<usize> = (0..bits.len()).collect();
                    u_numflow::random::shuffle(&mut order, rng);
                    first_flip(problem, &mut bits, value, &order)
                }
            };
            evaluations += scanned;

            let Some(i) = flip else {
                local_optimum = true;
                break;
            };
            bits[i] = !bits[i];
            value = flip_value;
            iterations += 1;

            debug!(
                event = "descent_move",
                iteration = iterations,
                bit = i,
                value
            );
        }

        info!(
            event = "descent_end",
            value,
            evaluations,
            iterations,
            local_optimum,
        );

        DescentResult {
            point: problem.decode(&bits),
            bits,
            value,
            evaluations,
            iterations,
            local_optimum,
        }
    }
}

/// Best strictly improving flip over the whole neighborhood.
///
/// Returns the flip, its value and the number of evaluations. `bits` is
/// left unchanged.
fn best_flip(
    problem: &BinaryProblem,
    bits: &mut [bool],
    value: f64,
) -> (Option<usize>, f64, usize) {
    let mut best = None;
    let mut best_value = value;
    for i in 0..bits.len() {
        bits[i] = !bits[i];
        let v = problem.evaluate(bits);
        bits[i] = !bits[i];
        if v < best_value {
            best = Some(i);
            best_value = v;
        }
    }
    (best, best_value, bits.len())
}

/// First strictly improving flip in `order`.
fn first_flip(
    problem: &BinaryProblem,
    bits: &mut [bool],
    value: f64,
    order: &[usize],
) -> (Option<usize>, f64, usize) {
    for (scanned, &i) in order.iter().enumerate() {
        bits[i] = !bits[i];
        let v = problem.evaluate(bits);
        bits[i] = !bits[i];
        if v < value {
            return (Some(i), v, scanned + 1);
        }
    }
    (None, value, order.len())
}
