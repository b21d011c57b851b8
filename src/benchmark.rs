//! Continuous benchmark functions.
//!
//! Each function has a documented search domain (the same interval in
//! every coordinate) and a global minimum of `0`.

use std::f64::consts::{E, PI};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised by [`BenchmarkFunction::evaluate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("{function} needs at least one coordinate")]
    Empty { function: BenchmarkFunction },

    #[error("{function}: x[{index}] = {value} outside [{lo}, {hi}]")]
    OutOfDomain {
        function: BenchmarkFunction,
        index: usize,
        value: f64,
        lo: f64,
        hi: f64,
    },

    #[error("unknown benchmark function `{0}`")]
    Unknown(String),
}

/// Benchmark functions for minimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum BenchmarkFunction {
    /// `Σ x_i²`
    Sphere,
    /// `-20 exp(-0.2 sqrt(Σx²/n)) - exp(Σcos(2πx)/n) + 20 + e`
    Ackley,
    /// `1 + Σx²/4000 - Π cos(x_i / sqrt(i))`
    Griewank,
    /// `10n + Σ(x² - 10 cos(2πx))`
    Rastrigin,
    /// `Σ 100(x_{i+1} - x_i²)² + (1 - x_i)²`
    Rosenbrock,
}

impl BenchmarkFunction {
    pub const ALL: [BenchmarkFunction; 5] = [
        BenchmarkFunction::Sphere,
        BenchmarkFunction::Ackley,
        BenchmarkFunction::Griewank,
        BenchmarkFunction::Rastrigin,
        BenchmarkFunction::Rosenbrock,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BenchmarkFunction::Sphere => "sphere",
            BenchmarkFunction::Ackley => "ackley",
            BenchmarkFunction::Griewank => "griewank",
            BenchmarkFunction::Rastrigin => "rastrigin",
            BenchmarkFunction::Rosenbrock => "rosenbrock",
        }
    }

    /// Search interval `(lo, hi)` of every coordinate.
    pub fn domain(&self) -> (f64, f64) {
        match self {
            BenchmarkFunction::Sphere | BenchmarkFunction::Rastrigin => (-5.12, 5.12),
            BenchmarkFunction::Ackley => (-30.0, 30.0),
            BenchmarkFunction::Griewank => (-600.0, 600.0),
            BenchmarkFunction::Rosenbrock => (-2.048, 2.048),
        }
    }

    /// The global minimizer in `dimension` coordinates.
    pub fn minimizer(&self, dimension: usize) -> Vec<f64> {
        let coordinate = match self {
            BenchmarkFunction::Rosenbrock => 1.0,
            _ => 0.0,
        };
        vec![coordinate; dimension]
    }

    /// Evaluates the function, checking every coordinate against the domain.
    pub fn evaluate(&self, x: &[f64]) -> Result<f64, DomainError> {
        if x.is_empty() {
            return Err(DomainError::Empty { function: *self });
        }
        let (lo, hi) = self.domain();
        if let Some((index, &value)) = x
            .iter()
            .enumerate()
            .find(|&(_, &v)| !(lo..=hi).contains(&v))
        {
            return Err(DomainError::OutOfDomain {
                function: *self,
                index,
                value,
                lo,
                hi,
            });
        }
        Ok(self.evaluate_unchecked(x))
    }

    fn evaluate_unchecked(&self, x: &[f64]) -> f64 {
        let n = x.len() as f64;
        match self {
            BenchmarkFunction::Sphere => x.iter().map(|v| v * v).sum(),
            BenchmarkFunction::Ackley => {
                let squares: f64 = x.iter().map(|v| v * v).sum();
                let cosines: f64 = x.iter().map(|v| (2.0 * PI * v).cos()).sum();
                -20.0 * (-0.2 * (squares / n).sqrt()).exp() - (cosines / n).exp() + 20.0 + E
            }
            BenchmarkFunction::Griewank => {
                let sum: f64 = x.iter().map(|v| v * v).sum::<f64>() / 4000.0;
                let product: f64 = x
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (v / ((i + 1) as f64).sqrt()).cos())
                    .product();
                1.0 + sum - product
            }
            BenchmarkFunction::Rastrigin => {
                10.0 * n
                    + x.iter()
                        .map(|v| v * v - 10.0 * (2.0 * PI * v).cos())
                        .sum::<f64>()
            }
            BenchmarkFunction::Rosenbrock => x
                .windows(2)
                .map(|w| 100.0 * (w[1] - w[0] * w[0]).powi(2) + (1.0 - w[0]).powi(2))
                .sum(),
        }
    }
}

impl fmt::Display for BenchmarkFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BenchmarkFunction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        BenchmarkFunction::ALL
            .into_iter()
            .find(|f| f.name() == name)
            .ok_or(DomainError::Unknown(name))
    }
}
