//! Descent configuration.

use std::fmt;
use std::str::FromStr;

/// How the bit-flip neighborhood is scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum DescentStrategy {
    /// Evaluate every flip and take the best improving one.
    #[default]
    Steepest,
    /// Take the first improving flip in bit order.
    First,
    /// Take the first improving flip in a freshly shuffled order.
    Random,
}

impl DescentStrategy {
    pub const ALL: [DescentStrategy; 3] = [
        DescentStrategy::Steepest,
        DescentStrategy::First,
        DescentStrategy::Random,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DescentStrategy::Steepest => "steepest",
            DescentStrategy::First => "first",
            DescentStrategy::Random => "random",
        }
    }
}

impl fmt::Display for DescentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DescentStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        DescentStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == name)
            .ok_or_else(|| format!("unknown descent strategy `{name}`"))
    }
}

/// Configuration for [`DescentRunner`](super::DescentRunner).
///
/// # Examples
///
/// ```
/// use u_anneal::descent::{DescentConfig, DescentStrategy};
///
/// let config = DescentConfig::default()
///     .with_strategy(DescentStrategy::First)
///     .with_max_iterations(50)
///     .with_seed(1);
/// assert_eq!(config.max_iterations, 50);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct DescentConfig {
    pub strategy: DescentStrategy,

    /// Maximum number of moves.
    pub max_iterations: usize,

    /// Random seed (None for random).
    pub seed: Option<u64>,
}

impl Default for DescentConfig {
    fn default() -> Self {
        Self {
            strategy: DescentStrategy::default(),
            max_iterations: 1000,
            seed: None,
        }
    }
}

impl DescentConfig {
    pub fn with_strategy(mut self, strategy: DescentStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
