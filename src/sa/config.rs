//! SA configuration and cooling schedules.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors reported by [`SaConfig::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SaError {
    #[error("initial_temperature must be positive, got {0}")]
    InitialTemperature(f64),

    #[error("min_temperature must be positive, got {0}")]
    MinTemperature(f64),

    #[error("min_temperature ({min}) must be less than initial_temperature ({initial})")]
    TemperatureOrder { min: f64, initial: f64 },

    #[error("{schedule} alpha out of range: {alpha}")]
    Alpha { schedule: &'static str, alpha: f64 },

    #[error("trials_factor must be positive, got {0}")]
    TrialsFactor(f64),

    #[error("trial_growth must be greater than 1, got {0}")]
    TrialGrowth(f64),

    #[error("unknown cooling schedule `{0}` (expected `geometric` or `slow`)")]
    UnknownSchedule(String),

    #[error("portfolio needs at least one seed")]
    EmptyPortfolio,
}

/// Cooling schedule for temperature reduction.
///
/// Applied once per temperature level, after the inner trial loop.
///
/// # References
///
/// - Geometric: Kirkpatrick et al. (1983)
/// - Slow: Lundy & Mees (1986)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", rename_all = "snake_case")
)]
pub enum CoolingSchedule {
    /// Geometric (exponential) cooling: `T_{k+1} = alpha * T_k`.
    Geometric {
        /// Cooling factor in (0, 1). Higher = slower cooling.
        alpha: f64,
    },

    /// Slow (harmonic) cooling: `T_{k+1} = T_k / (1 + alpha * T_k)`.
    ///
    /// Keeps the temperature high for longer than geometric cooling.
    /// Typical `alpha`: 5e-4.
    Slow {
        /// Cooling parameter, strictly positive.
        alpha: f64,
    },
}

impl CoolingSchedule {
    /// Default geometric factor.
    pub const DEFAULT_GEOMETRIC_ALPHA: f64 = 0.85;

    /// Default slow-cooling parameter.
    pub const DEFAULT_SLOW_ALPHA: f64 = 5e-4;

    /// Geometric cooling with the default factor.
    pub fn geometric() -> Self {
        CoolingSchedule::Geometric {
            alpha: Self::DEFAULT_GEOMETRIC_ALPHA,
        }
    }

    /// Slow cooling with the default parameter.
    pub fn slow() -> Self {
        CoolingSchedule::Slow {
            alpha: Self::DEFAULT_SLOW_ALPHA,
        }
    }

    /// Returns the same schedule with a different `alpha`.
    pub fn with_alpha(self, alpha: f64) -> Self {
        match self {
            CoolingSchedule::Geometric { .. } => CoolingSchedule::Geometric { alpha },
            CoolingSchedule::Slow { .. } => CoolingSchedule::Slow { alpha },
        }
    }

    /// The schedule's parameter.
    pub fn alpha(&self) -> f64 {
        match *self {
            CoolingSchedule::Geometric { alpha } | CoolingSchedule::Slow { alpha } => alpha,
        }
    }

    /// Short lowercase name, as accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            CoolingSchedule::Geometric { .. } => "geometric",
            CoolingSchedule::Slow { .. } => "slow",
        }
    }

    /// Computes the temperature of the next level.
    pub fn next_temperature(&self, temperature: f64) -> f64 {
        match *self {
            CoolingSchedule::Geometric { alpha } => alpha * temperature,
            CoolingSchedule::Slow { alpha } => temperature / (1.0 + alpha * temperature),
        }
    }

    fn validate(&self) -> Result<(), SaError> {
        match *self {
            CoolingSchedule::Geometric { alpha } => {
                if !(alpha > 0.0 && alpha < 1.0) {
                    return Err(SaError::Alpha {
                        schedule: "geometric",
                        alpha,
                    });
                }
            }
            CoolingSchedule::Slow { alpha } => {
                if !(alpha > 0.0 && alpha.is_finite()) {
                    return Err(SaError::Alpha {
                        schedule: "slow",
                        alpha,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for CoolingSchedule {
    fn default() -> Self {
        CoolingSchedule::geometric()
    }
}

impl fmt::Display for CoolingSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(alpha={})", self.name(), self.alpha())
    }
}

/// Parses `geometric`/`g` or `slow`/`s` into the schedule with its default alpha.
impl FromStr for CoolingSchedule {
    type Err = SaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "geometric" | "g" => Ok(CoolingSchedule::geometric()),
            "slow" | "s" => Ok(CoolingSchedule::slow()),
            other => Err(SaError::UnknownSchedule(other.to_string())),
        }
    }
}

/// Configuration for the Simulated Annealing algorithm.
///
/// The inner loop at each temperature level runs `N_trials` trials.
/// `N_trials` starts at `floor(trials_factor * problem.size())` and is
/// multiplied by `trial_growth` (then floored) after every level.
///
/// # Examples
///
/// ```
/// use u_anneal::sa::{SaConfig, CoolingSchedule};
///
/// let config = SaConfig::default()
///     .with_initial_temperature(20.0)
///     .with_min_temperature(1e-4)
///     .with_cooling(CoolingSchedule::Geometric { alpha: 0.85 })
///     .with_trials_factor(2.0)
///     .with_trial_growth(1.15)
///     .with_max_iterations(10_000)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SaConfig {
    /// Initial temperature. Higher values allow more exploration.
    pub initial_temperature: f64,

    /// Temperature floor. The run freezes once `T <= min_temperature`.
    pub min_temperature: f64,

    /// Cooling schedule.
    pub cooling: CoolingSchedule,

    /// Multiplier of the problem size giving the first level's trial count.
    pub trials_factor: f64,

    /// Growth factor `p > 1` applied to the trial count after each level.
    pub trial_growth: f64,

    /// Maximum total iterations (hard budget). 0 = no limit.
    pub max_iterations: usize,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for SaConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 100.0,
            min_temperature: 1e-4,
            cooling: CoolingSchedule::default(),
            trials_factor: 2.0,
            trial_growth: 1.15,
            max_iterations: 250_000,
            seed: None,
        }
    }
}

impl SaConfig {
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = t;
        self
    }

    pub fn with_cooling(mut self, cooling: CoolingSchedule) -> Self {
        self.cooling = cooling;
        self
    }

    pub fn with_trials_factor(mut self, factor: f64) -> Self {
        self.trials_factor = factor;
        self
    }

    pub fn with_trial_growth(mut self, p: f64) -> Self {
        self.trial_growth = p;
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

    /// Trial count of the first temperature level for a problem of `size`.
    ///
    /// Never less than one.
    pub fn initial_trials(&self, size: usize) -> usize {
        ((self.trials_factor * size as f64).floor() as usize).max(1)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), SaError> {
        if !(self.initial_temperature > 0.0) {
            return Err(SaError::InitialTemperature(self.initial_temperature));
        }
        if !(self.min_temperature > 0.0) {
            return Err(SaError::MinTemperature(self.min_temperature));
        }
        if self.min_temperature >= self.initial_temperature {
            return Err(SaError::TemperatureOrder {
                min: self.min_temperature,
                initial: self.initial_temperature,
            });
        }
        if !(self.trials_factor > 0.0) {
            return Err(SaError::TrialsFactor(self.trials_factor));
        }
        if !(self.trial_growth > 1.0) {
            return Err(SaError::TrialGrowth(self.trial_growth));
        }
        self.cooling.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_config() {
        let config = SaConfig::default();
        assert!((config.min_temperature - 1e-4).abs() < 1e-15);
        assert_eq!(config.max_iterations, 250_000);
        assert!((config.trial_growth - 1.15).abs() < 1e-12);
        assert_eq!(config.cooling, CoolingSchedule::Geometric { alpha: 0.85 });
    }

    #[test]
    fn test_validate_ok() {
        assert!(SaConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_bad_temperature() {
        let config = SaConfig::default().with_initial_temperature(-1.0);
        assert_eq!(config.validate(), Err(SaError::InitialTemperature(-1.0)));
    }

    #[test]
    fn test_validate_min_ge_initial() {
        let config = SaConfig::default()
            .with_initial_temperature(10.0)
            .with_min_temperature(20.0);
        assert!(matches!(
            config.validate(),
            Err(SaError::TemperatureOrder { .. })
        ));
    }

    #[test]
    fn test_validate_bad_alpha() {
        let config = SaConfig::default().with_cooling(CoolingSchedule::Geometric { alpha: 1.5 });
        assert!(config.validate().is_err());

        let config = SaConfig::default().with_cooling(CoolingSchedule::Slow { alpha: 0.0 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_growth() {
        let config = SaConfig::default().with_trial_growth(0.9);
        assert_eq!(config.validate(), Err(SaError::TrialGrowth(0.9)));

        let config = SaConfig::default().with_trial_growth(1.0);
        assert_eq!(config.validate(), Err(SaError::TrialGrowth(1.0)));
    }

    #[test]
    fn test_initial_trials() {
        let config = SaConfig::default();
        assert_eq!(config.initial_trials(9), 18);
        assert_eq!(config.initial_trials(0), 1);
        assert_eq!(config.with_trials_factor(0.5).initial_trials(5), 2);
    }

    #[test]
    fn test_schedule_from_str() {
        assert_eq!(
            "g".parse::<CoolingSchedule>(),
            Ok(CoolingSchedule::geometric())
        );
        assert_eq!(
            "Slow".parse::<CoolingSchedule>(),
            Ok(CoolingSchedule::slow())
        );
        assert!("linear".parse::<CoolingSchedule>().is_err());
    }

    #[test]
    fn test_alpha_is_caller_configurable_for_slow() {
        let schedule = CoolingSchedule::slow().with_alpha(0.01);
        assert_eq!(schedule, CoolingSchedule::Slow { alpha: 0.01 });
        let next = schedule.next_temperature(10.0);
        assert!((next - 10.0 / 1.1).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn geometric_strictly_decreases(alpha in 0.01f64..0.99, t in 1e-3f64..1e6) {
            let next = CoolingSchedule::Geometric { alpha }.next_temperature(t);
            prop_assert!(next < t);
            prop_assert!(next > 0.0);
        }

        #[test]
        fn slow_strictly_decreases(alpha in 1e-6f64..10.0, t in 1e-3f64..1e6) {
            let next = CoolingSchedule::Slow { alpha }.next_temperature(t);
            prop_assert!(next < t);
            prop_assert!(next > 0.0);
        }
    }
}
