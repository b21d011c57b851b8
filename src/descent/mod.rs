//! Deterministic local search over binary-encoded benchmark functions.
//!
//! A [`BinaryProblem`] concatenates one [`BitCodec`](crate::codec::BitCodec)
//! code per coordinate. [`DescentRunner`] walks single-bit flips downhill
//! until none improves; the same problem can be annealed through
//! [`SaRunner`](crate::sa::SaRunner) as well.
//!
//! # Examples
//!
//! ```
//! use u_anneal::benchmark::BenchmarkFunction;
//! use u_anneal::descent::{BinaryProblem, DescentConfig, DescentRunner};
//!
//! let problem = BinaryProblem::new(BenchmarkFunction::Sphere, 2, 10).unwrap();
//! let result = DescentRunner::run(&problem, &DescentConfig::default().with_seed(1));
//! assert!(result.value < 1e-3);
//! ```

mod config;
mod runner;
mod types;

pub use config::{DescentConfig, DescentStrategy};
pub use runner::{DescentResult, DescentRunner};
pub use types::BinaryProblem;
