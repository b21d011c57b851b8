//! Simulated annealing and bit-flip local search.
//!
//! - **Simulated Annealing (SA)**: generic annealing engine with geometric
//!   and slow cooling, growing per-level trial budgets and an explicit
//!   run state machine.
//! - **Sudoku**: puzzle parsing, balanced candidates and conflict counting,
//!   solved by the SA engine.
//! - **Codec**: fixed-width binary encoding of bounded real values.
//! - **Benchmark**: Sphere, Ackley, Griewank, Rastrigin and Rosenbrock with
//!   their search domains.
//! - **Descent**: steepest, first and random-order bit-flip descent over
//!   binary-encoded benchmark functions.
//!
//! # Architecture
//!
//! [`sa`] knows nothing about Sudoku or bit strings; problems implement
//! [`sa::SaProblem`]. Randomness flows through a single seeded generator
//! per run, so a fixed seed reproduces a run exactly.

pub mod benchmark;
pub mod codec;
pub mod descent;
pub mod sa;
pub mod sudoku;
