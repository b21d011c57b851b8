//! Binary-encoded benchmark problems.

use rand::Rng;

use crate::benchmark::BenchmarkFunction;
use crate::codec::{BitCodec, CodecError};
use crate::sa::SaProblem;

/// Minimizes a benchmark function over `dimension` coordinates, each
/// encoded with `bits` bits over the function's domain.
///
/// A solution is the concatenation of the coordinate codes,
/// `dimension * bits` bits in total.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryProblem {
    function: BenchmarkFunction,
    dimension: usize,
    codec: BitCodec,
}

impl BinaryProblem {
    pub fn new(
        function: BenchmarkFunction,
        dimension: usize,
        bits: u32,
    ) -> Result<Self, CodecError> {
        let (lo, hi) = function.domain();
        Ok(Self {
            function,
            dimension,
            codec: BitCodec::new(bits, lo, hi)?,
        })
    }

    pub fn function(&self) -> BenchmarkFunction {
        self.function
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn codec(&self) -> &BitCodec {
        &self.codec
    }

    /// Length of a solution.
    pub fn total_bits(&self) -> usize {
        self.dimension * self.codec.bits() as usize
    }

    pub fn random_bits<R: Rng>(&self, rng: &mut R) -> Vec<bool> {
        (0..self.total_bits())
            .map(|_| rng.random::<bool>())
            .collect()
    }

    /// Decodes a solution into a point.
    ///
    /// # Panics
    ///
    /// Panics if `bits` is not [`total_bits`](Self::total_bits) long.
    pub fn decode(&self, bits: &[bool]) -> Vec<f64> {
        assert_eq!(bits.len(), self.total_bits(), "solution length");
        bits.chunks(self.codec.bits() as usize)
            .map(|chunk| self.codec.level_value(BitCodec::level_of(chunk)))
            .collect()
    }

    /// Function value of a solution.
    ///
    /// Decoded points always lie in the domain; a point the function
    /// rejects (only possible with zero coordinates) costs infinity.
    pub fn evaluate(&self, bits: &[bool]) -> f64 {
        self.function
            .evaluate(&self.decode(bits))
            .unwrap_or(f64::INFINITY)
    }
}

impl SaProblem for BinaryProblem {
    type Solution = Vec<bool>;

    fn size(&self) -> usize {
        self.total_bits()
    }

    fn initial_solution<R: Rng>(&self, rng: &mut R) -> Vec<bool> {
        self.random_bits(rng)
    }

    fn cost(&self, solution: &Vec<bool>) -> f64 {
        self.evaluate(solution)
    }

    /// Flips one random bit.
    fn neighbor<R: Rng>(&self, solution: &Vec<bool>, rng: &mut R) -> Vec<bool> {
        let mut next = solution.clone();
        if !next.is_empty() {
            let i = rng.random_range(0..next.len());
            next[i] = !next[i];
        }
        next
    }
}
