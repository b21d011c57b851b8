//! Fixed-width binary encoding of real values.
//!
//! A value in `[lo, hi]` is quantized linearly onto the `2^bits - 1`
//! intervals between `lo` and `hi` and written most significant bit
//! first. `decode(encode(x))` lies within one quantization step of `x`.

use thiserror::Error;

/// Errors raised by [`BitCodec`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("bit width must be in 1..={max}, got {bits}")]
    Bits { bits: u32, max: u32 },

    #[error("invalid range [{lo}, {hi}]")]
    Range { lo: f64, hi: f64 },

    #[error("expected {expected} bits, got {found}")]
    Length { expected: usize, found: usize },
}

/// Linear quantizer over `[lo, hi]` with a fixed bit width.
///
/// # Examples
///
/// ```
/// use u_anneal::codec::BitCodec;
///
/// let codec = BitCodec::new(8, 0.0, 10.0).unwrap();
/// let bits = codec.encode(3.5);
/// let x = codec.decode(&bits).unwrap();
/// assert!((x - 3.5).abs() <= codec.step());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitCodec {
    bits: u32,
    lo: f64,
    hi: f64,
}

impl BitCodec {
    /// Widest supported code; levels stay exact in an `f64` mantissa.
    pub const MAX_BITS: u32 = 52;

    pub fn new(bits: u32, lo: f64, hi: f64) -> Result<Self, CodecError> {
        if bits == 0 || bits > Self::MAX_BITS {
            return Err(CodecError::Bits {
                bits,
                max: Self::MAX_BITS,
            });
        }
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(CodecError::Range { lo, hi });
        }
        Ok(Self { bits, lo, hi })
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    /// Highest level, `2^bits - 1`.
    pub fn max_level(&self) -> u64 {
        (1u64 << self.bits) - 1
    }

    /// Distance between two adjacent levels.
    pub fn step(&self) -> f64 {
        (self.hi - self.lo) / self.max_level() as f64
    }

    /// Nearest level of `value`; values outside `[lo, hi]` clamp to the ends.
    pub fn quantize(&self, value: f64) -> u64 {
        let max = self.max_level();
        let level = ((value - self.lo) * max as f64 / (self.hi - self.lo)).round();
        if level.is_nan() || level <= 0.0 {
            0
        } else if level >= max as f64 {
            max
        } else {
            level as u64
        }
    }

    /// Real value of a level.
    pub fn level_value(&self, level: u64) -> f64 {
        let x = self.lo + level as f64 * (self.hi - self.lo) / self.max_level() as f64;
        x.clamp(self.lo, self.hi)
    }

    pub fn encode(&self, value: f64) -> Vec<bool> {
        let level = self.quantize(value);
        (0..self.bits)
            .rev()
            .map(|shift| (level >> shift) & 1 == 1)
            .collect()
    }

    pub fn decode(&self, code: &[bool]) -> Result<f64, CodecError> {
        if code.len() != self.bits as usize {
            return Err(CodecError::Length {
                expected: self.bits as usize,
                found: code.len(),
            });
        }
        Ok(self.level_value(Self::level_of(code)))
    }

    /// Level read from a code, most significant bit first.
    ///
    /// The width is not checked; bits beyond 64 shift out.
    pub fn level_of(code: &[bool]) -> u64 {
        code.iter().fold(0, |acc, &b| (acc << 1) | u64::from(b))
    }

    /// Concatenated codes of every value.
    pub fn encode_all(&self, values: &[f64]) -> Vec<bool> {
        values.iter().flat_map(|&v| self.encode(v)).collect()
    }

    /// Inverse of [`encode_all`](Self::encode_all).
    ///
    /// The code length must be a multiple of the bit width.
    pub fn decode_all(&self, code: &[bool]) -> Result<Vec<f64>, CodecError> {
        let width = self.bits as usize;
        if !code.len().is_multiple_of(width) {
            return Err(CodecError::Length {
                expected: code.len().div_ceil(width) * width,
                found: code.len(),
            });
        }
        code.chunks(width).map(|chunk| self.decode(chunk)).collect()
    }
}

/// Encodes `value` with a one-off codec.
pub fn encode(value: f64, bits: u32, lo: f64, hi: f64) -> Result<Vec<bool>, CodecError> {
    Ok(BitCodec::new(bits, lo, hi)?.encode(value))
}

/// Decodes `code` with a one-off codec.
pub fn decode(code: &[bool], bits: u32, lo: f64, hi: f64) -> Result<f64, CodecError> {
    BitCodec::new(bits, lo, hi)?.decode(code)
}
