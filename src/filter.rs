//! Fixed-point single-pole filters.
//!
//! This module replays the high-pass and low-pass filters of the hardware
//! pre-processing block with integer-exact arithmetic. Coefficients are given
//! in Q format as `alpha_q / 2^scale`, products are rounded half up by adding
//! `2^(scale - 1)` before an arithmetic right shift, and every output is
//! saturated to a signed bit width.
//!
//! Accumulators are computed in `i64` and products in `i128`. With 32-bit
//! samples the accumulator stays below `3 * 2^31` in magnitude and any `i32`
//! coefficient below `2^31`, so no intermediate value overflows, including
//! coefficients with a gain above one.
//!
//! # Examples
//! ```
//! use ppgcheck::filter::{Cascade, Coefficient, Filter, HighPass, LowPass, SampleWidth};
//! # fn main() -> ppgcheck::error::Result<()> {
//! let width = SampleWidth::new(10)?;
//! let mut chain = Cascade(
//!     HighPass::new(Coefficient::new(30831, 15)?, width),
//!     LowPass::new(Coefficient::new(12629, 15)?, width),
//! );
//! assert_eq!(chain.process_all(&[100, 100, 100, 0]), vec![36, 56, 66, 34]);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};

/// Widest supported sample, in bits.
pub const MAX_WIDTH: u32 = 32;

/// Largest supported coefficient scale, in bits.
pub const MAX_SCALE: u32 = 30;

/// Signed sample bit width.
///
/// A width of `W` bits represents the range `[-2^(W-1), 2^(W-1) - 1]`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SampleWidth(u32);

impl SampleWidth {
    /// Creates a sample width.
    ///
    /// Returns an error unless `bits` is between 1 and [`MAX_WIDTH`].
    pub fn new(bits: u32) -> Result<SampleWidth> {
        if !(1..=MAX_WIDTH).contains(&bits) {
            return Err(Error::InvalidWidth(bits));
        }
        Ok(SampleWidth(bits))
    }

    /// Gives the width in bits.
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Gives the smallest representable sample.
    pub fn min(&self) -> i32 {
        (-(1i64 << (self.0 - 1))) as i32
    }

    /// Gives the largest representable sample.
    pub fn max(&self) -> i32 {
        ((1i64 << (self.0 - 1)) - 1) as i32
    }

    /// Clamps a value to the representable range.
    ///
    /// Values out of range are replaced by the nearest bound. There is no
    /// wraparound.
    pub fn saturate(&self, value: i64) -> i32 {
        self.saturate_wide(i128::from(value))
    }

    fn saturate_wide(&self, value: i128) -> i32 {
        value.clamp(i128::from(self.min()), i128::from(self.max())) as i32
    }
}

impl Default for SampleWidth {
    fn default() -> SampleWidth {
        SampleWidth(10)
    }
}

/// Fixed-point filter coefficient.
///
/// Represents the real number `alpha_q / 2^scale`. The coefficient is stored
/// as given and never renormalized, so it must match the format used by the
/// hardware.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Coefficient {
    alpha_q: i32,
    scale: u32,
}

impl Coefficient {
    /// Creates a coefficient.
    ///
    /// The `scale` must be between 1 and [`MAX_SCALE`]. Any numerator is
    /// accepted, including gains larger than one.
    pub fn new(alpha_q: i32, scale: u32) -> Result<Coefficient> {
        if !(1..=MAX_SCALE).contains(&scale) {
            return Err(Error::InvalidScale(scale));
        }
        Ok(Coefficient { alpha_q, scale })
    }

    /// Gives the coefficient numerator.
    pub fn alpha_q(&self) -> i32 {
        self.alpha_q
    }

    /// Gives the coefficient scale in bits.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Gives the real value of the coefficient.
    pub fn to_f64(&self) -> f64 {
        f64::from(self.alpha_q) / (1u64 << self.scale) as f64
    }

    // Multiplies by the coefficient, rounding half up.
    fn scale_rounded(&self, x: i64) -> i128 {
        let round_bias = 1i128 << (self.scale - 1);
        (i128::from(x) * i128::from(self.alpha_q) + round_bias) >> self.scale
    }
}

/// Running state of a single-pole filter.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct FilterState {
    /// Last input sample.
    pub previous_input: i32,
    /// Last output sample.
    pub previous_output: i32,
}

/// Sample-by-sample filter.
///
/// Samples must be given in arrival order, since each output depends on the
/// state left by the previous sample.
pub trait Filter {
    /// Filters one sample, updating the filter state.
    fn process(&mut self, input: i32) -> i32;

    /// Returns the filter to its initial state.
    fn reset(&mut self);

    /// Filters a sequence of samples.
    ///
    /// This is equivalent to calling [`Filter::process`] on each sample in
    /// order, so the state carries over between calls.
    fn process_all(&mut self, input: &[i32]) -> Vec<i32> {
        input.iter().map(|&x| self.process(x)).collect()
    }
}

/// Fixed-point high-pass filter.
///
/// Computes `y[n] = sat(round(alpha * (y[n-1] + x[n] - x[n-1])))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighPass {
    coefficient: Coefficient,
    width: SampleWidth,
    state: FilterState,
}

impl HighPass {
    /// Creates a high-pass filter with zero state.
    pub fn new(coefficient: Coefficient, width: SampleWidth) -> HighPass {
        HighPass {
            coefficient,
            width,
            state: FilterState::default(),
        }
    }

    /// Gives the current filter state.
    pub fn state(&self) -> FilterState {
        self.state
    }

    /// Gives the filter coefficient.
    pub fn coefficient(&self) -> Coefficient {
        self.coefficient
    }
}

impl Filter for HighPass {
    fn process(&mut self, input: i32) -> i32 {
        let acc = i64::from(self.state.previous_output) + i64::from(input)
            - i64::from(self.state.previous_input);
        let output = self.width.saturate_wide(self.coefficient.scale_rounded(acc));
        self.state = FilterState {
            previous_input: input,
            previous_output: output,
        };
        output
    }

    fn reset(&mut self) {
        self.state = FilterState::default();
    }
}

/// Fixed-point low-pass filter.
///
/// Computes `y[n] = sat(y[n-1] + round(alpha * (x[n] - y[n-1])))`, which is
/// an exponential moving average. The previous input is not used, so it stays
/// at zero in the [`FilterState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowPass {
    coefficient: Coefficient,
    width: SampleWidth,
    state: FilterState,
}

impl LowPass {
    /// Creates a low-pass filter with zero state.
    pub fn new(coefficient: Coefficient, width: SampleWidth) -> LowPass {
        LowPass {
            coefficient,
            width,
            state: FilterState::default(),
        }
    }

    /// Gives the current filter state.
    pub fn state(&self) -> FilterState {
        self.state
    }

    /// Gives the filter coefficient.
    pub fn coefficient(&self) -> Coefficient {
        self.coefficient
    }
}

impl Filter for LowPass {
    fn process(&mut self, input: i32) -> i32 {
        let previous = i64::from(self.state.previous_output);
        let diff = i64::from(input) - previous;
        let output = self
            .width
            .saturate_wide(i128::from(previous) + self.coefficient.scale_rounded(diff));
        self.state.previous_output = output;
        output
    }

    fn reset(&mut self) {
        self.state = FilterState::default();
    }
}

/// Two filters in series.
///
/// Each sample goes through the first filter and its output through the
/// second one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cascade<A, B>(pub A, pub B);

impl<A: Filter, B: Filter> Filter for Cascade<A, B> {
    fn process(&mut self, input: i32) -> i32 {
        self.1.process(self.0.process(input))
    }

    fn reset(&mut self) {
        self.0.reset();
        self.1.reset();
    }
}
