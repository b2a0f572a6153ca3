//! Precondition errors.
//!
//! The signal chain is total over its data: empty sequences, missing peaks and
//! out-of-range arithmetic all have a defined result. The errors in this module
//! are only returned when a component is configured with parameters for which
//! no meaningful result exists.

use thiserror::Error;

/// Result type for the signal chain.
pub type Result<T> = std::result::Result<T, Error>;

/// Precondition errors of the signal chain.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Downsample factor is zero.
    #[error("downsample factor must be positive")]
    InvalidDownsampleFactor,
    /// Sample bit width outside of `1..=32`.
    #[error("sample width of {0} bits is not between 1 and 32")]
    InvalidWidth(u32),
    /// Fixed-point scale outside of `1..=30`.
    #[error("fixed-point scale of {0} bits is not between 1 and 30")]
    InvalidScale(u32),
    /// A software candidate is empty while the reference is not.
    #[error(
        "cannot align reference of length {reference} with software lengths \
         {pre} (pre-downsample) and {post} (post-downsample)"
    )]
    AmbiguousAlignment {
        /// Reference length.
        reference: usize,
        /// Software length before downsampling.
        pre: usize,
        /// Software length after downsampling.
        post: usize,
    },
    /// Sample rate is not a positive finite number.
    #[error("sample rate {0} Hz is not positive")]
    InvalidSampleRate(f64),
}
