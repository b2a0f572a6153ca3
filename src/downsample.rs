//! Downsampling.
//!
//! The hardware decimates the low-pass output by keeping one sample out of
//! every `factor`, starting with the first one. There is no additional
//! anti-alias filtering.

use crate::error::{Error, Result};

/// Decimates a sequence by an integer factor.
///
/// The output is `sequence[0], sequence[factor], sequence[2 * factor], ...`,
/// with length `ceil(sequence.len() / factor)`. Returns an error if `factor`
/// is zero.
pub fn decimate<T: Clone>(sequence: &[T], factor: usize) -> Result<Vec<T>> {
    if factor == 0 {
        return Err(Error::InvalidDownsampleFactor);
    }
    Ok(sequence.iter().step_by(factor).cloned().collect())
}

/// Streaming decimator.
///
/// Produces the same samples as [`decimate`] when fed one sample at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimator {
    factor: usize,
    // samples left to drop before the next output
    skip: usize,
}

impl Decimator {
    /// Creates a decimator. Returns an error if `factor` is zero.
    pub fn new(factor: usize) -> Result<Decimator> {
        if factor == 0 {
            return Err(Error::InvalidDownsampleFactor);
        }
        Ok(Decimator { factor, skip: 0 })
    }

    /// Gives the decimation factor.
    pub fn factor(&self) -> usize {
        self.factor
    }

    /// Pushes a sample, returning it if it is kept.
    pub fn push<T>(&mut self, sample: T) -> Option<T> {
        if self.skip == 0 {
            self.skip = self.factor - 1;
            Some(sample)
        } else {
            self.skip -= 1;
            None
        }
    }

    /// Returns the decimator to its initial state.
    pub fn reset(&mut self) {
        self.skip = 0;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn factor_two() {
        let seq: Vec<i32> = (0..200).map(|x| x * 3 - 100).collect();
        let ds = decimate(&seq, 2).unwrap();
        assert_eq!(ds.len(), 100);
        for (k, &x) in ds.iter().enumerate() {
            assert_eq!(x, seq[2 * k]);
        }
    }

    #[test]
    fn length_rounds_up() {
        assert_eq!(decimate(&[1, 2, 3, 4, 5], 2).unwrap(), vec![1, 3, 5]);
        assert_eq!(decimate(&[1, 2, 3], 5).unwrap(), vec![1]);
        assert_eq!(decimate::<i32>(&[], 3).unwrap(), Vec::<i32>::new());
        assert_eq!(decimate(&[1, 2, 3], 1).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn zero_factor() {
        assert_eq!(decimate(&[1, 2], 0), Err(Error::InvalidDownsampleFactor));
        assert_eq!(Decimator::new(0), Err(Error::InvalidDownsampleFactor));
    }

    #[test]
    fn reset() {
        let mut d = Decimator::new(3).unwrap();
        assert_eq!(d.push(1), Some(1));
        assert_eq!(d.push(2), None);
        d.reset();
        assert_eq!(d.push(3), Some(3));
    }

    proptest! {
        #[test]
        fn streaming_matches_batch(
            seq in proptest::collection::vec(any::<i32>(), 0..300),
            factor in 1usize..10,
        ) {
            let mut decimator = Decimator::new(factor).unwrap();
            let streamed: Vec<i32> = seq.iter().filter_map(|&x| decimator.push(x)).collect();
            let batch = decimate(&seq, factor).unwrap();
            prop_assert_eq!(batch.len(), seq.len().div_ceil(factor));
            prop_assert_eq!(streamed, batch);
        }
    }
}
