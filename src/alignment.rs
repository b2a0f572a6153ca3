//! Alignment between hardware and software sequences.
//!
//! The hardware trace may have been captured either before or after the
//! downsampler, and its length does not always match any software sequence
//! exactly (for instance when the simulation stops a few samples early). This
//! module decides which software sequence the reference is compared against,
//! and at which sample rate and refractory period the comparison takes place.

use crate::error::{Error, Result};

/// Correspondence between the reference sequence and the software sequences.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AlignmentMode {
    /// The reference has the length of the sequence before downsampling.
    PreDownsample,
    /// The reference has the length of the sequence after downsampling.
    PostDownsample,
    /// No exact match, and the sequence before downsampling is closer.
    PreTruncated,
    /// No exact match, and the sequence after downsampling is closer or
    /// equally close.
    PostTruncated,
}

impl AlignmentMode {
    /// Returns `true` if the mode compares against the sequence before
    /// downsampling.
    pub fn is_pre_downsample(&self) -> bool {
        matches!(
            self,
            AlignmentMode::PreDownsample | AlignmentMode::PreTruncated
        )
    }

    /// Returns `true` if the sequences are truncated to a common length.
    pub fn is_truncated(&self) -> bool {
        matches!(
            self,
            AlignmentMode::PreTruncated | AlignmentMode::PostTruncated
        )
    }
}

impl From<AlignmentMode> for ppgcheck_json::AlignmentMode {
    fn from(value: AlignmentMode) -> ppgcheck_json::AlignmentMode {
        match value {
            AlignmentMode::PreDownsample => ppgcheck_json::AlignmentMode::Pre,
            AlignmentMode::PostDownsample => ppgcheck_json::AlignmentMode::Post,
            AlignmentMode::PreTruncated => ppgcheck_json::AlignmentMode::PreTrunc,
            AlignmentMode::PostTruncated => ppgcheck_json::AlignmentMode::PostTrunc,
        }
    }
}

impl std::fmt::Display for AlignmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", ppgcheck_json::AlignmentMode::from(*self))
    }
}

/// Sampling parameters of the two software domains.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DomainRates {
    /// Sample rate before downsampling, in Hz.
    pub sample_rate: f64,
    /// Downsample factor.
    pub downsample: usize,
    /// Refractory period after downsampling, in samples.
    pub refractory: usize,
}

/// Result of the alignment.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Alignment {
    /// Selected mode.
    pub mode: AlignmentMode,
    /// Number of samples compared.
    pub length: usize,
    /// Sample rate of the compared domain, in Hz.
    pub sample_rate: f64,
    /// Refractory period of the compared domain, in samples.
    pub refractory: usize,
}

/// Selects the alignment mode.
///
/// `reference` is the length of the hardware sequence, `pre` and `post` the
/// lengths of the software sequence before and after downsampling. An exact
/// match with `post` is preferred over an exact match with `pre`. Without an
/// exact match the candidate with the smallest length difference is used and
/// both sequences are truncated to the shorter length. When both candidates
/// are equally far, the post-downsample one is used.
///
/// Returns an error if `reference` is non-zero and one of the candidates is
/// empty, or if the downsample factor is zero.
pub fn resolve(
    reference: usize,
    pre: usize,
    post: usize,
    rates: &DomainRates,
) -> Result<Alignment> {
    if rates.downsample == 0 {
        return Err(Error::InvalidDownsampleFactor);
    }
    if reference != 0 && (pre == 0 || post == 0) {
        return Err(Error::AmbiguousAlignment {
            reference,
            pre,
            post,
        });
    }
    let (mode, length) = if reference == post {
        (AlignmentMode::PostDownsample, reference)
    } else if reference == pre {
        (AlignmentMode::PreDownsample, reference)
    } else if reference.abs_diff(post) <= reference.abs_diff(pre) {
        (AlignmentMode::PostTruncated, reference.min(post))
    } else {
        (AlignmentMode::PreTruncated, reference.min(pre))
    };
    let (sample_rate, refractory) = if mode.is_pre_downsample() {
        (rates.sample_rate, rates.refractory * rates.downsample)
    } else {
        (
            rates.sample_rate / rates.downsample as f64,
            rates.refractory,
        )
    };
    Ok(Alignment {
        mode,
        length,
        sample_rate,
        refractory,
    })
}

impl Alignment {
    /// Truncates the software and reference sequences to the aligned length.
    ///
    /// `pre` and `post` are the software sequences before and after
    /// downsampling. The one selected by the alignment mode is returned
    /// together with the reference.
    pub fn apply<'a, T, U>(
        &self,
        pre: &'a [T],
        post: &'a [T],
        reference: &'a [U],
    ) -> (&'a [T], &'a [U]) {
        let software = if self.mode.is_pre_downsample() {
            pre
        } else {
            post
        };
        (
            &software[..self.length.min(software.len())],
            &reference[..self.length.min(reference.len())],
        )
    }
}

impl From<Alignment> for ppgcheck_json::Alignment {
    fn from(value: Alignment) -> ppgcheck_json::Alignment {
        ppgcheck_json::Alignment {
            mode: value.mode.into(),
            length: value.length,
            sample_rate: value.sample_rate,
            refractory: value.refractory,
        }
    }
}
