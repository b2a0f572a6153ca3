//! ppgcheck-json contains the JSON schemas of the reports written by ppgcheck.

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};

/// Comparison report JSON schema.
///
/// This is the report written by the `compare` subcommand. It summarizes how
/// the software replay of the fixed-point pipeline agrees with a hardware
/// reference trace.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompareReport {
    /// Tool versions used to produce the report.
    pub versions: Versions,
    /// Report creation time, in RFC 3339 format.
    pub datetime: String,
    /// Sequence lengths seen during the comparison.
    pub lengths: Lengths,
    /// Alignment selected between the reference and the software sequences.
    pub alignment: Alignment,
    /// Peak detection summary.
    pub peaks: Peaks,
    /// Peak matching counts.
    pub matching: Matching,
    /// Heart rate summary.
    pub bpm: Bpm,
}

/// Peak comparison report JSON schema.
///
/// This is the report written by the `peaks` subcommand, which compares a peak
/// detector dump against the software peak detector on the same signal.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PeaksReport {
    /// Tool versions used to produce the report.
    pub versions: Versions,
    /// Report creation time, in RFC 3339 format.
    pub datetime: String,
    /// Number of samples in the dump.
    pub samples: usize,
    /// Peak detection summary.
    pub peaks: Peaks,
    /// Peak matching counts.
    pub matching: Matching,
}

/// Tool versions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Versions {
    /// git version of the ppgcheck sources.
    pub ppgcheck_git: String,
    /// ppgcheck crate version.
    pub ppgcheck_version: String,
}

/// Sequence lengths.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Lengths {
    /// Length of the raw input column.
    pub input: usize,
    /// Length of the hardware filtered column.
    pub reference: usize,
    /// Length of the software filtered sequence before downsampling.
    pub software_pre: usize,
    /// Length of the software filtered sequence after downsampling.
    pub software_post: usize,
}

/// Alignment JSON schema.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Alignment {
    /// Selected alignment mode.
    pub mode: AlignmentMode,
    /// Number of samples compared.
    pub length: usize,
    /// Sample rate of the compared domain in Hz.
    pub sample_rate: f64,
    /// Refractory period of the compared domain in samples.
    pub refractory: usize,
}

/// Alignment mode.
///
/// This enum lists the ways in which the reference sequence can be put in
/// correspondence with the software sequences.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AlignmentMode {
    /// Compared against the sequence before downsampling.
    Pre,
    /// Compared against the sequence after downsampling.
    Post,
    /// Compared against the truncated sequence before downsampling.
    PreTrunc,
    /// Compared against the truncated sequence after downsampling.
    PostTrunc,
}

macro_rules! impl_str_conv {
    ($ty:ty, $($s:expr => $v:ident),*) => {
        impl std::str::FromStr for $ty {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, ()> {
                Ok(match s {
                    $(
                        $s => <$ty>::$v,
                    )*
                        _ => return Err(()),
                })
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
                write!(f, "{}", match self {
                    $(
                        <$ty>::$v => $s,
                    )*
                })
            }
        }
    }
}

impl_str_conv!(AlignmentMode,
               "pre" => Pre,
               "post" => Post,
               "pre-trunc" => PreTrunc,
               "post-trunc" => PostTrunc);

/// Peak detection summary.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Peaks {
    /// Number of peaks found by the software detector.
    pub software: usize,
    /// Number of peaks flagged by the hardware.
    pub reference: usize,
    /// Detection threshold.
    pub threshold: i32,
    /// Refractory period in samples.
    pub refractory: usize,
    /// Sample rate of the peak domain in Hz.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<f64>,
}

/// Peak matching counts.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Matching {
    /// Matching tolerance in samples.
    pub tolerance: usize,
    /// Software peaks with a hardware peak within the tolerance.
    pub true_positive: usize,
    /// Software peaks without a hardware peak within the tolerance.
    pub false_positive: usize,
    /// Hardware peaks without a software peak within the tolerance.
    pub false_negative: usize,
}

/// Heart rate summary.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Bpm {
    /// Mean instantaneous BPM of the software peaks.
    pub software_overall: f64,
    /// Mean of the positive hardware BPM values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_overall: Option<f64>,
    /// Per-sample mean absolute error where the hardware BPM is positive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_absolute_error: Option<f64>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn alignment_mode_strings() {
        for mode in [
            AlignmentMode::Pre,
            AlignmentMode::Post,
            AlignmentMode::PreTrunc,
            AlignmentMode::PostTrunc,
        ] {
            assert_eq!(mode.to_string().parse::<AlignmentMode>(), Ok(mode));
            // serde and Display agree on the spelling
            assert_eq!(
                serde_json::to_string(&mode).unwrap(),
                format!("\"{mode}\"")
            );
        }
        assert!("truncated".parse::<AlignmentMode>().is_err());
    }

    #[test]
    fn bpm_skips_missing_reference() {
        let bpm = Bpm {
            software_overall: 72.0,
            reference_overall: None,
            mean_absolute_error: None,
        };
        assert_eq!(
            serde_json::to_string(&bpm).unwrap(),
            r#"{"software_overall":72.0}"#
        );
    }
}
