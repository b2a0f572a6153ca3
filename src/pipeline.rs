//! Software replay of the hardware pipeline.
//!
//! This module runs the whole signal chain on the raw input of a reference
//! trace and compares each stage with the hardware output: filtered signal,
//! peaks and BPM.

use crate::{
    alignment::{self, Alignment},
    bpm::{self, BpmComparison, BpmEstimate},
    config::PipelineConfig,
    downsample::decimate,
    error::Result,
    filter::Filter,
    matcher::{match_with_tolerance, MatchResult},
    peaks::{self, Peak},
    trace::ReferenceTrace,
};

/// Pipeline runner.
///
/// Holds a validated configuration. Each call to [`Pipeline::run`] uses
/// freshly constructed filters, so runs do not affect each other.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    config: PipelineConfig,
}

/// Outcome of comparing the software replay with a reference trace.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Software filtered sequence before downsampling.
    pub filtered: Vec<i32>,
    /// Software filtered sequence after downsampling.
    pub downsampled: Vec<i32>,
    /// Selected alignment.
    pub alignment: Alignment,
    /// Aligned software filtered sequence.
    pub software: Vec<i32>,
    /// Aligned hardware filtered sequence.
    pub reference: Vec<i32>,
    /// Peaks detected on the aligned software sequence.
    pub software_peaks: Vec<Peak<i32>>,
    /// Peaks flagged by the hardware within the aligned length.
    pub reference_peaks: Vec<usize>,
    /// Heart rate estimated from the software peaks.
    pub bpm: BpmEstimate,
    /// Software BPM series fitted to the aligned length.
    pub software_bpm: Vec<f64>,
    /// Hardware BPM column truncated to the aligned length.
    pub reference_bpm: Vec<f64>,
    /// Agreement of the BPM series, if the hardware ever reported a rate.
    pub bpm_comparison: Option<BpmComparison>,
    /// Matching of software peaks (first set) against hardware peaks.
    pub matching: MatchResult,
}

impl Pipeline {
    /// Creates a pipeline runner, validating the configuration.
    pub fn new(config: PipelineConfig) -> Result<Pipeline> {
        config.validate()?;
        Ok(Pipeline { config })
    }

    /// Gives the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Filters and downsamples a raw input sequence.
    ///
    /// Returns the filtered sequence before and after downsampling.
    pub fn filter(&self, input: &[i32]) -> Result<(Vec<i32>, Vec<i32>)> {
        let filtered = self.config.filter_chain()?.process_all(input);
        let downsampled = decimate(&filtered, self.config.downsample)?;
        Ok((filtered, downsampled))
    }

    /// Runs the software pipeline on a reference trace and compares it.
    #[tracing::instrument(
        name = "Pipeline::run",
        level = "debug",
        skip_all,
        fields(rows = trace.len())
    )]
    pub fn run(&self, trace: &ReferenceTrace) -> Result<Comparison> {
        let (filtered, downsampled) = self.filter(&trace.ppg_in)?;
        let alignment = alignment::resolve(
            trace.ppg_filt.len(),
            filtered.len(),
            downsampled.len(),
            &self.config.rates(),
        )?;
        tracing::info!(
            mode = %alignment.mode,
            length = alignment.length,
            reference = trace.ppg_filt.len(),
            pre = filtered.len(),
            post = downsampled.len(),
            "selected alignment"
        );
        if alignment.mode.is_truncated() {
            tracing::warn!(
                "no software sequence matches the reference length; truncating to {} samples",
                alignment.length
            );
        }
        let (software, reference) = alignment.apply(&filtered, &downsampled, &trace.ppg_filt);
        let (software, reference) = (software.to_vec(), reference.to_vec());

        let software_peaks = peaks::detect(&software, self.config.threshold, alignment.refractory);
        let flags = &trace.peak_pulse[..trace.peak_pulse.len().min(reference.len())];
        let reference_peaks = peaks::from_pulse(flags);
        tracing::debug!(
            software = software_peaks.len(),
            reference = reference_peaks.len(),
            refractory = alignment.refractory,
            "detected peaks"
        );

        let software_indices = peaks::indices(&software_peaks);
        let bpm = bpm::estimate(&software_indices, alignment.sample_rate);
        let software_bpm = bpm::fit_to_length(&bpm.series, alignment.length);
        let bpm_len = alignment.length.min(trace.bpm_value.len());
        let reference_bpm = trace.bpm_value[..bpm_len].to_vec();
        let bpm_comparison = bpm::compare(&software_bpm, &reference_bpm);
        let matching =
            match_with_tolerance(&software_indices, &reference_peaks, self.config.tolerance);

        Ok(Comparison {
            filtered,
            downsampled,
            alignment,
            software,
            reference,
            software_peaks,
            reference_peaks,
            bpm,
            software_bpm,
            reference_bpm,
            bpm_comparison,
            matching,
        })
    }

    /// Compares a peak detector dump with the software peak detector.
    ///
    /// The software detector runs on the dumped signal with the configured
    /// threshold and refractory period. The dump is in the downsampled domain,
    /// so the refractory period is used as is.
    pub fn compare_peaks(&self, dump: &crate::trace::PeakDump) -> PeakComparison {
        let detected = peaks::detect(&dump.ppg, self.config.threshold, self.config.refractory);
        let software: Vec<usize> = detected.iter().map(|p| dump.index[p.index]).collect();
        let reference = dump.flagged_indices();
        let matching = match_with_tolerance(&software, &reference, self.config.tolerance);
        PeakComparison {
            software,
            reference,
            matching,
        }
    }
}

/// Outcome of comparing a peak detector dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeakComparison {
    /// Sample indices of the software peaks.
    pub software: Vec<usize>,
    /// Sample indices flagged by the hardware.
    pub reference: Vec<usize>,
    /// Matching of software peaks against hardware peaks.
    pub matching: MatchResult,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{alignment::AlignmentMode, error::Error, trace::PeakDump};

    // Pulse train at 50 Hz with a period of 40 samples (75 BPM).
    fn input(len: usize) -> Vec<i32> {
        (0..len)
            .map(|n| if n % 40 < 4 { 400 } else { -20 })
            .collect()
    }

    fn trace_from(config: &PipelineConfig, len: usize, pre: bool) -> ReferenceTrace {
        let pipeline = Pipeline::new(*config).unwrap();
        let ppg_in = input(len);
        let (filtered, downsampled) = pipeline.filter(&ppg_in).unwrap();
        let (ppg_filt, refractory) = if pre {
            (filtered, config.refractory * config.downsample)
        } else {
            (downsampled, config.refractory)
        };
        let mut peak_pulse = vec![0; ppg_filt.len()];
        for p in peaks::detect(&ppg_filt, config.threshold, refractory) {
            peak_pulse[p.index] = 1;
        }
        let bpm_value = vec![75.0; ppg_filt.len()];
        ReferenceTrace {
            ppg_in,
            ppg_filt,
            peak_pulse,
            bpm_value,
        }
    }

    #[test]
    fn post_downsample_trace_agrees() {
        let config = PipelineConfig::default();
        let trace = trace_from(&config, 400, false);
        let cmp = Pipeline::new(config).unwrap().run(&trace).unwrap();
        assert_eq!(cmp.alignment.mode, AlignmentMode::PostDownsample);
        assert_eq!(cmp.alignment.sample_rate, 25.0);
        assert_eq!(cmp.software, cmp.reference);
        assert_eq!(cmp.filtered.len(), 400);
        assert_eq!(cmp.downsampled.len(), 200);
        assert!(!cmp.software_peaks.is_empty());
        assert_eq!(cmp.matching.false_positive, 0);
        assert_eq!(cmp.matching.false_negative, 0);
        assert_eq!(cmp.software_bpm.len(), 200);
        assert_eq!(cmp.bpm.overall, 75.0);
    }

    #[test]
    fn pre_downsample_trace_agrees() {
        let config = PipelineConfig::default();
        let trace = trace_from(&config, 400, true);
        let cmp = Pipeline::new(config).unwrap().run(&trace).unwrap();
        assert_eq!(cmp.alignment.mode, AlignmentMode::PreDownsample);
        assert_eq!(cmp.alignment.refractory, 16);
        assert_eq!(cmp.alignment.sample_rate, 50.0);
        assert_eq!(cmp.matching.false_negative, 0);
        assert_eq!(cmp.bpm.overall, 75.0);
    }

    #[test]
    fn short_reference_is_truncated() {
        let config = PipelineConfig::default();
        let mut trace = trace_from(&config, 400, false);
        trace.ppg_filt.truncate(190);
        let cmp = Pipeline::new(config).unwrap().run(&trace).unwrap();
        assert_eq!(cmp.alignment.mode, AlignmentMode::PostTruncated);
        assert_eq!(cmp.software.len(), 190);
        assert_eq!(cmp.reference.len(), 190);
        assert!(cmp.reference_peaks.iter().all(|&i| i < 190));
    }

    #[test]
    fn bpm_is_compared_within_alignment() {
        let config = PipelineConfig::default();
        let mut trace = trace_from(&config, 200, true);
        // the hardware kept running for 50 more rows
        trace.ppg_filt.resize(250, 0);
        trace.peak_pulse.resize(250, 0);
        trace.bpm_value.resize(250, 75.0);
        let cmp = Pipeline::new(config).unwrap().run(&trace).unwrap();
        assert_eq!(cmp.alignment.mode, AlignmentMode::PreTruncated);
        assert_eq!(cmp.alignment.length, 200);
        assert_eq!(cmp.software_bpm.len(), 200);
        assert_eq!(cmp.reference_bpm.len(), 200);
        let bpm = cmp.bpm_comparison.unwrap();
        assert_eq!(bpm.samples, 200);
        assert_eq!(bpm.reference_overall, 75.0);
    }

    #[test]
    fn runs_are_independent() {
        let config = PipelineConfig::default();
        let trace = trace_from(&config, 300, false);
        let pipeline = Pipeline::new(config).unwrap();
        assert_eq!(pipeline.run(&trace).unwrap(), pipeline.run(&trace).unwrap());
    }

    #[test]
    fn empty_input_with_reference() {
        let trace = ReferenceTrace {
            ppg_filt: vec![1, 2, 3],
            ..ReferenceTrace::default()
        };
        let err = Pipeline::new(PipelineConfig::default())
            .unwrap()
            .run(&trace)
            .unwrap_err();
        assert!(matches!(err, Error::AmbiguousAlignment { reference: 3, .. }));
    }

    #[test]
    fn invalid_config() {
        let config = PipelineConfig {
            downsample: 0,
            ..PipelineConfig::default()
        };
        assert_eq!(Pipeline::new(config), Err(Error::InvalidDownsampleFactor));
    }

    #[test]
    fn peak_dump() {
        let dump = PeakDump {
            index: (100..110).collect(),
            ppg: vec![0, 60, 0, 0, 0, 0, 0, 0, 0, 0],
            peak_pulse: vec![0, 0, 1, 0, 0, 0, 0, 0, 1, 0],
        };
        let cmp = Pipeline::new(PipelineConfig::default())
            .unwrap()
            .compare_peaks(&dump);
        assert_eq!(cmp.software, vec![101]);
        assert_eq!(cmp.reference, vec![102, 108]);
        assert_eq!(cmp.matching.true_positive, 1);
        assert_eq!(cmp.matching.false_negative, 1);
    }
}
