//! Comparison reports.
//!
//! This module turns comparison results into the JSON schemas of
//! [`ppgcheck_json`], logs a short summary, and writes the per-sample series
//! in CSV format so that they can be plotted by external tools.

use crate::{
    config::PipelineConfig,
    pipeline::{Comparison, PeakComparison},
    trace::ReferenceTrace,
};
use anyhow::Result;
use chrono::prelude::*;
use std::io::Write;

/// Gives the versions of this tool.
pub fn versions() -> ppgcheck_json::Versions {
    ppgcheck_json::Versions {
        ppgcheck_git: git_version::git_version!(fallback = "unknown").to_string(),
        ppgcheck_version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Builds the report of a trace comparison.
pub fn compare_report(
    comparison: &Comparison,
    trace: &ReferenceTrace,
    config: &PipelineConfig,
) -> ppgcheck_json::CompareReport {
    ppgcheck_json::CompareReport {
        versions: versions(),
        datetime: now(),
        lengths: ppgcheck_json::Lengths {
            input: trace.ppg_in.len(),
            reference: trace.ppg_filt.len(),
            software_pre: comparison.filtered.len(),
            software_post: comparison.downsampled.len(),
        },
        alignment: comparison.alignment.into(),
        peaks: ppgcheck_json::Peaks {
            software: comparison.software_peaks.len(),
            reference: comparison.reference_peaks.len(),
            threshold: config.threshold,
            refractory: comparison.alignment.refractory,
            sample_rate: Some(comparison.alignment.sample_rate),
        },
        matching: comparison.matching.to_json(config.tolerance),
        bpm: ppgcheck_json::Bpm {
            software_overall: comparison.bpm.overall,
            reference_overall: comparison.bpm_comparison.map(|c| c.reference_overall),
            mean_absolute_error: comparison.bpm_comparison.map(|c| c.mean_absolute_error),
        },
    }
}

/// Builds the report of a peak dump comparison.
pub fn peaks_report(
    comparison: &PeakComparison,
    samples: usize,
    config: &PipelineConfig,
) -> ppgcheck_json::PeaksReport {
    ppgcheck_json::PeaksReport {
        versions: versions(),
        datetime: now(),
        samples,
        peaks: ppgcheck_json::Peaks {
            software: comparison.software.len(),
            reference: comparison.reference.len(),
            threshold: config.threshold,
            refractory: config.refractory,
            sample_rate: None,
        },
        matching: comparison.matching.to_json(config.tolerance),
    }
}

/// Logs a summary of a comparison report.
pub fn log_summary(report: &ppgcheck_json::CompareReport) {
    let l = &report.lengths;
    tracing::info!(
        "lengths: input {} | reference {} | software pre {} | software post {}",
        l.input,
        l.reference,
        l.software_pre,
        l.software_post
    );
    tracing::info!("alignment mode: {}", report.alignment.mode);
    tracing::info!(
        "peaks: software {} @ {} Hz (threshold {}, refractory {}) | reference {}",
        report.peaks.software,
        report.alignment.sample_rate,
        report.peaks.threshold,
        report.peaks.refractory,
        report.peaks.reference
    );
    log_matching(&report.matching);
    tracing::info!("overall BPM (software): {:.2}", report.bpm.software_overall);
    match (report.bpm.reference_overall, report.bpm.mean_absolute_error) {
        (Some(overall), Some(mae)) => {
            tracing::info!("overall BPM (reference): {overall:.2}");
            tracing::info!("per-sample BPM MAE where reference > 0: {mae:.2}");
        }
        _ => tracing::warn!("reference BPM is never positive; per-sample comparison skipped"),
    }
}

/// Logs a summary of a peak dump report.
pub fn log_peaks_summary(report: &ppgcheck_json::PeaksReport) {
    tracing::info!(
        "peaks: software {} | reference {} over {} samples",
        report.peaks.software,
        report.peaks.reference,
        report.samples
    );
    log_matching(&report.matching);
}

fn log_matching(matching: &ppgcheck_json::Matching) {
    tracing::info!(
        "peak match (±{} samples): TP={}, FP={}, FN={}",
        matching.tolerance,
        matching.true_positive,
        matching.false_positive,
        matching.false_negative
    );
}

/// Serializes a report in pretty JSON, with a final newline.
pub fn to_json<T: serde::Serialize>(report: &T) -> Result<String> {
    let mut s = serde_json::to_string_pretty(report)?;
    s.push('\n');
    Ok(s)
}

/// Writes the aligned per-sample series of a comparison in CSV format.
///
/// The columns are the sample index, the reference and software filtered
/// signals, the peak flags of both, and the BPM series of both. Rows span the
/// longest of the aligned signals and the BPM columns; missing values are left
/// empty.
pub fn write_series<W: Write>(writer: W, comparison: &Comparison) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record([
        "index",
        "reference",
        "software",
        "reference_peak",
        "software_peak",
        "reference_bpm",
        "software_bpm",
    ])?;
    let rows = comparison
        .software
        .len()
        .max(comparison.reference.len())
        .max(comparison.reference_bpm.len());
    let software_peaks = flags(
        comparison.software.len(),
        comparison.software_peaks.iter().map(|p| p.index),
    );
    let reference_peaks = flags(
        comparison.reference.len(),
        comparison.reference_peaks.iter().copied(),
    );
    for i in 0..rows {
        writer.write_record([
            i.to_string(),
            cell(&comparison.reference, i),
            cell(&comparison.software, i),
            cell(&reference_peaks, i),
            cell(&software_peaks, i),
            cell(&comparison.reference_bpm, i),
            cell(&comparison.software_bpm, i),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn flags(len: usize, peaks: impl Iterator<Item = usize>) -> Vec<u8> {
    let mut flags = vec![0; len];
    for i in peaks.filter(|&i| i < len) {
        flags[i] = 1;
    }
    flags
}

fn cell<T: ToString>(values: &[T], i: usize) -> String {
    values.get(i).map(ToString::to_string).unwrap_or_default()
}

/// Writes a filtered input vector in CSV format, with columns `Input` and
/// `Output`.
pub fn write_filtered<W: Write>(writer: W, input: &[i32], output: &[i32]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["Input", "Output"])?;
    for (x, y) in input.iter().zip(output) {
        writer.write_record([x.to_string(), y.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pipeline::Pipeline;

    fn comparison() -> (Comparison, ReferenceTrace, PipelineConfig) {
        let config = PipelineConfig::default();
        let trace = ReferenceTrace {
            ppg_in: vec![0, 400, 0, 0, 0, 0],
            ppg_filt: vec![0, 0, 0],
            peak_pulse: vec![0, 1, 0],
            bpm_value: vec![0.0, 0.0, 0.0, 0.0],
        };
        let cmp = Pipeline::new(config).unwrap().run(&trace).unwrap();
        (cmp, trace, config)
    }

    #[test]
    fn compare_report_fields() {
        let (cmp, trace, config) = comparison();
        let report = compare_report(&cmp, &trace, &config);
        assert_eq!(report.lengths.input, 6);
        assert_eq!(report.lengths.reference, 3);
        assert_eq!(report.lengths.software_pre, 6);
        assert_eq!(report.lengths.software_post, 3);
        assert_eq!(report.alignment.mode, ppgcheck_json::AlignmentMode::Post);
        assert_eq!(report.peaks.reference, 1);
        assert_eq!(report.matching.tolerance, 1);
        assert_eq!(report.bpm.reference_overall, None);
        assert_eq!(report.versions.ppgcheck_version, env!("CARGO_PKG_VERSION"));
        let json = to_json(&report).unwrap();
        assert!(json.ends_with("}\n"));
        assert!(json.contains(r#""mode": "post""#));
    }

    #[test]
    fn series_csv() {
        let (cmp, _, _) = comparison();
        let mut out = Vec::new();
        write_series(&mut out, &cmp).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "index,reference,software,reference_peak,software_peak,reference_bpm,software_bpm"
        );
        // the fourth BPM value is outside the aligned samples
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("1,0,"));
        assert!(lines[2].contains(",1,"));
        assert!(lines[3].ends_with(",0,0"));
    }

    #[test]
    fn filtered_csv() {
        let mut out = Vec::new();
        write_filtered(&mut out, &[1, 2], &[3, -4]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Input,Output\n1,3\n2,-4\n");
    }
}
