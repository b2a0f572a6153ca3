//! CSV traces.
//!
//! This module reads the CSV files produced by the hardware simulation: the
//! full reference trace of the digital block, the raw input vectors, and the
//! peak detector dumps.

use anyhow::{Context, Result};
use std::io::Read;

/// Columns of the reference trace.
pub const REFERENCE_COLUMNS: [&str; 4] = ["ppg_in", "ppg_filt", "peak_pulse", "bpm_value"];

/// Reference trace of the hardware digital block.
///
/// All the columns have the same length, one entry per CSV row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceTrace {
    /// Raw input samples.
    pub ppg_in: Vec<i32>,
    /// Hardware filtered output.
    pub ppg_filt: Vec<i32>,
    /// Hardware peak flag, one at each detected peak.
    pub peak_pulse: Vec<i64>,
    /// Hardware BPM register.
    pub bpm_value: Vec<f64>,
}

impl ReferenceTrace {
    /// Reads a reference trace.
    ///
    /// The CSV must have a header row containing the columns listed in
    /// [`REFERENCE_COLUMNS`], in any order. Other columns are ignored. An
    /// error listing all the missing columns is returned if some are absent.
    pub fn from_reader<R: Read>(reader: R) -> Result<ReferenceTrace> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        let positions = REFERENCE_COLUMNS.map(|name| headers.iter().position(|h| h == name));
        let [Some(ppg_in), Some(ppg_filt), Some(peak_pulse), Some(bpm_value)] = positions else {
            let missing: Vec<&str> = REFERENCE_COLUMNS
                .iter()
                .zip(&positions)
                .filter_map(|(&name, pos)| pos.is_none().then_some(name))
                .collect();
            anyhow::bail!("CSV missing columns: {missing:?}");
        };

        let mut trace = ReferenceTrace::default();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let field = |column: usize| {
                record
                    .get(column)
                    .with_context(|| format!("row {} is too short", row + 1))
            };
            let context = |column: usize| {
                format!("row {}, column {}", row + 1, &headers[column])
            };
            trace
                .ppg_in
                .push(parse_sample(field(ppg_in)?).with_context(|| context(ppg_in))?);
            trace
                .ppg_filt
                .push(parse_sample(field(ppg_filt)?).with_context(|| context(ppg_filt))?);
            trace
                .peak_pulse
                .push(parse_integer(field(peak_pulse)?).with_context(|| context(peak_pulse))?);
            trace.bpm_value.push(
                field(bpm_value)?
                    .parse::<f64>()
                    .with_context(|| context(bpm_value))?,
            );
        }
        tracing::debug!(rows = trace.len(), "read reference trace");
        Ok(trace)
    }

    /// Gives the number of rows in the trace.
    pub fn len(&self) -> usize {
        self.ppg_in.len()
    }

    /// Returns `true` if the trace has no rows.
    pub fn is_empty(&self) -> bool {
        self.ppg_in.is_empty()
    }
}

/// Reads a raw input vector.
///
/// The samples are taken from the column named `PPG`, or from the first
/// column if there is no such column. The CSV must have a header row.
pub fn read_input<R: Read>(reader: R) -> Result<Vec<i32>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let column = reader
        .headers()?
        .iter()
        .position(|h| h == "PPG")
        .unwrap_or(0);
    reader
        .records()
        .enumerate()
        .map(|(row, record)| {
            let record = record?;
            let field = record
                .get(column)
                .with_context(|| format!("row {} is too short", row + 1))?;
            parse_sample(field).with_context(|| format!("row {}", row + 1))
        })
        .collect()
}

/// Peak detector dump.
///
/// The dump has no header row and three columns: sample index, signal value
/// and peak flag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeakDump {
    /// Sample index.
    pub index: Vec<usize>,
    /// Signal fed to the peak detector.
    pub ppg: Vec<i32>,
    /// Peak flag.
    pub peak_pulse: Vec<i64>,
}

impl PeakDump {
    /// Reads a peak detector dump.
    pub fn from_reader<R: Read>(reader: R) -> Result<PeakDump> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut dump = PeakDump::default();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            anyhow::ensure!(
                record.len() >= 3,
                "row {} has {} columns instead of 3",
                row + 1,
                record.len()
            );
            let context = || format!("row {}", row + 1);
            let index = parse_integer(&record[0]).with_context(context)?;
            dump.index.push(usize::try_from(index).with_context(context)?);
            dump.ppg.push(parse_sample(&record[1]).with_context(context)?);
            dump.peak_pulse.push(parse_integer(&record[2]).with_context(context)?);
        }
        Ok(dump)
    }

    /// Gives the sample indices flagged as peaks.
    pub fn flagged_indices(&self) -> Vec<usize> {
        crate::peaks::from_pulse(&self.peak_pulse)
            .into_iter()
            .map(|i| self.index[i])
            .collect()
    }
}

// Integer columns are sometimes written as floats (e.g. "12.0") by the
// simulation scripts.
fn parse_integer(field: &str) -> Result<i64> {
    if let Ok(x) = field.parse::<i64>() {
        return Ok(x);
    }
    let x = field
        .parse::<f64>()
        .with_context(|| format!("{field:?} is not a number"))?;
    anyhow::ensure!(
        x.is_finite() && x.fract() == 0.0 && x.abs() < 9.0e18,
        "{field:?} is not an integer"
    );
    Ok(x as i64)
}

fn parse_sample(field: &str) -> Result<i32> {
    let x = parse_integer(field)?;
    i32::try_from(x).with_context(|| format!("{x} does not fit in 32 bits"))
}
