//! Heart rate estimation.
//!
//! The heart rate is derived from the intervals between consecutive peaks.
//! Besides the overall rate, a per-sample series is produced that holds the
//! latest instantaneous rate at every sample, mimicking the hardware BPM
//! register, which keeps its value until the next peak updates it.

/// Heart rate estimate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BpmEstimate {
    /// Mean of the instantaneous rates, or zero with fewer than two peaks.
    pub overall: f64,
    /// Instantaneous rate of each pair of consecutive peaks.
    pub instantaneous: Vec<f64>,
    /// Per-sample rate, of length `last_peak + 1`.
    pub series: Vec<f64>,
}

/// Forward-fill accumulator.
///
/// Replaces each zero by the last non-zero value seen before it. Zeros before
/// the first non-zero value are kept.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct ForwardFill {
    last: f64,
}

impl ForwardFill {
    /// Gives the value currently held.
    pub fn held(&self) -> f64 {
        self.last
    }

    /// Feeds one value and returns its filled replacement.
    pub fn fill(&mut self, value: f64) -> f64 {
        if value != 0.0 {
            self.last = value;
        }
        self.last
    }
}

/// Estimates the heart rate from a set of peak indices.
///
/// The indices must be strictly increasing, as returned by
/// [`crate::peaks::detect`].
///
/// The instantaneous rate of peaks `p[k-1]` and `p[k]` is
/// `60 / ((p[k] - p[k-1]) / sample_rate)` and is placed at index `p[k]` of the
/// series. The series is then forward-filled. Its length is `last_peak + 1`,
/// so callers comparing it with a longer sequence must pad it (see
/// [`fit_to_length`]).
pub fn estimate(peaks: &[usize], sample_rate: f64) -> BpmEstimate {
    debug_assert!(
        peaks.windows(2).all(|p| p[0] < p[1]),
        "peak indices are not strictly increasing"
    );
    let Some(&last) = peaks.last() else {
        return BpmEstimate::default();
    };
    let mut placed = vec![0.0; last + 1];
    if peaks.len() < 2 {
        return BpmEstimate {
            series: placed,
            ..BpmEstimate::default()
        };
    }

    let instantaneous: Vec<f64> = peaks
        .windows(2)
        .map(|p| 60.0 / ((p[1] - p[0]) as f64 / sample_rate))
        .collect();
    for (p, &bpm) in peaks[1..].iter().zip(&instantaneous) {
        placed[*p] = bpm;
    }
    let overall = instantaneous.iter().sum::<f64>() / instantaneous.len() as f64;
    let mut fill = ForwardFill::default();
    let series = placed.into_iter().map(|x| fill.fill(x)).collect();

    BpmEstimate {
        overall,
        instantaneous,
        series,
    }
}

/// Truncates or zero-pads a series to a given length.
pub fn fit_to_length(series: &[f64], len: usize) -> Vec<f64> {
    let mut out: Vec<f64> = series.iter().copied().take(len).collect();
    out.resize(len, 0.0);
    out
}

/// Agreement between a software and a reference BPM series.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BpmComparison {
    /// Mean of the positive reference values.
    pub reference_overall: f64,
    /// Mean absolute error over the positions where the reference is positive.
    pub mean_absolute_error: f64,
    /// Number of positions where the reference is positive.
    pub samples: usize,
}

/// Compares a software BPM series with a reference series.
///
/// Only positions where the reference is positive are considered, since the
/// hardware reports zero until it has seen two peaks. Positions beyond the end
/// of `software` count as zero. Returns `None` if the reference is never
/// positive.
pub fn compare(software: &[f64], reference: &[f64]) -> Option<BpmComparison> {
    let (count, sum, abs_error) = reference
        .iter()
        .enumerate()
        .filter(|(_, &r)| r > 0.0)
        .fold((0usize, 0.0, 0.0), |(count, sum, abs_error), (i, &r)| {
            let s = software.get(i).copied().unwrap_or(0.0);
            (count + 1, sum + r, abs_error + (s - r).abs())
        });
    (count > 0).then(|| BpmComparison {
        reference_overall: sum / count as f64,
        mean_absolute_error: abs_error / count as f64,
        samples: count,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn three_peaks() {
        let est = estimate(&[10, 20, 35], 25.0);
        assert_eq!(est.instantaneous, vec![150.0, 100.0]);
        assert_eq!(est.overall, 125.0);
        assert_eq!(est.series.len(), 36);
        assert!(est.series[..20].iter().all(|&x| x == 0.0));
        assert!(est.series[20..35].iter().all(|&x| x == 150.0));
        assert_eq!(est.series[35], 100.0);
    }

    #[test]
    fn overall_is_unweighted() {
        // intervals 10 and 30 samples at 60 Hz: 360 and 120 BPM
        let est = estimate(&[0, 10, 40], 60.0);
        assert_eq!(est.overall, 240.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "strictly increasing")]
    fn unsorted_peaks() {
        estimate(&[20, 10], 25.0);
    }

    #[test]
    fn fewer_than_two_peaks() {
        let est = estimate(&[], 25.0);
        assert_eq!(est, BpmEstimate::default());
        let est = estimate(&[7], 25.0);
        assert_eq!(est.overall, 0.0);
        assert!(est.instantaneous.is_empty());
        assert_eq!(est.series, vec![0.0; 8]);
    }

    #[test]
    fn forward_fill() {
        let mut fill = ForwardFill::default();
        let out: Vec<f64> = [0.0, 3.0, 0.0, 0.0, 5.0, 0.0]
            .into_iter()
            .map(|x| fill.fill(x))
            .collect();
        assert_eq!(out, vec![0.0, 3.0, 3.0, 3.0, 5.0, 5.0]);
        assert_eq!(fill.held(), 5.0);
    }

    #[test]
    fn fit() {
        assert_eq!(fit_to_length(&[1.0, 2.0, 3.0], 2), vec![1.0, 2.0]);
        assert_eq!(fit_to_length(&[1.0], 3), vec![1.0, 0.0, 0.0]);
        assert!(fit_to_length(&[], 0).is_empty());
    }

    #[test]
    fn comparison() {
        let software = [0.0, 60.0, 60.0, 70.0];
        let reference = [0.0, 0.0, 62.0, 66.0, 80.0];
        let cmp = compare(&software, &reference).unwrap();
        assert_eq!(cmp.samples, 3);
        assert_eq!(cmp.reference_overall, 208.0 / 3.0);
        // |60-62| + |70-66| + |0-80|
        assert_eq!(cmp.mean_absolute_error, 86.0 / 3.0);
        assert_eq!(compare(&software, &[0.0, 0.0]), None);
    }
}
