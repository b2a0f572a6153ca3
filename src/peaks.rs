//! Peak detection.
//!
//! Peaks are strict local maxima above a threshold. A refractory period
//! suppresses double detections: among peaks closer than the refractory
//! distance only the highest one is kept.

use std::cmp::Ordering;

/// Detected peak.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Peak<T> {
    /// Index of the peak in the sequence.
    pub index: usize,
    /// Value of the sequence at the peak.
    pub value: T,
}

/// Detects peaks in a sequence.
///
/// A sample is a candidate if it is strictly greater than both of its
/// neighbours and not smaller than `threshold`. The first and last samples
/// are never candidates. Candidates are then visited from highest to lowest
/// value (earliest index first among equal values), and each retained
/// candidate removes all the other candidates closer than `min_distance`
/// samples. A `min_distance` of 0 or 1 disables this suppression.
///
/// The returned peaks are sorted by index and any two of them are at least
/// `min_distance` samples apart.
pub fn detect<T: PartialOrd + Copy>(
    sequence: &[T],
    threshold: T,
    min_distance: usize,
) -> Vec<Peak<T>> {
    let candidates: Vec<Peak<T>> = sequence
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0] && w[1] > w[2] && w[1] >= threshold)
        .map(|(i, w)| Peak {
            index: i + 1,
            value: w[1],
        })
        .collect();
    if min_distance <= 1 || candidates.len() < 2 {
        return candidates;
    }

    let mut priority: Vec<usize> = (0..candidates.len()).collect();
    priority.sort_by(|&a, &b| {
        candidates[b]
            .value
            .partial_cmp(&candidates[a].value)
            .unwrap_or(Ordering::Equal)
            .then(candidates[a].index.cmp(&candidates[b].index))
    });

    let mut keep = vec![true; candidates.len()];
    for &k in &priority {
        if !keep[k] {
            continue;
        }
        let index = candidates[k].index;
        // candidates are sorted by index, so the neighbours to suppress are
        // contiguous on each side of k
        for j in (0..k).rev() {
            if index - candidates[j].index >= min_distance {
                break;
            }
            keep[j] = false;
        }
        for j in k + 1..candidates.len() {
            if candidates[j].index - index >= min_distance {
                break;
            }
            keep[j] = false;
        }
    }

    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(peak, keep)| keep.then_some(peak))
        .collect()
}

/// Gives the indices of a set of peaks.
pub fn indices<T>(peaks: &[Peak<T>]) -> Vec<usize> {
    peaks.iter().map(|p| p.index).collect()
}

/// Extracts peak indices from a per-sample peak flag.
///
/// The hardware asserts its peak output for one sample at each detected peak.
/// The indices where the flag equals one are returned.
pub fn from_pulse(flags: &[i64]) -> Vec<usize> {
    flags
        .iter()
        .enumerate()
        .filter_map(|(i, &flag)| (flag == 1).then_some(i))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn local_maxima_above_threshold() {
        let seq = [0, 60, 0, 40, 0, 70, 70, 0, 55];
        // 40 is below threshold, the 70 plateau is not strict and the last
        // sample is a boundary
        assert_eq!(indices(&detect(&seq, 50, 0)), vec![1]);
        assert_eq!(indices(&detect(&seq, 0, 0)), vec![1, 3]);
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(
            detect(&[0, 50, 0], 50, 1),
            vec![Peak {
                index: 1,
                value: 50
            }]
        );
    }

    #[test]
    fn degenerate_inputs() {
        assert!(detect::<i32>(&[], 0, 8).is_empty());
        assert!(detect(&[5], 0, 8).is_empty());
        assert!(detect(&[1, 5], 0, 8).is_empty());
        assert!(detect(&[0, 10, 0, 20, 0], 100, 8).is_empty());
    }

    #[test]
    fn refractory_keeps_highest() {
        let seq = [0, 60, 0, 90, 0, 70, 0, 0, 0, 0, 0, 80, 0];
        let peaks = detect(&seq, 50, 4);
        assert_eq!(indices(&peaks), vec![3, 11]);
        assert_eq!(peaks[0].value, 90);
    }

    #[test]
    fn refractory_ties_keep_earliest() {
        let seq = [0, 80, 0, 80, 0, 80, 0];
        assert_eq!(indices(&detect(&seq, 50, 3)), vec![1, 5]);
        assert_eq!(indices(&detect(&seq, 50, 4)), vec![1, 5]);
        assert_eq!(indices(&detect(&seq, 50, 5)), vec![1]);
    }

    #[test]
    fn suppressed_candidates_do_not_suppress() {
        // 70 at 3 is removed by 100 at 6, so 60 at 1 survives even though it
        // is within the refractory distance of 70
        let seq = [0, 60, 0, 70, 0, 0, 100, 0];
        assert_eq!(indices(&detect(&seq, 0, 4)), vec![1, 6]);
    }

    #[test]
    fn float_sequences() {
        let seq = [0.0, 1.5, 0.2, 2.5, 0.1];
        let peaks = detect(&seq, 1.0, 2);
        assert_eq!(indices(&peaks), vec![1, 3]);
        assert_eq!(peaks[1].value, 2.5);
    }

    #[test]
    fn pulse_flags() {
        assert_eq!(from_pulse(&[0, 1, 0, 0, 1, 1, 2]), vec![1, 4, 5]);
        assert!(from_pulse(&[]).is_empty());
    }

    proptest! {
        #[test]
        fn peaks_are_spaced_and_separated(
            seq in proptest::collection::vec(-512i32..512, 0..400),
            threshold in -100i32..200,
            min_distance in 0usize..20,
        ) {
            let peaks = detect(&seq, threshold, min_distance);
            for p in &peaks {
                prop_assert!(p.value >= threshold);
                prop_assert_eq!(seq[p.index], p.value);
            }
            for pair in peaks.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                prop_assert!(b.index > a.index);
                prop_assert!(b.index - a.index >= min_distance);
                let valley = seq[a.index + 1..b.index].iter().min().copied();
                prop_assert!(valley.is_some_and(|v| v <= a.value && v <= b.value));
            }
        }
    }
}
