//! Tolerance matching of event indices.
//!
//! Two sorted sets of event indices (typically software and hardware peaks)
//! are matched with a greedy two-pointer sweep. This is not an optimal
//! bipartite matching: for each element of the first set, the earliest
//! unconsumed element of the second set that is not too early is tried, and
//! matched if it is within the tolerance. Peaks obey a refractory distance, so
//! closely spaced events that would make the greedy choice suboptimal are rare.

/// Result of matching two index sets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchResult {
    /// Elements of the first set matched to the second set.
    pub true_positive: usize,
    /// Elements of the first set without a match.
    pub false_positive: usize,
    /// Elements of the second set without a match.
    pub false_negative: usize,
    /// Match flag of each element of the first set.
    pub matched_a: Vec<bool>,
    /// Match flag of each element of the second set.
    pub matched_b: Vec<bool>,
}

/// Matches two sorted index sets within a tolerance.
///
/// For each `a[i]` in order, a cursor over `b` skips the elements smaller than
/// `a[i] - tolerance`. If the element under the cursor is within `tolerance` of
/// `a[i]`, both are marked as matched and the cursor moves past it, so that
/// each element of `b` matches at most once.
pub fn match_with_tolerance(a: &[usize], b: &[usize], tolerance: usize) -> MatchResult {
    let mut matched_a = vec![false; a.len()];
    let mut matched_b = vec![false; b.len()];
    let mut j = 0;
    for (i, &x) in a.iter().enumerate() {
        while j < b.len() && b[j] < x.saturating_sub(tolerance) {
            j += 1;
        }
        if j < b.len() && b[j].abs_diff(x) <= tolerance {
            matched_a[i] = true;
            matched_b[j] = true;
            j += 1;
        }
    }
    let true_positive = matched_a.iter().filter(|&&m| m).count();
    MatchResult {
        true_positive,
        false_positive: a.len() - true_positive,
        false_negative: matched_b.iter().filter(|&&m| !m).count(),
        matched_a,
        matched_b,
    }
}

impl MatchResult {
    /// Fraction of the first set that was matched, if it is not empty.
    pub fn precision(&self) -> Option<f64> {
        let n = self.true_positive + self.false_positive;
        (n > 0).then(|| self.true_positive as f64 / n as f64)
    }

    /// Fraction of the second set that was matched, if it is not empty.
    pub fn recall(&self) -> Option<f64> {
        let n = self.matched_b.len();
        (n > 0).then(|| (n - self.false_negative) as f64 / n as f64)
    }

    /// Converts the counts into their JSON schema.
    pub fn to_json(&self, tolerance: usize) -> ppgcheck_json::Matching {
        ppgcheck_json::Matching {
            tolerance,
            true_positive: self.true_positive,
            false_positive: self.false_positive,
            false_negative: self.false_negative,
        }
    }
}
