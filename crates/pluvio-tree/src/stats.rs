//! Entropy, information gain, split information, and gain ratio.
//!
//! The slice functions mirror the textbook C4.5 definitions over label
//! collections. [`ClassCounts`] carries the same math over pre-counted
//! classes so the split search can score candidates without allocating.

use crate::node::Label;

/// Additive guard inside the logarithm so an absent class contributes ~0.
pub const LOG_EPSILON: f64 = 1e-12;

/// Per-class sample counts for a binary label collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassCounts {
    counts: [usize; 2],
}

impl ClassCounts {
    /// Count the labels in `labels`.
    #[must_use]
    pub fn from_labels(labels: &[Label]) -> Self {
        let mut counts = Self::default();
        for &label in labels {
            counts.add(label);
        }
        counts
    }

    /// Record one more sample with `label`.
    pub fn add(&mut self, label: Label) {
        self.counts[label.index()] += 1;
    }

    /// Number of samples with `label`.
    #[must_use]
    pub fn count(&self, label: Label) -> usize {
        self.counts[label.index()]
    }

    /// Total number of samples.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts[0] + self.counts[1]
    }

    /// Subtract `other` class-wise. `other` must be a subset of `self`.
    #[must_use]
    pub fn minus(&self, other: &ClassCounts) -> ClassCounts {
        ClassCounts {
            counts: [
                self.counts[0] - other.counts[0],
                self.counts[1] - other.counts[1],
            ],
        }
    }

    /// The single label present, or `None` when both classes occur (or none do).
    #[must_use]
    pub fn pure_label(&self) -> Option<Label> {
        match self.counts {
            [n, 0] if n > 0 => Some(Label::NEGATIVE),
            [0, n] if n > 0 => Some(Label::POSITIVE),
            _ => None,
        }
    }

    /// Majority label. An even count resolves to [`Label::NEGATIVE`].
    #[must_use]
    pub fn majority(&self) -> Label {
        Label::from(self.counts[1] > self.counts[0])
    }

    /// Shannon entropy (base 2) over the classes present.
    ///
    /// Returns 0.0 for an empty collection.
    #[must_use]
    pub fn entropy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let n = total as f64;
        -self
            .counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let p = c as f64 / n;
                p * (p + LOG_EPSILON).log2()
            })
            .sum::<f64>()
    }
}

/// Entropy of a label collection: `-Σ p_k · log2(p_k + ε)`.
#[must_use]
pub fn entropy(labels: &[Label]) -> f64 {
    ClassCounts::from_labels(labels).entropy()
}

/// Entropy reduction of splitting `y` into `left_y` and `right_y`.
#[must_use]
pub fn information_gain(y: &[Label], left_y: &[Label], right_y: &[Label]) -> f64 {
    information_gain_counts(
        &ClassCounts::from_labels(y),
        &ClassCounts::from_labels(left_y),
        &ClassCounts::from_labels(right_y),
    )
}

/// Entropy of the partition-size distribution `(|left|, |right|)`.
#[must_use]
pub fn split_info(left_y: &[Label], right_y: &[Label]) -> f64 {
    split_info_sizes(left_y.len(), right_y.len())
}

/// Information gain normalized by split information.
///
/// Defined as 0.0 when split information is not positive.
#[must_use]
pub fn gain_ratio(y: &[Label], left_y: &[Label], right_y: &[Label]) -> f64 {
    gain_ratio_counts(
        &ClassCounts::from_labels(y),
        &ClassCounts::from_labels(left_y),
        &ClassCounts::from_labels(right_y),
    )
}

pub(crate) fn information_gain_counts(
    parent: &ClassCounts,
    left: &ClassCounts,
    right: &ClassCounts,
) -> f64 {
    let n = parent.total() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let weighted = (left.total() as f64 / n) * left.entropy()
        + (right.total() as f64 / n) * right.entropy();
    parent.entropy() - weighted
}

pub(crate) fn split_info_sizes(n_left: usize, n_right: usize) -> f64 {
    let total = (n_left + n_right) as f64;
    if total == 0.0 {
        return 0.0;
    }
    let mut info = 0.0;
    for n in [n_left, n_right] {
        // A zero proportion contributes nothing rather than -inf * 0.
        if n > 0 {
            let p = n as f64 / total;
            info -= p * p.log2();
        }
    }
    info
}

pub(crate) fn gain_ratio_counts(
    parent: &ClassCounts,
    left: &ClassCounts,
    right: &ClassCounts,
) -> f64 {
    let si = split_info_sizes(left.total(), right.total());
    if si <= 0.0 {
        return 0.0;
    }
    information_gain_counts(parent, left, right) / si
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: &[u8]) -> Vec<Label> {
        raw.iter().map(|&v| Label::try_from(v).unwrap()).collect()
    }

    #[test]
    fn entropy_single_class_is_zero() {
        assert!(entropy(&labels(&[1, 1, 1, 1])).abs() < 1e-9);
        assert!(entropy(&labels(&[0])).abs() < 1e-9);
    }

    #[test]
    fn entropy_balanced_is_one() {
        assert!((entropy(&labels(&[0, 1, 0, 1])) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn entropy_three_to_one() {
        // -0.75*log2(0.75) - 0.25*log2(0.25)
        let h = entropy(&labels(&[0, 0, 0, 1]));
        assert!((h - 0.811_278_124_459_132_9).abs() < 1e-9, "h = {h}");
    }

    #[test]
    fn entropy_empty_is_zero() {
        assert_eq!(entropy(&[]), 0.0);
    }

    #[test]
    fn information_gain_perfect_split() {
        let y = labels(&[0, 0, 1, 1]);
        let gain = information_gain(&y, &y[..2], &y[2..]);
        assert!((gain - 1.0).abs() < 1e-9);
    }

    #[test]
    fn information_gain_is_non_negative() {
        let y = labels(&[0, 1, 1, 0, 1, 0, 0, 1, 1]);
        for cut in 1..y.len() {
            let gain = information_gain(&y, &y[..cut], &y[cut..]);
            assert!(gain >= -1e-9, "cut {cut}: gain = {gain}");
        }
    }

    #[test]
    fn split_info_balanced_and_uneven() {
        let y = labels(&[0, 0, 1, 1]);
        assert!((split_info(&y[..2], &y[2..]) - 1.0).abs() < 1e-12);
        // -0.25*log2(0.25) - 0.75*log2(0.75)
        assert!((split_info(&y[..1], &y[1..]) - 0.811_278_124_459_132_9).abs() < 1e-12);
    }

    #[test]
    fn split_info_empty_side_contributes_nothing() {
        let y = labels(&[0, 1]);
        assert_eq!(split_info(&y, &[]), 0.0);
    }

    #[test]
    fn gain_ratio_degenerate_partition_is_zero() {
        let y = labels(&[0, 1, 1]);
        assert_eq!(gain_ratio(&y, &y, &[]), 0.0);
    }

    #[test]
    fn gain_ratio_bounded_by_one() {
        let y = labels(&[0, 0, 1, 0, 1, 1, 1, 0]);
        for cut in 1..y.len() {
            let gr = gain_ratio(&y, &y[..cut], &y[cut..]);
            assert!((-1e-9..=1.0 + 1e-9).contains(&gr), "cut {cut}: gr = {gr}");
        }
    }

    #[test]
    fn counts_majority_prefers_negative_on_tie() {
        let counts = ClassCounts::from_labels(&labels(&[1, 0, 1, 0]));
        assert_eq!(counts.majority(), Label::NEGATIVE);
        let counts = ClassCounts::from_labels(&labels(&[1, 0, 1]));
        assert_eq!(counts.majority(), Label::POSITIVE);
    }

    #[test]
    fn counts_pure_label() {
        assert_eq!(
            ClassCounts::from_labels(&labels(&[1, 1])).pure_label(),
            Some(Label::POSITIVE)
        );
        assert_eq!(ClassCounts::from_labels(&labels(&[1, 0])).pure_label(), None);
        assert_eq!(ClassCounts::default().pure_label(), None);
    }

    #[test]
    fn counts_minus() {
        let all = ClassCounts::from_labels(&labels(&[0, 0, 1, 1, 1]));
        let left = ClassCounts::from_labels(&labels(&[0, 1]));
        let right = all.minus(&left);
        assert_eq!(right.count(Label::NEGATIVE), 1);
        assert_eq!(right.count(Label::POSITIVE), 2);
    }
}
