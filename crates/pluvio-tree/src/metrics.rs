//! Binary confusion counts and positive-class metrics.

use std::fmt;

use crate::error::TreeError;
use crate::node::Label;

/// Confusion counts for a binary classifier, positive class = label 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct BinaryConfusion {
    /// Predicted 1, truly 1.
    pub true_positive: usize,
    /// Predicted 1, truly 0.
    pub false_positive: usize,
    /// Predicted 0, truly 0.
    pub true_negative: usize,
    /// Predicted 0, truly 1.
    pub false_negative: usize,
}

impl BinaryConfusion {
    /// Tally true against predicted labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::EmptyDataset`] | zero labels provided |
    /// | [`TreeError::LabelCountMismatch`] | `predicted.len() != truth.len()` |
    pub fn from_labels(truth: &[Label], predicted: &[Label]) -> Result<Self, TreeError> {
        if truth.is_empty() {
            return Err(TreeError::EmptyDataset);
        }
        if truth.len() != predicted.len() {
            return Err(TreeError::LabelCountMismatch {
                n_samples: truth.len(),
                n_labels: predicted.len(),
            });
        }
        let mut cm = Self::default();
        for (&t, &p) in truth.iter().zip(predicted) {
            match (t == Label::POSITIVE, p == Label::POSITIVE) {
                (true, true) => cm.true_positive += 1,
                (false, true) => cm.false_positive += 1,
                (false, false) => cm.true_negative += 1,
                (true, false) => cm.false_negative += 1,
            }
        }
        Ok(cm)
    }

    /// Total number of tallied samples.
    #[must_use]
    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    /// Proportion of correct predictions.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    /// TP / (TP + FP). 0.0 if nothing was predicted positive.
    #[must_use]
    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    /// TP / (TP + FN). 0.0 if there are no positive samples.
    #[must_use]
    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    /// Harmonic mean of precision and recall. 0.0 if both are zero.
    #[must_use]
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl fmt::Display for BinaryConfusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>8} {:>7} {:>7}", "", "pred_0", "pred_1")?;
        writeln!(
            f,
            "{:>8} {:>7} {:>7}",
            "true_0", self.true_negative, self.false_positive
        )?;
        writeln!(
            f,
            "{:>8} {:>7} {:>7}",
            "true_1", self.false_negative, self.true_positive
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: &[u8]) -> Vec<Label> {
        raw.iter().map(|&v| Label::try_from(v).unwrap()).collect()
    }

    #[test]
    fn perfect_predictions() {
        let y = labels(&[0, 1, 1, 0]);
        let cm = BinaryConfusion::from_labels(&y, &y).unwrap();
        assert!((cm.accuracy() - 1.0).abs() < f64::EPSILON);
        assert!((cm.precision() - 1.0).abs() < f64::EPSILON);
        assert!((cm.recall() - 1.0).abs() < f64::EPSILON);
        assert!((cm.f1() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn known_counts() {
        let truth = labels(&[1, 1, 1, 0, 0, 0, 0, 1]);
        let pred = labels(&[1, 1, 0, 0, 0, 1, 0, 0]);
        let cm = BinaryConfusion::from_labels(&truth, &pred).unwrap();
        assert_eq!(cm.true_positive, 2);
        assert_eq!(cm.false_positive, 1);
        assert_eq!(cm.true_negative, 3);
        assert_eq!(cm.false_negative, 2);
        assert!((cm.accuracy() - 5.0 / 8.0).abs() < 1e-12);
        assert!((cm.precision() - 2.0 / 3.0).abs() < 1e-12);
        assert!((cm.recall() - 0.5).abs() < 1e-12);
        assert!((cm.f1() - 4.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn no_positive_predictions_zero_precision() {
        let truth = labels(&[1, 0]);
        let pred = labels(&[0, 0]);
        let cm = BinaryConfusion::from_labels(&truth, &pred).unwrap();
        assert_eq!(cm.precision(), 0.0);
        assert_eq!(cm.f1(), 0.0);
    }

    #[test]
    fn empty_and_mismatched_errors() {
        assert!(matches!(
            BinaryConfusion::from_labels(&[], &[]).unwrap_err(),
            TreeError::EmptyDataset
        ));
        let err = BinaryConfusion::from_labels(&labels(&[0, 1]), &labels(&[0])).unwrap_err();
        assert!(matches!(err, TreeError::LabelCountMismatch { .. }));
    }

    #[test]
    fn display_formatting() {
        let y = labels(&[0, 1]);
        let out = format!("{}", BinaryConfusion::from_labels(&y, &y).unwrap());
        assert!(out.contains("pred_1"));
        assert!(out.contains("true_0"));
    }
}
