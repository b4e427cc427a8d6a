use crate::error::TreeError;
use crate::node::{FeatureIndex, Label};
use crate::stats::{ClassCounts, gain_ratio_counts};

/// The winning (feature, threshold) pair for a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestSplit {
    /// Feature to test.
    pub feature: FeatureIndex,
    /// Midpoint between two consecutive distinct observed values.
    pub threshold: f64,
    /// Gain ratio achieved by the split.
    pub gain_ratio: f64,
}

/// Find the split with the greatest gain ratio over a row-major matrix.
///
/// `features[sample_idx][feature_idx]`. Returns `Ok(None)` when no feature
/// has two distinct values, which includes any single-row input.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`TreeError::LabelCountMismatch`] | `labels.len() != features.len()` |
/// | [`TreeError::FeatureCountMismatch`] | a row differs in length from the first |
pub fn find_best_split(
    features: &[Vec<f64>],
    labels: &[Label],
) -> Result<Option<BestSplit>, TreeError> {
    if labels.len() != features.len() {
        return Err(TreeError::LabelCountMismatch {
            n_samples: features.len(),
            n_labels: labels.len(),
        });
    }

    let n_features = features.first().map_or(0, Vec::len);
    if let Some((sample_index, row)) = features
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != n_features)
    {
        return Err(TreeError::FeatureCountMismatch {
            expected: n_features,
            got: row.len(),
            sample_index,
        });
    }

    let col_features: Vec<Vec<f64>> = (0..n_features)
        .map(|feat_idx| features.iter().map(|row| row[feat_idx]).collect())
        .collect();
    let sample_indices: Vec<usize> = (0..features.len()).collect();
    Ok(best_split(&col_features, labels, &sample_indices))
}

/// Exhaustive gain-ratio search over the samples reaching a node.
///
/// For each feature in declared order, sorts the distinct observed values
/// and scores every midpoint threshold in ascending order. A candidate
/// replaces the incumbent only with a strictly greater gain ratio, so ties
/// keep the earliest-scanned candidate. NaN values are not candidates and
/// fall on neither side of a threshold.
///
/// # Column-major layout
///
/// `col_features[feature_idx][sample_idx]`; `sample_indices` index into
/// the inner vectors.
pub(crate) fn best_split(
    col_features: &[Vec<f64>],
    labels: &[Label],
    sample_indices: &[usize],
) -> Option<BestSplit> {
    if sample_indices.len() < 2 {
        return None;
    }

    let mut parent = ClassCounts::default();
    for &si in sample_indices {
        parent.add(labels[si]);
    }

    let mut best: Option<BestSplit> = None;
    let mut best_gain_ratio = f64::NEG_INFINITY;
    let mut sorted: Vec<(f64, Label)> = Vec::with_capacity(sample_indices.len());

    for (feat_idx, feat_col) in col_features.iter().enumerate() {
        sorted.clear();
        sorted.extend(
            sample_indices
                .iter()
                .map(|&si| (feat_col[si], labels[si]))
                .filter(|(v, _)| !v.is_nan()),
        );
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut distinct: Vec<f64> = sorted.iter().map(|&(v, _)| v).collect();
        distinct.dedup();
        if distinct.len() < 2 {
            continue;
        }

        let mut present = ClassCounts::default();
        for &(_, label) in &sorted {
            present.add(label);
        }

        // Thresholds ascend, so the left side only ever grows.
        let mut left = ClassCounts::default();
        let mut cursor = 0usize;
        for pair in distinct.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            while cursor < sorted.len() && sorted[cursor].0 <= threshold {
                left.add(sorted[cursor].1);
                cursor += 1;
            }

            let right = present.minus(&left);
            if left.total() == 0 || right.total() == 0 {
                continue;
            }

            let gain_ratio = gain_ratio_counts(&parent, &left, &right);
            if gain_ratio > best_gain_ratio {
                best_gain_ratio = gain_ratio;
                best = Some(BestSplit {
                    feature: FeatureIndex::new(feat_idx),
                    threshold,
                    gain_ratio,
                });
            }
        }
    }

    best
}
