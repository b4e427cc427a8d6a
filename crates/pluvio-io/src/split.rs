//! Stratified train/test partitioning.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::IoError;

/// Row indices assigned to each side of a train/test partition.
///
/// Both lists are sorted ascending so selected rows keep table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainTestSplit {
    /// Training row indices.
    pub train: Vec<usize>,
    /// Held-out row indices.
    pub test: Vec<usize>,
}

impl TrainTestSplit {
    /// Gather `items` into (train, test) vectors.
    #[must_use]
    pub fn select<T: Clone>(&self, items: &[T]) -> (Vec<T>, Vec<T>) {
        let pick = |indices: &[usize]| -> Vec<T> {
            indices.iter().map(|&i| items[i].clone()).collect()
        };
        (pick(&self.train), pick(&self.test))
    }
}

/// Partition rows so that each label keeps its share in the test set.
///
/// Rows of each label are shuffled with a `ChaCha8Rng` seeded from `seed`;
/// the first `round(n_label * test_fraction)` go to the test set.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::InvalidTestFraction`] | `test_fraction` not in (0, 1) |
/// | [`IoError::EmptyPartition`] | either side would hold no rows |
#[instrument(skip(labels), fields(n_rows = labels.len()))]
pub fn stratified_split(
    labels: &[u8],
    test_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit, IoError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(IoError::InvalidTestFraction { test_fraction });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    // Group indices by label, in ascending label order.
    let mut by_label: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        by_label.entry(label).or_default().push(i);
    }

    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();
    for (label, indices) in &mut by_label {
        indices.shuffle(&mut rng);
        let n_test = (indices.len() as f64 * test_fraction).round() as usize;
        debug!(label = *label, n = indices.len(), n_test, "stratum split");
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    for (partition, side) in [("train", &train), ("test", &test)] {
        if side.is_empty() {
            return Err(IoError::EmptyPartition {
                partition,
                n_rows: labels.len(),
                test_fraction,
            });
        }
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(TrainTestSplit { train, test })
}
