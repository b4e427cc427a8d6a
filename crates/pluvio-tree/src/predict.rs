//! Prediction by root-to-leaf traversal.

use rayon::prelude::*;

use crate::error::TreeError;
use crate::node::{Label, Node};
use crate::schema::FeatureRow;
use crate::tree::DecisionTree;

impl DecisionTree {
    /// Predict the label for a single row.
    ///
    /// Traverses from the root: at each decision node goes left when
    /// `row[feature] <= threshold`, right otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::MissingFeature`] when the row has no value
    /// (absent or NaN) for a feature tested on its path. Features off the
    /// path are never read.
    pub fn predict_one<R: FeatureRow + ?Sized>(&self, row: &R) -> Result<Label, TreeError> {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { label } => return Ok(*label),
                Node::Decision {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    let name = self.schema.name(*feature);
                    let value = row.value(*feature, name).ok_or_else(|| {
                        TreeError::MissingFeature {
                            feature: name.to_string(),
                        }
                    })?;
                    idx = if value <= *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }

    /// Predict every row in parallel, keeping one result per row in input order.
    ///
    /// A failing row does not affect the others.
    pub fn predict_many<R: FeatureRow + Sync>(
        &self,
        rows: &[R],
    ) -> Vec<Result<Label, TreeError>> {
        rows.par_iter().map(|row| self.predict_one(row)).collect()
    }

    /// Predict every row in parallel, failing on the first row that errors.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::MissingFeature`] if any row lacks a feature on its path.
    pub fn predict_batch<R: FeatureRow + Sync>(
        &self,
        rows: &[R],
    ) -> Result<Vec<Label>, TreeError> {
        rows.par_iter().map(|row| self.predict_one(row)).collect()
    }
}
