//! Named feature columns and typed row access.

use std::collections::{BTreeMap, HashMap};

use crate::error::TreeError;
use crate::node::FeatureIndex;

/// Ordered, duplicate-free feature names with a resolved name → index map.
///
/// Declared once at training start; decision nodes store the resolved
/// [`FeatureIndex`] so prediction never looks names up per comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
    index: HashMap<String, FeatureIndex>,
}

impl FeatureSchema {
    /// Build a schema from column names in declared order.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::DuplicateFeatureName`] if a name occurs twice.
    pub fn new<I, S>(names: I) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), FeatureIndex::new(i)).is_some() {
                return Err(TreeError::DuplicateFeatureName { name: name.clone() });
            }
        }
        Ok(Self { names, index })
    }

    /// Build a schema named `f0, f1, ...` for `n_features` unnamed columns.
    #[must_use]
    pub fn anonymous(n_features: usize) -> Self {
        let names: Vec<String> = (0..n_features).map(|i| format!("f{i}")).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), FeatureIndex::new(i)))
            .collect();
        Self { names, index }
    }

    /// Resolve a feature name to its column index.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<FeatureIndex> {
        self.index.get(name).copied()
    }

    /// Return the name of the feature at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` was not produced by this schema.
    #[must_use]
    pub fn name(&self, index: FeatureIndex) -> &str {
        &self.names[index.index()]
    }

    /// Return all feature names in declared order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Return the number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Return `true` if the schema declares no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A row that can supply a numeric value for a feature.
///
/// Positional rows answer by index, keyed rows by name. `None` (or a NaN
/// value) means the row does not carry that feature.
pub trait FeatureRow {
    /// Return the value of the feature at `index` named `name`, if present.
    fn value(&self, index: FeatureIndex, name: &str) -> Option<f64>;
}

impl FeatureRow for [f64] {
    fn value(&self, index: FeatureIndex, _name: &str) -> Option<f64> {
        self.get(index.index()).copied().filter(|v| !v.is_nan())
    }
}

impl FeatureRow for Vec<f64> {
    fn value(&self, index: FeatureIndex, name: &str) -> Option<f64> {
        self.as_slice().value(index, name)
    }
}

impl FeatureRow for [Option<f64>] {
    fn value(&self, index: FeatureIndex, _name: &str) -> Option<f64> {
        self.get(index.index()).copied().flatten().filter(|v| !v.is_nan())
    }
}

impl FeatureRow for Vec<Option<f64>> {
    fn value(&self, index: FeatureIndex, name: &str) -> Option<f64> {
        self.as_slice().value(index, name)
    }
}

impl FeatureRow for HashMap<String, f64> {
    fn value(&self, _index: FeatureIndex, name: &str) -> Option<f64> {
        self.get(name).copied().filter(|v| !v.is_nan())
    }
}

impl FeatureRow for BTreeMap<String, f64> {
    fn value(&self, _index: FeatureIndex, name: &str) -> Option<f64> {
        self.get(name).copied().filter(|v| !v.is_nan())
    }
}

impl<R: FeatureRow + ?Sized> FeatureRow for &R {
    fn value(&self, index: FeatureIndex, name: &str) -> Option<f64> {
        (**self).value(index, name)
    }
}
