use std::collections::VecDeque;

use tracing::{debug, instrument};

use crate::{
    TreeError,
    node::{Label, Node, NodeIndex},
    schema::FeatureSchema,
    split::best_split,
    stats::ClassCounts,
};

/// Pre-pruning configuration for gain-ratio tree induction.
///
/// Construct via [`TreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default   |
/// |---------------------|-----------|
/// | `max_depth`         | `Some(5)` |
/// | `min_samples_split` | 2         |
/// | `min_gain`          | 1e-6      |
#[derive(Debug, Clone, PartialEq)]
pub struct TreeConfig {
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_gain: f64,
}

impl TreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: Some(5),
            min_samples_split: 2,
            min_gain: 1e-6,
        }
    }

    /// Set the maximum tree depth.
    ///
    /// `None` grows until another stopping rule fires. `Some(d)` turns every
    /// node at depth `d` into a leaf (root is depth 0), so `Some(0)` yields a
    /// single majority leaf unless the labels are already pure.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples a node needs to be split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the gain ratio a split must strictly exceed to be kept.
    #[must_use]
    pub fn with_min_gain(mut self, min_gain: f64) -> Self {
        self.min_gain = min_gain;
        self
    }

    // --- Getters ---

    /// Return the maximum depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the minimum samples required to split a node.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Return the minimum gain ratio threshold.
    #[must_use]
    pub fn min_gain(&self) -> f64 {
        self.min_gain
    }

    /// Train a decision tree on the provided row-major dataset.
    ///
    /// `features[sample_idx][feature_idx]` — row-major layout, columns in
    /// `schema` order. `labels[sample_idx]` — 0 or 1.
    ///
    /// # Errors
    ///
    /// | Variant                                    | When                                        |
    /// |--------------------------------------------|---------------------------------------------|
    /// | [`TreeError::EmptyDataset`]                | `features` or `labels` is empty             |
    /// | [`TreeError::LabelCountMismatch`]          | `labels.len() != features.len()`            |
    /// | [`TreeError::FeatureNameCountMismatch`]    | first row width differs from `schema.len()` |
    /// | [`TreeError::FeatureCountMismatch`]        | rows have inconsistent lengths              |
    /// | [`TreeError::NonFiniteValue`]              | any value is NaN or infinite                |
    /// | [`TreeError::InvalidLabel`]                | a label is not 0 or 1                       |
    /// | [`TreeError::InvalidMinSamplesSplit`]      | `min_samples_split` is 0                    |
    /// | [`TreeError::InvalidMinGain`]              | `min_gain` is negative or not finite        |
    #[instrument(skip(self, features, labels, schema), fields(n_samples = features.len()))]
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[u8],
        schema: FeatureSchema,
    ) -> Result<DecisionTree, TreeError> {
        // --- Validate inputs ---
        if features.is_empty() || labels.is_empty() {
            return Err(TreeError::EmptyDataset);
        }

        let n_samples = features.len();
        if labels.len() != n_samples {
            return Err(TreeError::LabelCountMismatch {
                n_samples,
                n_labels: labels.len(),
            });
        }

        let n_features = features[0].len();
        if n_features != schema.len() {
            return Err(TreeError::FeatureNameCountMismatch {
                n_names: schema.len(),
                n_features,
            });
        }

        for (sample_index, row) in features.iter().enumerate() {
            if row.len() != n_features {
                return Err(TreeError::FeatureCountMismatch {
                    expected: n_features,
                    got: row.len(),
                    sample_index,
                });
            }
            if let Some(pos) = row.iter().position(|v| !v.is_finite()) {
                return Err(TreeError::NonFiniteValue {
                    sample_index,
                    feature: schema.names()[pos].clone(),
                });
            }
        }

        let labels: Vec<Label> = labels
            .iter()
            .enumerate()
            .map(|(sample_index, &value)| {
                Label::try_from(value)
                    .map_err(|_| TreeError::InvalidLabel { value, sample_index })
            })
            .collect::<Result<_, _>>()?;

        // --- Validate config ---
        if self.min_samples_split < 1 {
            return Err(TreeError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }

        if !self.min_gain.is_finite() || self.min_gain < 0.0 {
            return Err(TreeError::InvalidMinGain {
                min_gain: self.min_gain,
            });
        }

        debug!(
            n_samples,
            n_features,
            max_depth = ?self.max_depth,
            min_samples_split = self.min_samples_split,
            min_gain = self.min_gain,
            "fitting decision tree"
        );

        // Column-major layout for the split search.
        let col_features: Vec<Vec<f64>> = (0..n_features)
            .map(|feat_idx| features.iter().map(|row| row[feat_idx]).collect())
            .collect();

        let mut builder = TreeBuilder {
            col_features: &col_features,
            labels: &labels,
            config: self,
            arena: Vec::new(),
        };
        let sample_indices: Vec<usize> = (0..n_samples).collect();
        let root = builder.build(&sample_indices, 0);

        let tree = DecisionTree {
            nodes: builder.arena,
            schema,
        };

        debug!(
            root_index = root.index(),
            n_nodes = tree.n_nodes(),
            depth = tree.depth(),
            "decision tree built"
        );

        Ok(tree)
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-fit state threaded through the recursion.
struct TreeBuilder<'a> {
    col_features: &'a [Vec<f64>],
    labels: &'a [Label],
    config: &'a TreeConfig,
    arena: Vec<Node>,
}

impl TreeBuilder<'_> {
    /// Recursively build the subtree for `sample_indices`.
    ///
    /// Stopping rules are checked in order, first match wins: pure labels,
    /// then feature/size/depth limits, then split quality, then an empty
    /// partition. Returns the [`NodeIndex`] of the node just created.
    fn build(&mut self, sample_indices: &[usize], depth: usize) -> NodeIndex {
        let mut counts = ClassCounts::default();
        for &si in sample_indices {
            counts.add(self.labels[si]);
        }

        if let Some(label) = counts.pure_label() {
            return self.push_leaf(label);
        }

        let majority = counts.majority();
        let depth_exceeded = self.config.max_depth.is_some_and(|max_d| depth >= max_d);
        let too_few = sample_indices.len() < self.config.min_samples_split;

        if self.col_features.is_empty() || too_few || depth_exceeded {
            return self.push_leaf(majority);
        }

        let split = match best_split(self.col_features, self.labels, sample_indices) {
            Some(s) if s.gain_ratio > self.config.min_gain => s,
            _ => return self.push_leaf(majority),
        };

        // Order within each side follows `sample_indices`.
        let feat_col = &self.col_features[split.feature.index()];
        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = sample_indices
            .iter()
            .copied()
            .partition(|&si| feat_col[si] <= split.threshold);

        if left_indices.is_empty() || right_indices.is_empty() {
            return self.push_leaf(majority);
        }

        // Arena pattern: reserve index, recurse, then overwrite with the split.
        let node_idx = self.arena.len();
        self.arena.push(Node::Leaf { label: majority });

        let left = self.build(&left_indices, depth + 1);
        let right = self.build(&right_indices, depth + 1);

        self.arena[node_idx] = Node::Decision {
            feature: split.feature,
            threshold: split.threshold,
            gain_ratio: split.gain_ratio,
            left,
            right,
        };

        NodeIndex::new(node_idx)
    }

    fn push_leaf(&mut self, label: Label) -> NodeIndex {
        let idx = self.arena.len();
        self.arena.push(Node::Leaf { label });
        NodeIndex::new(idx)
    }
}

/// A fitted binary decision tree.
///
/// Nodes live in a pre-order `Vec<Node>` arena rooted at index 0. The tree
/// is immutable once built; prediction and serialization only read it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) schema: FeatureSchema,
}

impl DecisionTree {
    /// Return the root node.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// Return the node at `index`.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.index()]
    }

    /// Return all nodes in pre-order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the feature schema the tree was trained against.
    #[must_use]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Return the total number of nodes in the tree (both decisions and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Count how many decision nodes test each feature, in schema order.
    #[must_use]
    pub fn feature_usage(&self) -> Vec<usize> {
        let mut usage = vec![0usize; self.schema.len()];
        for node in &self.nodes {
            if let Node::Decision { feature, .. } = node {
                usage[feature.index()] += 1;
            }
        }
        usage
    }

    /// Return the maximum depth of the tree.
    ///
    /// A single-node tree (just a root leaf) has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0usize;
        let mut queue = VecDeque::new();
        queue.push_back((0usize, 0usize));

        while let Some((node_idx, d)) = queue.pop_front() {
            match &self.nodes[node_idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Decision { left, right, .. } => {
                    queue.push_back((left.index(), d + 1));
                    queue.push_back((right.index(), d + 1));
                }
            }
        }

        max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit_default(features: &[Vec<f64>], labels: &[u8]) -> DecisionTree {
        let schema = FeatureSchema::anonymous(features[0].len());
        TreeConfig::new().fit(features, labels, schema).unwrap()
    }

    #[test]
    fn empty_dataset_error() {
        let err = TreeConfig::new()
            .fit(&[], &[], FeatureSchema::anonymous(1))
            .unwrap_err();
        assert!(matches!(err, TreeError::EmptyDataset));
    }

    #[test]
    fn label_count_mismatch_error() {
        let features = vec![vec![1.0], vec![2.0]];
        let err = TreeConfig::new()
            .fit(&features, &[0], FeatureSchema::anonymous(1))
            .unwrap_err();
        assert!(matches!(
            err,
            TreeError::LabelCountMismatch { n_samples: 2, n_labels: 1 }
        ));
    }

    #[test]
    fn non_binary_label_error() {
        let features = vec![vec![1.0], vec![2.0]];
        let err = TreeConfig::new()
            .fit(&features, &[0, 2], FeatureSchema::anonymous(1))
            .unwrap_err();
        assert!(matches!(
            err,
            TreeError::InvalidLabel { value: 2, sample_index: 1 }
        ));
    }

    #[test]
    fn schema_width_mismatch_error() {
        let features = vec![vec![1.0, 2.0]];
        let err = TreeConfig::new()
            .fit(&features, &[0], FeatureSchema::anonymous(3))
            .unwrap_err();
        assert!(matches!(err, TreeError::FeatureNameCountMismatch { .. }));
    }

    #[test]
    fn feature_count_mismatch_error() {
        let features = vec![vec![1.0, 2.0], vec![3.0]];
        let err = TreeConfig::new()
            .fit(&features, &[0, 1], FeatureSchema::anonymous(2))
            .unwrap_err();
        assert!(matches!(err, TreeError::FeatureCountMismatch { .. }));
    }

    #[test]
    fn non_finite_value_error() {
        let features = vec![vec![1.0, f64::NAN], vec![3.0, 4.0]];
        let schema = FeatureSchema::new(["tavg", "pres"]).unwrap();
        let err = TreeConfig::new().fit(&features, &[0, 1], schema).unwrap_err();
        assert!(matches!(
            err,
            TreeError::NonFiniteValue { sample_index: 0, ref feature } if feature == "pres"
        ));
    }

    #[test]
    fn invalid_config_errors() {
        let features = vec![vec![1.0], vec![2.0]];
        let err = TreeConfig::new()
            .with_min_samples_split(0)
            .fit(&features, &[0, 1], FeatureSchema::anonymous(1))
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidMinSamplesSplit { .. }));

        let err = TreeConfig::new()
            .with_min_gain(-0.1)
            .fit(&features, &[0, 1], FeatureSchema::anonymous(1))
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidMinGain { .. }));
    }

    #[test]
    fn pure_dataset_single_leaf() {
        let features = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let tree = fit_default(&features, &[1, 1, 1]);
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.root(), &Node::Leaf { label: Label::POSITIVE });
    }

    #[test]
    fn separable_feature_gives_depth_one_split() {
        let features = vec![vec![1.0], vec![2.0], vec![8.0], vec![9.0]];
        let tree = fit_default(&features, &[0, 0, 1, 1]);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
        match tree.root() {
            Node::Decision {
                feature,
                threshold,
                gain_ratio,
                ..
            } => {
                assert_eq!(feature.index(), 0);
                assert!((threshold - 5.0).abs() < f64::EPSILON);
                assert!((gain_ratio - 1.0).abs() < 1e-9);
            }
            Node::Leaf { .. } => panic!("expected a decision root"),
        }
    }

    #[test]
    fn min_samples_split_above_size_gives_majority_leaf() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0], vec![5.0]];
        let schema = FeatureSchema::anonymous(1);
        let tree = TreeConfig::new()
            .with_min_samples_split(10)
            .fit(&features, &[1, 0, 1, 1, 0], schema)
            .unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.root(), &Node::Leaf { label: Label::POSITIVE });
    }

    #[test]
    fn max_depth_zero_forces_root_leaf() {
        let features = vec![vec![1.0], vec![2.0], vec![8.0], vec![9.0], vec![10.0]];
        let tree = TreeConfig::new()
            .with_max_depth(Some(0))
            .fit(&features, &[0, 0, 1, 1, 1], FeatureSchema::anonymous(1))
            .unwrap();
        assert_eq!(tree.root(), &Node::Leaf { label: Label::POSITIVE });
    }

    #[test]
    fn max_depth_zero_keeps_pure_label() {
        let features = vec![vec![1.0], vec![2.0]];
        let tree = TreeConfig::new()
            .with_max_depth(Some(0))
            .fit(&features, &[0, 0], FeatureSchema::anonymous(1))
            .unwrap();
        assert_eq!(tree.root(), &Node::Leaf { label: Label::NEGATIVE });
    }

    #[test]
    fn tied_majority_resolves_to_negative() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
        let tree = TreeConfig::new()
            .with_max_depth(Some(0))
            .fit(&features, &[1, 0, 1, 0], FeatureSchema::anonymous(1))
            .unwrap();
        assert_eq!(tree.root(), &Node::Leaf { label: Label::NEGATIVE });
    }

    #[test]
    fn min_gain_prunes_weak_splits() {
        // Best split (threshold 2.5) has gain ratio ~0.38.
        let features = vec![vec![1.0], vec![1.0], vec![1.0], vec![4.0]];
        let tree = TreeConfig::new()
            .with_min_gain(0.5)
            .fit(&features, &[0, 0, 1, 1], FeatureSchema::anonymous(1))
            .unwrap();
        assert_eq!(tree.n_nodes(), 1);
    }

    #[test]
    fn constant_features_give_majority_leaf() {
        let features = vec![vec![3.0], vec![3.0], vec![3.0]];
        let tree = fit_default(&features, &[1, 0, 1]);
        assert_eq!(tree.root(), &Node::Leaf { label: Label::POSITIVE });
    }

    #[test]
    fn xor_has_no_informative_single_split() {
        let features = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        // Every single split has zero gain on XOR, so the root stays a leaf.
        let tree = fit_default(&features, &[0, 1, 1, 0]);
        assert_eq!(tree.n_nodes(), 1);
    }

    #[test]
    fn depth_limit_is_respected() {
        let features: Vec<Vec<f64>> = (0..16).map(|i| vec![f64::from(i)]).collect();
        let labels: Vec<u8> = (0..16).map(|i| (i % 2) as u8).collect();
        let tree = TreeConfig::new()
            .with_max_depth(Some(2))
            .with_min_gain(0.0)
            .fit(&features, &labels, FeatureSchema::anonymous(1))
            .unwrap();
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn arena_is_preorder_with_root_first() {
        let features = vec![
            vec![1.0, 0.0],
            vec![2.0, 1.0],
            vec![3.0, 0.0],
            vec![10.0, 0.0],
            vec![11.0, 1.0],
            vec![12.0, 1.0],
        ];
        let tree = fit_default(&features, &[0, 0, 0, 1, 0, 1]);
        for (idx, node) in tree.nodes().iter().enumerate() {
            if let Node::Decision { left, right, .. } = node {
                assert_eq!(left.index(), idx + 1);
                assert!(right.index() > left.index());
            }
        }
    }

    #[test]
    fn feature_usage_counts_decisions() {
        let features = vec![vec![0.0, 1.0], vec![0.0, 2.0], vec![0.0, 8.0], vec![0.0, 9.0]];
        let tree = fit_default(&features, &[0, 0, 1, 1]);
        assert_eq!(tree.feature_usage(), vec![0, 1]);
    }
}
