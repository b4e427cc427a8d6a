//! Portable nested-record form of a tree, and JSON persistence.
//!
//! The JSON root is the bare root node: `{feature, threshold, gain_ratio,
//! left, right}` for decision nodes and `{label}` for leaves. Renderers and
//! independent predictors consume this shape directly.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::TreeError;
use crate::node::{Label, Node, NodeIndex};
use crate::schema::FeatureSchema;
use crate::tree::DecisionTree;

/// A tree node in portable, order-preserving nested form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortableNode {
    /// Interior threshold test. Field order is the serialized key order.
    Decision {
        /// Feature name.
        feature: String,
        /// Rows with value <= threshold go left.
        threshold: f64,
        /// Gain ratio of the split.
        gain_ratio: f64,
        /// Left subtree.
        left: Box<PortableNode>,
        /// Right subtree.
        right: Box<PortableNode>,
    },
    /// Terminal node.
    Leaf {
        /// Predicted label, 0 or 1.
        label: Label,
    },
}

impl PortableNode {
    /// Return the depth of this subtree (a lone leaf has depth 0).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            PortableNode::Leaf { .. } => 0,
            PortableNode::Decision { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    /// Return the number of leaves in this subtree.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        match self {
            PortableNode::Leaf { .. } => 1,
            PortableNode::Decision { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }

    /// Parse a portable tree from JSON text.
    ///
    /// Nesting depth is not capped, so any tree [`DecisionTree::to_json_string`]
    /// writes, including ones grown with `max_depth = None`, parses back.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when `text` is not a portable tree.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        let mut de = serde_json::Deserializer::from_str(text);
        de.disable_recursion_limit();
        let root = Self::deserialize(&mut de)?;
        de.end()?;
        Ok(root)
    }
}

impl DecisionTree {
    /// Convert the arena into the portable nested form.
    #[must_use]
    pub fn to_portable(&self) -> PortableNode {
        self.portable_at(NodeIndex::new(0))
    }

    fn portable_at(&self, index: NodeIndex) -> PortableNode {
        match self.node(index) {
            Node::Leaf { label } => PortableNode::Leaf { label: *label },
            Node::Decision {
                feature,
                threshold,
                gain_ratio,
                left,
                right,
            } => PortableNode::Decision {
                feature: self.schema.name(*feature).to_string(),
                threshold: *threshold,
                gain_ratio: *gain_ratio,
                left: Box::new(self.portable_at(*left)),
                right: Box::new(self.portable_at(*right)),
            },
        }
    }

    /// Rebuild a tree from its portable form, resolving feature names against `schema`.
    ///
    /// Nodes are laid out in pre-order, matching a freshly fitted tree.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::UnknownFeature`] | a decision node names a feature not in `schema` |
    /// | [`TreeError::InvalidPortableNode`] | a threshold or gain ratio is not finite |
    pub fn from_portable(root: &PortableNode, schema: FeatureSchema) -> Result<Self, TreeError> {
        let mut nodes = Vec::new();
        push_portable(root, &schema, &mut nodes)?;
        Ok(Self { nodes, schema })
    }

    /// Encode the portable form as pretty JSON with four-space indentation.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::SerializeTree`] if JSON encoding fails.
    pub fn to_json_string(&self) -> Result<String, TreeError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.to_portable()
            .serialize(&mut ser)
            .map_err(|e| TreeError::SerializeTree { source: e })?;
        // serde_json only emits UTF-8.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Save the portable form as a JSON file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::SerializeTree`] | JSON encoding failed |
    /// | [`TreeError::WriteTree`] | file write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), TreeError> {
        let path = path.as_ref();
        let json = self.to_json_string()?;

        std::fs::write(path, &json).map_err(|e| TreeError::WriteTree {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(size_bytes = json.len(), n_nodes = self.n_nodes(), "tree saved");
        Ok(())
    }

    /// Load a tree from a portable JSON file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::ReadTree`] | file read failed |
    /// | [`TreeError::DeserializeTree`] | JSON decoding failed |
    /// | [`TreeError::UnknownFeature`] | a node names a feature not in `schema` |
    /// | [`TreeError::InvalidPortableNode`] | a node holds a non-finite number |
    #[instrument(skip(schema), fields(path = %path.as_ref().display()))]
    pub fn load_json(path: impl AsRef<Path>, schema: FeatureSchema) -> Result<Self, TreeError> {
        let path = path.as_ref();
        let root = read_portable(path)?;
        let tree = Self::from_portable(&root, schema)?;
        debug!(n_nodes = tree.n_nodes(), depth = tree.depth(), "tree loaded");
        Ok(tree)
    }
}

/// Read a portable tree from a JSON file without resolving feature names.
///
/// # Errors
///
/// Returns [`TreeError::ReadTree`] or [`TreeError::DeserializeTree`].
pub fn read_portable(path: &Path) -> Result<PortableNode, TreeError> {
    let text = std::fs::read_to_string(path).map_err(|e| TreeError::ReadTree {
        path: path.to_path_buf(),
        source: e,
    })?;
    PortableNode::from_json_str(&text).map_err(|e| TreeError::DeserializeTree {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Append `node` and its subtree to `nodes` in pre-order, returning its index.
fn push_portable(
    node: &PortableNode,
    schema: &FeatureSchema,
    nodes: &mut Vec<Node>,
) -> Result<NodeIndex, TreeError> {
    match node {
        PortableNode::Leaf { label } => {
            nodes.push(Node::Leaf { label: *label });
            Ok(NodeIndex::new(nodes.len() - 1))
        }
        PortableNode::Decision {
            feature,
            threshold,
            gain_ratio,
            left,
            right,
        } => {
            let feature_index =
                schema
                    .index_of(feature)
                    .ok_or_else(|| TreeError::UnknownFeature {
                        feature: feature.clone(),
                    })?;
            if !threshold.is_finite() || !gain_ratio.is_finite() {
                return Err(TreeError::InvalidPortableNode {
                    reason: format!(
                        "decision on \"{feature}\" has threshold {threshold} and gain ratio {gain_ratio}"
                    ),
                });
            }

            let node_idx = nodes.len();
            nodes.push(Node::Leaf {
                label: Label::NEGATIVE,
            });
            let left = push_portable(left, schema, nodes)?;
            let right = push_portable(right, schema, nodes)?;
            nodes[node_idx] = Node::Decision {
                feature: feature_index,
                threshold: *threshold,
                gain_ratio: *gain_ratio,
                left,
                right,
            };
            Ok(NodeIndex::new(node_idx))
        }
    }
}
