use std::fmt;

use crate::error::TreeError;

/// Position of a column in a [`FeatureSchema`](crate::FeatureSchema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    pub(crate) fn new(position: usize) -> Self {
        Self(position)
    }

    /// Return the column position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feature #{}", self.0)
    }
}

/// Slot of a node in a tree's pre-order arena; the root is slot 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) fn new(slot: usize) -> Self {
        Self(slot)
    }

    /// Return the arena slot.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A binary class label: 0 (negative) or 1 (positive).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Label(u8);

impl Label {
    /// Label 0.
    pub const NEGATIVE: Label = Label(0);
    /// Label 1.
    pub const POSITIVE: Label = Label(1);

    /// Return the label as its integer value (0 or 1).
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Return the label as an index usable for `[_; 2]` count arrays.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u8> for Label {
    type Error = TreeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Label::NEGATIVE),
            1 => Ok(Label::POSITIVE),
            value => Err(TreeError::NonBinaryLabel { value }),
        }
    }
}

impl From<Label> for u8 {
    fn from(label: Label) -> Self {
        label.0
    }
}

impl From<bool> for Label {
    fn from(positive: bool) -> Self {
        if positive { Label::POSITIVE } else { Label::NEGATIVE }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in a decision tree arena.
///
/// Trees are stored as `Vec<Node>` in pre-order, with children referenced
/// by [`NodeIndex`]. The root is always at index 0.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// An interior threshold test.
    Decision {
        /// Feature tested at this node.
        feature: FeatureIndex,
        /// Samples with feature <= threshold go left, the rest go right.
        threshold: f64,
        /// Gain ratio of the split chosen here.
        gain_ratio: f64,
        /// Index of the left child node.
        left: NodeIndex,
        /// Index of the right child node.
        right: NodeIndex,
    },
    /// A terminal node carrying the predicted label.
    Leaf {
        /// Predicted label.
        label: Label,
    },
}

impl Node {
    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{FeatureIndex, Label, Node, NodeIndex};
    use crate::error::TreeError;

    #[test]
    fn feature_index_roundtrip() {
        let fi = FeatureIndex::new(4);
        assert_eq!(fi.index(), 4);
        assert_eq!(format!("{fi}"), "feature #4");
    }

    #[test]
    fn node_index_ordering() {
        assert!(NodeIndex::new(1) < NodeIndex::new(2));
    }

    #[test]
    fn label_accepts_only_binary_values() {
        assert_eq!(Label::try_from(0).unwrap(), Label::NEGATIVE);
        assert_eq!(Label::try_from(1).unwrap(), Label::POSITIVE);
        assert!(matches!(
            Label::try_from(2),
            Err(TreeError::NonBinaryLabel { value: 2 })
        ));
    }

    #[test]
    fn label_from_bool() {
        assert_eq!(Label::from(true), Label::POSITIVE);
        assert_eq!(Label::from(false).value(), 0);
    }

    #[test]
    fn label_serializes_as_integer() {
        let json = serde_json::to_string(&Label::POSITIVE).unwrap();
        assert_eq!(json, "1");
        let back: Label = serde_json::from_str("0").unwrap();
        assert_eq!(back, Label::NEGATIVE);
        assert!(serde_json::from_str::<Label>("3").is_err());
    }

    #[test]
    fn deserialized_label_error_names_no_sample() {
        let msg = serde_json::from_str::<Label>("2").unwrap_err().to_string();
        assert!(msg.contains("label 2 is not binary"), "{msg}");
        assert!(!msg.contains("sample"), "{msg}");
    }

    #[test]
    fn leaf_is_leaf() {
        let leaf = Node::Leaf { label: Label::POSITIVE };
        let split = Node::Decision {
            feature: FeatureIndex::new(0),
            threshold: 1.5,
            gain_ratio: 0.4,
            left: NodeIndex::new(1),
            right: NodeIndex::new(2),
        };
        assert!(leaf.is_leaf());
        assert!(!split.is_leaf());
    }
}
