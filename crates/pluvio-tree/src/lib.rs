//! Binary decision trees grown by gain ratio (C4.5-style).
//!
//! Provides entropy-based split statistics, an exhaustive threshold search,
//! a pre-pruned recursive builder over an index arena, row-wise prediction,
//! and a portable nested JSON form for interchange.

mod error;
mod metrics;
mod node;
mod portable;
mod predict;
mod schema;
mod split;
pub mod stats;
mod tree;

pub use error::TreeError;
pub use metrics::BinaryConfusion;
pub use node::{FeatureIndex, Label, Node, NodeIndex};
pub use portable::{PortableNode, read_portable};
pub use schema::{FeatureRow, FeatureSchema};
pub use split::{BestSplit, find_best_split};
pub use stats::{entropy, gain_ratio, information_gain, split_info};
pub use tree::{DecisionTree, TreeConfig};
