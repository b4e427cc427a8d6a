//! Graphviz rendering of a portable tree.

use std::fmt;

use pluvio_tree::PortableNode;

/// Display names for label 0 and label 1.
pub const DEFAULT_CLASS_NAMES: [&str; 2] = ["No Rain", "Rain"];

/// A portable tree formatted as a Graphviz `digraph`.
///
/// Decision nodes are diamonds labelled `feature ≤ threshold` over the gain
/// ratio; leaves are boxes labelled with their class name. The edge to the
/// left child carries the `≤` test and the edge to the right child the `>`
/// test. Node identifiers follow pre-order (`n0` is the root).
///
/// ```
/// use pluvio_io::Dot;
/// use pluvio_tree::{Label, PortableNode};
///
/// let leaf = PortableNode::Leaf { label: Label::POSITIVE };
/// let text = Dot::new(&leaf, "rain").to_string();
/// assert!(text.contains("n0 [label=\"Rain\", shape=box"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Dot<'a> {
    root: &'a PortableNode,
    graph_name: &'a str,
    class_names: [&'a str; 2],
}

impl<'a> Dot<'a> {
    /// Prepare `root` for rendering as the graph `graph_name`.
    #[must_use]
    pub fn new(root: &'a PortableNode, graph_name: &'a str) -> Self {
        Self {
            root,
            graph_name,
            class_names: DEFAULT_CLASS_NAMES,
        }
    }

    /// Use `names[0]` and `names[1]` for leaves of label 0 and 1.
    #[must_use]
    pub fn with_class_names(mut self, names: [&'a str; 2]) -> Self {
        self.class_names = names;
        self
    }

    fn write_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        node: &PortableNode,
        next_id: &mut usize,
    ) -> Result<usize, fmt::Error> {
        let id = *next_id;
        *next_id += 1;
        match node {
            PortableNode::Leaf { label } => {
                writeln!(
                    f,
                    "    n{id} [label=\"{}\", shape=box, style=filled, fillcolor=lightgreen, fontname=Arial];",
                    escape(self.class_names[label.index()])
                )?;
            }
            PortableNode::Decision {
                feature,
                threshold,
                gain_ratio,
                left,
                right,
            } => {
                let feature = escape(feature);
                writeln!(
                    f,
                    "    n{id} [label=\"{feature} ≤ {threshold:.2}\\nGR={gain_ratio:.3}\", shape=diamond, style=filled, fillcolor=lightblue, fontname=Arial];"
                )?;
                let left_id = self.write_node(f, left, next_id)?;
                writeln!(
                    f,
                    "    n{id} -> n{left_id} [label=\"{feature} ≤ {threshold:.2}\"];"
                )?;
                let right_id = self.write_node(f, right, next_id)?;
                writeln!(
                    f,
                    "    n{id} -> n{right_id} [label=\"{feature} > {threshold:.2}\"];"
                )?;
            }
        }
        Ok(id)
    }
}

impl fmt::Display for Dot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph \"{}\" {{", escape(self.graph_name))?;
        writeln!(f, "    rankdir=TB;")?;
        let mut next_id = 0;
        self.write_node(f, self.root, &mut next_id)?;
        writeln!(f, "}}")
    }
}

/// Escape a string for use inside a double-quoted DOT identifier.
fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
