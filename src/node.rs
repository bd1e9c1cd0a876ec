//! Composed document tree.

use crate::mark::Mark;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Scalar { value: String, style: ScalarStyle },
    Mapping(Vec<(Node, Node)>),
    Sequence(Vec<Node>),
}

#[derive(Debug, Clone, PartialEq)]
/// A node of the composed tree with its explicit tag and start position.
pub struct Node {
    pub kind: NodeKind,
    pub tag: Option<String>,
    pub mark: Mark,
}

impl Node {
    pub fn scalar(value: impl Into<String>, style: ScalarStyle, mark: Mark) -> Self {
        Self {
            kind: NodeKind::Scalar {
                value: value.into(),
                style,
            },
            tag: None,
            mark,
        }
    }

    /// Returns the text of a scalar node.
    pub fn as_scalar(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Short kind name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Scalar { .. } => "scalar",
            NodeKind::Mapping(_) => "mapping",
            NodeKind::Sequence(_) => "sequence",
        }
    }
}
