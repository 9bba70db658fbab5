//! Parse tree produced by the construction pass.

use std::fmt;

/// The labelled node kinds the INI grammar emits. Every other rule is an
/// alias whose children are spliced into its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Config,
    Comment,
    Group,
    GroupKey,
    Key,
    Symbol,
    KeyedValue,
    Value,
    Quote,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Config => "config",
            NodeKind::Comment => "comment",
            NodeKind::Group => "group",
            NodeKind::GroupKey => "group-key",
            NodeKind::Key => "key",
            NodeKind::Symbol => "symbol",
            NodeKind::KeyedValue => "keyed-value",
            NodeKind::Value => "value",
            NodeKind::Quote => "quote",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A node spanning `from..to` code points of the parsed input.
///
/// Nodes do not own their text; use [`Tree::text`] to slice it out of the
/// input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub from: usize,
    pub to: usize,
    pub children: Vec<Node>,
}

/// A parse tree together with the decoded input it spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    pub root: Node,
    input: Vec<char>,
}

impl Tree {
    pub(crate) fn new(root: Node, input: Vec<char>) -> Self {
        Self { root, input }
    }

    pub fn text(&self, node: &Node) -> String {
        self.input[node.from..node.to].iter().collect()
    }
}
