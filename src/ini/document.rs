//! Hierarchical key/value document built from the parse tree.

use std::collections::BTreeMap;

use super::ast::{Node, NodeKind, Tree};
use super::error::Error;
use super::unescape::{unescape_bare, unquote};

/// One node of a parsed INI document.
///
/// A node may hold values, child fields, or both. Values keep source order
/// across every definition of the same path, whether written inside a group
/// or with a full dotted key. Field names are the symbols exactly as written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    values: Vec<String>,
    fields: BTreeMap<String, Document>,
    used: bool,
}

impl Document {
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn fields(&self) -> &BTreeMap<String, Document> {
        &self.fields
    }

    /// True when nothing at all was defined.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.fields.is_empty()
    }

    pub fn node<S: AsRef<str>>(&self, path: &[S]) -> Option<&Document> {
        path.iter()
            .try_fold(self, |node, symbol| node.fields.get(symbol.as_ref()))
    }

    /// Values at `path`; empty if nothing was ever written there.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> &[String] {
        self.node(path).map(Document::values).unwrap_or(&[])
    }

    /// Like [`Document::get`], and marks the node as used.
    pub fn consume<S: AsRef<str>>(&mut self, path: &[S]) -> &[String] {
        let mut node = self;
        for symbol in path {
            match node.fields.get_mut(symbol.as_ref()) {
                Some(child) => node = child,
                None => return &[],
            }
        }
        node.used = true;
        &node.values
    }

    /// Paths that hold values no one has consumed.
    pub fn unused(&self) -> Vec<Vec<String>> {
        let mut found = Vec::new();
        self.collect_unused(&mut Vec::new(), &mut found);
        found
    }

    fn collect_unused(&self, path: &mut Vec<String>, found: &mut Vec<Vec<String>>) {
        if !self.values.is_empty() && !self.used {
            found.push(path.clone());
        }
        for (symbol, child) in &self.fields {
            path.push(symbol.clone());
            child.collect_unused(path, found);
            path.pop();
        }
    }

    fn child_mut(&mut self, path: &[String]) -> &mut Document {
        path.iter().fold(self, |node, symbol| {
            node.fields.entry(symbol.clone()).or_default()
        })
    }
}

/// Interprets a parse tree as a document.
pub fn postprocess(tree: &Tree) -> Result<Document, Error> {
    let mut root = Document::default();
    process(tree, &mut root, &tree.root)?;
    Ok(root)
}

fn process(tree: &Tree, parent: &mut Document, node: &Node) -> Result<(), Error> {
    match node.kind {
        NodeKind::Config => process_all(tree, parent, &node.children),
        NodeKind::Comment => Ok(()),
        NodeKind::Quote => {
            parent.values.push(unquote(&tree.text(node))?);
            Ok(())
        }
        NodeKind::Value => match node.children.as_slice() {
            [wrapped] => process(tree, parent, wrapped),
            _ => {
                parent.values.push(unescape_bare(&tree.text(node))?);
                Ok(())
            }
        },
        NodeKind::KeyedValue => {
            let [key, rest @ ..] = node.children.as_slice() else {
                return Err(misplaced(node));
            };
            if rest.is_empty() {
                return Err(misplaced(node));
            }
            let path = key_path(tree, key)?;
            process_all(tree, parent.child_mut(&path), rest)
        }
        NodeKind::Group => {
            let Some((group_key, rest)) = node.children.split_first() else {
                return Err(misplaced(node));
            };
            let key = match (group_key.kind, group_key.children.first()) {
                (NodeKind::GroupKey, Some(key)) => key,
                _ => return Err(misplaced(node)),
            };
            let path = key_path(tree, key)?;
            process_all(tree, parent.child_mut(&path), rest)
        }
        NodeKind::GroupKey | NodeKind::Key | NodeKind::Symbol => Err(misplaced(node)),
    }
}

fn process_all(tree: &Tree, parent: &mut Document, nodes: &[Node]) -> Result<(), Error> {
    nodes.iter().try_for_each(|node| process(tree, parent, node))
}

fn key_path(tree: &Tree, key: &Node) -> Result<Vec<String>, Error> {
    if key.kind != NodeKind::Key {
        return Err(misplaced(key));
    }
    Ok(key.children.iter().map(|symbol| tree.text(symbol)).collect())
}

fn misplaced(node: &Node) -> Error {
    Error::InvalidAst(format!("{} at {}..{}", node.kind, node.from, node.to))
}
