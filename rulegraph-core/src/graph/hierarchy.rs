//! Parent/child nesting of nodes.

use std::collections::HashMap;

use crate::NodeId;

/// Tracks which nodes are nested inside which compound nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Hierarchy {
    roots: Vec<NodeId>,
    parent: HashMap<NodeId, NodeId>,
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl Hierarchy {
    pub fn push_root(&mut self, node: NodeId) {
        self.roots.push(node);
    }

    pub fn push_child(&mut self, parent: NodeId, node: NodeId) {
        self.parent.insert(node, parent);
        self.children.entry(parent).or_default().push(node);
    }

    #[inline]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    #[inline]
    pub fn is_root(&self, node: NodeId) -> bool {
        !self.parent.contains_key(&node)
    }

    #[inline]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parent.get(&node).copied()
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.children
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Siblings of `node`, including itself.
    pub fn siblings(&self, node: NodeId) -> &[NodeId] {
        match self.parent(node) {
            Some(p) => self.children(p),
            None => self.roots(),
        }
    }

    /// All nodes, depth first, parents before children.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder {
            hierarchy: self,
            stack: self.roots.iter().rev().copied().collect(),
        }
    }

    /// `node` followed by all of its descendants, depth first.
    pub fn descendants(&self, node: NodeId) -> Preorder<'_> {
        Preorder {
            hierarchy: self,
            stack: vec![node],
        }
    }
}

/// Depth-first pre-order traversal over a [`Hierarchy`].
pub(crate) struct Preorder<'a> {
    hierarchy: &'a Hierarchy,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.hierarchy.children(node).iter().rev().copied());
        Some(node)
    }
}
