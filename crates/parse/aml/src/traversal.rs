//! Tree traversal in AML byte-stream order.
//!
//! The children of an Object node are its fixed arguments, in index order,
//! followed by its variable arguments, in list order. [`AmlTree::next_node`]
//! walks the whole tree depth first in that order, which is exactly the
//! order in which the nodes are encoded. [`AmlTree::previous_node`] walks
//! it backwards.
//!
//! These are pure navigation helpers: misuse (a node that is not in the
//! list it is claimed to be in, a Data node used as a parent) yields `None`.

use crate::node::{AmlNode, NodeId, ObjectNode};
use crate::tree::AmlTree;

fn fixed_args(obj: &ObjectNode) -> &[Option<NodeId>] {
    &obj.fixed_args[..obj.fixed_arg_count()]
}

impl AmlTree {
    /// Next node in the variable argument list holding `node`.
    ///
    /// Returns `None` at the end of the list, and for nodes that are not in
    /// a variable list (the Root, detached nodes, fixed arguments).
    #[must_use]
    pub fn sibling_in_variable_list(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        if self.fixed_argument_index(node).is_some() {
            log::debug!("aml: {node:?} is a fixed argument, not a list member");
            return None;
        }
        self.next_variable_argument(parent, Some(node))
    }

    /// First variable argument of `parent` if `current` is `None`, else the
    /// one following `current`.
    ///
    /// Returns `None` at the end of the list or if `current` is not a member
    /// of `parent`'s variable list.
    #[must_use]
    pub fn next_variable_argument(
        &self,
        parent: NodeId,
        current: Option<NodeId>,
    ) -> Option<NodeId> {
        let list = self.node(parent)?.variable_args()?;
        match current {
            None => list.first().copied(),
            Some(current) => {
                let pos = list.iter().position(|&id| id == current)?;
                list.get(pos + 1).copied()
            }
        }
    }

    /// Last variable argument of `parent` if `current` is `None`, else the
    /// one preceding `current`.
    #[must_use]
    pub fn previous_variable_argument(
        &self,
        parent: NodeId,
        current: Option<NodeId>,
    ) -> Option<NodeId> {
        let list = self.node(parent)?.variable_args()?;
        match current {
            None => list.last().copied(),
            Some(current) => {
                let pos = list.iter().position(|&id| id == current)?;
                pos.checked_sub(1).map(|prev| list[prev])
            }
        }
    }

    /// Next child of `parent` after `child`, fixed arguments first.
    ///
    /// With `child == None` this is the first child.
    #[must_use]
    pub fn next_sibling(&self, parent: NodeId, child: Option<NodeId>) -> Option<NodeId> {
        let obj = match self.node(parent)? {
            AmlNode::Root(_) => return self.next_variable_argument(parent, child),
            AmlNode::Object(obj) => obj,
            AmlNode::Data(_) => return None,
        };
        let fixed = fixed_args(obj);

        let start = match child {
            None => 0,
            Some(child) => match fixed.iter().position(|&arg| arg == Some(child)) {
                Some(index) => index + 1,
                None => return self.next_variable_argument(parent, Some(child)),
            },
        };
        fixed[start..]
            .iter()
            .flatten()
            .next()
            .copied()
            .or_else(|| self.next_variable_argument(parent, None))
    }

    /// Previous child of `parent` before `child`, variable arguments first
    /// (in reverse) then fixed arguments (in reverse).
    ///
    /// With `child == None` this is the last child.
    #[must_use]
    pub fn previous_sibling(&self, parent: NodeId, child: Option<NodeId>) -> Option<NodeId> {
        let (obj, list) = match self.node(parent)? {
            AmlNode::Root(root) => (None, root.variable_args.as_slice()),
            AmlNode::Object(obj) => (Some(obj), obj.variable_args.as_slice()),
            AmlNode::Data(_) => return None,
        };
        let fixed = obj.map_or(&[][..], fixed_args);
        let last_fixed_before = |end: usize| fixed[..end].iter().rev().flatten().next().copied();

        match child {
            None => list.last().copied().or_else(|| last_fixed_before(fixed.len())),
            Some(child) => {
                if let Some(index) = fixed.iter().position(|&arg| arg == Some(child)) {
                    return last_fixed_before(index);
                }
                match list.iter().position(|&id| id == child)? {
                    0 => last_fixed_before(fixed.len()),
                    pos => Some(list[pos - 1]),
                }
            }
        }
    }

    /// Next node in AML byte-stream (depth-first, pre-order) order.
    ///
    /// Returns `None` after the last node of the tree holding `node`.
    #[must_use]
    pub fn next_node(&self, node: NodeId) -> Option<NodeId> {
        if let Some(child) = self.next_sibling(node, None) {
            return Some(child);
        }

        let mut current = node;
        loop {
            let parent = self.parent(current)?;
            if let Some(sibling) = self.next_sibling(parent, Some(current)) {
                return Some(sibling);
            }
            current = parent;
        }
    }

    /// Previous node in AML byte-stream order.
    ///
    /// Returns `None` for the Root and for the top of a detached subtree.
    #[must_use]
    pub fn previous_node(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let Some(mut candidate) = self.previous_sibling(parent, Some(node)) else {
            return Some(parent);
        };

        // The previous node is the last descendant of the previous sibling.
        loop {
            if matches!(self.node(candidate), Some(AmlNode::Data(_))) {
                return Some(candidate);
            }
            match self.previous_sibling(candidate, None) {
                Some(last) => candidate = last,
                None => return Some(candidate),
            }
        }
    }

    /// Iterate over `node` and all its descendants in byte-stream order.
    #[must_use]
    pub fn iter_from(&self, node: NodeId) -> Nodes<'_> {
        Nodes {
            tree: self,
            top: node,
            next: self.is_valid(node).then_some(node),
        }
    }

    /// Iterate over every node reachable from the Root, Root first.
    #[must_use]
    pub fn nodes(&self) -> Nodes<'_> {
        self.iter_from(self.root())
    }
}

/// Pre-order iterator over a subtree, see [`AmlTree::iter_from`].
#[derive(Debug, Clone)]
pub struct Nodes<'a> {
    tree: &'a AmlTree,
    top: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Nodes<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self
            .tree
            .next_node(current)
            .filter(|&n| self.tree.is_ancestor_or_self(self.top, n));
        Some(current)
    }
}
