//! Namespace path resolution and lookup.
//!
//! A node's namespace path is built by folding the names of its
//! scope-opening ancestors (Scope, Device, Method, ...) from the top down,
//! each name being resolved relative to the scope built so far. Lookups
//! compare absolute paths and return the first match in byte-stream order;
//! the ACPI upward search rules for single-segment names are not applied.

use crate::encoding::EncodingAttributes;
use crate::name::{AmlNameString, AmlPath};
use crate::node::{AmlDataType, AmlNode, NodeId};
use crate::tree::AmlTree;
use crate::AmlError;

impl AmlTree {
    /// The name declared by a namespace object.
    fn declared_name(&self, node: NodeId) -> Result<AmlNameString, AmlError> {
        let obj = self.object(node)?;
        if !obj.has_attribute(EncodingAttributes::IN_NAMESPACE) {
            return Err(AmlError::InvalidParameter);
        }
        let name = self
            .fixed_argument(node, usize::from(obj.encoding.name_index))
            .ok_or(AmlError::InvalidParameter)?;
        let data = self.data(name)?;
        if data.data_type != AmlDataType::NameString {
            return Err(AmlError::InvalidParameter);
        }
        Ok(AmlNameString::parse(&data.buffer)?.0)
    }

    /// Path of the namespace scope `node` is declared in.
    fn enclosing_scope(&self, node: NodeId) -> Result<AmlPath, AmlError> {
        // Scope-opening ancestors, innermost first.
        let mut scopes = alloc::vec::Vec::new();
        let mut current = self.parent(node);
        while let Some(ancestor) = current {
            if let Some(AmlNode::Object(obj)) = self.node(ancestor) {
                if obj.encoding.opens_scope() {
                    scopes
                        .try_reserve(1)
                        .map_err(|_| AmlError::OutOfResources)?;
                    scopes.push(ancestor);
                }
            }
            current = self.parent(ancestor);
        }

        let mut path = AmlPath::ROOT;
        for &scope in scopes.iter().rev() {
            path = path.resolve(&self.declared_name(scope)?)?;
        }
        Ok(path)
    }

    /// Absolute namespace path of `node`.
    ///
    /// The Root is `\`. Any other node must declare a name (Name, Scope,
    /// Device, Method, a named field, ...).
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `node` declares no name, or
    /// [`AmlError::PathOverflow`] if its path cannot be represented.
    pub fn node_path(&self, node: NodeId) -> Result<AmlPath, AmlError> {
        if let AmlNode::Root(_) = self.node(node).ok_or(AmlError::InvalidParameter)? {
            return Ok(AmlPath::ROOT);
        }
        self.enclosing_scope(node)?
            .resolve(&self.declared_name(node)?)
    }

    /// Path relative names are resolved against when `node` is the
    /// reference: the node's own path if it opens a scope, else the scope it
    /// lives in.
    ///
    /// # Errors
    ///
    /// Same as [`node_path`](Self::node_path).
    pub fn scope_path(&self, node: NodeId) -> Result<AmlPath, AmlError> {
        match self.node(node).ok_or(AmlError::InvalidParameter)? {
            AmlNode::Root(_) => Ok(AmlPath::ROOT),
            AmlNode::Object(obj) if obj.encoding.opens_scope() => self.node_path(node),
            _ => self.enclosing_scope(node),
        }
    }

    /// Find the node named by `asl_path`, resolved relative to `reference`.
    ///
    /// `asl_path` uses ASL syntax: `\_SB_.COM0._UID`, `^PCI0`, `_HID`.
    /// Only the tree holding `reference` is searched. A path of `\` yields
    /// the Root.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `reference` is invalid or
    /// `asl_path` is malformed, and [`AmlError::NotFound`] if no node has
    /// that path.
    pub fn find_node(&self, reference: NodeId, asl_path: &str) -> Result<NodeId, AmlError> {
        let name = AmlNameString::from_asl(asl_path)?;
        let target = self.scope_path(reference)?.resolve(&name)?;

        let mut top = reference;
        while let Some(parent) = self.parent(top) {
            top = parent;
        }
        if target == AmlPath::ROOT && matches!(self.node(top), Some(AmlNode::Root(_))) {
            return Ok(top);
        }

        let found = self.iter_from(top).find(|&id| {
            matches!(self.node(id), Some(AmlNode::Object(obj))
                if obj.has_attribute(EncodingAttributes::IN_NAMESPACE))
                && self.node_path(id).is_ok_and(|path| path == target)
        });
        match found {
            Some(id) => Ok(id),
            None => {
                log::debug!("aml: no node at {target}");
                Err(AmlError::NotFound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::test_util::{empty_ssdt, sample_ssdt};
    use std::string::ToString;

    #[test]
    fn absolute_and_relative_lookups() {
        let tree = sample_ssdt();
        let root = tree.root();
        let device = tree.find_node(root, "\\_SB_.COM0").unwrap();
        let uid = tree.find_node(root, "\\_SB_.COM0._UID").unwrap();

        assert_eq!(tree.find_node(device, "_UID"), Ok(uid));
        assert_eq!(tree.find_node(uid, "_UID"), Ok(uid));
        assert_eq!(tree.find_node(uid, "^COM0._UID"), Ok(uid));
        assert_eq!(tree.find_node(device, "^COM0"), Ok(device));
        assert_eq!(tree.find_node(uid, "\\"), Ok(root));
        assert_eq!(tree.node_path(uid).unwrap().to_string(), "\\_SB_.COM0._UID");
    }

    #[test]
    fn missing_and_malformed_paths() {
        let tree = sample_ssdt();
        let root = tree.root();
        assert_eq!(tree.find_node(root, "\\_SB_.COM1"), Err(AmlError::NotFound));
        // No upward search from a nested scope.
        let device = tree.find_node(root, "\\_SB_.COM0").unwrap();
        assert_eq!(tree.find_node(device, "COM0"), Err(AmlError::NotFound));
        assert_eq!(
            tree.find_node(root, "\\_SB_.TOOLONG"),
            Err(AmlError::InvalidParameter)
        );
        assert_eq!(tree.find_node(root, "^FOO_"), Err(AmlError::PathOverflow));
    }

    #[test]
    fn method_opens_a_scope() {
        let mut tree = empty_ssdt();
        let root = tree.root();
        let method = tree
            .code_gen_method_ret_integer("MTH0", 1, 7, Some(root))
            .unwrap();
        let path = tree.scope_path(method).unwrap();
        assert_eq!(path.to_string(), "\\MTH0");
        assert_eq!(tree.find_node(root, "MTH0"), Ok(method));
        // Data nodes inherit the scope of their object.
        let name = tree.fixed_argument(method, 0).unwrap();
        assert_eq!(tree.scope_path(name).unwrap().to_string(), "\\MTH0");
        assert_eq!(tree.node_path(name), Err(AmlError::InvalidParameter));
    }

    #[test]
    fn detached_subtrees_are_searched_separately() {
        let mut tree = sample_ssdt();
        let root = tree.root();
        let device = tree.find_node(root, "\\_SB_.COM0").unwrap();
        tree.detach_node(device).unwrap();

        assert_eq!(tree.find_node(root, "\\_SB_.COM0"), Err(AmlError::NotFound));
        // Once detached, the device is declared at the top level.
        assert_eq!(tree.find_node(device, "\\COM0._UID").map(|_| ()), Ok(()));
    }
}
