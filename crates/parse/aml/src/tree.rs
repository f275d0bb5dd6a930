//! Node arena and structural edits (attach, detach, delete).
//!
//! Every node of a definition block lives in the [`AmlTree`] arena. Parents
//! own their children through the fixed argument slots and the variable
//! argument list; children only record their parent's [`NodeId`]. A node
//! whose parent link is empty is either the Root or the top of a detached
//! subtree owned by the caller.

use alloc::vec::Vec;

use crate::encoding::{AmlByteEncoding, AmlParseFormat, EncodingAttributes, PACKAGE_OP};
use crate::node::{AmlDataType, AmlNode, AmlNodeType, DataNode, NodeId, ObjectNode, RootNode};
use crate::pkg_len;
use crate::sdt::SdtHeader;
use crate::AmlError;

/// A live node and its parent link.
#[derive(Debug)]
struct NodeEntry {
    parent: Option<NodeId>,
    node: AmlNode,
}

/// One arena slot. `entry` is `None` once the node has been deleted.
#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<NodeEntry>,
}

/// In-memory tree of a DSDT/SSDT definition block.
#[derive(Debug)]
pub struct AmlTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl AmlTree {
    /// Create a tree holding only a Root node with the given header.
    ///
    /// The header's length is reset to the size of an empty definition block.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if the signature is neither
    /// `DSDT` nor `SSDT`.
    pub fn new(header: SdtHeader) -> Result<Self, AmlError> {
        if !header.is_definition_block() {
            return Err(AmlError::InvalidParameter);
        }
        let mut header = header;
        header.length = SdtHeader::SIZE as u32;

        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        };
        tree.root = tree.alloc(AmlNode::Root(RootNode {
            header,
            variable_args: Vec::new(),
        }))?;
        Ok(tree)
    }

    /// Handle of the Root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns `true` if `id` designates a live node of this tree.
    #[must_use]
    pub fn is_valid(&self, id: NodeId) -> bool {
        self.entry(id).is_some()
    }

    /// Number of live nodes, detached subtrees included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.entry.is_some()).count()
    }

    /// Borrow a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&AmlNode> {
        self.entry(id).map(|e| &e.node)
    }

    /// Parent of `id`, or `None` for the Root and detached nodes.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).and_then(|e| e.parent)
    }

    fn entry(&self, id: NodeId) -> Option<&NodeEntry> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    fn entry_mut(&mut self, id: NodeId) -> Option<&mut NodeEntry> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut AmlNode> {
        self.entry_mut(id).map(|e| &mut e.node)
    }

    pub(crate) fn root_node(&self, id: NodeId) -> Result<&RootNode, AmlError> {
        match self.node(id) {
            Some(AmlNode::Root(root)) => Ok(root),
            _ => Err(AmlError::InvalidParameter),
        }
    }

    pub(crate) fn root_node_mut(&mut self, id: NodeId) -> Result<&mut RootNode, AmlError> {
        match self.node_mut(id) {
            Some(AmlNode::Root(root)) => Ok(root),
            _ => Err(AmlError::InvalidParameter),
        }
    }

    pub(crate) fn object(&self, id: NodeId) -> Result<&ObjectNode, AmlError> {
        match self.node(id) {
            Some(AmlNode::Object(obj)) => Ok(obj),
            _ => Err(AmlError::InvalidParameter),
        }
    }

    pub(crate) fn object_mut(&mut self, id: NodeId) -> Result<&mut ObjectNode, AmlError> {
        match self.node_mut(id) {
            Some(AmlNode::Object(obj)) => Ok(obj),
            _ => Err(AmlError::InvalidParameter),
        }
    }

    pub(crate) fn data(&self, id: NodeId) -> Result<&DataNode, AmlError> {
        match self.node(id) {
            Some(AmlNode::Data(data)) => Ok(data),
            _ => Err(AmlError::InvalidParameter),
        }
    }

    pub(crate) fn data_mut(&mut self, id: NodeId) -> Result<&mut DataNode, AmlError> {
        match self.node_mut(id) {
            Some(AmlNode::Data(data)) => Ok(data),
            _ => Err(AmlError::InvalidParameter),
        }
    }

    /// Reserve room for `count` more nodes.
    pub(crate) fn reserve_nodes(&mut self, count: usize) -> Result<(), AmlError> {
        let needed = count.saturating_sub(self.free.len());
        self.slots
            .try_reserve(needed)
            .map_err(|_| AmlError::OutOfResources)
    }

    fn alloc(&mut self, node: AmlNode) -> Result<NodeId, AmlError> {
        let entry = Some(NodeEntry { parent: None, node });
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = entry;
            return Ok(NodeId {
                index,
                generation: slot.generation,
            });
        }

        let index = u32::try_from(self.slots.len()).map_err(|_| AmlError::OutOfResources)?;
        self.reserve_nodes(1)?;
        self.slots.push(Slot {
            generation: 0,
            entry,
        });
        Ok(NodeId {
            index,
            generation: 0,
        })
    }

    /// Create a detached Object node for `encoding` with empty arguments.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::OutOfResources`] if the arena cannot grow.
    pub fn create_object_node(
        &mut self,
        encoding: &'static AmlByteEncoding,
    ) -> Result<NodeId, AmlError> {
        let pkg_len = if encoding.has(EncodingAttributes::HAS_PKG_LENGTH) {
            pkg_len::from_payload(0)?
        } else {
            0
        };
        self.alloc(AmlNode::Object(ObjectNode {
            encoding,
            pkg_len,
            fixed_args: [None; crate::encoding::MAX_FIXED_ARGS],
            variable_args: Vec::new(),
        }))
    }

    /// Create a detached Data node holding a copy of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `bytes` is empty, or
    /// [`AmlError::OutOfResources`] if the buffer cannot be allocated.
    pub fn create_data_node(
        &mut self,
        data_type: AmlDataType,
        bytes: &[u8],
    ) -> Result<NodeId, AmlError> {
        if bytes.is_empty() {
            return Err(AmlError::InvalidParameter);
        }
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(bytes.len())
            .map_err(|_| AmlError::OutOfResources)?;
        buffer.extend_from_slice(bytes);
        self.alloc(AmlNode::Data(DataNode { data_type, buffer }))
    }

    /// Fixed argument `index` of an Object node.
    #[must_use]
    pub fn fixed_argument(&self, node: NodeId, index: usize) -> Option<NodeId> {
        let obj = self.object(node).ok()?;
        if index >= obj.fixed_arg_count() {
            return None;
        }
        obj.fixed_args[index]
    }

    /// Index of `node` among its parent's fixed arguments.
    ///
    /// Returns `None` if the node has no parent or sits in a variable list.
    #[must_use]
    pub fn fixed_argument_index(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        let obj = self.object(parent).ok()?;
        obj.fixed_args[..obj.fixed_arg_count()]
            .iter()
            .position(|&arg| arg == Some(node))
    }

    /// Returns `true` if `ancestor` is `node` or one of its ancestors.
    pub(crate) fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Check that `child` is a detached, non-root subtree that may hang
    /// below `parent`.
    fn check_attachable(&self, parent: NodeId, child: NodeId) -> Result<(), AmlError> {
        let parent_type = self.node_type(parent);
        if parent_type != AmlNodeType::Root && parent_type != AmlNodeType::Object {
            return Err(AmlError::InvalidParameter);
        }
        match self.entry(child) {
            Some(entry) if entry.parent.is_none() => {}
            _ => return Err(AmlError::InvalidParameter),
        }
        if child == self.root || self.is_ancestor_or_self(child, parent) {
            return Err(AmlError::InvalidParameter);
        }
        Ok(())
    }

    /// Returns `true` if `child` may fill a fixed slot encoded as `format`.
    fn fits_fixed_format(&self, format: AmlParseFormat, child: NodeId) -> bool {
        match self.node(child) {
            Some(AmlNode::Object(obj)) => {
                format == AmlParseFormat::Object && !obj.encoding.is_field_element()
            }
            Some(AmlNode::Data(data)) => match format {
                AmlParseFormat::Object | AmlParseFormat::Name => {
                    data.data_type == AmlDataType::NameString
                }
                AmlParseFormat::String => data.data_type == AmlDataType::String,
                AmlParseFormat::FieldPkgLen => data.data_type == AmlDataType::FieldPkgLen,
                _ => {
                    data.data_type == AmlDataType::UInt
                        && format.integer_width() == Some(data.buffer.len())
                }
            },
            _ => false,
        }
    }

    /// Returns `true` if `child` may be appended to `parent`'s variable list.
    fn fits_variable_list(&self, parent: NodeId, child: NodeId) -> bool {
        let child_node = self.node(child);
        let attributes = match self.node(parent) {
            Some(AmlNode::Root(_)) => {
                return matches!(child_node, Some(AmlNode::Object(obj)) if !obj.encoding.is_field_element());
            }
            Some(AmlNode::Object(obj)) => obj.encoding.attributes,
            _ => return false,
        };

        if attributes.contains(EncodingAttributes::HAS_BYTE_LIST) {
            matches!(child_node, Some(AmlNode::Data(data)) if data.data_type.is_byte_list())
        } else if attributes.contains(EncodingAttributes::HAS_FIELD_LIST) {
            matches!(child_node, Some(AmlNode::Object(obj)) if obj.encoding.is_field_element())
        } else if attributes.contains(EncodingAttributes::HAS_CHILD_OBJ) {
            match child_node {
                Some(AmlNode::Object(obj)) => !obj.encoding.is_field_element(),
                Some(AmlNode::Data(data)) => data.data_type == AmlDataType::NameString,
                _ => false,
            }
        } else {
            false
        }
    }

    /// Number of elements a variable argument adds to `parent`'s element
    /// count (Package NumElements).
    fn element_delta(&self, parent: NodeId) -> i32 {
        match self.object(parent) {
            Ok(obj) if obj.is_op(PACKAGE_OP, 0) => 1,
            _ => 0,
        }
    }

    /// Attach the detached subtree `child` as fixed argument `index` of
    /// `parent` and propagate its size.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `parent` is not an Object
    /// node, the slot is out of range or occupied, `child` is attached, is
    /// the Root or an ancestor of `parent`, or does not match the slot's
    /// encoding. Propagation failures are returned unchanged.
    pub fn set_fixed_argument(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), AmlError> {
        self.check_attachable(parent, child)?;
        let obj = self.object(parent)?;
        if index >= obj.fixed_arg_count() || obj.fixed_args[index].is_some() {
            return Err(AmlError::InvalidParameter);
        }
        if !self.fits_fixed_format(obj.encoding.formats[index], child) {
            return Err(AmlError::InvalidParameter);
        }

        let size = self.compute_size(child)?;
        self.propagate_information(parent, size as isize, 0)?;
        self.link_fixed(parent, index, child)
    }

    /// Append the detached subtree `child` to `parent`'s variable argument
    /// list and propagate its size.
    ///
    /// # Errors
    ///
    /// See [`set_fixed_argument`](Self::set_fixed_argument); also fails with
    /// [`AmlError::InvalidParameter`] if `parent` has no variable list able
    /// to hold `child`.
    pub fn append_variable_argument(
        &mut self,
        parent: NodeId,
        child: NodeId,
    ) -> Result<(), AmlError> {
        self.insert_variable_argument(parent, None, child)
    }

    /// Insert the detached subtree `child` right before `sibling` in
    /// `parent`'s variable argument list.
    ///
    /// # Errors
    ///
    /// Same as [`append_variable_argument`](Self::append_variable_argument);
    /// also fails with [`AmlError::InvalidParameter`] if `sibling` is not in
    /// that list.
    pub fn insert_variable_argument_before(
        &mut self,
        parent: NodeId,
        sibling: NodeId,
        child: NodeId,
    ) -> Result<(), AmlError> {
        self.insert_variable_argument(parent, Some(sibling), child)
    }

    fn insert_variable_argument(
        &mut self,
        parent: NodeId,
        before: Option<NodeId>,
        child: NodeId,
    ) -> Result<(), AmlError> {
        self.check_attachable(parent, child)?;
        if !self.fits_variable_list(parent, child) {
            return Err(AmlError::InvalidParameter);
        }
        let list = self
            .node(parent)
            .and_then(AmlNode::variable_args)
            .ok_or(AmlError::InvalidParameter)?;
        let position = match before {
            Some(sibling) => list
                .iter()
                .position(|&id| id == sibling)
                .ok_or(AmlError::InvalidParameter)?,
            None => list.len(),
        };

        self.node_mut(parent)
            .and_then(AmlNode::variable_args_mut)
            .ok_or(AmlError::InvalidParameter)?
            .try_reserve(1)
            .map_err(|_| AmlError::OutOfResources)?;

        let size = self.compute_size(child)?;
        let elements = self.element_delta(parent);
        self.propagate_information(parent, size as isize, elements)?;

        log::trace!("aml: attach {child:?} under {parent:?} at {position} (+{size} bytes)");
        self.link_variable(parent, position, child)
    }

    /// Link `child` into a fixed slot without touching any size.
    pub(crate) fn link_fixed(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), AmlError> {
        self.object_mut(parent)?.fixed_args[index] = Some(child);
        self.entry_mut(child).ok_or(AmlError::InvalidParameter)?.parent = Some(parent);
        Ok(())
    }

    /// Link `child` into the variable list at `position` without touching
    /// any size.
    pub(crate) fn link_variable(
        &mut self,
        parent: NodeId,
        position: usize,
        child: NodeId,
    ) -> Result<(), AmlError> {
        let list = self
            .node_mut(parent)
            .and_then(AmlNode::variable_args_mut)
            .ok_or(AmlError::InvalidParameter)?;
        list.try_reserve(1).map_err(|_| AmlError::OutOfResources)?;
        list.insert(position, child);
        self.entry_mut(child).ok_or(AmlError::InvalidParameter)?.parent = Some(parent);
        Ok(())
    }

    /// Detach `node` from its parent's variable argument list.
    ///
    /// The node becomes the top of a standalone subtree owned by the caller,
    /// who must either re-attach it or pass it to
    /// [`delete_tree`](Self::delete_tree).
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `node` is the Root, has no
    /// parent, or is a fixed argument. Propagation failures are returned
    /// unchanged and leave the tree untouched.
    pub fn detach_node(&mut self, node: NodeId) -> Result<(), AmlError> {
        if node == self.root {
            return Err(AmlError::InvalidParameter);
        }
        let parent = self.parent(node).ok_or(AmlError::InvalidParameter)?;
        let position = self
            .node(parent)
            .and_then(AmlNode::variable_args)
            .and_then(|list| list.iter().position(|&id| id == node))
            .ok_or(AmlError::InvalidParameter)?;

        let size = self.compute_size(node)?;
        let elements = self.element_delta(parent);
        self.propagate_information(parent, -(size as isize), -elements)?;

        if let Some(list) = self.node_mut(parent).and_then(AmlNode::variable_args_mut) {
            list.remove(position);
        }
        if let Some(entry) = self.entry_mut(node) {
            entry.parent = None;
        }
        log::trace!("aml: detached {node:?} from {parent:?} (-{size} bytes)");
        Ok(())
    }

    /// Free `node` and its whole subtree.
    ///
    /// Only the Root or a detached subtree can be deleted. Deleting the Root
    /// frees every node reachable from it and invalidates
    /// [`root`](Self::root).
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `node` is invalid or still
    /// attached to a parent.
    pub fn delete_tree(&mut self, node: NodeId) -> Result<(), AmlError> {
        let entry = self.entry(node).ok_or(AmlError::InvalidParameter)?;
        if entry.parent.is_some() {
            return Err(AmlError::InvalidParameter);
        }

        let mut stack = Vec::new();
        stack.push(node);
        while let Some(id) = stack.pop() {
            let Some(slot) = self.slots.get_mut(id.index as usize) else {
                continue;
            };
            if slot.generation != id.generation {
                continue;
            }
            let Some(entry) = slot.entry.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);

            match entry.node {
                AmlNode::Root(root) => stack.extend(root.variable_args),
                AmlNode::Object(obj) => {
                    stack.extend(obj.fixed_args.iter().flatten().copied());
                    stack.extend(obj.variable_args);
                }
                AmlNode::Data(_) => {}
            }
        }
        Ok(())
    }
}
