//! Size computation and upward size propagation.
//!
//! Whenever the encoded size of a node changes by `delta` bytes, every
//! ancestor carrying a PkgLength and the Root's table length must change by
//! the same amount. Re-encoding a PkgLength can itself change its width, in
//! which case the extra bytes are carried further up.

use alloc::vec::Vec;

use crate::encoding::{EncodingAttributes, PACKAGE_OP};
use crate::node::{AmlNode, NodeId};
use crate::pkg_len;
use crate::tree::AmlTree;
use crate::AmlError;

impl AmlTree {
    /// Encoded size of `node` alone, without its children.
    pub(crate) fn own_size(&self, node: NodeId) -> Result<usize, AmlError> {
        match self.node(node).ok_or(AmlError::InvalidParameter)? {
            AmlNode::Root(_) => Ok(0),
            AmlNode::Object(obj) => {
                let mut size = obj.encoding.opcode_size();
                if obj.has_attribute(EncodingAttributes::HAS_PKG_LENGTH) {
                    size += pkg_len::width(obj.pkg_len).ok_or(AmlError::InvalidPkgLength)?;
                }
                Ok(size)
            }
            AmlNode::Data(data) => Ok(data.buffer.len()),
        }
    }

    /// Encoded size of the subtree rooted at `node`.
    ///
    /// For the Root node this is the size of the AML code, without the
    /// 36-byte table header.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `node` is not a live node.
    pub fn compute_size(&self, node: NodeId) -> Result<usize, AmlError> {
        let mut total = 0;
        let mut stack = Vec::new();
        stack.push(node);
        while let Some(id) = stack.pop() {
            total += self.own_size(id)?;
            match self.node(id) {
                Some(AmlNode::Root(root)) => stack.extend_from_slice(&root.variable_args),
                Some(AmlNode::Object(obj)) => {
                    stack.extend(obj.fixed_args.iter().flatten().copied());
                    stack.extend_from_slice(&obj.variable_args);
                }
                _ => {}
            }
        }
        Ok(total)
    }

    /// Propagate a size change of `delta` bytes from `node` to the top of
    /// its tree.
    ///
    /// `node` and each of its ancestors with a PkgLength get their PkgLength
    /// re-derived; the Root absorbs the final delta into its table length.
    /// If `node` is a Package, its NumElements is adjusted by
    /// `node_count_delta`.
    ///
    /// The whole walk is validated before anything is written, so a failure
    /// leaves the tree unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidPkgLength`] if a package would outgrow the
    /// PkgLength encoding, or [`AmlError::InvalidParameter`] if a size or
    /// element count would become negative or overflow.
    pub fn propagate_information(
        &mut self,
        node: NodeId,
        delta: isize,
        node_count_delta: i32,
    ) -> Result<(), AmlError> {
        self.walk_propagation(node, delta, node_count_delta, false)?;
        self.walk_propagation(node, delta, node_count_delta, true)?;
        if delta != 0 {
            log::trace!("aml: propagated {delta:+} bytes from {node:?}");
        }
        Ok(())
    }

    fn walk_propagation(
        &mut self,
        node: NodeId,
        delta: isize,
        node_count_delta: i32,
        apply: bool,
    ) -> Result<(), AmlError> {
        if node_count_delta != 0 {
            self.update_element_count(node, node_count_delta, apply)?;
        }

        let mut delta = delta;
        let mut current = Some(node);
        while let Some(id) = current {
            if delta == 0 {
                break;
            }
            match self.node_mut(id).ok_or(AmlError::InvalidParameter)? {
                AmlNode::Root(root) => {
                    let length = isize::try_from(root.header.length)
                        .map_err(|_| AmlError::InvalidParameter)?;
                    let length = u32::try_from(length + delta)
                        .map_err(|_| AmlError::InvalidParameter)?;
                    if apply {
                        root.header.length = length;
                    }
                    break;
                }
                AmlNode::Object(obj) if obj.has_attribute(EncodingAttributes::HAS_PKG_LENGTH) => {
                    let old_width =
                        pkg_len::width(obj.pkg_len).ok_or(AmlError::InvalidPkgLength)?;
                    let payload = pkg_len::payload(obj.pkg_len) as isize + delta;
                    let payload =
                        usize::try_from(payload).map_err(|_| AmlError::InvalidParameter)?;
                    let new_pkg_len = pkg_len::from_payload(payload)?;
                    let new_width =
                        pkg_len::width(new_pkg_len).ok_or(AmlError::InvalidPkgLength)?;
                    if apply {
                        obj.pkg_len = new_pkg_len;
                    }
                    delta += new_width as isize - old_width as isize;
                }
                _ => {}
            }
            current = self.parent(id);
        }
        Ok(())
    }

    /// Adjust the NumElements byte of a Package by `count`.
    fn update_element_count(
        &mut self,
        node: NodeId,
        count: i32,
        apply: bool,
    ) -> Result<(), AmlError> {
        let Ok(obj) = self.object(node) else {
            return Ok(());
        };
        if !obj.is_op(PACKAGE_OP, 0) {
            return Ok(());
        }
        let Some(num_elements) = obj.fixed_args[0] else {
            return Ok(());
        };

        let data = self.data_mut(num_elements)?;
        let current = i32::from(*data.buffer.first().ok_or(AmlError::InvalidParameter)?);
        let updated = u8::try_from(current + count).map_err(|_| AmlError::InvalidParameter)?;
        if apply {
            data.buffer[0] = updated;
        }
        Ok(())
    }
}
