//! Building AML trees from scratch.
//!
//! Each `code_gen_*` helper builds a detached subtree and, if a parent is
//! given, appends it to that parent's variable argument list. On failure
//! the partially built subtree is freed.

use alloc::vec::Vec;

use zerocopy::IntoBytes;

use crate::encoding::{
    self, AmlByteEncoding, BUFFER, DEVICE, METHOD, NAME_ENC, ONE, RETURN, SCOPE, STRING, ZERO,
};
use crate::name::AmlNameString;
use crate::node::{AmlDataType, NodeId};
use crate::resource;
use crate::sdt::SdtHeader;
use crate::tree::AmlTree;
use crate::AmlError;

impl AmlTree {
    /// Create an empty definition block.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `signature` is neither
    /// `DSDT` nor `SSDT`.
    pub fn code_gen_definition_block(
        signature: [u8; 4],
        oem_id: [u8; 6],
        oem_table_id: [u8; 8],
        oem_revision: u32,
    ) -> Result<Self, AmlError> {
        Self::new(SdtHeader {
            signature,
            length: 0,
            revision: 2,
            checksum: 0,
            oem_id,
            oem_table_id,
            oem_revision,
            creator_id: u32::from_le_bytes(*b"HDRN"),
            creator_revision: 1,
        })
    }

    /// Run `build` on a fresh subtree; free it if anything fails, including
    /// the final attach to `parent`.
    fn build_subtree(
        &mut self,
        top: NodeId,
        parent: Option<NodeId>,
        build: impl FnOnce(&mut Self, NodeId) -> Result<(), AmlError>,
    ) -> Result<NodeId, AmlError> {
        let result = build(self, top).and_then(|()| match parent {
            Some(parent) => self.append_variable_argument(parent, top),
            None => Ok(()),
        });
        match result {
            Ok(()) => Ok(top),
            Err(err) => {
                self.delete_tree(top)?;
                Err(err)
            }
        }
    }

    fn code_gen_named_object(
        &mut self,
        encoding: &'static AmlByteEncoding,
        name: &str,
        parent: Option<NodeId>,
        build: impl FnOnce(&mut Self, NodeId) -> Result<(), AmlError>,
    ) -> Result<NodeId, AmlError> {
        let name = AmlNameString::from_asl(name)?.to_aml_bytes()?;
        let node = self.create_object_node(encoding)?;
        self.build_subtree(node, parent, |tree, node| {
            let name = tree.create_data_node(AmlDataType::NameString, &name)?;
            tree.set_fixed_argument(node, usize::from(encoding.name_index), name)?;
            build(tree, node)
        })
    }

    /// `Scope (name) {}`.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] for a malformed name or a
    /// parent that cannot hold a scope.
    pub fn code_gen_scope(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
    ) -> Result<NodeId, AmlError> {
        self.code_gen_named_object(&SCOPE, name, parent, |_, _| Ok(()))
    }

    /// `Device (name) {}`.
    ///
    /// # Errors
    ///
    /// See [`code_gen_scope`](Self::code_gen_scope).
    pub fn code_gen_device(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
    ) -> Result<NodeId, AmlError> {
        self.code_gen_named_object(&DEVICE, name, parent, |_, _| Ok(()))
    }

    /// Integer literal using Zero, One or the smallest sized prefix.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::OutOfResources`] if the arena cannot grow.
    pub fn code_gen_integer(&mut self, value: u64) -> Result<NodeId, AmlError> {
        match value {
            0 => self.create_object_node(&ZERO),
            1 => self.create_object_node(&ONE),
            _ => {
                let enc = encoding::integer_encoding_for(value);
                let width = enc.formats[0]
                    .integer_width()
                    .ok_or(AmlError::InvalidParameter)?;
                let node = self.create_object_node(enc)?;
                self.build_subtree(node, None, |tree, node| {
                    let bytes = value.to_le_bytes();
                    let data = tree.create_data_node(AmlDataType::UInt, &bytes[..width])?;
                    tree.set_fixed_argument(node, 0, data)
                })
            }
        }
    }

    /// String literal.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `value` holds a character
    /// outside `0x01..=0x7F`.
    pub fn code_gen_string(&mut self, value: &str) -> Result<NodeId, AmlError> {
        if !value.bytes().all(|b| (0x01..=0x7F).contains(&b)) {
            return Err(AmlError::InvalidParameter);
        }
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(value.len() + 1)
            .map_err(|_| AmlError::OutOfResources)?;
        bytes.extend_from_slice(value.as_bytes());
        bytes.push(0);

        let node = self.create_object_node(&STRING)?;
        self.build_subtree(node, None, |tree, node| {
            let data = tree.create_data_node(AmlDataType::String, &bytes)?;
            tree.set_fixed_argument(node, 0, data)
        })
    }

    fn code_gen_name(
        &mut self,
        name: &str,
        value: NodeId,
        parent: Option<NodeId>,
    ) -> Result<NodeId, AmlError> {
        let result = self.code_gen_named_object(&NAME_ENC, name, parent, |tree, node| {
            tree.set_fixed_argument(node, 1, value)
        });
        if result.is_err() && self.is_valid(value) && self.parent(value).is_none() {
            self.delete_tree(value)?;
        }
        result
    }

    /// `Name (name, value)` with an integer value.
    ///
    /// # Errors
    ///
    /// See [`code_gen_scope`](Self::code_gen_scope).
    pub fn code_gen_name_integer(
        &mut self,
        name: &str,
        value: u64,
        parent: Option<NodeId>,
    ) -> Result<NodeId, AmlError> {
        let value = self.code_gen_integer(value)?;
        self.code_gen_name(name, value, parent)
    }

    /// `Name (name, "value")`.
    ///
    /// # Errors
    ///
    /// See [`code_gen_scope`](Self::code_gen_scope) and
    /// [`code_gen_string`](Self::code_gen_string).
    pub fn code_gen_name_string(
        &mut self,
        name: &str,
        value: &str,
        parent: Option<NodeId>,
    ) -> Result<NodeId, AmlError> {
        let value = self.code_gen_string(value)?;
        self.code_gen_name(name, value, parent)
    }

    /// `Name (name, ResourceTemplate () {})`: a Buffer holding only an End
    /// Tag. Descriptors are added with [`append_rd_node`](Self::append_rd_node)
    /// or the `code_gen_rd_*` helpers.
    ///
    /// # Errors
    ///
    /// See [`code_gen_scope`](Self::code_gen_scope).
    pub fn code_gen_name_resource_template(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
    ) -> Result<NodeId, AmlError> {
        let buffer = self.create_object_node(&BUFFER)?;
        self.build_subtree(buffer, None, |tree, buffer| {
            let size = tree.code_gen_integer(resource::END_TAG_SIZE as u64)?;
            tree.set_fixed_argument(buffer, 0, size)?;
            let end = tree.create_data_node(AmlDataType::ResourceData, &resource::end_tag())?;
            tree.append_variable_argument(buffer, end)
        })?;
        self.code_gen_name(name, buffer, parent)
    }

    /// `Method (name, arg_count) { Return (value) }`.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `arg_count` exceeds 7 or the
    /// name is malformed.
    pub fn code_gen_method_ret_integer(
        &mut self,
        name: &str,
        arg_count: u8,
        value: u64,
        parent: Option<NodeId>,
    ) -> Result<NodeId, AmlError> {
        if arg_count > 7 {
            return Err(AmlError::InvalidParameter);
        }
        self.code_gen_named_object(&METHOD, name, parent, |tree, method| {
            // NotSerialized, SyncLevel 0.
            let flags = tree.create_data_node(AmlDataType::UInt, &[arg_count])?;
            tree.set_fixed_argument(method, 1, flags)?;

            let ret = tree.create_object_node(&RETURN)?;
            tree.build_subtree(ret, Some(method), |tree, ret| {
                let value = tree.code_gen_integer(value)?;
                tree.set_fixed_argument(ret, 0, value)
            })?;
            Ok(())
        })
    }

    /// Insert the resource data node `rd` before the End Tag of the
    /// resource template held by the NameOp `name`.
    ///
    /// The Buffer's size operand is updated and the End Tag checksum is
    /// reset to zero, which marks the template as valid without checksum.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `name` does not hold a
    /// resource template ending with an End Tag, or `rd` is not a detached
    /// resource data node.
    pub fn append_rd_node(&mut self, name: NodeId, rd: NodeId) -> Result<(), AmlError> {
        if self.node_data_type(rd)? != AmlDataType::ResourceData {
            return Err(AmlError::InvalidParameter);
        }
        let buffer = self.resource_template_buffer(name)?;
        let end = self
            .previous_variable_argument(buffer, None)
            .ok_or(AmlError::InvalidParameter)?;
        if self.resource_data_descriptor_id(end)? != resource::SMALL_END_TAG_ID {
            return Err(AmlError::InvalidParameter);
        }
        let size_node = self
            .fixed_argument(buffer, 0)
            .filter(|&size| self.is_updatable_integer(size))
            .ok_or(AmlError::InvalidParameter)?;

        self.insert_variable_argument_before(buffer, end, rd)?;
        if let Err(err) = self.resize_template(buffer, size_node, end) {
            self.detach_node(rd)?;
            return Err(err);
        }
        Ok(())
    }

    /// Set the BufferSize operand to the byte list length and clear the End
    /// Tag checksum.
    fn resize_template(
        &mut self,
        buffer: NodeId,
        size_node: NodeId,
        end: NodeId,
    ) -> Result<(), AmlError> {
        let mut byte_list = 0;
        let mut current = self.next_variable_argument(buffer, None);
        while let Some(id) = current {
            byte_list += self.data(id)?.buffer.len();
            current = self.next_variable_argument(buffer, Some(id));
        }
        self.update_integer(size_node, byte_list as u64)?;
        self.update_data_node(end, AmlDataType::ResourceData, &resource::end_tag())?;
        log::trace!("aml: resource template {buffer:?} now holds {byte_list} bytes");
        Ok(())
    }

    fn code_gen_rd(&mut self, name: NodeId, bytes: &[u8]) -> Result<NodeId, AmlError> {
        let rd = self.create_data_node(AmlDataType::ResourceData, bytes)?;
        if let Err(err) = self.append_rd_node(name, rd) {
            if self.parent(rd).is_none() {
                self.delete_tree(rd)?;
            }
            return Err(err);
        }
        Ok(rd)
    }

    /// Append a `QWordMemory` descriptor covering `[base, base + length)` to
    /// the resource template of `name`.
    ///
    /// # Errors
    ///
    /// See [`append_rd_node`](Self::append_rd_node).
    pub fn code_gen_rd_qword_memory(
        &mut self,
        name: NodeId,
        base: u64,
        length: u64,
    ) -> Result<NodeId, AmlError> {
        self.code_gen_rd(name, resource::qword_memory(base, length).as_bytes())
    }

    /// Append an extended `Interrupt` descriptor for `irq` to the resource
    /// template of `name`.
    ///
    /// # Errors
    ///
    /// See [`append_rd_node`](Self::append_rd_node).
    pub fn code_gen_rd_interrupt(&mut self, name: NodeId, irq: u32) -> Result<NodeId, AmlError> {
        self.code_gen_rd(name, resource::extended_interrupt(irq).as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::AcpiResource;
    use crate::test_util::{empty_ssdt, sample_ssdt};

    #[test]
    fn definition_block_header() {
        let tree =
            AmlTree::code_gen_definition_block(*b"SSDT", *b"HADRON", *b"SERIAL  ", 3).unwrap();
        let header = tree.root_node_info(tree.root()).unwrap();
        assert_eq!(header.length, 36);
        assert_eq!(header.oem_revision, 3);
        assert!(
            AmlTree::code_gen_definition_block(*b"FACP", *b"HADRON", *b"SERIAL  ", 3).is_err()
        );
    }

    #[test]
    fn integer_literals() {
        let mut tree = empty_ssdt();
        for (value, expected) in [
            (0u64, &[0x00][..]),
            (1, &[0x01][..]),
            (0x0F, &[0x0A, 0x0F][..]),
            (0x1_0000, &[0x0C, 0x00, 0x00, 0x01, 0x00][..]),
        ] {
            let node = tree.code_gen_integer(value).unwrap();
            assert_eq!(tree.serialize_node(node).unwrap(), expected);
            assert_eq!(tree.integer_value(node), Ok(value));
        }
        assert_eq!(tree.code_gen_string("caf\u{e9}"), Err(AmlError::InvalidParameter));
    }

    #[test]
    fn scope_and_device_encoding() {
        let mut tree = empty_ssdt();
        let root = tree.root();
        let scope = tree.code_gen_scope("\\_SB", Some(root)).unwrap();
        tree.code_gen_device("COM0", Some(scope)).unwrap();
        assert_eq!(
            tree.serialize_node(scope).unwrap(),
            [
                0x10, 0x0D, b'\\', b'_', b'S', b'B', b'_', // Scope (\_SB_)
                0x5B, 0x82, 0x05, b'C', b'O', b'M', b'0', // Device (COM0)
            ]
        );
        assert_eq!(tree.root_node_info(root).unwrap().length, 36 + 14);
    }

    #[test]
    fn method_returning_integer() {
        let mut tree = empty_ssdt();
        let method = tree.code_gen_method_ret_integer("_STA", 0, 0x0F, None).unwrap();
        assert_eq!(
            tree.serialize_node(method).unwrap(),
            [0x14, 0x09, b'_', b'S', b'T', b'A', 0x00, 0xA4, 0x0A, 0x0F]
        );
        assert_eq!(
            tree.code_gen_method_ret_integer("_STA", 8, 0, None),
            Err(AmlError::InvalidParameter)
        );
    }

    #[test]
    fn resource_template_grows_before_end_tag() {
        let tree = sample_ssdt();
        let crs = tree.find_node(tree.root(), "\\_SB_.COM0._CRS").unwrap();
        let buffer = tree.name_op_value(crs).unwrap();
        let size = tree.fixed_argument(buffer, 0).unwrap();
        assert_eq!(
            tree.integer_value(size),
            Ok((resource::QWORD_ADDRESS_SIZE + resource::EXTENDED_IRQ_SIZE + 2) as u64)
        );

        let first = tree.name_op_get_first_rd_node(crs).unwrap().unwrap();
        assert_eq!(
            resource::decode(tree.data_node_bytes(first).unwrap()),
            Some(AcpiResource::Memory64 {
                base: 0x1000_0000,
                max: 0x1000_0FFF,
                length: 0x1000,
                writable: true,
            })
        );
        let second = tree.name_op_get_next_rd_node(first).unwrap().unwrap();
        assert_eq!(
            tree.resource_data_descriptor_id(second),
            Ok(resource::LARGE_EXTENDED_IRQ_ID)
        );
        assert_eq!(tree.name_op_get_next_rd_node(second), Ok(None));

        let last = tree.previous_variable_argument(buffer, None).unwrap();
        assert_eq!(tree.data_node_bytes(last).unwrap(), &resource::end_tag());
    }

    #[test]
    fn append_rd_leaves_unsized_template_untouched() {
        // Name (RES0, Buffer (SIZE) { EndTag }): the size is a name, not an
        // integer literal.
        let mut tree = empty_ssdt();
        let root = tree.root();
        let buffer = tree.create_object_node(&BUFFER).unwrap();
        let size = tree.create_data_node(AmlDataType::NameString, b"SIZE").unwrap();
        tree.set_fixed_argument(buffer, 0, size).unwrap();
        let end = tree
            .create_data_node(AmlDataType::ResourceData, &resource::end_tag())
            .unwrap();
        tree.append_variable_argument(buffer, end).unwrap();
        let name = tree.code_gen_name("RES0", buffer, Some(root)).unwrap();

        let before = tree.serialize_definition_block().unwrap();
        let nodes = tree.node_count();
        assert_eq!(
            tree.code_gen_rd_interrupt(name, 5),
            Err(AmlError::InvalidParameter)
        );
        assert_eq!(tree.serialize_definition_block().unwrap(), before);
        assert_eq!(tree.node_count(), nodes);

        let irq = resource::extended_interrupt(5);
        let rd = tree
            .create_data_node(AmlDataType::ResourceData, irq.as_bytes())
            .unwrap();
        assert_eq!(tree.append_rd_node(name, rd), Err(AmlError::InvalidParameter));
        assert_eq!(tree.parent(rd), None);
        assert_eq!(tree.previous_variable_argument(buffer, None), Some(end));
        assert_eq!(tree.serialize_definition_block().unwrap(), before);
    }

    #[test]
    fn append_rd_requires_template() {
        let mut tree = empty_ssdt();
        let root = tree.root();
        let uid = tree.code_gen_name_integer("_UID", 0, Some(root)).unwrap();
        let before = tree.node_count();
        assert_eq!(
            tree.code_gen_rd_interrupt(uid, 5),
            Err(AmlError::InvalidParameter)
        );
        // The rejected descriptor was freed.
        assert_eq!(tree.node_count(), before);
    }
}
