//! Node inspection and in-place mutation.
//!
//! Accessors check the node kind and return [`AmlError::InvalidParameter`]
//! when called on the wrong one. Mutators validate everything first, then
//! propagate the size change, and only then write into the node, so a
//! failure never leaves a half-updated tree behind.

use alloc::vec::Vec;

use crate::encoding::{
    self, AmlParseFormat, EncodingAttributes, FIELD_NAMED_OP, ONES_OP, ONE_OP, STRING_PREFIX,
    ZERO_OP,
};
use crate::name::name_string_size;
use crate::node::{AmlDataType, AmlNode, AmlNodeType, NodeId};
use crate::resource;
use crate::sdt::SdtHeader;
use crate::tree::AmlTree;
use crate::AmlError;

/// Opcode-level information about an Object node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectNodeInfo {
    /// Opcode byte ([`EXT_OP_PREFIX`](crate::encoding::EXT_OP_PREFIX) for
    /// extended opcodes).
    pub op_code: u8,
    /// Second byte of extended opcodes, 0 otherwise.
    pub sub_op_code: u8,
    /// PkgLength value, 0 if the opcode has none.
    pub pkg_len: u32,
    /// The object declares a name in the namespace.
    pub is_namespace_node: bool,
}

impl AmlTree {
    /// Kind of `node`, or [`AmlNodeType::Unknown`] for a stale or foreign
    /// handle.
    #[must_use]
    pub fn node_type(&self, node: NodeId) -> AmlNodeType {
        match self.node(node) {
            Some(n) => n.node_type(),
            None => {
                log::debug!("aml: node type requested for invalid handle {node:?}");
                AmlNodeType::Unknown
            }
        }
    }

    /// Copy of the table header held by the Root node.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `node` is not a Root node.
    pub fn root_node_info(&self, node: NodeId) -> Result<SdtHeader, AmlError> {
        Ok(self.root_node(node)?.header)
    }

    /// Opcode, sub-opcode, PkgLength and namespace flag of an Object node.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `node` is not an Object node.
    pub fn object_node_info(&self, node: NodeId) -> Result<ObjectNodeInfo, AmlError> {
        let obj = self.object(node)?;
        let has_pkg_len = obj.has_attribute(EncodingAttributes::HAS_PKG_LENGTH);
        Ok(ObjectNodeInfo {
            op_code: obj.encoding.op_code,
            sub_op_code: obj.encoding.sub_op_code,
            pkg_len: if has_pkg_len { obj.pkg_len } else { 0 },
            is_namespace_node: obj.has_attribute(EncodingAttributes::IN_NAMESPACE),
        })
    }

    /// Number of fixed arguments of `node`; 0 for anything but an Object.
    #[must_use]
    pub fn fixed_argument_count(&self, node: NodeId) -> usize {
        self.object(node).map_or(0, |obj| obj.fixed_arg_count())
    }

    /// Data type of a Data node.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `node` is not a Data node.
    pub fn node_data_type(&self, node: NodeId) -> Result<AmlDataType, AmlError> {
        Ok(self.data(node)?.data_type)
    }

    /// Descriptor id of a resource data node.
    ///
    /// Small descriptors report their item name bits (`byte0 & 0x78`), large
    /// ones their full tag byte.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `node` is not a
    /// [`AmlDataType::ResourceData`] node.
    pub fn resource_data_descriptor_id(&self, node: NodeId) -> Result<u8, AmlError> {
        let data = self.data(node)?;
        if data.data_type != AmlDataType::ResourceData {
            return Err(AmlError::InvalidParameter);
        }
        resource::descriptor_id(&data.buffer).ok_or(AmlError::InvalidParameter)
    }

    /// Two-phase copy of a Data node's buffer.
    ///
    /// On entry `size` is the capacity the caller offers. On exit it always
    /// holds the real buffer size. The bytes are copied only when `buffer`
    /// is given and the offered capacity is large enough, so passing `None`
    /// queries the size.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `node` is not a Data node.
    pub fn data_node_buffer(
        &self,
        node: NodeId,
        buffer: Option<&mut [u8]>,
        size: &mut usize,
    ) -> Result<(), AmlError> {
        let data = self.data(node)?;
        let len = data.buffer.len();
        if let Some(out) = buffer {
            if *size >= len && out.len() >= len {
                out[..len].copy_from_slice(&data.buffer);
            }
        }
        *size = len;
        Ok(())
    }

    /// Borrow a Data node's bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `node` is not a Data node.
    pub fn data_node_bytes(&self, node: NodeId) -> Result<&[u8], AmlError> {
        Ok(&self.data(node)?.buffer)
    }

    /// Replace the Root's header fields with those of `header`.
    ///
    /// The length is not copied: it is recomputed from the tree.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `node` is not the Root or
    /// the signature is neither `DSDT` nor `SSDT`.
    pub fn update_root_node(&mut self, node: NodeId, header: &SdtHeader) -> Result<(), AmlError> {
        self.root_node(node)?;
        if !header.is_definition_block() {
            return Err(AmlError::InvalidParameter);
        }
        let size = self.compute_size(node)?;
        let length = u32::try_from(size + SdtHeader::SIZE).map_err(|_| AmlError::InvalidParameter)?;

        let root = self.root_node_mut(node)?;
        root.header = SdtHeader { length, ..*header };
        log::debug!("aml: root header updated, table length {length}");
        Ok(())
    }

    /// Set the value of an integer literal node.
    ///
    /// Zero and One nodes become sized integers. The node is re-encoded with
    /// the smallest of Byte, Word, DWord and QWord able to hold `value`, and
    /// the size difference is propagated.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `node` is not an integer
    /// literal or is a Ones node. Propagation failures are returned as-is
    /// and leave the node unchanged.
    pub fn update_integer(&mut self, node: NodeId, value: u64) -> Result<(), AmlError> {
        if !self.is_updatable_integer(node) {
            return Err(AmlError::InvalidParameter);
        }
        let obj = self.object(node)?;
        let is_integer = encoding::is_integer_encoding(obj.encoding);

        let new_enc = encoding::integer_encoding_for(value);
        let new_width = new_enc.formats[0]
            .integer_width()
            .ok_or(AmlError::InvalidParameter)?;
        let bytes = value.to_le_bytes();
        let existing = if is_integer { obj.fixed_args[0] } else { None };

        let old_width = match existing {
            Some(data) => self.data(data)?.buffer.len(),
            None => 0,
        };
        let delta = new_width as isize - old_width as isize;

        // Prepare every allocation before anything observable changes.
        let data = match existing {
            Some(data) => {
                let buffer = &mut self.data_mut(data)?.buffer;
                buffer
                    .try_reserve_exact(new_width.saturating_sub(buffer.len()))
                    .map_err(|_| AmlError::OutOfResources)?;
                data
            }
            None => self.create_data_node(AmlDataType::UInt, &bytes[..new_width])?,
        };

        if delta != 0 {
            if let Err(err) = self.propagate_information(node, delta, 0) {
                if existing.is_none() {
                    self.delete_tree(data)?;
                }
                return Err(err);
            }
        }

        let buffer = &mut self.data_mut(data)?.buffer;
        buffer.clear();
        buffer.extend_from_slice(&bytes[..new_width]);
        self.object_mut(node)?.encoding = new_enc;
        if existing.is_none() {
            self.link_fixed(node, 0, data)?;
        }
        log::trace!("aml: integer {node:?} set to {value:#x} ({delta:+} bytes)");
        Ok(())
    }

    /// `true` for integer literal objects [`update_integer`](Self::update_integer)
    /// accepts: sized integers, Zero and One.
    pub(crate) fn is_updatable_integer(&self, node: NodeId) -> bool {
        self.object(node).is_ok_and(|obj| {
            let enc = obj.encoding;
            (encoding::is_integer_encoding(enc) || encoding::is_special_integer_encoding(enc))
                && enc.op_code != ONES_OP
        })
    }

    /// Replace the contents of a Data node.
    ///
    /// `data_type` must be the node's current type, except that Raw and
    /// ResourceData may be swapped for one another. The bytes are checked
    /// against the type before anything is changed.
    ///
    /// # Errors
    ///
    /// - [`AmlError::InvalidParameter`] if `node` is not a Data node, `bytes`
    ///   is empty or malformed for `data_type`, or the parent cannot hold it.
    /// - [`AmlError::Unsupported`] if the type change is not allowed or a
    ///   fixed-width integer operand would change size.
    /// - Propagation failures, returned as-is with the node unchanged.
    pub fn update_data_node(
        &mut self,
        node: NodeId,
        data_type: AmlDataType,
        bytes: &[u8],
    ) -> Result<(), AmlError> {
        let current = self.data(node)?;
        if bytes.is_empty() {
            return Err(AmlError::InvalidParameter);
        }
        let old_type = current.data_type;
        if old_type != data_type && !(old_type.is_byte_list() && data_type.is_byte_list()) {
            return Err(AmlError::Unsupported);
        }
        let old_len = current.buffer.len();

        self.validate_data_update(node, data_type, bytes, old_len)?;

        let delta = bytes.len() as isize - old_len as isize;
        if delta == 0 {
            let data = self.data_mut(node)?;
            data.buffer.copy_from_slice(bytes);
            data.data_type = data_type;
            return Ok(());
        }

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(bytes.len())
            .map_err(|_| AmlError::OutOfResources)?;
        buffer.extend_from_slice(bytes);

        self.propagate_information(node, delta, 0)?;

        let data = self.data_mut(node)?;
        data.buffer = buffer;
        data.data_type = data_type;
        log::trace!("aml: data {node:?} replaced ({delta:+} bytes)");
        Ok(())
    }

    fn validate_data_update(
        &self,
        node: NodeId,
        data_type: AmlDataType,
        bytes: &[u8],
        old_len: usize,
    ) -> Result<(), AmlError> {
        let parent_attributes = || {
            self.parent(node)
                .and_then(|p| self.object(p).ok())
                .map(|obj| obj.encoding.attributes)
        };

        match data_type {
            AmlDataType::NameString => {
                if name_string_size(bytes) != Some(bytes.len()) {
                    return Err(AmlError::InvalidParameter);
                }
            }
            AmlDataType::String => {
                let (last, body) = bytes.split_last().ok_or(AmlError::InvalidParameter)?;
                if *last != 0 || !body.iter().all(|b| (0x01..=0x7F).contains(b)) {
                    return Err(AmlError::InvalidParameter);
                }
            }
            AmlDataType::UInt => {
                if let Some(index) = self.fixed_argument_index(node) {
                    let parent = self.parent(node).ok_or(AmlError::InvalidParameter)?;
                    let format = self.object(parent)?.encoding.formats[index];
                    if format != AmlParseFormat::Object && bytes.len() != old_len {
                        return Err(AmlError::Unsupported);
                    }
                }
            }
            AmlDataType::Raw => {
                let attrs = parent_attributes().ok_or(AmlError::InvalidParameter)?;
                if !attrs.contains(EncodingAttributes::HAS_BYTE_LIST) {
                    return Err(AmlError::InvalidParameter);
                }
            }
            AmlDataType::ResourceData => {
                let attrs = parent_attributes().ok_or(AmlError::InvalidParameter)?;
                if !attrs.contains(EncodingAttributes::HAS_BYTE_LIST) {
                    return Err(AmlError::InvalidParameter);
                }
                if resource::is_large(bytes[0]) && bytes.len() < resource::LARGE_HEADER_SIZE {
                    return Err(AmlError::InvalidParameter);
                }
                if resource::descriptor_size(bytes) != Some(bytes.len()) {
                    return Err(AmlError::InvalidParameter);
                }
            }
            AmlDataType::FieldPkgLen => {
                let parent = self.parent(node).ok_or(AmlError::InvalidParameter)?;
                let obj = self.object(parent)?;
                if !(obj.encoding.is_field_element() && obj.encoding.op_code == FIELD_NAMED_OP) {
                    return Err(AmlError::InvalidParameter);
                }
            }
        }
        Ok(())
    }

    /// Value of an integer literal (Zero, One, Ones, Byte..QWord) or of a
    /// UInt Data node.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] for any other node.
    pub fn integer_value(&self, node: NodeId) -> Result<u64, AmlError> {
        let data = match self.node(node).ok_or(AmlError::InvalidParameter)? {
            AmlNode::Object(obj) => match obj.encoding.op_code {
                _ if obj.encoding.is_field_element() => return Err(AmlError::InvalidParameter),
                ZERO_OP => return Ok(0),
                ONE_OP => return Ok(1),
                ONES_OP => return Ok(u64::MAX),
                _ if encoding::is_integer_encoding(obj.encoding) => {
                    self.data(obj.fixed_args[0].ok_or(AmlError::InvalidParameter)?)?
                }
                _ => return Err(AmlError::InvalidParameter),
            },
            AmlNode::Data(data) if data.data_type == AmlDataType::UInt => data,
            _ => return Err(AmlError::InvalidParameter),
        };
        if data.buffer.len() > 8 {
            return Err(AmlError::InvalidParameter);
        }
        let mut bytes = [0u8; 8];
        bytes[..data.buffer.len()].copy_from_slice(&data.buffer);
        Ok(u64::from_le_bytes(bytes))
    }

    /// Text of a String literal object or a String Data node, without the
    /// terminating null.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] for any other node or a string
    /// that is not ASCII.
    pub fn string_value(&self, node: NodeId) -> Result<&str, AmlError> {
        let data = match self.node(node).ok_or(AmlError::InvalidParameter)? {
            AmlNode::Object(obj) if obj.is_op(STRING_PREFIX, 0) => {
                self.data(obj.fixed_args[0].ok_or(AmlError::InvalidParameter)?)?
            }
            AmlNode::Data(data) if data.data_type == AmlDataType::String => data,
            _ => return Err(AmlError::InvalidParameter),
        };
        let text = data.buffer.strip_suffix(&[0]).unwrap_or(&data.buffer);
        core::str::from_utf8(text).map_err(|_| AmlError::InvalidParameter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{BUFFER, BYTE, NAME_ENC, ONE, ONES, PACKAGE, STRING};
    use crate::test_util::{empty_ssdt, sample_ssdt, ssdt_header};

    fn table_length(tree: &AmlTree) -> usize {
        tree.root_node_info(tree.root()).unwrap().length as usize
    }

    fn assert_consistent(tree: &AmlTree) {
        assert_eq!(
            table_length(tree),
            SdtHeader::SIZE + tree.compute_size(tree.root()).unwrap()
        );
    }

    /// Build `Name (NAME, <literal>)` under the Root and return the literal.
    fn name_with(tree: &mut AmlTree, literal: NodeId) -> NodeId {
        let root = tree.root();
        let name = tree.create_object_node(&NAME_ENC).unwrap();
        let seg = tree.create_data_node(AmlDataType::NameString, b"VALU").unwrap();
        tree.set_fixed_argument(name, 0, seg).unwrap();
        tree.set_fixed_argument(name, 1, literal).unwrap();
        tree.append_variable_argument(root, name).unwrap();
        literal
    }

    #[test]
    fn inspection_checks_node_kind() {
        let tree = sample_ssdt();
        let root = tree.root();
        assert_eq!(tree.node_type(root), AmlNodeType::Root);
        assert_eq!(tree.root_node_info(root).unwrap().oem_id, *b"HADRON");

        let scope = tree.next_node(root).unwrap();
        let info = tree.object_node_info(scope).unwrap();
        assert_eq!(info.op_code, crate::encoding::SCOPE_OP);
        assert!(info.is_namespace_node);
        assert_ne!(info.pkg_len, 0);
        assert_eq!(tree.fixed_argument_count(scope), 1);
        assert_eq!(tree.fixed_argument_count(root), 0);

        assert_eq!(tree.root_node_info(scope), Err(AmlError::InvalidParameter));
        assert_eq!(tree.node_data_type(scope), Err(AmlError::InvalidParameter));
        assert_eq!(tree.object_node_info(root), Err(AmlError::InvalidParameter));

        let scope_name = tree.fixed_argument(scope, 0).unwrap();
        assert_eq!(tree.node_data_type(scope_name), Ok(AmlDataType::NameString));
        assert_eq!(
            tree.resource_data_descriptor_id(scope_name),
            Err(AmlError::InvalidParameter)
        );
    }

    #[test]
    fn pkg_len_is_zero_without_package() {
        let mut tree = empty_ssdt();
        let byte = tree.create_object_node(&BYTE).unwrap();
        assert_eq!(tree.object_node_info(byte).unwrap().pkg_len, 0);
        assert!(!tree.object_node_info(byte).unwrap().is_namespace_node);
    }

    #[test]
    fn data_buffer_two_phase_copy() {
        let mut tree = empty_ssdt();
        let node = tree.create_data_node(AmlDataType::Raw, &[1, 2, 3]).unwrap();

        let mut size = 0;
        tree.data_node_buffer(node, None, &mut size).unwrap();
        assert_eq!(size, 3);

        // Too small: size reported, nothing copied.
        let mut small = [0u8; 2];
        let mut size = small.len();
        tree.data_node_buffer(node, Some(&mut small), &mut size).unwrap();
        assert_eq!(size, 3);
        assert_eq!(small, [0, 0]);

        let mut out = [0u8; 4];
        let mut size = out.len();
        tree.data_node_buffer(node, Some(&mut out), &mut size).unwrap();
        assert_eq!(size, 3);
        assert_eq!(out, [1, 2, 3, 0]);
    }

    #[test]
    fn update_root_node_recomputes_length() {
        let mut tree = sample_ssdt();
        let root = tree.root();
        let mut header = ssdt_header();
        header.oem_table_id = *b"SERIAL  ";
        header.length = 1;
        header.signature = *b"DSDT";
        tree.update_root_node(root, &header).unwrap();

        let info = tree.root_node_info(root).unwrap();
        assert_eq!(info.oem_table_id, *b"SERIAL  ");
        assert_eq!(&info.signature, b"DSDT");
        assert_consistent(&tree);

        header.signature = *b"APIC";
        assert_eq!(
            tree.update_root_node(root, &header),
            Err(AmlError::InvalidParameter)
        );
        let scope = tree.next_node(root).unwrap();
        assert_eq!(
            tree.update_root_node(scope, &ssdt_header()),
            Err(AmlError::InvalidParameter)
        );
    }

    #[test]
    fn integer_width_renegotiation() {
        let mut tree = empty_ssdt();
        let literal = tree.create_object_node(&BYTE).unwrap();
        let byte = tree.create_data_node(AmlDataType::UInt, &[5]).unwrap();
        tree.set_fixed_argument(literal, 0, byte).unwrap();
        let literal = name_with(&mut tree, literal);
        let before = table_length(&tree);

        // Still fits a byte: no size change.
        tree.update_integer(literal, 0x7F).unwrap();
        assert_eq!(table_length(&tree), before);
        assert_eq!(tree.integer_value(literal), Ok(0x7F));

        // Needs a DWord: 4 bytes instead of 1.
        tree.update_integer(literal, 0x0900_0000).unwrap();
        assert_eq!(table_length(&tree), before + 3);
        assert_eq!(
            tree.object_node_info(literal).unwrap().op_code,
            crate::encoding::DWORD_PREFIX
        );
        assert_eq!(tree.integer_value(literal), Ok(0x0900_0000));
        assert_consistent(&tree);

        // And back down.
        tree.update_integer(literal, 3).unwrap();
        assert_eq!(table_length(&tree), before);
        assert_consistent(&tree);
    }

    #[test]
    fn integer_growth_widens_enclosing_pkg_len() {
        let mut tree = empty_ssdt();
        let root = tree.root();
        let scope = tree.code_gen_scope("SCP0", Some(root)).unwrap();
        tree.code_gen_name_integer("VALU", 5, Some(scope)).unwrap();
        // Pads the Scope payload to 62 bytes, the most a 1-byte PkgLength holds.
        tree.code_gen_name_string(
            "PAD0",
            "abcdefghijklmnopqrstuvwxyzabcdefghijklmnopqr",
            Some(scope),
        )
        .unwrap();
        assert_eq!(tree.object_node_info(scope).unwrap().pkg_len, 63);
        let before = table_length(&tree);

        let name = tree.find_node(root, "\\SCP0.VALU").unwrap();
        let literal = tree.name_op_value(name).unwrap();
        tree.update_integer(literal, 0x0900_0000).unwrap();

        // 3 more integer bytes and one more PkgLength byte.
        assert_eq!(tree.object_node_info(scope).unwrap().pkg_len, 67);
        assert_eq!(table_length(&tree), before + 4);
        assert_eq!(&tree.serialize_node(scope).unwrap()[..3], &[0x10, 0x43, 0x04]);
        assert_consistent(&tree);

        tree.update_integer(literal, 3).unwrap();
        assert_eq!(tree.object_node_info(scope).unwrap().pkg_len, 63);
        assert_eq!(table_length(&tree), before);
        assert_eq!(&tree.serialize_node(scope).unwrap()[..2], &[0x10, 0x3F]);
        assert_consistent(&tree);
    }

    #[test]
    fn special_integers() {
        let mut tree = empty_ssdt();
        let one = tree.create_object_node(&ONE).unwrap();
        let one = name_with(&mut tree, one);
        let before = table_length(&tree);
        assert_eq!(tree.integer_value(one), Ok(1));

        tree.update_integer(one, 0x1234).unwrap();
        assert_eq!(tree.integer_value(one), Ok(0x1234));
        assert_eq!(tree.fixed_argument_count(one), 1);
        assert_eq!(table_length(&tree), before + 2);
        assert_consistent(&tree);

        let ones = tree.create_object_node(&ONES).unwrap();
        assert_eq!(tree.update_integer(ones, 1), Err(AmlError::InvalidParameter));
        let string = tree.create_object_node(&STRING).unwrap();
        assert_eq!(tree.update_integer(string, 1), Err(AmlError::InvalidParameter));
    }

    #[test]
    fn data_type_compatibility() {
        let mut tree = empty_ssdt();
        let buffer = tree.create_object_node(&BUFFER).unwrap();
        let raw = tree.create_data_node(AmlDataType::Raw, &[0xAA, 0xBB]).unwrap();
        tree.append_variable_argument(buffer, raw).unwrap();

        // Raw <-> ResourceData is allowed.
        tree.update_data_node(raw, AmlDataType::ResourceData, &[0x22, 0x01, 0x00])
            .unwrap();
        assert_eq!(tree.node_data_type(raw), Ok(AmlDataType::ResourceData));
        tree.update_data_node(raw, AmlDataType::Raw, &[0x01]).unwrap();

        let all = [
            AmlDataType::Raw,
            AmlDataType::ResourceData,
            AmlDataType::NameString,
            AmlDataType::String,
            AmlDataType::UInt,
            AmlDataType::FieldPkgLen,
        ];
        for old in all {
            let node = tree.create_data_node(old, &[0x41]).unwrap();
            for new in all {
                if old == new || (old.is_byte_list() && new.is_byte_list()) {
                    continue;
                }
                assert_eq!(
                    tree.update_data_node(node, new, &[0x41]),
                    Err(AmlError::Unsupported),
                    "{old:?} -> {new:?}"
                );
            }
        }
    }

    #[test]
    fn string_validation_leaves_node_untouched() {
        let mut tree = empty_ssdt();
        let literal = tree.create_object_node(&STRING).unwrap();
        let text = tree.create_data_node(AmlDataType::String, b"PNP0501\0").unwrap();
        tree.set_fixed_argument(literal, 0, text).unwrap();
        let literal = name_with(&mut tree, literal);
        let before = table_length(&tree);

        assert_eq!(
            tree.update_data_node(text, AmlDataType::String, b"AB\x80\0"),
            Err(AmlError::InvalidParameter)
        );
        assert_eq!(
            tree.update_data_node(text, AmlDataType::String, b"AB\0C\0"),
            Err(AmlError::InvalidParameter)
        );
        assert_eq!(tree.string_value(literal), Ok("PNP0501"));
        assert_eq!(table_length(&tree), before);

        tree.update_data_node(text, AmlDataType::String, b"ARMHB000\0")
            .unwrap();
        assert_eq!(tree.string_value(literal), Ok("ARMHB000"));
        assert_eq!(table_length(&tree), before + 1);
        assert_consistent(&tree);
    }

    #[test]
    fn fixed_width_operand_cannot_resize() {
        let mut tree = empty_ssdt();
        let package = tree.create_object_node(&PACKAGE).unwrap();
        let count = tree.create_data_node(AmlDataType::UInt, &[0]).unwrap();
        tree.set_fixed_argument(package, 0, count).unwrap();

        assert_eq!(
            tree.update_data_node(count, AmlDataType::UInt, &[0, 0]),
            Err(AmlError::Unsupported)
        );
        tree.update_data_node(count, AmlDataType::UInt, &[4]).unwrap();
        assert_eq!(tree.integer_value(count), Ok(4));
    }

    #[test]
    fn byte_list_and_name_checks() {
        let mut tree = empty_ssdt();
        let orphan = tree.create_data_node(AmlDataType::Raw, &[1]).unwrap();
        assert_eq!(
            tree.update_data_node(orphan, AmlDataType::Raw, &[2]),
            Err(AmlError::InvalidParameter)
        );

        let buffer = tree.create_object_node(&BUFFER).unwrap();
        let rd = tree
            .create_data_node(AmlDataType::ResourceData, &[0x79, 0x00])
            .unwrap();
        tree.append_variable_argument(buffer, rd).unwrap();
        // Declared size (2 for a small descriptor of length 1) disagrees.
        assert_eq!(
            tree.update_data_node(rd, AmlDataType::ResourceData, &[0x79, 0x00, 0x00]),
            Err(AmlError::InvalidParameter)
        );
        // Large descriptor shorter than its header.
        assert_eq!(
            tree.update_data_node(rd, AmlDataType::ResourceData, &[0x8A, 0x00]),
            Err(AmlError::InvalidParameter)
        );

        let name = tree.create_data_node(AmlDataType::NameString, b"COM0").unwrap();
        assert_eq!(
            tree.update_data_node(name, AmlDataType::NameString, b"DEV0\0"),
            Err(AmlError::InvalidParameter)
        );
        tree.update_data_node(name, AmlDataType::NameString, b"\\DEV0")
            .unwrap();

        let bits = tree.create_data_node(AmlDataType::FieldPkgLen, &[8]).unwrap();
        assert_eq!(
            tree.update_data_node(bits, AmlDataType::FieldPkgLen, &[16]),
            Err(AmlError::InvalidParameter)
        );
    }
}
