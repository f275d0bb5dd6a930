//! Definition block parser.
//!
//! [`parse_definition_block`] validates a DSDT/SSDT and decodes its AML into
//! an [`AmlTree`]. Nodes are linked directly without size propagation; the
//! Root length is set once from the finished tree.
//!
//! A NameString found where an object is expected (a reference, a package
//! element) becomes a `NameString` Data node. Method invocations are not
//! decoded: their arguments are parsed as the following terms, which keeps
//! the byte stream intact.

use crate::encoding::{self, AmlByteEncoding, AmlParseFormat, EncodingAttributes, EXT_OP_PREFIX};
use crate::name::{
    self, AmlNameString, DUAL_NAME_PREFIX, MULTI_NAME_PREFIX, PARENT_PREFIX_CHAR, ROOT_CHAR,
};
use crate::node::{AmlDataType, NodeId};
use crate::pkg_len;
use crate::resource;
use crate::sdt::{self, SdtHeader};
use crate::tree::AmlTree;
use crate::AmlError;

/// Deepest object nesting the parser accepts.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Parse a complete DSDT or SSDT into a tree.
///
/// Bytes past the length stored in the header are ignored.
///
/// # Errors
///
/// - [`AmlError::UnexpectedEnd`] if the table or an AML construct is
///   truncated.
/// - [`AmlError::InvalidSignature`] if the table is not a DSDT or SSDT.
/// - [`AmlError::InvalidChecksum`] if the table does not sum to zero.
/// - [`AmlError::InvalidAml`] or [`AmlError::InvalidPkgLength`] if the AML
///   is malformed, uses an unknown opcode or nests objects deeper than
///   [`MAX_NESTING_DEPTH`].
pub fn parse_definition_block(table: &[u8]) -> Result<AmlTree, AmlError> {
    let header = SdtHeader::read_from_bytes(table).ok_or(AmlError::UnexpectedEnd)?;
    if !header.is_definition_block() {
        return Err(AmlError::InvalidSignature);
    }
    let length = header.length as usize;
    if length < SdtHeader::SIZE {
        return Err(AmlError::InvalidAml);
    }
    let table = table.get(..length).ok_or(AmlError::UnexpectedEnd)?;
    if !sdt::validate_checksum(table) {
        return Err(AmlError::InvalidChecksum);
    }

    let mut parser = Parser {
        data: table,
        pos: SdtHeader::SIZE,
        depth: 0,
        tree: AmlTree::new(header)?,
    };
    let root = parser.tree.root();
    parser.parse_term_list(root, length)?;

    let mut tree = parser.tree;
    let size = SdtHeader::SIZE + tree.compute_size(root)?;
    let stored = tree.root_node_mut(root)?;
    stored.header = header;
    stored.header.length = u32::try_from(size).map_err(|_| AmlError::InvalidAml)?;
    if size != length {
        log::debug!("aml: table re-encodes to {size} bytes (was {length})");
    }

    log::debug!(
        "aml: parsed {} with {} nodes",
        core::str::from_utf8(&header.signature).unwrap_or("????"),
        tree.node_count()
    );
    Ok(tree)
}

/// Byte cursor over the table, building nodes as it goes.
struct Parser<'a> {
    data: &'a [u8],
    pos: usize,
    /// Objects currently being parsed.
    depth: usize,
    tree: AmlTree,
}

impl<'a> Parser<'a> {
    fn peek(&self, limit: usize) -> Result<u8, AmlError> {
        if self.pos >= limit {
            return Err(AmlError::UnexpectedEnd);
        }
        self.data.get(self.pos).copied().ok_or(AmlError::UnexpectedEnd)
    }

    /// Remaining bytes up to `limit`.
    fn rest(&self, limit: usize) -> &'a [u8] {
        self.data.get(self.pos..limit).unwrap_or(&[])
    }

    fn take(&mut self, count: usize, limit: usize) -> Result<&'a [u8], AmlError> {
        let bytes = self
            .rest(limit)
            .get(..count)
            .ok_or(AmlError::UnexpectedEnd)?;
        self.pos += count;
        Ok(bytes)
    }

    fn data_node(
        &mut self,
        data_type: AmlDataType,
        count: usize,
        limit: usize,
    ) -> Result<NodeId, AmlError> {
        let bytes = self.take(count, limit)?;
        self.tree.create_data_node(data_type, bytes)
    }

    /// Parse terms into `parent`'s variable list until `limit`.
    fn parse_term_list(&mut self, parent: NodeId, limit: usize) -> Result<(), AmlError> {
        let mut position = 0;
        while self.pos < limit {
            let child = self.parse_object(limit)?;
            self.tree.link_variable(parent, position, child)?;
            position += 1;
        }
        Ok(())
    }

    fn parse_object(&mut self, limit: usize) -> Result<NodeId, AmlError> {
        let lead = self.peek(limit)?;
        if is_name_start(lead) {
            let (_, size) = AmlNameString::parse(self.rest(limit))?;
            return self.data_node(AmlDataType::NameString, size, limit);
        }

        let sub = if lead == EXT_OP_PREFIX {
            self.rest(limit).get(1).copied().ok_or(AmlError::UnexpectedEnd)?
        } else {
            0
        };
        let Some(enc) = encoding::lookup(lead, sub) else {
            log::warn!(
                "aml: unknown opcode {lead:#04x}/{sub:#04x} at offset {:#x}",
                self.pos
            );
            return Err(AmlError::InvalidAml);
        };
        self.pos += enc.opcode_size();
        self.parse_object_body(enc, limit)
    }

    /// Parse everything after the opcode bytes of `enc`.
    fn parse_object_body(
        &mut self,
        enc: &'static AmlByteEncoding,
        limit: usize,
    ) -> Result<NodeId, AmlError> {
        if self.depth >= MAX_NESTING_DEPTH {
            log::warn!("aml: objects nested too deep at offset {:#x}", self.pos);
            return Err(AmlError::InvalidAml);
        }
        self.depth += 1;
        let node = self.parse_object_contents(enc, limit);
        self.depth -= 1;
        node
    }

    fn parse_object_contents(
        &mut self,
        enc: &'static AmlByteEncoding,
        limit: usize,
    ) -> Result<NodeId, AmlError> {
        let node = self.tree.create_object_node(enc)?;

        let end = if enc.has(EncodingAttributes::HAS_PKG_LENGTH) {
            let (value, width) = pkg_len::decode(self.rest(limit))?;
            let value = value as usize;
            if value < width || self.pos + value > limit {
                return Err(AmlError::InvalidPkgLength);
            }
            let end = self.pos + value;
            self.pos += width;
            self.tree.object_mut(node)?.pkg_len = pkg_len::from_payload(value - width)?;
            end
        } else {
            limit
        };

        for (index, &format) in enc.formats[..usize::from(enc.fixed_arg_count)]
            .iter()
            .enumerate()
        {
            let arg = self.parse_fixed_argument(format, end)?;
            self.tree.link_fixed(node, index, arg)?;
        }

        if enc.has(EncodingAttributes::HAS_CHILD_OBJ) {
            self.parse_term_list(node, end)?;
        } else if enc.has(EncodingAttributes::HAS_BYTE_LIST) {
            self.parse_byte_list(node, end)?;
        } else if enc.has(EncodingAttributes::HAS_FIELD_LIST) {
            self.parse_field_list(node, end)?;
        }

        if enc.has(EncodingAttributes::HAS_PKG_LENGTH) && self.pos != end {
            log::warn!("aml: {} ends before its package length", enc.name);
            return Err(AmlError::InvalidPkgLength);
        }
        Ok(node)
    }

    fn parse_fixed_argument(
        &mut self,
        format: AmlParseFormat,
        limit: usize,
    ) -> Result<NodeId, AmlError> {
        if let Some(width) = format.integer_width() {
            return self.data_node(AmlDataType::UInt, width, limit);
        }
        match format {
            AmlParseFormat::Name => {
                let (_, size) = AmlNameString::parse(self.rest(limit))?;
                self.data_node(AmlDataType::NameString, size, limit)
            }
            AmlParseFormat::String => {
                let nul = self
                    .rest(limit)
                    .iter()
                    .position(|&b| b == 0)
                    .ok_or(AmlError::UnexpectedEnd)?;
                self.data_node(AmlDataType::String, nul + 1, limit)
            }
            AmlParseFormat::Object => self.parse_object(limit),
            AmlParseFormat::FieldPkgLen => {
                let (_, width) = pkg_len::decode(self.rest(limit))?;
                self.data_node(AmlDataType::FieldPkgLen, width, limit)
            }
            _ => Err(AmlError::InvalidAml),
        }
    }

    /// A well-formed resource template is split into one node per
    /// descriptor; anything else is kept as a single raw node.
    fn parse_byte_list(&mut self, parent: NodeId, end: usize) -> Result<(), AmlError> {
        let bytes = self.rest(end);
        if bytes.is_empty() {
            return Ok(());
        }
        match resource::split_template(bytes) {
            Some(descriptors) => {
                self.tree.reserve_nodes(descriptors.len())?;
                for (position, desc) in descriptors.iter().enumerate() {
                    let rd = self.tree.create_data_node(AmlDataType::ResourceData, desc)?;
                    self.tree.link_variable(parent, position, rd)?;
                }
            }
            None => {
                let raw = self.tree.create_data_node(AmlDataType::Raw, bytes)?;
                self.tree.link_variable(parent, 0, raw)?;
            }
        }
        self.pos = end;
        Ok(())
    }

    fn parse_field_list(&mut self, parent: NodeId, end: usize) -> Result<(), AmlError> {
        let mut position = 0;
        while self.pos < end {
            let lead = self.peek(end)?;
            let Some(enc) = encoding::lookup_field_element(lead) else {
                log::warn!("aml: unknown field element {lead:#04x} at offset {:#x}", self.pos);
                return Err(AmlError::InvalidAml);
            };
            self.pos += enc.opcode_size();
            let element = self.parse_object_body(enc, end)?;
            self.tree.link_variable(parent, position, element)?;
            position += 1;
        }
        Ok(())
    }
}

fn is_name_start(lead: u8) -> bool {
    name::is_lead_name_char(lead)
        || matches!(
            lead,
            ROOT_CHAR | PARENT_PREFIX_CHAR | DUAL_NAME_PREFIX | MULTI_NAME_PREFIX
        )
}
