//! Tree to ACPI table serialization.

use alloc::vec::Vec;

use crate::encoding::{EncodingAttributes, EXT_OP_PREFIX, FIELD_NAMED_OP};
use crate::node::{AmlNode, NodeId};
use crate::pkg_len;
use crate::sdt::{self, SdtHeader};
use crate::tree::AmlTree;
use crate::AmlError;

/// Offset of the checksum byte in the table header.
const CHECKSUM_OFFSET: usize = 9;

impl AmlTree {
    /// Serialize the tree into a complete DSDT/SSDT.
    ///
    /// The header length is recomputed from the tree and the checksum is
    /// set so the whole table sums to zero.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if the Root has been deleted,
    /// [`AmlError::InvalidPkgLength`] if a package is too large to encode, or
    /// [`AmlError::OutOfResources`] if the output cannot be allocated.
    pub fn serialize_definition_block(&self) -> Result<Vec<u8>, AmlError> {
        let root = self.root();
        let mut header = self.root_node(root)?.header;
        let size = SdtHeader::SIZE + self.compute_size(root)?;
        let length = u32::try_from(size).map_err(|_| AmlError::InvalidParameter)?;
        if header.length != length {
            log::debug!(
                "aml: stored table length {} differs from tree size {length}",
                header.length
            );
        }
        header.length = length;
        header.checksum = 0;

        let mut out = Vec::new();
        out.try_reserve_exact(size)
            .map_err(|_| AmlError::OutOfResources)?;
        out.extend_from_slice(&header.to_bytes());
        self.emit(root, &mut out)?;
        out[CHECKSUM_OFFSET] = sdt::compute_checksum(&out);

        log::debug!(
            "aml: serialized {size}-byte {} table",
            core::str::from_utf8(&header.signature).unwrap_or("????")
        );
        Ok(out)
    }

    /// Serialize the subtree rooted at `node` as raw AML, without any table
    /// header.
    ///
    /// # Errors
    ///
    /// Same as [`serialize_definition_block`](Self::serialize_definition_block).
    pub fn serialize_node(&self, node: NodeId) -> Result<Vec<u8>, AmlError> {
        let size = self.compute_size(node)?;
        let mut out = Vec::new();
        out.try_reserve_exact(size)
            .map_err(|_| AmlError::OutOfResources)?;
        self.emit(node, &mut out)?;
        Ok(out)
    }

    fn emit(&self, top: NodeId, out: &mut Vec<u8>) -> Result<(), AmlError> {
        for id in self.iter_from(top) {
            match self.node(id).ok_or(AmlError::InvalidParameter)? {
                AmlNode::Root(_) => {}
                AmlNode::Object(obj) => {
                    let enc = obj.encoding;
                    if enc.is_field_element() {
                        if enc.op_code != FIELD_NAMED_OP {
                            out.push(enc.op_code);
                        }
                    } else if enc.is_ext_op() {
                        out.extend_from_slice(&[EXT_OP_PREFIX, enc.sub_op_code]);
                    } else {
                        out.push(enc.op_code);
                    }
                    if enc.has(EncodingAttributes::HAS_PKG_LENGTH) {
                        let (bytes, width) = pkg_len::encode(obj.pkg_len)?;
                        out.extend_from_slice(&bytes[..width]);
                    }
                }
                AmlNode::Data(data) => out.extend_from_slice(&data.buffer),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{empty_ssdt, sample_ssdt};

    #[test]
    fn empty_table_is_header_only() {
        let tree = empty_ssdt();
        let table = tree.serialize_definition_block().unwrap();
        assert_eq!(table.len(), SdtHeader::SIZE);
        assert!(sdt::validate_checksum(&table));
        assert_eq!(SdtHeader::read_from_bytes(&table).unwrap().length(), 36);
    }

    #[test]
    fn serialized_size_matches_header() {
        let tree = sample_ssdt();
        let table = tree.serialize_definition_block().unwrap();
        let header = SdtHeader::read_from_bytes(&table).unwrap();
        assert_eq!(header.length() as usize, table.len());
        assert_eq!(
            header.length(),
            tree.root_node_info(tree.root()).unwrap().length
        );
        assert!(sdt::validate_checksum(&table));
        // Scope (\_SB_) opens the definition block.
        assert_eq!(&table[36..37], &[crate::encoding::SCOPE_OP]);
    }

    #[test]
    fn node_serialization() {
        let mut tree = empty_ssdt();
        let literal = tree.code_gen_integer(0x1234).unwrap();
        assert_eq!(tree.serialize_node(literal).unwrap(), [0x0B, 0x34, 0x12]);
        let string = tree.code_gen_string("ab").unwrap();
        assert_eq!(tree.serialize_node(string).unwrap(), [0x0D, b'a', b'b', 0]);
    }
}
