//! Convenience editors for the objects platform code usually patches:
//! `Name()` values, resource templates and device names.

use alloc::vec::Vec;

use zerocopy::FromBytes;

use crate::encoding::{BUFFER_OP, DEVICE_OP, EXT_OP_PREFIX, NAME_OP, STRING_PREFIX};
use crate::name::AmlNameString;
use crate::node::{AmlDataType, NodeId};
use crate::resource::{self, ExtendedIrqDescriptor, QwordAddressDescriptor};
use crate::tree::AmlTree;
use crate::AmlError;

impl AmlTree {
    /// The value operand of a `Name (X, value)` node.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `name` is not a NameOp.
    pub fn name_op_value(&self, name: NodeId) -> Result<NodeId, AmlError> {
        if !self.object(name)?.is_op(NAME_OP, 0) {
            return Err(AmlError::InvalidParameter);
        }
        self.fixed_argument(name, 1).ok_or(AmlError::InvalidParameter)
    }

    /// The Buffer of a `Name (X, ResourceTemplate () {...})` node.
    pub(crate) fn resource_template_buffer(&self, name: NodeId) -> Result<NodeId, AmlError> {
        let buffer = self.name_op_value(name)?;
        if !self.object(buffer)?.is_op(BUFFER_OP, 0) {
            return Err(AmlError::InvalidParameter);
        }
        Ok(buffer)
    }

    /// Set the integer held by a `Name (X, <integer>)` node.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `name` is not a NameOp or
    /// its value is not an updatable integer literal.
    pub fn name_op_update_integer(&mut self, name: NodeId, value: u64) -> Result<(), AmlError> {
        let literal = self.name_op_value(name)?;
        self.update_integer(literal, value)
    }

    /// Set the string held by a `Name (X, "...")` node.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `name` is not a NameOp, its
    /// value is not a String literal, or `value` is not plain ASCII.
    pub fn name_op_update_string(&mut self, name: NodeId, value: &str) -> Result<(), AmlError> {
        let literal = self.name_op_value(name)?;
        if !self.object(literal)?.is_op(STRING_PREFIX, 0) {
            return Err(AmlError::InvalidParameter);
        }
        let data = self
            .fixed_argument(literal, 0)
            .ok_or(AmlError::InvalidParameter)?;

        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(value.len() + 1)
            .map_err(|_| AmlError::OutOfResources)?;
        bytes.extend_from_slice(value.as_bytes());
        bytes.push(0);
        self.update_data_node(data, AmlDataType::String, &bytes)
    }

    /// First resource data descriptor of a `Name (X, ResourceTemplate ())`
    /// node, or `None` if the template is empty.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `name` does not hold a
    /// Buffer.
    pub fn name_op_get_first_rd_node(&self, name: NodeId) -> Result<Option<NodeId>, AmlError> {
        let buffer = self.resource_template_buffer(name)?;
        Ok(self
            .next_variable_argument(buffer, None)
            .filter(|&rd| self.is_descriptor(rd)))
    }

    /// Resource data descriptor following `rd`, or `None` at the End Tag.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `rd` is not a resource data
    /// node.
    pub fn name_op_get_next_rd_node(&self, rd: NodeId) -> Result<Option<NodeId>, AmlError> {
        if self.node_data_type(rd)? != AmlDataType::ResourceData {
            return Err(AmlError::InvalidParameter);
        }
        Ok(self
            .sibling_in_variable_list(rd)
            .filter(|&next| self.is_descriptor(next)))
    }

    /// Resource data other than the End Tag.
    fn is_descriptor(&self, node: NodeId) -> bool {
        self.resource_data_descriptor_id(node)
            .is_ok_and(|id| id != resource::SMALL_END_TAG_ID)
    }

    /// Rewrite the range of a QWord address space descriptor: minimum
    /// `base`, maximum `base + length - 1`, length `length`.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `rd` is not a QWord address
    /// space descriptor.
    pub fn update_rd_qword(&mut self, rd: NodeId, base: u64, length: u64) -> Result<(), AmlError> {
        let mut bytes = self.descriptor_copy(rd, resource::LARGE_QWORD_ADDRESS_ID)?;
        let (qword, _) = QwordAddressDescriptor::mut_from_prefix(&mut bytes)
            .map_err(|_| AmlError::InvalidParameter)?;
        qword.set_range(base, length);
        self.update_data_node(rd, AmlDataType::ResourceData, &bytes)
    }

    /// Replace the first interrupt of an extended interrupt descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `rd` is not an extended
    /// interrupt descriptor with at least one interrupt.
    pub fn update_rd_interrupt(&mut self, rd: NodeId, irq: u32) -> Result<(), AmlError> {
        let mut bytes = self.descriptor_copy(rd, resource::LARGE_EXTENDED_IRQ_ID)?;
        let (desc, _) = ExtendedIrqDescriptor::mut_from_prefix(&mut bytes)
            .map_err(|_| AmlError::InvalidParameter)?;
        if desc.count == 0 {
            return Err(AmlError::InvalidParameter);
        }
        desc.interrupt.set(irq);
        self.update_data_node(rd, AmlDataType::ResourceData, &bytes)
    }

    fn descriptor_copy(&self, rd: NodeId, id: u8) -> Result<Vec<u8>, AmlError> {
        if self.resource_data_descriptor_id(rd)? != id {
            return Err(AmlError::InvalidParameter);
        }
        let current = self.data_node_bytes(rd)?;
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(current.len())
            .map_err(|_| AmlError::OutOfResources)?;
        bytes.extend_from_slice(current);
        Ok(bytes)
    }

    /// Rename a `Device ()`.
    ///
    /// `name` is an ASL name string such as `DEV0` or `\_SB_.DEV0`.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if `device` is not a Device
    /// node or `name` is malformed.
    pub fn update_device_op_name(&mut self, device: NodeId, name: &str) -> Result<(), AmlError> {
        if !self.object(device)?.is_op(EXT_OP_PREFIX, DEVICE_OP) {
            return Err(AmlError::InvalidParameter);
        }
        let name_node = self
            .fixed_argument(device, 0)
            .ok_or(AmlError::InvalidParameter)?;
        let bytes = AmlNameString::from_asl(name)?.to_aml_bytes()?;
        self.update_data_node(name_node, AmlDataType::NameString, &bytes)?;
        log::debug!("aml: device {device:?} renamed to {name}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::AcpiResource;
    use crate::sdt::SdtHeader;
    use crate::test_util::sample_ssdt;

    fn assert_consistent(tree: &AmlTree) {
        assert_eq!(
            tree.root_node_info(tree.root()).unwrap().length as usize,
            SdtHeader::SIZE + tree.compute_size(tree.root()).unwrap()
        );
    }

    #[test]
    fn name_values() {
        let mut tree = sample_ssdt();
        let root = tree.root();
        let uid = tree.find_node(root, "\\_SB_.COM0._UID").unwrap();
        tree.name_op_update_integer(uid, 0x1_0000).unwrap();
        assert_eq!(tree.integer_value(tree.name_op_value(uid).unwrap()), Ok(0x1_0000));

        let text = tree.find_node(root, "\\_SB_.COM0._STR").unwrap();
        tree.name_op_update_string(text, "serial port").unwrap();
        assert_eq!(
            tree.string_value(tree.name_op_value(text).unwrap()),
            Ok("serial port")
        );
        assert_consistent(&tree);

        // Wrong value kinds.
        assert_eq!(
            tree.name_op_update_string(uid, "x"),
            Err(AmlError::InvalidParameter)
        );
        assert_eq!(
            tree.name_op_update_integer(text, 1),
            Err(AmlError::InvalidParameter)
        );
        let device = tree.find_node(root, "\\_SB_.COM0").unwrap();
        assert_eq!(tree.name_op_value(device), Err(AmlError::InvalidParameter));
    }

    #[test]
    fn resource_updates() {
        let mut tree = sample_ssdt();
        let crs = tree.find_node(tree.root(), "\\_SB_.COM0._CRS").unwrap();
        let qword = tree.name_op_get_first_rd_node(crs).unwrap().unwrap();
        let irq = tree.name_op_get_next_rd_node(qword).unwrap().unwrap();
        let before = tree.root_node_info(tree.root()).unwrap().length;

        tree.update_rd_qword(qword, 0x0900_0000, 0x2000).unwrap();
        tree.update_rd_interrupt(irq, 39).unwrap();
        assert_eq!(
            resource::decode(tree.data_node_bytes(qword).unwrap()),
            Some(AcpiResource::Memory64 {
                base: 0x0900_0000,
                max: 0x0900_1FFF,
                length: 0x2000,
                writable: true,
            })
        );
        assert!(matches!(
            resource::decode(tree.data_node_bytes(irq).unwrap()),
            Some(AcpiResource::ExtendedIrq { gsi: 39, .. })
        ));
        assert_eq!(tree.root_node_info(tree.root()).unwrap().length, before);

        // Descriptor kinds are checked.
        assert_eq!(tree.update_rd_qword(irq, 0, 1), Err(AmlError::InvalidParameter));
        assert_eq!(tree.update_rd_interrupt(qword, 1), Err(AmlError::InvalidParameter));
    }

    #[test]
    fn device_rename() {
        let mut tree = sample_ssdt();
        let root = tree.root();
        let device = tree.find_node(root, "\\_SB_.COM0").unwrap();
        tree.update_device_op_name(device, "DEV0").unwrap();

        assert!(tree.find_node(root, "\\_SB_.DEV0._UID").is_ok());
        assert_eq!(
            tree.find_node(root, "\\_SB_.COM0._UID"),
            Err(AmlError::NotFound)
        );

        let uid = tree.find_node(root, "\\_SB_.DEV0._UID").unwrap();
        assert_eq!(
            tree.update_device_op_name(uid, "DEV1"),
            Err(AmlError::InvalidParameter)
        );
        assert_eq!(
            tree.update_device_op_name(device, "dev1"),
            Err(AmlError::InvalidParameter)
        );
        assert_consistent(&tree);
    }
}
