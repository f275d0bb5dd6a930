//! The serial port SSDT template.

use alloc::vec::Vec;

use hadron_aml::{AmlError, AmlTree};

/// OEM table id of the generated table.
pub const TEMPLATE_OEM_TABLE_ID: [u8; 8] = *b"SERIALPT";

/// Build the AML of the serial port SSDT template:
///
/// ```text
/// Scope (\_SB_) {
///     Device (COM0) {
///         Name (_UID, Zero)
///         Name (_HID, "PNP0501")
///         Name (_CID, "PNP0500")
///         Name (_CRS, ResourceTemplate () {
///             QWordMemory (..., 0x0, 0x0, ...)
///             Interrupt (ResourceConsumer, Level, ActiveHigh, Exclusive) { 0 }
///         })
///         Method (_STA) { Return (0x0F) }
///     }
/// }
/// ```
///
/// # Errors
///
/// Returns [`AmlError::OutOfResources`] if the tree cannot be allocated.
pub fn serial_port_template() -> Result<Vec<u8>, AmlError> {
    let mut tree =
        AmlTree::code_gen_definition_block(*b"SSDT", *b"HADRON", TEMPLATE_OEM_TABLE_ID, 1)?;
    let root = tree.root();
    let scope = tree.code_gen_scope("\\_SB_", Some(root))?;
    let device = tree.code_gen_device("COM0", Some(scope))?;
    tree.code_gen_name_integer("_UID", 0, Some(device))?;
    tree.code_gen_name_string("_HID", "PNP0501", Some(device))?;
    tree.code_gen_name_string("_CID", "PNP0500", Some(device))?;
    let crs = tree.code_gen_name_resource_template("_CRS", Some(device))?;
    tree.code_gen_rd_qword_memory(crs, 0, 0)?;
    tree.code_gen_rd_interrupt(crs, 0)?;
    tree.code_gen_method_ret_integer("_STA", 0, 0x0F, Some(device))?;
    tree.serialize_definition_block()
}
