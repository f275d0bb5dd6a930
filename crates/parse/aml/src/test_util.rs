//! Fixtures shared by the unit tests.

use crate::sdt::SdtHeader;
use crate::tree::AmlTree;

pub(crate) fn ssdt_header() -> SdtHeader {
    SdtHeader {
        signature: *b"SSDT",
        length: 0,
        revision: 2,
        checksum: 0,
        oem_id: *b"HADRON",
        oem_table_id: *b"AMLTEST ",
        oem_revision: 1,
        creator_id: u32::from_le_bytes(*b"HDRN"),
        creator_revision: 1,
    }
}

pub(crate) fn empty_ssdt() -> AmlTree {
    AmlTree::new(ssdt_header()).unwrap()
}

/// `Scope (\_SB) { Device (COM0) { Name (_UID, 0x05) Name (_STR, "uart")
/// Name (_CRS, ResourceTemplate () { QWordMemory (...) Interrupt (...) })
/// Method (_STA) { Return (0x0F) } } }`
pub(crate) fn sample_ssdt() -> AmlTree {
    let mut tree = empty_ssdt();
    let root = tree.root();
    let scope = tree.code_gen_scope("\\_SB_", Some(root)).unwrap();
    let device = tree.code_gen_device("COM0", Some(scope)).unwrap();
    tree.code_gen_name_integer("_UID", 5, Some(device)).unwrap();
    tree.code_gen_name_string("_STR", "uart", Some(device)).unwrap();
    let crs = tree.code_gen_name_resource_template("_CRS", Some(device)).unwrap();
    tree.code_gen_rd_qword_memory(crs, 0x1000_0000, 0x1000).unwrap();
    tree.code_gen_rd_interrupt(crs, 33).unwrap();
    tree.code_gen_method_ret_integer("_STA", 0, 0x0F, Some(device)).unwrap();
    tree
}
