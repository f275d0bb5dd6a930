//! Serial port SSDT generation.
//!
//! Builds an SSDT describing one serial port by patching a pre-built
//! template with [`hadron_aml`]: the device ids follow the DBG2 port subtype,
//! the `_CRS` gets the MMIO range and interrupt, and the device is renamed
//! and given its `_UID`.

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

mod template;

use alloc::vec::Vec;

use hadron_aml::{AmlError, AmlTree, NodeId, parse_definition_block};

pub use template::{TEMPLATE_OEM_TABLE_ID, serial_port_template};

/// Smallest MMIO range reported in `_CRS`.
pub const MIN_UART_ADDRESS_LENGTH: u64 = 0x1000;

const UID_PATH: &str = "\\_SB_.COM0._UID";
const HID_PATH: &str = "\\_SB_.COM0._HID";
const CID_PATH: &str = "\\_SB_.COM0._CID";
const CRS_PATH: &str = "\\_SB_.COM0._CRS";
const DEVICE_PATH: &str = "\\_SB_.COM0";

/// DBG2 serial port subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct SerialPortSubtype(pub u16);

impl SerialPortSubtype {
    /// Fully 16550-compatible.
    pub const FULL_16550: Self = Self(0x0000);
    /// 16450 subset of 16550.
    pub const FULL_16450: Self = Self(0x0001);
    /// ARM PL011 UART.
    pub const ARM_PL011: Self = Self(0x0003);
    /// ARM SBSA generic UART (2.x only, 32-bit access).
    pub const ARM_SBSA_GENERIC_UART_2X: Self = Self(0x000D);
    /// ARM SBSA generic UART.
    pub const ARM_SBSA_GENERIC_UART: Self = Self(0x000E);
    /// ARM debug communication channel.
    pub const DCC: Self = Self(0x000F);
    /// BCM2835 mini UART.
    pub const BCM2835: Self = Self(0x0010);

    /// Subtypes a table can be generated for.
    #[must_use]
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            Self::FULL_16550
                | Self::ARM_PL011
                | Self::ARM_SBSA_GENERIC_UART
                | Self::ARM_SBSA_GENERIC_UART_2X
                | Self::DCC
        )
    }
}

/// Description of one serial port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialPortInfo {
    /// MMIO base address.
    pub base_address: u64,
    /// Size of the MMIO range, raised to [`MIN_UART_ADDRESS_LENGTH`].
    pub base_address_length: u64,
    /// Global system interrupt.
    pub interrupt: u32,
    /// DBG2 port subtype.
    pub port_subtype: SerialPortSubtype,
}

/// Optional overrides applied while building the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerialPortFixupConfig<'a> {
    /// `_HID` for 16550 ports that are not BSA compliant. When set, the
    /// `_CID` object is removed.
    pub non_bsa_16550_hid: Option<&'a str>,
    /// OEM id of the table header.
    pub oem_id: Option<[u8; 6]>,
    /// OEM table id of the table header.
    pub oem_table_id: Option<[u8; 8]>,
    /// OEM revision of the table header.
    pub oem_revision: Option<u32>,
    /// Creator id of the table header.
    pub creator_id: Option<u32>,
    /// Creator revision of the table header.
    pub creator_revision: Option<u32>,
}

/// Errors returned while building a serial port SSDT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialPortError {
    /// An AML tree operation failed.
    Aml(AmlError),
    /// No serial port was given.
    NoPorts,
    /// The port subtype is not supported.
    UnsupportedSubtype(u16),
    /// The port has no base address.
    InvalidBaseAddress,
    /// The configured `_HID` is neither a PNP nor an ACPI id.
    InvalidHid,
}

impl From<AmlError> for SerialPortError {
    fn from(err: AmlError) -> Self {
        Self::Aml(err)
    }
}

impl core::fmt::Display for SerialPortError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Aml(err) => write!(f, "AML error: {err}"),
            Self::NoPorts => write!(f, "no serial port given"),
            Self::UnsupportedSubtype(id) => write!(f, "unsupported serial port subtype {id:#06x}"),
            Self::InvalidBaseAddress => write!(f, "serial port base address is zero"),
            Self::InvalidHid => write!(f, "invalid serial port _HID"),
        }
    }
}

/// Check that every port can be described by the template.
///
/// # Errors
///
/// Returns [`SerialPortError::NoPorts`] for an empty slice,
/// [`SerialPortError::UnsupportedSubtype`] or
/// [`SerialPortError::InvalidBaseAddress`] for the first bad port.
pub fn validate_serial_port_info(ports: &[SerialPortInfo]) -> Result<(), SerialPortError> {
    if ports.is_empty() {
        return Err(SerialPortError::NoPorts);
    }
    for (index, port) in ports.iter().enumerate() {
        if !port.port_subtype.is_supported() {
            log::warn!(
                "serial: port {index}: unsupported subtype {:#06x}",
                port.port_subtype.0
            );
            return Err(SerialPortError::UnsupportedSubtype(port.port_subtype.0));
        }
        if port.base_address == 0 {
            log::warn!("serial: port {index}: zero base address");
            return Err(SerialPortError::InvalidBaseAddress);
        }
    }
    Ok(())
}

/// `PNPxxxx`: three uppercase letters then four uppercase hex digits.
fn is_valid_pnp_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    bytes.len() == 7
        && bytes[..3].iter().all(u8::is_ascii_uppercase)
        && bytes[3..].iter().all(is_upper_hex)
}

/// `ACPIxxxx`: four uppercase letters or digits then four uppercase hex
/// digits.
fn is_valid_acpi_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    bytes.len() == 8
        && bytes[..4]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        && bytes[4..].iter().all(is_upper_hex)
}

fn is_upper_hex(b: &u8) -> bool {
    b.is_ascii_digit() || (b'A'..=b'F').contains(b)
}

/// `_HID` and optional `_CID` for a port.
fn device_ids<'a>(
    info: &SerialPortInfo,
    config: &SerialPortFixupConfig<'a>,
) -> Result<(&'a str, Option<&'static str>), SerialPortError> {
    match info.port_subtype {
        SerialPortSubtype::FULL_16550 => match config.non_bsa_16550_hid {
            Some(hid) if is_valid_pnp_id(hid) || is_valid_acpi_id(hid) => Ok((hid, None)),
            Some(hid) => {
                log::warn!("serial: rejecting _HID {hid:?}");
                Err(SerialPortError::InvalidHid)
            }
            None => Ok(("PNP0501", Some("PNP0500"))),
        },
        SerialPortSubtype::ARM_PL011 => Ok(("ARMH0011", None)),
        SerialPortSubtype::ARM_SBSA_GENERIC_UART | SerialPortSubtype::ARM_SBSA_GENERIC_UART_2X => {
            Ok(("ARMHB000", None))
        }
        other => {
            log::warn!("serial: no device id for subtype {:#06x}", other.0);
            Err(SerialPortError::Aml(AmlError::InvalidParameter))
        }
    }
}

fn fixup_ids(
    tree: &mut AmlTree,
    info: &SerialPortInfo,
    config: &SerialPortFixupConfig<'_>,
) -> Result<(), SerialPortError> {
    let (hid, cid) = device_ids(info, config)?;
    let root = tree.root();

    let hid_node = tree.find_node(root, HID_PATH)?;
    tree.name_op_update_string(hid_node, hid)?;

    let cid_node = tree.find_node(root, CID_PATH)?;
    match cid {
        Some(cid) => tree.name_op_update_string(cid_node, cid)?,
        None => {
            tree.detach_node(cid_node)?;
            tree.delete_tree(cid_node)?;
        }
    }
    Ok(())
}

fn fixup_crs(tree: &mut AmlTree, info: &SerialPortInfo) -> Result<(), SerialPortError> {
    let crs = tree.find_node(tree.root(), CRS_PATH)?;

    let qword = tree
        .name_op_get_first_rd_node(crs)?
        .ok_or(AmlError::InvalidParameter)?;
    let length = info.base_address_length.max(MIN_UART_ADDRESS_LENGTH);
    tree.update_rd_qword(qword, info.base_address, length)?;

    let interrupt = next_rd(tree, qword)?;
    tree.update_rd_interrupt(interrupt, info.interrupt)?;
    Ok(())
}

fn next_rd(tree: &AmlTree, rd: NodeId) -> Result<NodeId, SerialPortError> {
    Ok(tree
        .name_op_get_next_rd_node(rd)?
        .ok_or(AmlError::InvalidParameter)?)
}

/// Patch a tree built from [`serial_port_template`] for `info`.
///
/// `name` is the new device name (such as `COM1`) and `uid` its `_UID`.
///
/// # Errors
///
/// Returns [`SerialPortError::InvalidHid`] for a bad `_HID` override and
/// [`SerialPortError::Aml`] if the subtype has no device id or the tree does
/// not have the template's shape.
pub fn fixup_serial_port_info(
    tree: &mut AmlTree,
    info: &SerialPortInfo,
    name: &str,
    uid: u64,
    config: &SerialPortFixupConfig<'_>,
) -> Result<(), SerialPortError> {
    fixup_ids(tree, info, config)?;

    let uid_node = tree.find_node(tree.root(), UID_PATH)?;
    tree.name_op_update_integer(uid_node, uid)?;

    fixup_crs(tree, info)?;

    let device = tree.find_node(tree.root(), DEVICE_PATH)?;
    tree.update_device_op_name(device, name)?;
    Ok(())
}

fn apply_header_overrides(
    tree: &mut AmlTree,
    config: &SerialPortFixupConfig<'_>,
) -> Result<(), AmlError> {
    let root = tree.root();
    let mut header = tree.root_node_info(root)?;
    if let Some(oem_id) = config.oem_id {
        header.oem_id = oem_id;
    }
    if let Some(oem_table_id) = config.oem_table_id {
        header.oem_table_id = oem_table_id;
    }
    if let Some(oem_revision) = config.oem_revision {
        header.oem_revision = oem_revision;
    }
    if let Some(creator_id) = config.creator_id {
        header.creator_id = creator_id;
    }
    if let Some(creator_revision) = config.creator_revision {
        header.creator_revision = creator_revision;
    }
    tree.update_root_node(root, &header)
}

/// Build a complete SSDT describing `info`.
///
/// # Errors
///
/// See [`validate_serial_port_info`] and [`fixup_serial_port_info`].
pub fn build_ssdt_serial_port_table(
    info: &SerialPortInfo,
    name: &str,
    uid: u64,
    config: &SerialPortFixupConfig<'_>,
) -> Result<Vec<u8>, SerialPortError> {
    validate_serial_port_info(core::slice::from_ref(info))?;

    let template = serial_port_template()?;
    let mut tree = parse_definition_block(&template)?;
    apply_header_overrides(&mut tree, config)?;
    fixup_serial_port_info(&mut tree, info, name, uid, config)?;

    let table = tree.serialize_definition_block()?;
    log::debug!(
        "serial: built {}-byte SSDT for {name} at {:#x}",
        table.len(),
        info.base_address
    );
    Ok(table)
}
