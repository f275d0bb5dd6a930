//! System Description Table (SDT) header and checksum utilities.

use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Signature of the Differentiated System Description Table.
pub const DSDT_SIGNATURE: &[u8; 4] = b"DSDT";

/// Signature of a Secondary System Description Table.
pub const SSDT_SIGNATURE: &[u8; 4] = b"SSDT";

/// Standard ACPI System Description Table header.
///
/// Every definition block starts with this 36-byte header. The Root node of
/// an [`AmlTree`](crate::AmlTree) owns a copy of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdtHeader {
    /// 4-byte ASCII signature identifying the table type.
    pub signature: [u8; 4],
    /// Total length of the table, including the header, in bytes.
    pub length: u32,
    /// Revision of the table structure.
    pub revision: u8,
    /// Checksum byte. The entire table, including the header, must sum to zero.
    pub checksum: u8,
    /// OEM-supplied identification string.
    pub oem_id: [u8; 6],
    /// OEM-supplied table identification string.
    pub oem_table_id: [u8; 8],
    /// OEM-supplied revision number.
    pub oem_revision: u32,
    /// Vendor ID of the utility that created the table.
    pub creator_id: u32,
    /// Revision of the utility that created the table.
    pub creator_revision: u32,
}

/// Wire image of [`SdtHeader`].
#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawSdtHeader {
    signature: [u8; 4],
    length: U32,
    revision: u8,
    checksum: u8,
    oem_id: [u8; 6],
    oem_table_id: [u8; 8],
    oem_revision: U32,
    creator_id: U32,
    creator_revision: U32,
}

const _: () = assert!(size_of::<RawSdtHeader>() == SdtHeader::SIZE);

impl SdtHeader {
    /// The size of an SDT header in bytes.
    pub const SIZE: usize = 36;

    /// Read an [`SdtHeader`] from a byte slice.
    ///
    /// Returns `None` if the slice is shorter than [`SdtHeader::SIZE`] bytes.
    #[must_use]
    pub fn read_from_bytes(data: &[u8]) -> Option<Self> {
        let (raw, _) = RawSdtHeader::read_from_prefix(data).ok()?;
        Some(Self {
            signature: raw.signature,
            length: raw.length.get(),
            revision: raw.revision,
            checksum: raw.checksum,
            oem_id: raw.oem_id,
            oem_table_id: raw.oem_table_id,
            oem_revision: raw.oem_revision.get(),
            creator_id: raw.creator_id.get(),
            creator_revision: raw.creator_revision.get(),
        })
    }

    /// Encode the header into its 36-byte little-endian wire form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let raw = RawSdtHeader {
            signature: self.signature,
            length: U32::new(self.length),
            revision: self.revision,
            checksum: self.checksum,
            oem_id: self.oem_id,
            oem_table_id: self.oem_table_id,
            oem_revision: U32::new(self.oem_revision),
            creator_id: U32::new(self.creator_id),
            creator_revision: U32::new(self.creator_revision),
        };
        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(raw.as_bytes());
        out
    }

    /// Returns the 4-byte signature.
    #[must_use]
    pub fn signature(&self) -> [u8; 4] {
        self.signature
    }

    /// Returns the total length of this table (header included).
    #[must_use]
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Returns `true` if the signature is `DSDT` or `SSDT`.
    #[must_use]
    pub fn is_definition_block(&self) -> bool {
        &self.signature == DSDT_SIGNATURE || &self.signature == SSDT_SIGNATURE
    }
}

/// Validate the checksum of a byte slice.
///
/// ACPI tables are designed so that the sum of all bytes in the table equals
/// zero (mod 256). This function computes that sum and returns `true` when
/// the checksum is valid.
#[must_use]
pub fn validate_checksum(data: &[u8]) -> bool {
    let mut sum: u8 = 0;
    for &byte in data {
        sum = sum.wrapping_add(byte);
    }
    sum == 0
}

/// Compute the checksum byte that makes `data` sum to zero.
///
/// The byte currently stored in the checksum slot must be zero for the result
/// to be meaningful.
#[must_use]
pub fn compute_checksum(data: &[u8]) -> u8 {
    data.iter()
        .fold(0u8, |sum, &byte| sum.wrapping_add(byte))
        .wrapping_neg()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> SdtHeader {
        SdtHeader {
            signature: *SSDT_SIGNATURE,
            length: 0x40,
            revision: 2,
            checksum: 0,
            oem_id: *b"HADRON",
            oem_table_id: *b"SERIALPT",
            oem_revision: 1,
            creator_id: u32::from_le_bytes(*b"INTL"),
            creator_revision: 0x2022_0331,
        }
    }

    #[test]
    fn header_bytes_layout() {
        let bytes = sample_header().to_bytes();
        assert_eq!(&bytes[0..4], b"SSDT");
        assert_eq!(&bytes[4..8], &[0x40, 0, 0, 0]);
        assert_eq!(bytes[8], 2);
        assert_eq!(&bytes[10..16], b"HADRON");
        assert_eq!(&bytes[16..24], b"SERIALPT");
        assert_eq!(&bytes[28..32], b"INTL");
    }

    #[test]
    fn header_read_back() {
        let header = sample_header();
        let parsed = SdtHeader::read_from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
        assert!(parsed.is_definition_block());
    }

    #[test]
    fn header_too_short() {
        assert!(SdtHeader::read_from_bytes(&[0u8; 35]).is_none());
    }

    #[test]
    fn checksum_makes_sum_zero() {
        let mut bytes = sample_header().to_bytes();
        bytes[9] = compute_checksum(&bytes);
        assert!(validate_checksum(&bytes));
        bytes[20] ^= 0x01;
        assert!(!validate_checksum(&bytes));
    }
}
