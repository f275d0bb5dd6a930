//! ACPI resource data descriptors.
//!
//! A resource template is the byte list of a `Buffer` made of small (1-byte
//! tag) and large (3-byte header) descriptors, terminated by an End Tag.
//! The parser keeps one [`ResourceData`](crate::AmlDataType::ResourceData)
//! node per descriptor; this module knows how to size, split, decode and
//! build them.

use alloc::vec::Vec;

use zerocopy::little_endian::{U16, U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Size of a large descriptor header: tag byte and 16-bit length.
pub const LARGE_HEADER_SIZE: usize = 3;

/// End Tag descriptor byte (small item 0x0F, length 1).
pub const END_TAG: u8 = 0x79;
/// Size of the End Tag descriptor, checksum included.
pub const END_TAG_SIZE: usize = 2;

/// Small End Tag descriptor id.
pub const SMALL_END_TAG_ID: u8 = 0x78;

/// Large extended interrupt descriptor id.
pub const LARGE_EXTENDED_IRQ_ID: u8 = 0x89;
/// Large QWord address space descriptor id.
pub const LARGE_QWORD_ADDRESS_ID: u8 = 0x8A;

/// Total size of a QWord address space descriptor.
pub const QWORD_ADDRESS_SIZE: usize = size_of::<QwordAddressDescriptor>();

/// Size of an extended interrupt descriptor holding one interrupt.
pub const EXTENDED_IRQ_SIZE: usize = size_of::<ExtendedIrqDescriptor>();

/// QWord address space descriptor (large item 0x0A).
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct QwordAddressDescriptor {
    /// Descriptor tag, [`LARGE_QWORD_ADDRESS_ID`].
    pub tag: u8,
    /// Length of the descriptor after the large header.
    pub length: U16,
    /// Resource type: 0 memory, 1 I/O, 2 bus number.
    pub resource_type: u8,
    /// General flags (consumer, decode, fixed min/max).
    pub general_flags: u8,
    /// Type-specific flags. Bit 0 is read-write for memory ranges.
    pub type_flags: u8,
    /// Address space granularity.
    pub granularity: U64,
    /// Range minimum.
    pub min: U64,
    /// Range maximum.
    pub max: U64,
    /// Translation offset.
    pub translation: U64,
    /// Range length.
    pub range_length: U64,
}

impl QwordAddressDescriptor {
    /// Set the minimum, maximum and length of the range to cover
    /// `[base, base + length)`. A zero length yields a zero maximum.
    pub fn set_range(&mut self, base: u64, length: u64) {
        let max = match length {
            0 => 0,
            _ => base.wrapping_add(length - 1),
        };
        self.min.set(base);
        self.max.set(max);
        self.range_length.set(length);
    }
}

/// Extended interrupt descriptor (large item 0x09) holding one interrupt.
///
/// Descriptors with more interrupts or a resource source are longer; this
/// layout covers their prefix.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct ExtendedIrqDescriptor {
    /// Descriptor tag, [`LARGE_EXTENDED_IRQ_ID`].
    pub tag: u8,
    /// Length of the descriptor after the large header.
    pub length: U16,
    /// Bit 0 consumer, bit 1 edge-triggered, bit 2 active-low, bit 3 shared.
    pub flags: u8,
    /// Number of interrupts in the table.
    pub count: u8,
    /// First interrupt of the table.
    pub interrupt: U32,
}

/// Returns `true` if `tag` starts a large descriptor.
#[must_use]
pub fn is_large(tag: u8) -> bool {
    tag & 0x80 != 0
}

/// Descriptor id: the whole tag of a large descriptor, the item name bits
/// of a small one.
#[must_use]
pub fn descriptor_id(data: &[u8]) -> Option<u8> {
    let tag = *data.first()?;
    Some(if is_large(tag) { tag } else { tag & 0x78 })
}

/// Total size of the descriptor starting at `data`, as declared by its
/// header.
///
/// Returns `None` if a large header is truncated.
#[must_use]
pub fn descriptor_size(data: &[u8]) -> Option<usize> {
    let tag = *data.first()?;
    if is_large(tag) {
        let (len, _) = U16::read_from_prefix(data.get(1..)?).ok()?;
        Some(usize::from(len.get()) + LARGE_HEADER_SIZE)
    } else {
        Some(usize::from(tag & 0x07) + 1)
    }
}

/// Split a byte list into its descriptors.
///
/// Returns `None` unless the list is a complete resource template: every
/// descriptor fits and the End Tag is the last one.
#[must_use]
pub fn split_template(data: &[u8]) -> Option<Vec<&[u8]>> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let rest = &data[pos..];
        let size = descriptor_size(rest)?;
        let desc = rest.get(..size)?;
        out.try_reserve(1).ok()?;
        out.push(desc);
        pos += size;
        if descriptor_id(desc) == Some(SMALL_END_TAG_ID) {
            return (pos == data.len() && size == END_TAG_SIZE).then_some(out);
        }
    }
    None
}

/// Build an End Tag with a zero checksum.
#[must_use]
pub fn end_tag() -> [u8; END_TAG_SIZE] {
    [END_TAG, 0]
}

/// Build a QWord memory descriptor covering `[base, base + length)`.
///
/// The range is fixed, cacheable, read-write and not translated.
#[must_use]
pub fn qword_memory(base: u64, length: u64) -> QwordAddressDescriptor {
    let mut desc = QwordAddressDescriptor {
        tag: LARGE_QWORD_ADDRESS_ID,
        length: U16::new((QWORD_ADDRESS_SIZE - LARGE_HEADER_SIZE) as u16),
        // Memory range, consumer, fixed min/max.
        resource_type: 0,
        general_flags: 0x0C,
        // Cacheable, read-write.
        type_flags: 0x03,
        granularity: U64::ZERO,
        min: U64::ZERO,
        max: U64::ZERO,
        translation: U64::ZERO,
        range_length: U64::ZERO,
    };
    desc.set_range(base, length);
    desc
}

/// Build an extended interrupt descriptor for a single level-triggered,
/// active-high, exclusive interrupt consumed by the device.
#[must_use]
pub fn extended_interrupt(irq: u32) -> ExtendedIrqDescriptor {
    ExtendedIrqDescriptor {
        tag: LARGE_EXTENDED_IRQ_ID,
        length: U16::new((EXTENDED_IRQ_SIZE - LARGE_HEADER_SIZE) as u16),
        flags: 0x01,
        count: 1,
        interrupt: U32::new(irq),
    }
}

/// A decoded ACPI resource descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcpiResource {
    /// 64-bit memory range from a QWord address space descriptor.
    Memory64 {
        /// Minimum (base) address.
        base: u64,
        /// Maximum address.
        max: u64,
        /// Length in bytes.
        length: u64,
        /// The region is writable.
        writable: bool,
    },
    /// Extended interrupt (large descriptor 0x89), first interrupt only.
    ExtendedIrq {
        /// Global System Interrupt number.
        gsi: u32,
        /// Edge-triggered rather than level-triggered.
        edge_triggered: bool,
        /// Active-low rather than active-high.
        active_low: bool,
    },
}

/// Decode one descriptor.
///
/// Only QWord memory ranges and extended interrupts are recognised. Returns
/// `None` for the End Tag, other descriptors, and descriptors too short for
/// their type.
#[must_use]
pub fn decode(desc: &[u8]) -> Option<AcpiResource> {
    let size = descriptor_size(desc)?;
    let desc = desc.get(..size)?;
    match descriptor_id(desc)? {
        LARGE_EXTENDED_IRQ_ID => {
            let (irq, _) = ExtendedIrqDescriptor::read_from_prefix(desc).ok()?;
            if irq.count == 0 {
                return None;
            }
            Some(AcpiResource::ExtendedIrq {
                gsi: irq.interrupt.get(),
                edge_triggered: irq.flags & 0x02 != 0,
                active_low: irq.flags & 0x04 != 0,
            })
        }
        LARGE_QWORD_ADDRESS_ID => {
            let (qword, _) = QwordAddressDescriptor::read_from_prefix(desc).ok()?;
            (qword.resource_type == 0).then_some(AcpiResource::Memory64 {
                base: qword.min.get(),
                max: qword.max.get(),
                length: qword.range_length.get(),
                writable: qword.type_flags & 0x01 != 0,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use std::vec::Vec;

    #[test]
    fn ids_and_sizes() {
        // Small IRQ with flags byte.
        assert_eq!(descriptor_id(&[0x23, 0x10, 0x00, 0x09]), Some(0x20));
        assert_eq!(descriptor_size(&[0x23, 0x10, 0x00, 0x09]), Some(4));
        assert_eq!(descriptor_id(&[END_TAG, 0]), Some(SMALL_END_TAG_ID));
        assert_eq!(QWORD_ADDRESS_SIZE, 46);
        assert_eq!(EXTENDED_IRQ_SIZE, 9);
        assert_eq!(
            descriptor_size(qword_memory(0, 0).as_bytes()),
            Some(QWORD_ADDRESS_SIZE)
        );
        assert_eq!(
            descriptor_id(extended_interrupt(1).as_bytes()),
            Some(LARGE_EXTENDED_IRQ_ID)
        );
        assert_eq!(descriptor_size(&[0x8A, 0x2B]), None);
    }

    #[test]
    fn split_requires_trailing_end_tag() {
        let mut template = Vec::new();
        template.extend_from_slice(&[0x22, 0x10, 0x00]);
        template.extend_from_slice(extended_interrupt(9).as_bytes());
        template.extend_from_slice(&end_tag());
        let parts = split_template(&template).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2], &end_tag());

        // Bytes after the End Tag.
        template.push(0);
        assert!(split_template(&template).is_none());
        // No End Tag at all.
        assert!(split_template(&[0x22, 0x10, 0x00]).is_none());
        // Truncated large descriptor.
        assert!(split_template(&[0x8A, 0x2B, 0x00, 0x00]).is_none());
        assert!(split_template(&[]).is_none());
    }

    #[test]
    fn qword_wire_layout() {
        let qword = qword_memory(0x0900_0000, 0x1000);
        let bytes = qword.as_bytes();
        assert_eq!(&bytes[..6], &[0x8A, 0x2B, 0x00, 0x00, 0x0C, 0x03]);
        assert_eq!(&bytes[14..22], &0x0900_0000u64.to_le_bytes());
        assert_eq!(&bytes[22..30], &0x0900_0FFFu64.to_le_bytes());
        assert_eq!(&bytes[38..46], &0x1000u64.to_le_bytes());

        let irq = extended_interrupt(39);
        assert_eq!(irq.as_bytes(), &[0x89, 0x06, 0x00, 0x01, 0x01, 39, 0, 0, 0]);
    }

    #[test]
    fn zero_length_range() {
        let mut qword = qword_memory(0x0900_0000, 0);
        assert_eq!(qword.max.get(), 0);
        assert_eq!(qword.min.get(), 0x0900_0000);
        qword.set_range(0x1000, 0x10);
        assert_eq!(qword.max.get(), 0x100F);
        qword.set_range(0x1000, 0);
        assert_eq!(qword.max.get(), 0);
        assert_eq!(qword.range_length.get(), 0);
    }

    #[test]
    fn decode_built_descriptors() {
        let qword = qword_memory(0x0900_0000, 0x1000);
        assert_eq!(
            decode(qword.as_bytes()),
            Some(AcpiResource::Memory64 {
                base: 0x0900_0000,
                max: 0x0900_0FFF,
                length: 0x1000,
                writable: true,
            })
        );
        assert_eq!(
            decode(extended_interrupt(39).as_bytes()),
            Some(AcpiResource::ExtendedIrq {
                gsi: 39,
                edge_triggered: false,
                active_low: false,
            })
        );
        assert_eq!(decode(&end_tag()), None);
        // Small IRQ is not decoded.
        assert_eq!(decode(&[0x22, 0x10, 0x00]), None);
        // Interrupt table with no entries.
        assert_eq!(decode(&[0x89, 0x06, 0x00, 0x01, 0x00, 0, 0, 0, 0]), None);
        // Truncated QWord.
        assert_eq!(decode(&qword.as_bytes()[..20]), None);
    }
}
