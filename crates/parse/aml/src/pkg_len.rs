//! AML `PkgLength` encoding and decoding.
//!
//! A PkgLength is 1 to 4 bytes long. Bits 7:6 of the lead byte give the
//! number of bytes that follow. A single-byte PkgLength stores the value in
//! bits 5:0; longer forms store the low nibble in bits 3:0 of the lead byte
//! and the remaining bits in the following bytes, least significant first.
//!
//! For package opcodes the encoded value counts the PkgLength bytes
//! themselves. Field elements reuse the same encoding for a bit length that
//! does not include its own width.

use crate::AmlError;

/// Largest value a PkgLength can encode.
pub const MAX_PKG_LEN: u32 = 0x0FFF_FFFF;

/// Largest value encodable with each width (index = width - 1).
const MAX_BY_WIDTH: [u32; 4] = [0x3F, 0x0FFF, 0x000F_FFFF, MAX_PKG_LEN];

/// Returns the number of bytes needed to encode `value`.
///
/// Returns `None` if `value` exceeds [`MAX_PKG_LEN`].
#[must_use]
pub fn width(value: u32) -> Option<usize> {
    MAX_BY_WIDTH
        .iter()
        .position(|&max| value <= max)
        .map(|idx| idx + 1)
}

/// Encode `value` using the minimal PkgLength form.
///
/// Returns the encoded bytes and the number of bytes used.
///
/// # Errors
///
/// Returns [`AmlError::InvalidPkgLength`] if `value` exceeds [`MAX_PKG_LEN`].
pub fn encode(value: u32) -> Result<([u8; 4], usize), AmlError> {
    let width = width(value).ok_or(AmlError::InvalidPkgLength)?;
    let mut out = [0u8; 4];

    if width == 1 {
        out[0] = value as u8;
        return Ok((out, 1));
    }

    out[0] = (((width - 1) as u8) << 6) | (value & 0x0F) as u8;
    for i in 1..width {
        out[i] = (value >> (4 + (i - 1) * 8)) as u8;
    }
    Ok((out, width))
}

/// Decode a PkgLength from the start of `data`.
///
/// Returns `(value, width)`.
///
/// # Errors
///
/// Returns [`AmlError::UnexpectedEnd`] if `data` is truncated, or
/// [`AmlError::InvalidPkgLength`] if the reserved lead-byte bits are set.
pub fn decode(data: &[u8]) -> Result<(u32, usize), AmlError> {
    let lead = *data.first().ok_or(AmlError::UnexpectedEnd)?;
    let byte_count = usize::from(lead >> 6);

    if byte_count == 0 {
        return Ok((u32::from(lead & 0x3F), 1));
    }

    // Bits 5:4 are reserved in the multi-byte form.
    if lead & 0x30 != 0 {
        return Err(AmlError::InvalidPkgLength);
    }

    let mut value = u32::from(lead & 0x0F);
    for i in 0..byte_count {
        let b = *data.get(1 + i).ok_or(AmlError::UnexpectedEnd)?;
        value |= u32::from(b) << (4 + i * 8);
    }
    Ok((value, 1 + byte_count))
}

/// Compute the PkgLength value of a package holding `payload` bytes.
///
/// The result includes the PkgLength field itself, using the smallest width
/// that can represent the total.
///
/// # Errors
///
/// Returns [`AmlError::InvalidPkgLength`] if the package is too large.
pub fn from_payload(payload: usize) -> Result<u32, AmlError> {
    for (idx, &max) in MAX_BY_WIDTH.iter().enumerate() {
        let total = payload + idx + 1;
        if total <= max as usize {
            return Ok(total as u32);
        }
    }
    Err(AmlError::InvalidPkgLength)
}

/// Returns the payload size (bytes after the PkgLength field) of a package
/// whose PkgLength is `value`.
#[must_use]
pub fn payload(value: u32) -> usize {
    let width = width(value).unwrap_or(4);
    (value as usize).saturating_sub(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_byte_form() {
        assert_eq!(encode(0x3F).unwrap(), ([0x3F, 0, 0, 0], 1));
        assert_eq!(decode(&[0x3F]).unwrap(), (0x3F, 1));
    }

    #[test]
    fn two_byte_form() {
        // 0x0123: lead = 0x40 | 0x3, next = 0x12
        assert_eq!(encode(0x0123).unwrap(), ([0x43, 0x12, 0, 0], 2));
        assert_eq!(decode(&[0x43, 0x12]).unwrap(), (0x0123, 2));
    }

    #[test]
    fn four_byte_form() {
        let (bytes, width) = encode(MAX_PKG_LEN).unwrap();
        assert_eq!(width, 4);
        assert_eq!(decode(&bytes).unwrap(), (MAX_PKG_LEN, 4));
        assert_eq!(encode(MAX_PKG_LEN + 1), Err(AmlError::InvalidPkgLength));
    }

    #[test]
    fn decode_rejects_reserved_bits() {
        assert_eq!(decode(&[0x50, 0x00]), Err(AmlError::InvalidPkgLength));
        assert_eq!(decode(&[0x41]), Err(AmlError::UnexpectedEnd));
        assert_eq!(decode(&[]), Err(AmlError::UnexpectedEnd));
    }

    #[test]
    fn payload_crosses_width_boundary() {
        // 62 payload bytes + 1 length byte still fits in the 1-byte form.
        assert_eq!(from_payload(62).unwrap(), 63);
        // 63 payload bytes need the 2-byte form: 63 + 2.
        assert_eq!(from_payload(63).unwrap(), 65);
        assert_eq!(payload(65), 63);
        assert_eq!(payload(63), 62);
    }
}
