//! AML name segments, name strings and namespace paths.
//!
//! ACPI names are composed of 4-byte segments. In the AML byte stream a
//! NameString is an optional root (`\`) or parent (`^`) prefix followed by
//! a NullName (`0x00`), a single segment, a DualNamePath (`0x2E`) or a
//! MultiNamePath (`0x2F` + count). ASL spells the same thing with `.`
//! separators, e.g. `\_SB_.COM0._UID`.

use alloc::vec::Vec;

use crate::AmlError;

/// Root prefix character (`\`).
pub const ROOT_CHAR: u8 = b'\\';
/// Parent prefix character (`^`).
pub const PARENT_PREFIX_CHAR: u8 = b'^';
/// Null name.
pub const NULL_NAME: u8 = 0x00;
/// Prefix of a two-segment name path.
pub const DUAL_NAME_PREFIX: u8 = 0x2E;
/// Prefix of an N-segment name path.
pub const MULTI_NAME_PREFIX: u8 = 0x2F;

/// Returns `true` if `c` may start a name segment.
#[must_use]
pub fn is_lead_name_char(c: u8) -> bool {
    c.is_ascii_uppercase() || c == b'_'
}

/// Returns `true` if `c` may appear after the first character of a segment.
#[must_use]
pub fn is_name_char(c: u8) -> bool {
    is_lead_name_char(c) || c.is_ascii_digit()
}

/// A 4-byte AML name segment (e.g., `_SB_`, `PCI0`, `_HID`).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NameSeg(pub [u8; 4]);

impl NameSeg {
    /// Create a `NameSeg` from a 4-byte slice.
    ///
    /// Returns `None` if the slice is shorter than 4 bytes or is not a valid
    /// segment.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..4)?;
        let mut seg = [0u8; 4];
        seg.copy_from_slice(bytes);
        let seg = Self(seg);
        seg.is_valid().then_some(seg)
    }

    /// Create a `NameSeg` from an ASL name of 1 to 4 characters.
    ///
    /// Short names are padded with `_` the way ASL compilers do (`_SB` becomes
    /// `_SB_`).
    #[must_use]
    pub fn from_asl(name: &str) -> Option<Self> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > 4 {
            return None;
        }
        let mut seg = [b'_'; 4];
        seg[..bytes.len()].copy_from_slice(bytes);
        let seg = Self(seg);
        seg.is_valid().then_some(seg)
    }

    /// Returns `true` if all four characters are legal name characters.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        is_lead_name_char(self.0[0]) && self.0[1..].iter().all(|&c| is_name_char(c))
    }

    /// Returns the name as a UTF-8 string (ACPI names are always ASCII).
    #[must_use]
    pub fn as_str(&self) -> &str {
        // ACPI names are ASCII; fallback to empty on invalid UTF-8 (shouldn't happen).
        core::str::from_utf8(&self.0).unwrap_or("")
    }
}

impl core::fmt::Debug for NameSeg {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NameSeg(\"{}\")", self.as_str())
    }
}

impl core::fmt::Display for NameSeg {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum number of segments in an inline AML path.
const MAX_PATH_DEPTH: usize = 16;

/// A fixed-capacity absolute AML namespace path.
///
/// Stores up to [`MAX_PATH_DEPTH`] (16) segments inline, which is sufficient
/// for all practical ACPI namespace depths.
#[derive(Clone, Copy)]
pub struct AmlPath {
    segments: [NameSeg; MAX_PATH_DEPTH],
    len: u8,
}

impl AmlPath {
    /// The root path (`\`).
    pub const ROOT: Self = Self {
        segments: [NameSeg(*b"____"); MAX_PATH_DEPTH],
        len: 0,
    };

    /// Creates an empty path.
    #[must_use]
    pub const fn new() -> Self {
        Self::ROOT
    }

    /// Appends a name segment to the path.
    ///
    /// Returns `false` if the path is already at maximum capacity.
    pub fn push(&mut self, seg: NameSeg) -> bool {
        if (self.len as usize) >= MAX_PATH_DEPTH {
            return false;
        }
        self.segments[self.len as usize] = seg;
        self.len += 1;
        true
    }

    /// Removes and returns the last name segment from the path.
    pub fn pop(&mut self) -> Option<NameSeg> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.segments[self.len as usize])
    }

    /// Returns the segments of this path.
    #[must_use]
    pub fn segments(&self) -> &[NameSeg] {
        &self.segments[..self.len as usize]
    }

    /// Returns the number of segments (depth) in this path.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.len as usize
    }

    /// Resolve `name` relative to this scope.
    ///
    /// A root prefix restarts from `\`, each parent prefix drops one segment
    /// and the name's segments are appended.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::PathOverflow`] if the name climbs above the root
    /// or the result exceeds the maximum depth.
    pub fn resolve(&self, name: &AmlNameString) -> Result<Self, AmlError> {
        let mut path = if name.is_absolute() { Self::ROOT } else { *self };
        for _ in 0..name.parent_prefixes() {
            path.pop().ok_or(AmlError::PathOverflow)?;
        }
        for &seg in name.segments() {
            if !path.push(seg) {
                return Err(AmlError::PathOverflow);
            }
        }
        Ok(path)
    }
}

impl Default for AmlPath {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for AmlPath {
    fn eq(&self, other: &Self) -> bool {
        self.segments() == other.segments()
    }
}

impl Eq for AmlPath {}

impl core::fmt::Debug for AmlPath {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(self, f)
    }
}

impl core::fmt::Display for AmlPath {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "\\")?;
        for (i, seg) in self.segments().iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

/// A decoded AML NameString.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmlNameString {
    absolute: bool,
    parent_prefixes: usize,
    segments: Vec<NameSeg>,
}

impl AmlNameString {
    /// Build a name string from its parts.
    #[must_use]
    pub fn new(absolute: bool, parent_prefixes: usize, segments: Vec<NameSeg>) -> Self {
        Self {
            absolute,
            parent_prefixes: if absolute { 0 } else { parent_prefixes },
            segments,
        }
    }

    /// Decode the NameString at the start of `data`.
    ///
    /// Returns the name and the number of bytes it occupies.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::UnexpectedEnd`] if `data` is truncated, or
    /// [`AmlError::InvalidAml`] if it is not a well-formed NameString.
    pub fn parse(data: &[u8]) -> Result<(Self, usize), AmlError> {
        let mut pos = 0;
        let mut absolute = false;
        let mut parent_prefixes = 0;

        match data.first() {
            Some(&ROOT_CHAR) => {
                absolute = true;
                pos = 1;
            }
            Some(&PARENT_PREFIX_CHAR) => {
                while data.get(pos) == Some(&PARENT_PREFIX_CHAR) {
                    parent_prefixes += 1;
                    pos += 1;
                }
            }
            Some(_) => {}
            None => return Err(AmlError::UnexpectedEnd),
        }

        let lead = *data.get(pos).ok_or(AmlError::UnexpectedEnd)?;
        let seg_count = match lead {
            NULL_NAME => {
                pos += 1;
                0
            }
            DUAL_NAME_PREFIX => {
                pos += 1;
                2
            }
            MULTI_NAME_PREFIX => {
                let count = *data.get(pos + 1).ok_or(AmlError::UnexpectedEnd)?;
                pos += 2;
                if count == 0 {
                    return Err(AmlError::InvalidAml);
                }
                usize::from(count)
            }
            c if is_lead_name_char(c) => 1,
            _ => return Err(AmlError::InvalidAml),
        };

        let mut segments = Vec::new();
        segments
            .try_reserve_exact(seg_count)
            .map_err(|_| AmlError::OutOfResources)?;
        for _ in 0..seg_count {
            let bytes = data.get(pos..pos + 4).ok_or(AmlError::UnexpectedEnd)?;
            segments.push(NameSeg::from_bytes(bytes).ok_or(AmlError::InvalidAml)?);
            pos += 4;
        }

        Ok((
            Self {
                absolute,
                parent_prefixes,
                segments,
            },
            pos,
        ))
    }

    /// Convert an ASL path such as `\_SB_.COM0._UID` or `^^PCI0`.
    ///
    /// Segments shorter than four characters are padded with `_`.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::InvalidParameter`] if a segment is empty, too long
    /// or contains an illegal character.
    pub fn from_asl(path: &str) -> Result<Self, AmlError> {
        let (absolute, rest) = match path.strip_prefix('\\') {
            Some(rest) => (true, rest),
            None => (false, path),
        };
        let trimmed = rest.trim_start_matches('^');
        let parent_prefixes = rest.len() - trimmed.len();
        if absolute && parent_prefixes != 0 {
            return Err(AmlError::InvalidParameter);
        }

        let mut segments = Vec::new();
        if !trimmed.is_empty() {
            for part in trimmed.split('.') {
                let seg = NameSeg::from_asl(part).ok_or(AmlError::InvalidParameter)?;
                segments
                    .try_reserve(1)
                    .map_err(|_| AmlError::OutOfResources)?;
                segments.push(seg);
            }
        }
        if segments.len() > usize::from(u8::MAX) {
            return Err(AmlError::InvalidParameter);
        }

        Ok(Self {
            absolute,
            parent_prefixes,
            segments,
        })
    }

    /// Encode this name into its AML byte form.
    ///
    /// # Errors
    ///
    /// Returns [`AmlError::OutOfResources`] if the output cannot be allocated.
    pub fn to_aml_bytes(&self) -> Result<Vec<u8>, AmlError> {
        let mut out = Vec::new();
        out.try_reserve_exact(self.encoded_size())
            .map_err(|_| AmlError::OutOfResources)?;

        if self.absolute {
            out.push(ROOT_CHAR);
        }
        out.extend(core::iter::repeat_n(PARENT_PREFIX_CHAR, self.parent_prefixes));
        match self.segments.len() {
            0 => out.push(NULL_NAME),
            1 => {}
            2 => out.push(DUAL_NAME_PREFIX),
            n => {
                out.push(MULTI_NAME_PREFIX);
                out.push(n as u8);
            }
        }
        for seg in &self.segments {
            out.extend_from_slice(&seg.0);
        }
        Ok(out)
    }

    /// Number of bytes [`to_aml_bytes`](Self::to_aml_bytes) produces.
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        let prefix = usize::from(self.absolute) + self.parent_prefixes;
        let header = match self.segments.len() {
            0 | 2 => 1,
            1 => 0,
            _ => 2,
        };
        prefix + header + self.segments.len() * 4
    }

    /// Returns `true` if the name starts at the namespace root.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Number of `^` prefixes.
    #[must_use]
    pub fn parent_prefixes(&self) -> usize {
        self.parent_prefixes
    }

    /// The name segments, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[NameSeg] {
        &self.segments
    }
}

/// Returns the size of the well-formed NameString at the start of `data`.
#[must_use]
pub fn name_string_size(data: &[u8]) -> Option<usize> {
    AmlNameString::parse(data).ok().map(|(_, size)| size)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::format;

    #[test]
    fn asl_padding_and_validation() {
        assert_eq!(NameSeg::from_asl("_SB").unwrap().as_str(), "_SB_");
        assert!(NameSeg::from_asl("COM0").is_some());
        assert!(NameSeg::from_asl("0COM").is_none());
        assert!(NameSeg::from_asl("COM00").is_none());
        assert!(NameSeg::from_asl("com0").is_none());
    }

    #[test]
    fn asl_path_to_aml() {
        let name = AmlNameString::from_asl("\\_SB_.COM0._UID").unwrap();
        let bytes = name.to_aml_bytes().unwrap();
        assert_eq!(&bytes[..3], &[ROOT_CHAR, MULTI_NAME_PREFIX, 3]);
        assert_eq!(&bytes[3..], b"_SB_COM0_UID");
        assert_eq!(bytes.len(), name.encoded_size());

        let dual = AmlNameString::from_asl("^PCI0.DEV").unwrap();
        assert_eq!(
            dual.to_aml_bytes().unwrap(),
            b"^\x2EPCI0DEV_".as_slice()
        );

        let single = AmlNameString::from_asl("COM0").unwrap();
        assert_eq!(single.to_aml_bytes().unwrap(), b"COM0".as_slice());
    }

    #[test]
    fn parse_matches_size() {
        let bytes = b"\\\x2F\x02_SB_PCI0trailing";
        let (name, size) = AmlNameString::parse(bytes).unwrap();
        assert_eq!(size, 11);
        assert!(name.is_absolute());
        assert_eq!(name.segments().len(), 2);
        assert_eq!(name_string_size(bytes), Some(11));
        assert_eq!(name_string_size(b"\\\x00"), Some(2));
        assert_eq!(name_string_size(b"_SB"), None);
        assert_eq!(name_string_size(b"\x2F\x00"), None);
    }

    #[test]
    fn resolve_against_scope() {
        let mut scope = AmlPath::new();
        scope.push(NameSeg(*b"_SB_"));
        scope.push(NameSeg(*b"COM0"));

        let rel = AmlNameString::from_asl("_UID").unwrap();
        assert_eq!(format!("{}", scope.resolve(&rel).unwrap()), "\\_SB_.COM0._UID");

        let up = AmlNameString::from_asl("^COM1").unwrap();
        assert_eq!(format!("{}", scope.resolve(&up).unwrap()), "\\_SB_.COM1");

        let abs = AmlNameString::from_asl("\\_TZ_").unwrap();
        assert_eq!(format!("{}", scope.resolve(&abs).unwrap()), "\\_TZ_");

        let too_far = AmlNameString::from_asl("^^^X").unwrap();
        assert_eq!(scope.resolve(&too_far), Err(AmlError::PathOverflow));
    }
}
