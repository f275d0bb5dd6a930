//! Static AML opcode encoding table.
//!
//! Each [`AmlByteEncoding`] describes the shape of one opcode: how many fixed
//! arguments it carries and how each one is encoded, whether it is followed
//! by a PkgLength, and what kind of variable argument list (term list, byte
//! list, field list) it owns. Object nodes keep a `&'static` reference to
//! their entry.

use bitflags::bitflags;

/// Maximum number of fixed arguments an opcode can carry.
pub const MAX_FIXED_ARGS: usize = 6;

/// `ZeroOp`.
pub const ZERO_OP: u8 = 0x00;
/// `OneOp`.
pub const ONE_OP: u8 = 0x01;
/// `AliasOp`.
pub const ALIAS_OP: u8 = 0x06;
/// `NameOp`.
pub const NAME_OP: u8 = 0x08;
/// `BytePrefix`.
pub const BYTE_PREFIX: u8 = 0x0A;
/// `WordPrefix`.
pub const WORD_PREFIX: u8 = 0x0B;
/// `DWordPrefix`.
pub const DWORD_PREFIX: u8 = 0x0C;
/// `StringPrefix`.
pub const STRING_PREFIX: u8 = 0x0D;
/// `QWordPrefix`.
pub const QWORD_PREFIX: u8 = 0x0E;
/// `ScopeOp`.
pub const SCOPE_OP: u8 = 0x10;
/// `BufferOp`.
pub const BUFFER_OP: u8 = 0x11;
/// `PackageOp`.
pub const PACKAGE_OP: u8 = 0x12;
/// `VarPackageOp`.
pub const VAR_PACKAGE_OP: u8 = 0x13;
/// `MethodOp`.
pub const METHOD_OP: u8 = 0x14;
/// `ExtOpPrefix`.
pub const EXT_OP_PREFIX: u8 = 0x5B;
/// `ReturnOp`.
pub const RETURN_OP: u8 = 0xA4;
/// `OnesOp`.
pub const ONES_OP: u8 = 0xFF;

/// `DeviceOp` (after [`EXT_OP_PREFIX`]).
pub const DEVICE_OP: u8 = 0x82;
/// `FieldOp` (after [`EXT_OP_PREFIX`]).
pub const FIELD_OP: u8 = 0x81;

/// Field list `ReservedField` lead byte.
pub const FIELD_RESERVED_OP: u8 = 0x00;
/// Field list `AccessField` lead byte.
pub const FIELD_ACCESS_OP: u8 = 0x01;
/// Field list `ConnectField` lead byte.
pub const FIELD_CONNECTION_OP: u8 = 0x02;
/// Field list `ExtendedAccessField` lead byte.
pub const FIELD_EXT_ACCESS_OP: u8 = 0x03;
/// Pseudo opcode of a `NamedField`, which has no lead byte in the stream.
pub const FIELD_NAMED_OP: u8 = 0x04;

/// How a fixed argument is encoded in the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmlParseFormat {
    /// Unused slot.
    None,
    /// 1-byte integer.
    UInt8,
    /// 2-byte little-endian integer.
    UInt16,
    /// 4-byte little-endian integer.
    UInt32,
    /// 8-byte little-endian integer.
    UInt64,
    /// NameString.
    Name,
    /// Null-terminated ASCII string.
    String,
    /// A nested AML object (TermArg, DataRefObject, ...).
    Object,
    /// PkgLength-encoded bit length of a field element.
    FieldPkgLen,
}

impl AmlParseFormat {
    /// Byte width of the integer formats, `None` for the others.
    #[must_use]
    pub const fn integer_width(self) -> Option<usize> {
        match self {
            Self::UInt8 => Some(1),
            Self::UInt16 => Some(2),
            Self::UInt32 => Some(4),
            Self::UInt64 => Some(8),
            _ => None,
        }
    }
}

bitflags! {
    /// Opcode attributes from the encoding table.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EncodingAttributes: u32 {
        /// A PkgLength follows the opcode.
        const HAS_PKG_LENGTH   = 1 << 0;
        /// The variable arguments are a list of AML objects.
        const HAS_CHILD_OBJ    = 1 << 1;
        /// The variable arguments are a byte list (raw or resource data).
        const HAS_BYTE_LIST    = 1 << 2;
        /// The variable arguments are field elements.
        const HAS_FIELD_LIST   = 1 << 3;
        /// The object declares a name in the ACPI namespace.
        const IN_NAMESPACE     = 1 << 4;
        /// The object is an element of a field list.
        const IS_FIELD_ELEMENT = 1 << 5;
    }
}

/// Shape of one AML opcode.
#[derive(Debug, PartialEq, Eq)]
pub struct AmlByteEncoding {
    /// ASL name of the opcode, for diagnostics.
    pub name: &'static str,
    /// Opcode byte ([`EXT_OP_PREFIX`] for extended opcodes).
    pub op_code: u8,
    /// Second opcode byte of extended opcodes, 0 otherwise.
    pub sub_op_code: u8,
    /// Encoding of each fixed argument.
    pub formats: [AmlParseFormat; MAX_FIXED_ARGS],
    /// Number of fixed arguments.
    pub fixed_arg_count: u8,
    /// Index of the fixed argument holding the declared name, if
    /// [`EncodingAttributes::IN_NAMESPACE`] is set.
    pub name_index: u8,
    /// Attribute flags.
    pub attributes: EncodingAttributes,
}

impl AmlByteEncoding {
    /// Returns `true` if the opcode is preceded by [`EXT_OP_PREFIX`].
    #[must_use]
    pub fn is_ext_op(&self) -> bool {
        self.op_code == EXT_OP_PREFIX && !self.is_field_element()
    }

    /// Returns `true` for field list elements.
    #[must_use]
    pub fn is_field_element(&self) -> bool {
        self.attributes.contains(EncodingAttributes::IS_FIELD_ELEMENT)
    }

    /// Number of opcode bytes emitted in the stream.
    #[must_use]
    pub fn opcode_size(&self) -> usize {
        if self.is_field_element() {
            usize::from(self.op_code != FIELD_NAMED_OP)
        } else if self.is_ext_op() {
            2
        } else {
            1
        }
    }

    /// Returns `true` if the attribute set contains `attr`.
    #[must_use]
    pub fn has(&self, attr: EncodingAttributes) -> bool {
        self.attributes.contains(attr)
    }

    /// Returns `true` if the object opens a new namespace scope for its
    /// variable arguments (Scope, Device, Method, ...).
    #[must_use]
    pub fn opens_scope(&self) -> bool {
        self.has(EncodingAttributes::IN_NAMESPACE) && self.has(EncodingAttributes::HAS_PKG_LENGTH)
    }

    /// Returns `true` if this entry matches `(op_code, sub_op_code)`.
    #[must_use]
    pub fn matches(&self, op_code: u8, sub_op_code: u8) -> bool {
        !self.is_field_element() && self.op_code == op_code && self.sub_op_code == sub_op_code
    }
}

const NONE: AmlParseFormat = AmlParseFormat::None;
const U8: AmlParseFormat = AmlParseFormat::UInt8;
const U16: AmlParseFormat = AmlParseFormat::UInt16;
const U32: AmlParseFormat = AmlParseFormat::UInt32;
const U64: AmlParseFormat = AmlParseFormat::UInt64;
const NAME: AmlParseFormat = AmlParseFormat::Name;
const STR: AmlParseFormat = AmlParseFormat::String;
const OBJ: AmlParseFormat = AmlParseFormat::Object;
const FPL: AmlParseFormat = AmlParseFormat::FieldPkgLen;

const NO_ATTR: EncodingAttributes = EncodingAttributes::empty();
const NS: EncodingAttributes = EncodingAttributes::IN_NAMESPACE;
const PKG_CHILD: EncodingAttributes =
    EncodingAttributes::HAS_PKG_LENGTH.union(EncodingAttributes::HAS_CHILD_OBJ);
const PKG_CHILD_NS: EncodingAttributes = PKG_CHILD.union(NS);
const PKG_BYTES: EncodingAttributes =
    EncodingAttributes::HAS_PKG_LENGTH.union(EncodingAttributes::HAS_BYTE_LIST);
const PKG_FIELDS: EncodingAttributes =
    EncodingAttributes::HAS_PKG_LENGTH.union(EncodingAttributes::HAS_FIELD_LIST);
const FIELD_ELEM: EncodingAttributes = EncodingAttributes::IS_FIELD_ELEMENT;

/// Build a table entry; unused format slots are filled with `None`.
const fn op<const N: usize>(
    name: &'static str,
    op_code: u8,
    sub_op_code: u8,
    args: [AmlParseFormat; N],
    name_index: u8,
    attributes: EncodingAttributes,
) -> AmlByteEncoding {
    let mut formats = [NONE; MAX_FIXED_ARGS];
    let mut i = 0;
    while i < N {
        formats[i] = args[i];
        i += 1;
    }
    AmlByteEncoding {
        name,
        op_code,
        sub_op_code,
        formats,
        fixed_arg_count: N as u8,
        name_index,
        attributes,
    }
}

/// Encoding of `ZeroOp`.
pub static ZERO: AmlByteEncoding = op("Zero", ZERO_OP, 0, [], 0, NO_ATTR);
/// Encoding of `OneOp`.
pub static ONE: AmlByteEncoding = op("One", ONE_OP, 0, [], 0, NO_ATTR);
/// Encoding of `OnesOp`.
pub static ONES: AmlByteEncoding = op("Ones", ONES_OP, 0, [], 0, NO_ATTR);
/// Encoding of `NameOp`.
pub static NAME_ENC: AmlByteEncoding = op("Name", NAME_OP, 0, [NAME, OBJ], 0, NS);
/// Encoding of `BytePrefix`.
pub static BYTE: AmlByteEncoding = op("Byte", BYTE_PREFIX, 0, [U8], 0, NO_ATTR);
/// Encoding of `WordPrefix`.
pub static WORD: AmlByteEncoding = op("Word", WORD_PREFIX, 0, [U16], 0, NO_ATTR);
/// Encoding of `DWordPrefix`.
pub static DWORD: AmlByteEncoding = op("DWord", DWORD_PREFIX, 0, [U32], 0, NO_ATTR);
/// Encoding of `QWordPrefix`.
pub static QWORD: AmlByteEncoding = op("QWord", QWORD_PREFIX, 0, [U64], 0, NO_ATTR);
/// Encoding of `StringPrefix`.
pub static STRING: AmlByteEncoding = op("String", STRING_PREFIX, 0, [STR], 0, NO_ATTR);
/// Encoding of `ScopeOp`.
pub static SCOPE: AmlByteEncoding = op("Scope", SCOPE_OP, 0, [NAME], 0, PKG_CHILD_NS);
/// Encoding of `BufferOp`.
pub static BUFFER: AmlByteEncoding = op("Buffer", BUFFER_OP, 0, [OBJ], 0, PKG_BYTES);
/// Encoding of `PackageOp`.
pub static PACKAGE: AmlByteEncoding = op("Package", PACKAGE_OP, 0, [U8], 0, PKG_CHILD);
/// Encoding of `MethodOp`.
pub static METHOD: AmlByteEncoding = op("Method", METHOD_OP, 0, [NAME, U8], 0, PKG_CHILD_NS);
/// Encoding of `ReturnOp`.
pub static RETURN: AmlByteEncoding = op("Return", RETURN_OP, 0, [OBJ], 0, NO_ATTR);
/// Encoding of `DeviceOp`.
pub static DEVICE: AmlByteEncoding =
    op("Device", EXT_OP_PREFIX, DEVICE_OP, [NAME], 0, PKG_CHILD_NS);
/// Encoding of a `NamedField` field element.
pub static NAMED_FIELD: AmlByteEncoding =
    op("NamedField", FIELD_NAMED_OP, 0, [NAME, FPL], 0, FIELD_ELEM.union(NS));

/// Every opcode the tree editor understands, outside of field lists.
static AML_ENCODINGS: &[&AmlByteEncoding] = &[
    &ZERO,
    &ONE,
    &op("Alias", ALIAS_OP, 0, [NAME, NAME], 1, NS),
    &NAME_ENC,
    &BYTE,
    &WORD,
    &DWORD,
    &STRING,
    &QWORD,
    &SCOPE,
    &BUFFER,
    &PACKAGE,
    &op("VarPackage", VAR_PACKAGE_OP, 0, [OBJ], 0, PKG_CHILD),
    &METHOD,
    &op("External", 0x15, 0, [NAME, U8, U8], 0, NO_ATTR),
    &op("Local0", 0x60, 0, [], 0, NO_ATTR),
    &op("Local1", 0x61, 0, [], 0, NO_ATTR),
    &op("Local2", 0x62, 0, [], 0, NO_ATTR),
    &op("Local3", 0x63, 0, [], 0, NO_ATTR),
    &op("Local4", 0x64, 0, [], 0, NO_ATTR),
    &op("Local5", 0x65, 0, [], 0, NO_ATTR),
    &op("Local6", 0x66, 0, [], 0, NO_ATTR),
    &op("Local7", 0x67, 0, [], 0, NO_ATTR),
    &op("Arg0", 0x68, 0, [], 0, NO_ATTR),
    &op("Arg1", 0x69, 0, [], 0, NO_ATTR),
    &op("Arg2", 0x6A, 0, [], 0, NO_ATTR),
    &op("Arg3", 0x6B, 0, [], 0, NO_ATTR),
    &op("Arg4", 0x6C, 0, [], 0, NO_ATTR),
    &op("Arg5", 0x6D, 0, [], 0, NO_ATTR),
    &op("Arg6", 0x6E, 0, [], 0, NO_ATTR),
    &op("Store", 0x70, 0, [OBJ, OBJ], 0, NO_ATTR),
    &op("RefOf", 0x71, 0, [OBJ], 0, NO_ATTR),
    &op("Add", 0x72, 0, [OBJ, OBJ, OBJ], 0, NO_ATTR),
    &op("Concatenate", 0x73, 0, [OBJ, OBJ, OBJ], 0, NO_ATTR),
    &op("Subtract", 0x74, 0, [OBJ, OBJ, OBJ], 0, NO_ATTR),
    &op("Increment", 0x75, 0, [OBJ], 0, NO_ATTR),
    &op("Decrement", 0x76, 0, [OBJ], 0, NO_ATTR),
    &op("Multiply", 0x77, 0, [OBJ, OBJ, OBJ], 0, NO_ATTR),
    &op("Divide", 0x78, 0, [OBJ, OBJ, OBJ, OBJ], 0, NO_ATTR),
    &op("ShiftLeft", 0x79, 0, [OBJ, OBJ, OBJ], 0, NO_ATTR),
    &op("ShiftRight", 0x7A, 0, [OBJ, OBJ, OBJ], 0, NO_ATTR),
    &op("And", 0x7B, 0, [OBJ, OBJ, OBJ], 0, NO_ATTR),
    &op("NAnd", 0x7C, 0, [OBJ, OBJ, OBJ], 0, NO_ATTR),
    &op("Or", 0x7D, 0, [OBJ, OBJ, OBJ], 0, NO_ATTR),
    &op("NOr", 0x7E, 0, [OBJ, OBJ, OBJ], 0, NO_ATTR),
    &op("XOr", 0x7F, 0, [OBJ, OBJ, OBJ], 0, NO_ATTR),
    &op("Not", 0x80, 0, [OBJ, OBJ], 0, NO_ATTR),
    &op("FindSetLeftBit", 0x81, 0, [OBJ, OBJ], 0, NO_ATTR),
    &op("FindSetRightBit", 0x82, 0, [OBJ, OBJ], 0, NO_ATTR),
    &op("DerefOf", 0x83, 0, [OBJ], 0, NO_ATTR),
    &op("ConcatenateResTemplate", 0x84, 0, [OBJ, OBJ, OBJ], 0, NO_ATTR),
    &op("Mod", 0x85, 0, [OBJ, OBJ, OBJ], 0, NO_ATTR),
    &op("Notify", 0x86, 0, [OBJ, OBJ], 0, NO_ATTR),
    &op("SizeOf", 0x87, 0, [OBJ], 0, NO_ATTR),
    &op("Index", 0x88, 0, [OBJ, OBJ, OBJ], 0, NO_ATTR),
    &op("Match", 0x89, 0, [OBJ, U8, OBJ, U8, OBJ, OBJ], 0, NO_ATTR),
    &op("CreateDWordField", 0x8A, 0, [OBJ, OBJ, NAME], 2, NS),
    &op("CreateWordField", 0x8B, 0, [OBJ, OBJ, NAME], 2, NS),
    &op("CreateByteField", 0x8C, 0, [OBJ, OBJ, NAME], 2, NS),
    &op("CreateBitField", 0x8D, 0, [OBJ, OBJ, NAME], 2, NS),
    &op("ObjectType", 0x8E, 0, [OBJ], 0, NO_ATTR),
    &op("CreateQWordField", 0x8F, 0, [OBJ, OBJ, NAME], 2, NS),
    &op("LAnd", 0x90, 0, [OBJ, OBJ], 0, NO_ATTR),
    &op("LOr", 0x91, 0, [OBJ, OBJ], 0, NO_ATTR),
    &op("LNot", 0x92, 0, [OBJ], 0, NO_ATTR),
    &op("LEqual", 0x93, 0, [OBJ, OBJ], 0, NO_ATTR),
    &op("LGreater", 0x94, 0, [OBJ, OBJ], 0, NO_ATTR),
    &op("LLess", 0x95, 0, [OBJ, OBJ], 0, NO_ATTR),
    &op("ToBuffer", 0x96, 0, [OBJ, OBJ], 0, NO_ATTR),
    &op("ToDecimalString", 0x97, 0, [OBJ, OBJ], 0, NO_ATTR),
    &op("ToHexString", 0x98, 0, [OBJ, OBJ], 0, NO_ATTR),
    &op("ToInteger", 0x99, 0, [OBJ, OBJ], 0, NO_ATTR),
    &op("ToString", 0x9C, 0, [OBJ, OBJ, OBJ], 0, NO_ATTR),
    &op("CopyObject", 0x9D, 0, [OBJ, OBJ], 0, NO_ATTR),
    &op("Mid", 0x9E, 0, [OBJ, OBJ, OBJ, OBJ], 0, NO_ATTR),
    &op("Continue", 0x9F, 0, [], 0, NO_ATTR),
    &op("If", 0xA0, 0, [OBJ], 0, PKG_CHILD),
    &op("Else", 0xA1, 0, [], 0, PKG_CHILD),
    &op("While", 0xA2, 0, [OBJ], 0, PKG_CHILD),
    &op("NoOp", 0xA3, 0, [], 0, NO_ATTR),
    &RETURN,
    &op("Break", 0xA5, 0, [], 0, NO_ATTR),
    &op("BreakPoint", 0xCC, 0, [], 0, NO_ATTR),
    &ONES,
    &op("Mutex", EXT_OP_PREFIX, 0x01, [NAME, U8], 0, NS),
    &op("Event", EXT_OP_PREFIX, 0x02, [NAME], 0, NS),
    &op("CondRefOf", EXT_OP_PREFIX, 0x12, [OBJ, OBJ], 0, NO_ATTR),
    &op("CreateField", EXT_OP_PREFIX, 0x13, [OBJ, OBJ, OBJ, NAME], 3, NS),
    &op("LoadTable", EXT_OP_PREFIX, 0x1F, [OBJ, OBJ, OBJ, OBJ, OBJ, OBJ], 0, NO_ATTR),
    &op("Load", EXT_OP_PREFIX, 0x20, [NAME, OBJ], 0, NO_ATTR),
    &op("Stall", EXT_OP_PREFIX, 0x21, [OBJ], 0, NO_ATTR),
    &op("Sleep", EXT_OP_PREFIX, 0x22, [OBJ], 0, NO_ATTR),
    &op("Acquire", EXT_OP_PREFIX, 0x23, [OBJ, U16], 0, NO_ATTR),
    &op("Signal", EXT_OP_PREFIX, 0x24, [OBJ], 0, NO_ATTR),
    &op("Wait", EXT_OP_PREFIX, 0x25, [OBJ, OBJ], 0, NO_ATTR),
    &op("Reset", EXT_OP_PREFIX, 0x26, [OBJ], 0, NO_ATTR),
    &op("Release", EXT_OP_PREFIX, 0x27, [OBJ], 0, NO_ATTR),
    &op("FromBCD", EXT_OP_PREFIX, 0x28, [OBJ, OBJ], 0, NO_ATTR),
    &op("ToBCD", EXT_OP_PREFIX, 0x29, [OBJ, OBJ], 0, NO_ATTR),
    &op("Revision", EXT_OP_PREFIX, 0x30, [], 0, NO_ATTR),
    &op("Debug", EXT_OP_PREFIX, 0x31, [], 0, NO_ATTR),
    &op("Fatal", EXT_OP_PREFIX, 0x32, [U8, U32, OBJ], 0, NO_ATTR),
    &op("Timer", EXT_OP_PREFIX, 0x33, [], 0, NO_ATTR),
    &op("OperationRegion", EXT_OP_PREFIX, 0x80, [NAME, U8, OBJ, OBJ], 0, NS),
    &op("Field", EXT_OP_PREFIX, FIELD_OP, [NAME, U8], 0, PKG_FIELDS),
    &DEVICE,
    &op("Processor", EXT_OP_PREFIX, 0x83, [NAME, U8, U32, U8], 0, PKG_CHILD_NS),
    &op("PowerResource", EXT_OP_PREFIX, 0x84, [NAME, U8, U16], 0, PKG_CHILD_NS),
    &op("ThermalZone", EXT_OP_PREFIX, 0x85, [NAME], 0, PKG_CHILD_NS),
    &op("IndexField", EXT_OP_PREFIX, 0x86, [NAME, NAME, U8], 0, PKG_FIELDS),
    &op("BankField", EXT_OP_PREFIX, 0x87, [NAME, NAME, OBJ, U8], 0, PKG_FIELDS),
    &op("DataTableRegion", EXT_OP_PREFIX, 0x88, [NAME, OBJ, OBJ, OBJ], 0, NS),
];

/// Field list elements.
static FIELD_ENCODINGS: &[&AmlByteEncoding] = &[
    &op("ReservedField", FIELD_RESERVED_OP, 0, [FPL], 0, FIELD_ELEM),
    &op("AccessField", FIELD_ACCESS_OP, 0, [U8, U8], 0, FIELD_ELEM),
    &op("ConnectField", FIELD_CONNECTION_OP, 0, [OBJ], 0, FIELD_ELEM),
    &op("ExtendedAccessField", FIELD_EXT_ACCESS_OP, 0, [U8, U8, U8], 0, FIELD_ELEM),
    &NAMED_FIELD,
];

/// Look up the encoding of `(op_code, sub_op_code)`.
///
/// `sub_op_code` is ignored unless `op_code` is [`EXT_OP_PREFIX`].
#[must_use]
pub fn lookup(op_code: u8, sub_op_code: u8) -> Option<&'static AmlByteEncoding> {
    let sub_op_code = if op_code == EXT_OP_PREFIX { sub_op_code } else { 0 };
    AML_ENCODINGS
        .iter()
        .copied()
        .find(|enc| enc.matches(op_code, sub_op_code))
}

/// Look up the field list element starting with `lead`.
///
/// Lead name characters select [`NAMED_FIELD`].
#[must_use]
pub fn lookup_field_element(lead: u8) -> Option<&'static AmlByteEncoding> {
    if crate::name::is_lead_name_char(lead) {
        return Some(&NAMED_FIELD);
    }
    if lead == FIELD_NAMED_OP {
        return None;
    }
    FIELD_ENCODINGS
        .iter()
        .copied()
        .find(|enc| enc.op_code == lead)
}

/// Returns `true` for the sized integer prefixes (Byte, Word, DWord, QWord).
#[must_use]
pub fn is_integer_encoding(enc: &AmlByteEncoding) -> bool {
    !enc.is_field_element()
        && matches!(
            enc.op_code,
            BYTE_PREFIX | WORD_PREFIX | DWORD_PREFIX | QWORD_PREFIX
        )
}

/// Returns `true` for Zero, One and Ones.
#[must_use]
pub fn is_special_integer_encoding(enc: &AmlByteEncoding) -> bool {
    !enc.is_field_element() && matches!(enc.op_code, ZERO_OP | ONE_OP | ONES_OP)
}

/// Smallest sized-integer encoding able to hold `value`.
#[must_use]
pub fn integer_encoding_for(value: u64) -> &'static AmlByteEncoding {
    if value <= u64::from(u8::MAX) {
        &BYTE
    } else if value <= u64::from(u16::MAX) {
        &WORD
    } else if value <= u64::from(u32::MAX) {
        &DWORD
    } else {
        &QWORD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_plain_and_extended() {
        assert_eq!(lookup(NAME_OP, 0).unwrap().name, "Name");
        assert_eq!(lookup(EXT_OP_PREFIX, DEVICE_OP).unwrap().name, "Device");
        assert_eq!(lookup(EXT_OP_PREFIX, 0x80).unwrap().fixed_arg_count, 4);
        assert!(lookup(EXT_OP_PREFIX, 0x7F).is_none());
        assert_eq!(lookup(0x89, 0).unwrap().fixed_arg_count, 6);
        assert_eq!(lookup(EXT_OP_PREFIX, 0x13).unwrap().name_index, 3);
        assert_eq!(lookup(EXT_OP_PREFIX, 0x23).unwrap().formats[1], AmlParseFormat::UInt16);
        // A plain opcode ignores the sub opcode.
        assert_eq!(lookup(SCOPE_OP, 0x42).unwrap().name, "Scope");
    }

    #[test]
    fn field_elements() {
        assert_eq!(lookup_field_element(b'F').unwrap().name, "NamedField");
        assert_eq!(lookup_field_element(0x00).unwrap().name, "ReservedField");
        assert!(lookup_field_element(FIELD_NAMED_OP).is_none());
        assert_eq!(NAMED_FIELD.opcode_size(), 0);
        assert_eq!(lookup_field_element(0x01).unwrap().opcode_size(), 1);
        // Field list ReservedField (0x00) must not shadow ZeroOp.
        assert_eq!(lookup(0x00, 0).unwrap().name, "Zero");
    }

    #[test]
    fn opcode_sizes_and_scopes() {
        assert_eq!(DEVICE.opcode_size(), 2);
        assert_eq!(BYTE.opcode_size(), 1);
        assert!(DEVICE.opens_scope());
        assert!(METHOD.opens_scope());
        assert!(!NAME_ENC.opens_scope());
        assert!(BUFFER.has(EncodingAttributes::HAS_BYTE_LIST));
    }

    #[test]
    fn integer_widths() {
        assert_eq!(integer_encoding_for(0xFF).op_code, BYTE_PREFIX);
        assert_eq!(integer_encoding_for(0x100).op_code, WORD_PREFIX);
        assert_eq!(integer_encoding_for(0x0900_0000).op_code, DWORD_PREFIX);
        assert_eq!(integer_encoding_for(u64::MAX).op_code, QWORD_PREFIX);
        assert!(is_special_integer_encoding(&ONES));
        assert!(!is_integer_encoding(&ONES));
    }
}
