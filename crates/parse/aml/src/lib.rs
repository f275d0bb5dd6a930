//! `hadron-aml` --- a standalone, `no_std` AML tree editor.
//!
//! This crate turns a DSDT/SSDT definition block into an in-memory tree of
//! AML nodes, lets callers inspect and edit that tree, and serializes it back
//! into a checksummed ACPI table. It is the building block used to fix up
//! pre-compiled SSDT templates (serial ports, devices, ...) at boot.
//!
//! The tree is made of three node kinds:
//!
//! - a single **Root** node holding the ACPI table header and the top-level
//!   terms of the definition block,
//! - **Object** nodes, one per AML opcode, with index-addressed *fixed*
//!   arguments followed by a list of *variable* arguments,
//! - **Data** nodes, leaves holding raw bytes (integers, strings, name
//!   strings, resource descriptors, ...).
//!
//! Nodes live in an arena owned by [`AmlTree`] and are addressed by
//! [`NodeId`] handles. Every mutation that changes the encoded size of a node
//! propagates the difference to the `PkgLen` of its ancestors and to the
//! table length stored in the Root node.
//!
//! # Usage
//!
//! ```ignore
//! let mut tree = hadron_aml::parse_definition_block(ssdt_bytes)?;
//! let uid = tree.find_node(tree.root(), "\\_SB_.COM0._UID")?;
//! tree.name_op_update_integer(uid, 3)?;
//! let table = tree.serialize_definition_block()?;
//! ```

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

pub mod api;
pub mod codegen;
pub mod encoding;
pub mod find;
pub mod interface;
pub mod name;
pub mod node;
pub mod parser;
pub mod pkg_len;
pub mod propagate;
pub mod resource;
pub mod sdt;
pub mod serialize;
pub mod traversal;
pub mod tree;

#[cfg(test)]
mod test_util;

// Re-export key types at crate root for convenience.
pub use encoding::{AmlByteEncoding, AmlParseFormat, EncodingAttributes};
pub use interface::ObjectNodeInfo;
pub use name::{AmlNameString, AmlPath, NameSeg};
pub use node::{AmlDataType, AmlNodeType, NodeId};
pub use parser::parse_definition_block;
pub use resource::AcpiResource;
pub use sdt::SdtHeader;
pub use tree::AmlTree;

/// Errors returned by AML tree operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmlError {
    /// A precondition on a node kind, argument or value range was violated.
    InvalidParameter,
    /// The operation is not allowed for this node's role in the tree.
    Unsupported,
    /// A buffer or arena allocation failed.
    OutOfResources,
    /// A path lookup did not match any node.
    NotFound,
    /// The AML stream ended unexpectedly.
    UnexpectedEnd,
    /// A PkgLength encoding was invalid or out of range.
    InvalidPkgLength,
    /// An [`AmlPath`] exceeded its maximum depth or climbed above the root.
    PathOverflow,
    /// The AML bytecode contained an invalid or unsupported construct.
    InvalidAml,
    /// The table signature is not a definition block signature.
    InvalidSignature,
    /// The table checksum did not validate (sum != 0).
    InvalidChecksum,
}

impl core::fmt::Display for AmlError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidParameter => write!(f, "invalid parameter"),
            Self::Unsupported => write!(f, "unsupported AML operation"),
            Self::OutOfResources => write!(f, "out of resources"),
            Self::NotFound => write!(f, "AML node not found"),
            Self::UnexpectedEnd => write!(f, "AML stream ended unexpectedly"),
            Self::InvalidPkgLength => write!(f, "invalid AML package length"),
            Self::PathOverflow => write!(f, "AML path out of range"),
            Self::InvalidAml => write!(f, "invalid AML bytecode"),
            Self::InvalidSignature => write!(f, "not a DSDT or SSDT signature"),
            Self::InvalidChecksum => write!(f, "invalid ACPI table checksum"),
        }
    }
}
