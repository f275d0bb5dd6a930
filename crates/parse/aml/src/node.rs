//! AML node model.
//!
//! A node is exactly one of [`AmlNode::Root`], [`AmlNode::Object`] or
//! [`AmlNode::Data`]. Parent links are stored next to the node in the arena
//! (see [`AmlTree`](crate::AmlTree)) as plain [`NodeId`]s, so children never
//! keep their parent alive.

use alloc::vec::Vec;

use crate::encoding::{AmlByteEncoding, EncodingAttributes, MAX_FIXED_ARGS};
use crate::sdt::SdtHeader;

/// Handle to a node stored in an [`AmlTree`](crate::AmlTree).
///
/// The generation counter makes handles to deleted nodes fail validation
/// instead of aliasing a node that reused the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// Kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmlNodeType {
    /// The Root node of a definition block.
    Root,
    /// An opcode node.
    Object,
    /// A leaf holding raw bytes.
    Data,
    /// The handle does not designate a live node.
    Unknown,
}

/// Interpretation of a Data node's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmlDataType {
    /// Raw bytes of a byte list.
    Raw,
    /// One resource data descriptor of a resource template.
    ResourceData,
    /// An AML NameString.
    NameString,
    /// A null-terminated ASCII string.
    String,
    /// A little-endian unsigned integer.
    UInt,
    /// PkgLength-encoded bit length of a field element.
    FieldPkgLen,
}

impl AmlDataType {
    /// Raw and resource data describe the same byte-list bytes and may be
    /// substituted for each other.
    #[must_use]
    pub fn is_byte_list(self) -> bool {
        matches!(self, Self::Raw | Self::ResourceData)
    }
}

/// Root node: the definition block header and its top-level terms.
#[derive(Debug, Clone)]
pub struct RootNode {
    pub(crate) header: SdtHeader,
    pub(crate) variable_args: Vec<NodeId>,
}

/// Object node: one AML opcode with its arguments.
#[derive(Debug, Clone)]
pub struct ObjectNode {
    pub(crate) encoding: &'static AmlByteEncoding,
    /// PkgLength value (including its own width), 0 for encodings without one.
    pub(crate) pkg_len: u32,
    pub(crate) fixed_args: [Option<NodeId>; MAX_FIXED_ARGS],
    pub(crate) variable_args: Vec<NodeId>,
}

impl ObjectNode {
    /// The opcode's encoding table entry.
    #[must_use]
    pub fn encoding(&self) -> &'static AmlByteEncoding {
        self.encoding
    }

    /// Returns `true` if the encoding carries `attr`.
    #[must_use]
    pub fn has_attribute(&self, attr: EncodingAttributes) -> bool {
        self.encoding.has(attr)
    }

    /// Number of fixed argument slots.
    #[must_use]
    pub fn fixed_arg_count(&self) -> usize {
        usize::from(self.encoding.fixed_arg_count)
    }

    /// Returns `true` if this node is `op_code` (and `sub_op_code` for
    /// extended opcodes).
    #[must_use]
    pub fn is_op(&self, op_code: u8, sub_op_code: u8) -> bool {
        self.encoding.matches(op_code, sub_op_code)
    }
}

/// Data node: a leaf buffer.
#[derive(Debug, Clone)]
pub struct DataNode {
    pub(crate) data_type: AmlDataType,
    pub(crate) buffer: Vec<u8>,
}

impl DataNode {
    /// Interpretation of the buffer.
    #[must_use]
    pub fn data_type(&self) -> AmlDataType {
        self.data_type
    }

    /// The node's bytes.
    #[must_use]
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }
}

/// A node of the AML tree.
#[derive(Debug, Clone)]
pub enum AmlNode {
    /// See [`RootNode`].
    Root(RootNode),
    /// See [`ObjectNode`].
    Object(ObjectNode),
    /// See [`DataNode`].
    Data(DataNode),
}

impl AmlNode {
    /// Kind of this node.
    #[must_use]
    pub fn node_type(&self) -> AmlNodeType {
        match self {
            Self::Root(_) => AmlNodeType::Root,
            Self::Object(_) => AmlNodeType::Object,
            Self::Data(_) => AmlNodeType::Data,
        }
    }

    /// The variable argument list of a Root or Object node.
    #[must_use]
    pub fn variable_args(&self) -> Option<&[NodeId]> {
        match self {
            Self::Root(root) => Some(&root.variable_args),
            Self::Object(obj) => Some(&obj.variable_args),
            Self::Data(_) => None,
        }
    }

    pub(crate) fn variable_args_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            Self::Root(root) => Some(&mut root.variable_args),
            Self::Object(obj) => Some(&mut obj.variable_args),
            Self::Data(_) => None,
        }
    }

    /// Returns the Object payload, if any.
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Returns the Data payload, if any.
    #[must_use]
    pub fn as_data(&self) -> Option<&DataNode> {
        match self {
            Self::Data(data) => Some(data),
            _ => None,
        }
    }
}
