//! Error types.
//!
//! Only caller bugs surface as errors. Recoverable conditions (unknown tags,
//! corrupted style encodings, calls into destroyed wrappers) are logged and
//! absorbed by the bridge instead.

use thiserror::Error;

use crate::bridge::WrapperId;
use crate::dom::NodeId;

/// Errors raised by tree operations and widget creation.
#[derive(Debug, Error)]
pub enum DomError {
    /// Illegal tree operation: mutating a leaf's children, creating a cycle,
    /// inserting a document node.
    #[error("structural error on node {node}: {reason}")]
    Structural { node: NodeId, reason: &'static str },

    /// The reference node is not a child of the claimed parent.
    #[error("node {node} is not a child of {parent}")]
    NotFound { node: NodeId, parent: NodeId },

    /// The node id is not present in the arena (never created, or released).
    #[error("no such node: {0}")]
    InvalidNode(NodeId),

    /// `create()` was called with a parent handle the host does not know.
    #[error("wrapper {wrapper} created without a valid parent handle")]
    InvalidParent { wrapper: WrapperId },

    /// A configuration document could not be decoded.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl DomError {
    pub(crate) fn structural(node: NodeId, reason: &'static str) -> Self {
        Self::Structural { node, reason }
    }

    /// True for [`DomError::Structural`].
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural { .. })
    }

    /// True for [`DomError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, DomError>;
