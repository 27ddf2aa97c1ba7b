//! Error types for table model operations

use crate::{NodeId, NodeKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableModelError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Expected a {expected:?} node, found {found:?}")]
    WrongKind { expected: NodeKind, found: NodeKind },

    #[error("A {child:?} cannot be placed inside a {parent:?}")]
    InvalidChild { parent: NodeKind, child: NodeKind },

    #[error("Unsupported format '{key}' on a {kind:?} node")]
    UnsupportedFormat { kind: NodeKind, key: String },

    #[error("Reference node {0} is not a child of the target parent")]
    InvalidReference(NodeId),

    #[error("Table structure error: {0}")]
    Structure(String),
}

pub type Result<T> = std::result::Result<T, TableModelError>;
