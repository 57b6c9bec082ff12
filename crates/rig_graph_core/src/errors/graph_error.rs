use thiserror::Error;

use crate::graph::NodeId;

/// Failures of the graph primitives (node, attribute and connection bookkeeping).
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("No live node with id {0:?}")]
    MissingNode(NodeId),
    #[error("No live node named {0:?}")]
    MissingNodeName(String),
    #[error("Node {0:?} has no attribute {1}")]
    MissingAttribute(String, String),
    #[error("Attribute {1} already exists on node {0:?}")]
    DuplicateAttribute(String, String),
    #[error("Attribute {0} is locked")]
    LockedAttribute(String),
    #[error("Attribute {0} is driven by a connection and cannot be set")]
    ConnectedAttribute(String),
    #[error("Tried to use incorrect data type: expected {0}, got {1}")]
    MismatchedDataType(String, String),
    #[error("Invalid attribute path {0:?}: {1}")]
    InvalidPath(String, String),
    #[error("Node {0:?} is not a scope container")]
    NotAScope(String),
    #[error("Node {0:?} is not a transform")]
    NotATransform(String),
    #[error("Namespace {0:?} does not exist")]
    MissingNamespace(String),
    #[error("Namespace {0:?} already exists")]
    NamespaceExists(String),
    #[error("Could not (de)serialize the graph document: {0}")]
    Serialization(String),
}

pub type GraphResult<T> = Result<T, GraphError>;
