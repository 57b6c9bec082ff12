use thiserror::Error;

use super::GraphError;
use crate::graph::NodeId;

/// Errors that abort a whole lifecycle call. Everything else is logged and skipped.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RigError {
    #[error("Component {0:?} is already initialized")]
    AlreadyInitialized(String),
    #[error("Component {0:?} is not rebuildable")]
    RebuildRefused(String),
    #[error("Namespace {0:?} is already owned by another scope")]
    NamespaceTaken(String),
    #[error("Unknown component class {0:?}")]
    UnknownComponentClass(String),
    #[error("No component is registered for scope {0:?}")]
    MissingComponent(NodeId),
    #[error("Scope {0:?} has no interface node")]
    MissingInterface(String),
    #[error("Component {0:?} already takes part in a mirror pair")]
    MirrorRefused(String),
    #[error("Could not encode or decode a parameter payload: {0}")]
    Payload(String),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type RigResult<T> = Result<T, RigError>;
