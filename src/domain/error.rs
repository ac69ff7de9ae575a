//! Error types for allocation-graph operations.

use crate::domain::node::{ProcessId, ResourceId};
use std::fmt;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// A reference to a process or a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Process(ProcessId),
    Resource(ResourceId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Process(id) => write!(f, "process {id}"),
            EntityRef::Resource(id) => write!(f, "resource {id}"),
        }
    }
}

/// Errors returned by the engine. A failed call leaves the graph untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Reference to a process or resource that does not exist.
    #[error("Unknown {0}")]
    UnknownEntity(EntityRef),

    /// Malformed request, e.g. a process waiting on a resource it holds.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Why the request was rejected.
        message: String,
    },

    /// Resource is already assigned to another process.
    #[error("Resource {resource} is busy (held by {holder})")]
    ResourceBusy {
        resource: ResourceId,
        holder: ProcessId,
    },

    /// Release of a resource that is not assigned.
    #[error("Resource {0} is not assigned")]
    NotAssigned(ResourceId),

    /// Resolution attempted without an active deadlock.
    #[error("No deadlock present")]
    NoDeadlock,
}
