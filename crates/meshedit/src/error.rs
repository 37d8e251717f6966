//! Error types for the edit engine.
//!
//! The `SessionController` surface degrades these to `Option`/`bool` plus a log
//! line; they only travel as `Result`s inside the crate and through the few
//! setup helpers that must report why a tool cannot start.

use shared::ObjectId;
use thiserror::Error;

use crate::topology::ElementKind;

/// Structural problems in a `MeshTopology`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("{kind} index {index} is out of range")]
    OutOfRange { kind: ElementKind, index: u32 },
    #[error("{kind} {index} has been removed")]
    Removed { kind: ElementKind, index: u32 },
    #[error("face needs at least 3 distinct vertices, got {0}")]
    DegenerateFace(usize),
    #[error("edge needs two distinct vertices")]
    DegenerateEdge,
    #[error("face with the same vertices already exists as face {0}")]
    DuplicateFace(u32),
    #[error("edge {0} is not shared by exactly two faces")]
    NotManifold(u32),
    #[error("broken adjacency: {0}")]
    BrokenAdjacency(String),
}

/// Failures reported by the host application.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("unknown object `{0}`")]
    UnknownObject(ObjectId),
    #[error("object `{0}` has no working copy")]
    NoWorkingCopy(ObjectId),
    #[error("object `{0}` is locked for writing")]
    Locked(ObjectId),
    #[error("mesh rejected for `{object}`: {reason}")]
    InvalidMesh { object: ObjectId, reason: String },
}

/// Session-level failure taxonomy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No trackable object, or topology / ray-structure build failed.
    #[error("setup failed: {0}")]
    SetupFailure(String),
    /// An index that no longer refers to a live element.
    #[error("stale {kind} reference {index} on `{object}`")]
    StaleReference {
        object: ObjectId,
        kind: ElementKind,
        index: u32,
    },
    /// Restoring or releasing session state failed.
    #[error("cleanup failed: {0}")]
    CleanupFailure(String),
    #[error("session is closed")]
    Closed,
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error(transparent)]
    Host(#[from] HostError),
}
