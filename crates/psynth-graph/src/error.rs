//! Error types for the psynth-graph crate.

use psynth_core::{AnchorKind, CoreError};
use thiserror::Error;

use crate::transport::TransportError;

/// A referenced node, link or link type does not exist in the local graph.
///
/// Raised before anything is registered or queued, so the graph is unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferentialError {
    #[error("Invalid origin node: {0}")]
    OriginNotFound(String),

    #[error("Invalid terminus node: {0}")]
    TerminusNotFound(String),

    #[error("Invalid link type: {0}")]
    LinkTypeNotFound(String),

    #[error("Invalid anchor {kind}: {uid}")]
    AnchorNotFound { kind: AnchorKind, uid: String },

    #[error("Detail anchored to {anchor_uid} has no anchor type")]
    AnchorTypeMissing { anchor_uid: String },
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error(transparent)]
    Referential(#[from] ReferentialError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Remote command {query} failed")]
    RemoteFailure { query: String },

    #[error("Graph has no nodes; its extents are undefined")]
    EmptyGraph,

    #[error("No tokio runtime available to drive the request queue")]
    NoRuntime,

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, GraphError>;
