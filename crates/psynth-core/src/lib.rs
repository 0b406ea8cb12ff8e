//! psynth-core: Shared types, wire documents and configuration for the Psynth client.
//!
//! This crate provides the foundational pieces used by the graph client:
//! - Entity types (Node, Link, LinkType, Detail) and their raw constructor parameters
//! - Request documents and response shapes exchanged with the Psynth server
//! - The reversible text codec applied at the wire boundary
//! - Identifier generation
//! - Configuration management and common error types

pub mod codec;
pub mod config;
pub mod error;
pub mod param;
pub mod types;
pub mod uid;
pub mod wire;

pub use config::ServerConfig;
pub use error::CoreError;
pub use param::Param;
pub use types::{
    AnchorKind, Detail, DetailInput, DetailKind, DetailParams, Link, LinkInput, LinkParams,
    LinkType, LinkTypeInput, LinkTypeParams, Node, NodeInput, NodeParams, Shape,
};
pub use wire::{Command, GraphIdentity, FAILURE_SENTINEL};
