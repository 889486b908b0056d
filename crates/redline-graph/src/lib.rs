//! redline Graph Model
//!
//! Builds and queries the dependency graph over document sections.
//!
//! # Core Concepts
//!
//! - [`GraphBuilder`]: single-writer accumulator; rejects duplicate ids,
//!   dangling edges, and cycles at insertion time
//! - [`DocumentGraph`]: immutable published snapshot with deterministic
//!   topological order and ancestor/descendant traversals
//! - [`GraphSnapshot`]: persistable row schema that round-trips a graph
//!   through external storage with content-hash verification
//!
//! A graph is never observable in an invalid state: every edge that would
//! close a cycle is rejected before insertion, so acyclicity holds at all
//! times, not only at publish.

#![warn(unreachable_pub)]

mod builder;
mod error;
mod graph;
mod snapshot;

pub use builder::GraphBuilder;
pub use error::GraphError;
pub use graph::DocumentGraph;
pub use snapshot::{GraphSnapshot, RestoreError, SectionRow};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
