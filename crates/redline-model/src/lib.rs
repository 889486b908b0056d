//! redline Data Model
//!
//! Shared types for the dependency-aware revision engine.
//!
//! # Core Concepts
//!
//! - [`Section`]: a document node with id, governance tier, content, hash,
//!   and a monotonic version counter
//! - [`GovernanceTier`]: Locked (immutable mandate), Reviewable
//!   (approval-gated), Generated (machine-regenerable)
//! - [`Edge`] / [`DependencyKind`]: directed relations between sections
//! - [`ContentHash`]: 32-byte BLAKE3 digest of a section's canonical content
//! - [`Fingerprint`]: externally computed similarity signature for the
//!   cross-revision matcher
//! - [`SimilarityProvider`] / [`TermExtractor`]: capability traits the
//!   surrounding application implements

#![warn(unreachable_pub)]

mod content;
mod edge;
mod fingerprint;
mod hash;
mod id;
mod provider;
mod section;

pub use content::SectionContent;
pub use edge::{DependencyKind, Edge};
pub use fingerprint::{normalize_title, Fingerprint};
pub use hash::{ContentHash, HashError};
pub use id::{ConstraintId, SectionId};
pub use provider::{SimilarityProvider, TermExtractor};
pub use section::{GovernanceTier, Section};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
