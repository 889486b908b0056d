//! Structural errors
//!
//! Every variant is fatal to the mutating call that raised it and leaves the
//! builder exactly as it was: no partial section, no partial edge.

use redline_model::SectionId;
use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Errors raised while constructing or mutating a document graph
///
/// `Display` and `Error` are hand-written because `CycleDetected` names its
/// edge-source field `source`, which a `thiserror` derive would treat as an
/// error source and require to implement `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A section with this id already exists in the builder
    DuplicateId {
        /// Offending id
        id: SectionId,
    },

    /// An operation referenced a section the builder does not hold
    UnknownSection {
        /// Missing id
        id: SectionId,
    },

    /// Adding the edge would close a cycle
    ///
    /// Detected by incremental reachability: the edge is rejected when its
    /// target is already an ancestor of its source. Self-edges are cycles of
    /// length one.
    CycleDetected {
        /// Edge source
        source: SectionId,
        /// Edge target
        target: SectionId,
    },

    /// Content was proposed for a published Locked section
    ImmutableSectionViolation {
        /// Immutable section
        id: SectionId,
    },
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId { id } => write!(f, "duplicate section id: {id}"),
            Self::UnknownSection { id } => write!(f, "unknown section: {id}"),
            Self::CycleDetected { source, target } => {
                write!(f, "edge {source} -> {target} would create a cycle")
            }
            Self::ImmutableSectionViolation { id } => {
                write!(f, "section {id} is locked and published; content is immutable")
            }
        }
    }
}

impl Error for GraphError {}

impl GraphError {
    /// The section id the error is about (edge errors report the source)
    #[must_use]
    pub fn section(&self) -> &SectionId {
        match self {
            Self::DuplicateId { id }
            | Self::UnknownSection { id }
            | Self::ImmutableSectionViolation { id } => id,
            Self::CycleDetected { source, .. } => source,
        }
    }
}
