//! Matcher failures
//!
//! Below-threshold pairs are not errors; they come back as new and
//! deprecated entries in the result. Errors here mean the inputs were
//! malformed or the solve never finished.

use redline_model::SectionId;
use thiserror::Error;

/// Failure modes of a revision match
#[derive(Debug, Error)]
pub enum MatchError {
    /// The same section id appeared twice on one side of the match
    #[error("duplicate fingerprint for section {id}")]
    DuplicateId {
        /// The repeated id
        id: SectionId,
    },

    /// An embedding's dimension disagrees with the rest of the input
    #[error("embedding for {id} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        /// Section carrying the odd embedding
        id: SectionId,
        /// Dimension established by the first embedding seen
        expected: usize,
        /// Dimension actually supplied
        found: usize,
    },

    /// The assignment solve was cancelled before completing
    ///
    /// Retry with fewer sections or a longer budget; no partial assignment
    /// is ever returned.
    #[error("assignment solve was cancelled before completing")]
    ComputationTimeout,

    /// The background worker running the solve terminated abnormally
    #[error("assignment worker terminated abnormally: {reason}")]
    WorkerLost {
        /// Join failure description
        reason: String,
    },
}
