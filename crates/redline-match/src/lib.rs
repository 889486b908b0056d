//! redline Revision Matcher
//!
//! Aligns sections between two document snapshots, typically last cycle's
//! published plan and the current draft, so stable ids survive a rewrite.
//!
//! # Core Concepts
//!
//! - [`SectionFingerprint`]: an id plus the similarity signature ingestion
//!   computed for it; the matcher never touches raw content
//! - [`ScorerWeights`] / [`DomainScorer`]: the weighted similarity blend,
//!   with a reserved slot for a pluggable domain signal
//! - [`match_revisions`]: full-matrix scoring plus an optimal assignment
//!   solve, split at the acceptance threshold into matched, new, and
//!   deprecated sections
//! - [`match_revisions_bounded`]: the same solve on the blocking pool under
//!   a wall-clock budget; timeouts return nothing partial
//!
//! Alignment is canonical: results never depend on input order, and tied
//! candidates resolve by position gap and then id for reproducibility.

#![warn(unreachable_pub)]

mod assignment;
mod error;
mod matcher;
mod score;

pub use error::MatchError;
pub use matcher::{
    match_revisions, match_revisions_bounded, match_revisions_with, MatchResult, MatchedPair,
    SectionFingerprint, DEFAULT_THRESHOLD,
};
pub use score::{pair_similarity, DomainScorer, ScorerWeights};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
