//! Compilation error taxonomy
//!
//! Validation outcomes are never errors: unsatisfied constraints come back
//! as findings inside [`crate::ValidationResult`]. Errors here mean the
//! declared templates could not be turned into checkable predicates at all.

use redline_model::{ConstraintId, GovernanceTier, SectionId};
use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Why template instantiation failed
///
/// `Display` and `Error` are hand-written because several variants name
/// their governance-source field `source`, which a `thiserror` derive would
/// treat as an error source and require to implement `Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum CompilationError {
    /// A ceiling template names a figure with no numeric value in the
    /// source's figures or body text
    MissingFigure {
        /// Governance source section
        source: SectionId,
        /// Figure the ceiling binds
        figure: String,
    },

    /// An alignment template declares a threshold outside [0, 1]
    ThresholdOutOfRange {
        /// Governance source section
        source: SectionId,
        /// Declared threshold
        threshold: f64,
    },

    /// Extraction produced no terms for a term-based template
    EmptyTermSet {
        /// Governance source section
        source: SectionId,
    },

    /// Two templates on one source derive the same constraint id
    DuplicateConstraint {
        /// Colliding id
        id: ConstraintId,
    },

    /// Templates declared for a section absent from the graph
    UnknownSource {
        /// Missing section id
        id: SectionId,
    },

    /// Templates declared on a section that cannot carry governance rules
    NotGovernanceTier {
        /// Declared section id
        id: SectionId,
        /// Its actual tier
        tier: GovernanceTier,
    },
}

impl Display for CompilationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFigure { source, figure } => {
                write!(f, "no numeric value for figure {figure} in {source}")
            }
            Self::ThresholdOutOfRange { source, threshold } => {
                write!(
                    f,
                    "alignment threshold {threshold} for {source} is outside [0, 1]"
                )
            }
            Self::EmptyTermSet { source } => {
                write!(f, "term extraction for {source} produced an empty set")
            }
            Self::DuplicateConstraint { id } => {
                write!(f, "duplicate compiled constraint id: {id}")
            }
            Self::UnknownSource { id } => {
                write!(f, "templates declared for unknown section {id}")
            }
            Self::NotGovernanceTier { id, tier } => {
                write!(
                    f,
                    "templates declared on {tier} section {id}; constraints bind to locked or reviewable sections"
                )
            }
        }
    }
}

impl Error for CompilationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_section() {
        let err = CompilationError::MissingFigure {
            source: SectionId::new("mandate.budget"),
            figure: "ceiling".into(),
        };
        assert_eq!(
            err.to_string(),
            "no numeric value for figure ceiling in mandate.budget"
        );

        let err = CompilationError::NotGovernanceTier {
            id: SectionId::new("plan.summary"),
            tier: GovernanceTier::Generated,
        };
        assert!(err.to_string().contains("generated section plan.summary"));
    }
}
