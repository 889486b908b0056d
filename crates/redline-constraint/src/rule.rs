//! Rule vocabulary: templates declared at ingestion, constraints compiled
//! from governance content

use redline_model::{ConstraintId, GovernanceTier, SectionId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display};

/// How strictly a constraint gates acceptance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Severity {
    /// Unsatisfied hard constraints block acceptance and downstream propagation
    Hard,
    /// Unsatisfied soft constraints are reported but never block
    Soft,
}

impl Severity {
    /// True for [`Severity::Hard`]
    #[inline]
    #[must_use]
    pub fn is_hard(self) -> bool {
        matches!(self, Self::Hard)
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hard => f.write_str("hard"),
            Self::Soft => f.write_str("soft"),
        }
    }
}

/// Which validation targets a constraint applies to
///
/// `Tier` and `Descendants` scopes reach a target only when the constraint's
/// source section is an ancestor of the target through constraint-carrying
/// edges (`DerivesFrom`, `Constrains`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConstraintScope {
    /// Exactly one named section
    Section(SectionId),
    /// Every governed descendant whose tier matches
    Tier(GovernanceTier),
    /// Every governed descendant regardless of tier
    Descendants,
}

/// Declared rule shape, instantiated against governance content at compile
/// time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum TemplateKind {
    /// Allowed-vocabulary rule; the allowed set is the source section's
    /// labels plus its extracted terms
    EnumeratedSet,
    /// Numeric ceiling on a named figure; the limit is read from the source
    /// section's figures, falling back to its body text
    NumericCeiling {
        /// Figure name the ceiling binds
        figure: String,
    },
    /// Required-term rule; the term set comes from the extraction provider
    RequiredTerm,
    /// Semantic alignment against the source section's body
    SemanticAlignment {
        /// Minimum acceptable similarity, in [0, 1]
        threshold: f64,
    },
}

impl TemplateKind {
    /// Stable suffix used to derive the compiled constraint's id
    #[must_use]
    pub fn slug(&self) -> String {
        match self {
            Self::EnumeratedSet => "enumerated-set".to_owned(),
            Self::NumericCeiling { figure } => format!("ceiling.{figure}"),
            Self::RequiredTerm => "required-terms".to_owned(),
            Self::SemanticAlignment { .. } => "alignment".to_owned(),
        }
    }
}

/// One rule declaration on a governance section
///
/// Ingestion declares templates; [`crate::ConstraintCompiler`] instantiates
/// them into [`Constraint`] values from the section's current content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleTemplate {
    /// Declared rule shape
    pub kind: TemplateKind,
    /// Validation targets the compiled constraint applies to
    pub scope: ConstraintScope,
    /// Blocking or advisory
    pub severity: Severity,
}

impl RuleTemplate {
    /// Declare an allowed-vocabulary rule
    #[must_use]
    pub fn enumerated_set(scope: ConstraintScope, severity: Severity) -> Self {
        Self {
            kind: TemplateKind::EnumeratedSet,
            scope,
            severity,
        }
    }

    /// Declare a numeric ceiling on `figure`
    #[must_use]
    pub fn numeric_ceiling(
        figure: impl Into<String>,
        scope: ConstraintScope,
        severity: Severity,
    ) -> Self {
        Self {
            kind: TemplateKind::NumericCeiling {
                figure: figure.into(),
            },
            scope,
            severity,
        }
    }

    /// Declare a required-term rule
    #[must_use]
    pub fn required_term(scope: ConstraintScope, severity: Severity) -> Self {
        Self {
            kind: TemplateKind::RequiredTerm,
            scope,
            severity,
        }
    }

    /// Declare a semantic-alignment rule with `threshold` in [0, 1]
    #[must_use]
    pub fn semantic_alignment(threshold: f64, scope: ConstraintScope, severity: Severity) -> Self {
        Self {
            kind: TemplateKind::SemanticAlignment { threshold },
            scope,
            severity,
        }
    }
}

/// Compiled, checkable predicate parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum ConstraintRule {
    /// Target labels must all come from `allowed`
    EnumeratedSet {
        /// Allowed vocabulary, lowercased
        allowed: BTreeSet<String>,
    },
    /// Target figure `figure`, when present, must not exceed `limit`
    NumericCeiling {
        /// Figure name the ceiling binds
        figure: String,
        /// Inclusive upper bound
        limit: f64,
    },
    /// Target body must mention every term
    RequiredTerm {
        /// Required terms, lowercased
        terms: BTreeSet<String>,
    },
    /// Target body must align with the source body at or above `threshold`
    SemanticAlignment {
        /// Minimum acceptable similarity, in [0, 1]
        threshold: f64,
    },
}

impl ConstraintRule {
    /// Short rule-kind name for findings and logs
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::EnumeratedSet { .. } => "enumerated-set",
            Self::NumericCeiling { .. } => "numeric-ceiling",
            Self::RequiredTerm { .. } => "required-term",
            Self::SemanticAlignment { .. } => "semantic-alignment",
        }
    }
}

/// A compiled predicate bound to a governance source section
///
/// Row shape of the logical constraint table; reconstructable from storage
/// via serde.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Constraint {
    /// Derived id, `<source>::<template slug>`
    pub id: ConstraintId,
    /// Governance section this rule was compiled from
    pub source: SectionId,
    /// Source section version at compile time
    pub source_version: u64,
    /// Validation targets
    pub applies_to: ConstraintScope,
    /// Blocking or advisory
    pub severity: Severity,
    /// Checkable predicate
    pub rule: ConstraintRule,
}
