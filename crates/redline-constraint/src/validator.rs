//! Pure validation of proposed content
//!
//! Collects every constraint bound to a target (directly, or inherited from
//! ancestors over constraint-carrying edges), evaluates each, and reports
//! findings as data. Unsatisfied constraints are expected workflow outcomes,
//! not errors; only an unknown target id fails the call itself.

use crate::rule::{Constraint, ConstraintRule, ConstraintScope, Severity};
use crate::set::ConstraintSet;
use redline_graph::{DocumentGraph, GraphError};
use redline_model::{ConstraintId, SectionContent, SectionId, SimilarityProvider};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One evaluated constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Constraint that was checked
    pub constraint_id: ConstraintId,
    /// Blocking or advisory
    pub severity: Severity,
    /// Whether the proposed content satisfies the rule
    pub satisfied: bool,
    /// Human-readable evaluation note
    pub detail: String,
}

/// Outcome of validating one proposed revision
///
/// Findings are ordered by ascending constraint id, so identical inputs
/// serialize identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    target: SectionId,
    findings: Vec<Finding>,
}

impl ValidationResult {
    /// Section the proposal targets
    #[must_use]
    pub fn target(&self) -> &SectionId {
        &self.target
    }

    /// All findings, ascending by constraint id
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Accepted iff no hard constraint is unsatisfied; soft failures are
    /// advisory and never block
    #[must_use]
    pub fn accepted(&self) -> bool {
        !self
            .findings
            .iter()
            .any(|finding| finding.severity.is_hard() && !finding.satisfied)
    }

    /// Unsatisfied findings of any severity
    pub fn violations(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|finding| !finding.satisfied)
    }

    /// Unsatisfied hard findings, the ones that block propagation
    pub fn hard_violations(&self) -> impl Iterator<Item = &Finding> {
        self.violations()
            .filter(|finding| finding.severity.is_hard())
    }
}

/// Validate proposed content for `target_id` against a compiled set
///
/// Pure: no caches, no side effects; identical inputs produce identical
/// results. The applicable constraints are the union of
///
/// - ids listed on the target section that resolve in `constraints`,
/// - constraints whose scope names the target section,
/// - `Tier`/`Descendants`-scoped constraints whose source is an ancestor of
///   the target over `DerivesFrom`/`Constrains` edges.
///
/// # Errors
/// [`GraphError::UnknownSection`] when `target_id` is not in the snapshot.
pub fn validate(
    graph: &DocumentGraph,
    constraints: &ConstraintSet,
    target_id: &SectionId,
    proposed: &SectionContent,
    similarity: &dyn SimilarityProvider,
) -> Result<ValidationResult, GraphError> {
    let findings = applicable_constraints(graph, constraints, target_id)?
        .into_iter()
        .map(|constraint| {
            let (satisfied, detail) = evaluate(constraint, proposed, graph, similarity);
            Finding {
                constraint_id: constraint.id.clone(),
                severity: constraint.severity,
                satisfied,
                detail,
            }
        })
        .collect();

    Ok(ValidationResult {
        target: target_id.clone(),
        findings,
    })
}

/// Constraints that would gate a proposal for `target_id`, ascending by id
///
/// The same collection [`validate`] evaluates: ids listed on the section,
/// `Section`-scoped constraints naming it, and `Tier`/`Descendants`-scoped
/// constraints inherited over constraint-carrying edges. The ripple planner
/// uses this to annotate plan entries with the rules their regenerated
/// content must pass.
///
/// # Errors
/// [`GraphError::UnknownSection`] when `target_id` is not in the snapshot.
pub fn applicable_constraints<'a>(
    graph: &DocumentGraph,
    constraints: &'a ConstraintSet,
    target_id: &SectionId,
) -> Result<Vec<&'a Constraint>, GraphError> {
    let target = graph
        .section(target_id)
        .ok_or_else(|| GraphError::UnknownSection {
            id: target_id.clone(),
        })?;

    let governing = governing_ancestors(graph, target_id);

    let mut applicable: BTreeMap<&ConstraintId, &Constraint> = BTreeMap::new();
    for id in target.constraints() {
        if let Some(constraint) = constraints.get(id) {
            applicable.insert(&constraint.id, constraint);
        }
    }
    for constraint in constraints {
        let applies = match &constraint.applies_to {
            ConstraintScope::Section(id) => id == target_id,
            ConstraintScope::Tier(tier) => {
                *tier == target.tier() && governing.contains(&constraint.source)
            }
            ConstraintScope::Descendants => governing.contains(&constraint.source),
        };
        if applies {
            applicable.insert(&constraint.id, constraint);
        }
    }

    Ok(applicable.into_values().collect())
}

/// Strict ancestors of `target` over constraint-carrying edges
fn governing_ancestors(graph: &DocumentGraph, target: &SectionId) -> BTreeSet<SectionId> {
    let mut incoming: BTreeMap<&SectionId, Vec<&SectionId>> = BTreeMap::new();
    for edge in graph.edges() {
        if edge.kind.carries_constraints() {
            incoming.entry(&edge.target).or_default().push(&edge.source);
        }
    }

    let mut seen: BTreeSet<SectionId> = BTreeSet::new();
    let mut frontier = vec![target];
    while let Some(next) = frontier.pop() {
        for &parent in incoming.get(next).into_iter().flatten() {
            if seen.insert(parent.clone()) {
                frontier.push(parent);
            }
        }
    }
    seen
}

fn evaluate(
    constraint: &Constraint,
    proposed: &SectionContent,
    graph: &DocumentGraph,
    similarity: &dyn SimilarityProvider,
) -> (bool, String) {
    match &constraint.rule {
        ConstraintRule::EnumeratedSet { allowed } => {
            if proposed.labels.is_empty() {
                return (true, "no categorical references declared".to_owned());
            }
            let offending: Vec<&str> = proposed
                .labels
                .iter()
                .filter(|label| !allowed.contains(&label.to_lowercase()))
                .map(String::as_str)
                .collect();
            if offending.is_empty() {
                (
                    true,
                    format!("all {} labels within the allowed vocabulary", proposed.labels.len()),
                )
            } else {
                (
                    false,
                    format!("labels outside allowed vocabulary: {}", offending.join(", ")),
                )
            }
        }
        ConstraintRule::NumericCeiling { figure, limit } => match proposed.figure(figure) {
            Some(value) => (
                value <= *limit,
                format!("figure {figure} = {value}, ceiling {limit}"),
            ),
            None => (
                true,
                format!("figure {figure} not present; ceiling {limit} not exercised"),
            ),
        },
        ConstraintRule::RequiredTerm { terms } => {
            let body = proposed.body.to_lowercase();
            let missing: Vec<&str> = terms
                .iter()
                .filter(|term| !body.contains(term.as_str()))
                .map(String::as_str)
                .collect();
            if missing.is_empty() {
                (true, format!("all {} required terms present", terms.len()))
            } else {
                (false, format!("missing required terms: {}", missing.join(", ")))
            }
        }
        ConstraintRule::SemanticAlignment { threshold } => {
            let Some(source) = graph.section(&constraint.source) else {
                return (
                    false,
                    format!("source section {} absent from snapshot", constraint.source),
                );
            };
            let score = similarity
                .similarity(&source.content().body, &proposed.body)
                .clamp(0.0, 1.0);
            (
                score >= *threshold,
                format!(
                    "alignment {score:.3} against {}, threshold {threshold}",
                    constraint.source
                ),
            )
        }
    }
}
