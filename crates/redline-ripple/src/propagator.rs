//! Ripple computation
//!
//! Forward impact descends the graph, backward review climbs it behind a
//! tolerance policy, and lateral checks fan out across near cousins. The
//! planner only decides what needs doing and in what order; regeneration,
//! review, and validation all stay with the caller.

use crate::change::{CycleBaseline, SectionChange};
use crate::plan::{PlanAction, UpdatePlan};
use crate::tolerance::TolerancePolicy;
use redline_constraint::{applicable_constraints, ConstraintSet};
use redline_graph::{DocumentGraph, GraphError};
use redline_model::{GovernanceTier, SectionId};
use std::collections::{BTreeMap, BTreeSet};

/// Graph distance bound for lateral consistency checks, applied to both the
/// climb to the common ancestor and the descent to the cousin.
const LATERAL_RADIUS: usize = 2;

/// Compute the update plan for a set of accepted edits
///
/// - Forward impact: strict descendants of any changed section, excluding
///   Locked sections and sections whose version already advanced past
///   `baseline` this cycle, in topological order. Generated descendants need
///   regeneration, Reviewable descendants need review.
/// - Backward review: Locked/Reviewable ancestors of a changed section, when
///   `tolerance` judges the change significant for that ancestor.
/// - Lateral check: sections within distance two of a shared ancestor of a
///   changed section, matching its governance tier.
///
/// Pure in its inputs: identical graph, changes, baseline, and policy yield
/// a byte-identical plan.
///
/// # Errors
/// [`GraphError::UnknownSection`] when a change names a section absent from
/// the snapshot.
pub fn compute_plan(
    graph: &DocumentGraph,
    constraints: &ConstraintSet,
    changes: &[SectionChange],
    baseline: &CycleBaseline,
    tolerance: &dyn TolerancePolicy,
) -> Result<UpdatePlan, GraphError> {
    let mut changed: BTreeSet<SectionId> = BTreeSet::new();
    for change in changes {
        if !graph.contains(&change.id) {
            return Err(GraphError::UnknownSection {
                id: change.id.clone(),
            });
        }
        changed.insert(change.id.clone());
    }

    let forward = forward_set(graph, &changed, baseline)?;

    let mut entries = Vec::with_capacity(forward.len());
    for id in graph.topological_order() {
        if !forward.contains(&id) {
            continue;
        }
        let Some(section) = graph.section(&id) else {
            continue;
        };
        let action = match section.tier() {
            GovernanceTier::Generated => PlanAction::NeedsRegeneration,
            GovernanceTier::Reviewable => PlanAction::NeedsReview,
            GovernanceTier::Locked => continue,
        };
        let gating = applicable_constraints(graph, constraints, &id)?
            .into_iter()
            .map(|constraint| constraint.id.clone())
            .collect();
        entries.push((id, action, gating));
    }

    let mut dependencies: BTreeMap<SectionId, BTreeSet<SectionId>> = BTreeMap::new();
    for edge in graph.edges() {
        if forward.contains(&edge.target) && forward.contains(&edge.source) {
            dependencies
                .entry(edge.target.clone())
                .or_default()
                .insert(edge.source.clone());
        }
    }

    let backward_review = backward_set(graph, changes, tolerance)?;
    let lateral_check = lateral_set(graph, &changed, &forward)?;

    tracing::debug!(
        "plan for {} changes: {} forward, {} backward, {} lateral",
        changed.len(),
        entries.len(),
        backward_review.len(),
        lateral_check.len()
    );

    Ok(UpdatePlan::assemble(
        entries,
        backward_review,
        lateral_check,
        changed,
        dependencies,
    ))
}

/// Strict descendants of the changed set, minus Locked sections, minus
/// sections already past the baseline.
fn forward_set(
    graph: &DocumentGraph,
    changed: &BTreeSet<SectionId>,
    baseline: &CycleBaseline,
) -> Result<BTreeSet<SectionId>, GraphError> {
    let mut forward: BTreeSet<SectionId> = BTreeSet::new();
    for id in changed {
        forward.extend(graph.descendants_of(id)?);
    }
    forward.retain(|id| {
        !changed.contains(id)
            && graph
                .section(id)
                .is_some_and(|section| section.tier() != GovernanceTier::Locked)
            && !baseline.is_advanced(graph, id)
    });
    Ok(forward)
}

fn backward_set(
    graph: &DocumentGraph,
    changes: &[SectionChange],
    tolerance: &dyn TolerancePolicy,
) -> Result<BTreeSet<SectionId>, GraphError> {
    let mut review = BTreeSet::new();
    for change in changes {
        for ancestor_id in graph.ancestors_of(&change.id)? {
            let Some(ancestor) = graph.section(&ancestor_id) else {
                continue;
            };
            if ancestor.tier().is_governance() && tolerance.crosses(change, ancestor) {
                review.insert(ancestor_id);
            }
        }
    }
    Ok(review)
}

/// Cousins of each changed section: within [`LATERAL_RADIUS`] of a shared
/// ancestor on both legs, same tier as the changed section, not themselves
/// changed or already on the forward list.
fn lateral_set(
    graph: &DocumentGraph,
    changed: &BTreeSet<SectionId>,
    forward: &BTreeSet<SectionId>,
) -> Result<BTreeSet<SectionId>, GraphError> {
    let mut lateral = BTreeSet::new();
    for id in changed {
        let Some(tier) = graph.section(id).map(redline_model::Section::tier) else {
            continue;
        };
        for ancestor in graph.ancestors_within(id, LATERAL_RADIUS)?.into_keys() {
            for cousin in graph.descendants_within(&ancestor, LATERAL_RADIUS)?.into_keys() {
                if &cousin == id || changed.contains(&cousin) || forward.contains(&cousin) {
                    continue;
                }
                if graph
                    .section(&cousin)
                    .is_some_and(|section| section.tier() == tier)
                {
                    lateral.insert(cousin);
                }
            }
        }
    }
    Ok(lateral)
}
