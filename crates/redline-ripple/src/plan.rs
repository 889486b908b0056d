//! The update plan and its entry state machine
//!
//! A plan is data the caller walks: regeneration happens outside the core,
//! and outcomes come back through [`UpdatePlan::mark_settled`] and
//! [`UpdatePlan::mark_blocked`]. Blocking holds every dependent entry inside
//! the plan, so invalid content never cascades downstream.

use redline_model::{ConstraintId, SectionId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What the caller must do for a forward-impact entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanAction {
    /// Generated tier: regenerate, then validate
    NeedsRegeneration,
    /// Reviewable tier: route to human review
    NeedsReview,
}

/// Where an entry stands in the current cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryState {
    /// Not yet attempted
    Pending,
    /// Regenerated or reviewed content was accepted
    Settled,
    /// Hard validation failure reported by the caller
    Blocked,
    /// An upstream entry on this plan is blocked; do not attempt
    BlockedUpstream,
}

/// One section on the forward-impact list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Target section
    pub id: SectionId,
    /// Required action
    pub action: PlanAction,
    /// Current cycle state
    pub state: EntryState,
    /// Constraints the regenerated content must pass, ascending by id
    pub gating: Vec<ConstraintId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum Mark {
    Settled,
    Blocked,
}

/// Result of one ripple computation
///
/// `forward_impact` is in topological order; all other sets are ordered by
/// section id. Identical inputs to the planner produce byte-identical
/// serialized plans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePlan {
    forward_impact: Vec<PlanEntry>,
    backward_review: BTreeSet<SectionId>,
    lateral_check: BTreeSet<SectionId>,
    changed: BTreeSet<SectionId>,
    /// Per-entry upstream dependencies restricted to plan members
    dependencies: BTreeMap<SectionId, BTreeSet<SectionId>>,
    marks: BTreeMap<SectionId, Mark>,
}

/// Plan bookkeeping failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// The id is not on the forward-impact list
    #[error("section {id} is not on the plan's forward impact")]
    UnknownEntry {
        /// Offending id
        id: SectionId,
    },
}

impl UpdatePlan {
    pub(crate) fn assemble(
        entries: Vec<(SectionId, PlanAction, Vec<ConstraintId>)>,
        backward_review: BTreeSet<SectionId>,
        lateral_check: BTreeSet<SectionId>,
        changed: BTreeSet<SectionId>,
        dependencies: BTreeMap<SectionId, BTreeSet<SectionId>>,
    ) -> Self {
        let forward_impact = entries
            .into_iter()
            .map(|(id, action, gating)| PlanEntry {
                id,
                action,
                state: EntryState::Pending,
                gating,
            })
            .collect();
        Self {
            forward_impact,
            backward_review,
            lateral_check,
            changed,
            dependencies,
            marks: BTreeMap::new(),
        }
    }

    /// Sections to regenerate or review, in topological order
    #[must_use]
    pub fn forward_impact(&self) -> &[PlanEntry] {
        &self.forward_impact
    }

    /// Governance ancestors needing human re-review
    #[must_use]
    pub fn backward_review(&self) -> &BTreeSet<SectionId> {
        &self.backward_review
    }

    /// Same-tier cousins flagged for consistency review
    #[must_use]
    pub fn lateral_check(&self) -> &BTreeSet<SectionId> {
        &self.lateral_check
    }

    /// The accepted edits this plan was computed from
    #[must_use]
    pub fn changed(&self) -> &BTreeSet<SectionId> {
        &self.changed
    }

    /// Forward-impact ids in regeneration order
    #[must_use]
    pub fn order(&self) -> Vec<SectionId> {
        self.forward_impact
            .iter()
            .map(|entry| entry.id.clone())
            .collect()
    }

    /// Regeneration order grouped into independent ranks
    ///
    /// Entries within one rank share no plan-internal dependencies and may
    /// be dispatched concurrently; ranks must still run in sequence.
    #[must_use]
    pub fn layers(&self) -> Vec<Vec<SectionId>> {
        let mut rank_of: BTreeMap<&SectionId, usize> = BTreeMap::new();
        let mut layers: Vec<Vec<SectionId>> = Vec::new();
        for entry in &self.forward_impact {
            let rank = self
                .dependencies
                .get(&entry.id)
                .into_iter()
                .flatten()
                .filter_map(|parent| rank_of.get(parent))
                .max()
                .map_or(0, |&deepest| deepest + 1);
            rank_of.insert(&entry.id, rank);
            if layers.len() <= rank {
                layers.push(Vec::new());
            }
            layers[rank].push(entry.id.clone());
        }
        layers
    }

    /// One forward entry
    #[must_use]
    pub fn entry(&self, id: &SectionId) -> Option<&PlanEntry> {
        self.forward_impact.iter().find(|entry| &entry.id == id)
    }

    /// Entries still waiting for an attempt
    pub fn pending(&self) -> impl Iterator<Item = &PlanEntry> {
        self.forward_impact
            .iter()
            .filter(|entry| entry.state == EntryState::Pending)
    }

    /// Entries held by a hard failure, their own or an upstream one
    pub fn blocked(&self) -> impl Iterator<Item = &PlanEntry> {
        self.forward_impact.iter().filter(|entry| {
            matches!(entry.state, EntryState::Blocked | EntryState::BlockedUpstream)
        })
    }

    /// True when every forward entry has settled
    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.forward_impact
            .iter()
            .all(|entry| entry.state == EntryState::Settled)
    }

    /// True when the change rippled nowhere
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward_impact.is_empty()
    }

    /// Record that `id`'s content was accepted; dependents held only by this
    /// entry become available again
    ///
    /// # Errors
    /// [`PlanError::UnknownEntry`] if `id` is not a forward entry.
    pub fn mark_settled(&mut self, id: &SectionId) -> Result<(), PlanError> {
        self.ensure_entry(id)?;
        self.marks.insert(id.clone(), Mark::Settled);
        self.recompute_states();
        Ok(())
    }

    /// Record a hard validation failure for `id`; every dependent entry on
    /// the plan is held as [`EntryState::BlockedUpstream`]
    ///
    /// # Errors
    /// [`PlanError::UnknownEntry`] if `id` is not a forward entry.
    pub fn mark_blocked(&mut self, id: &SectionId) -> Result<(), PlanError> {
        self.ensure_entry(id)?;
        self.marks.insert(id.clone(), Mark::Blocked);
        self.recompute_states();
        Ok(())
    }

    fn ensure_entry(&self, id: &SectionId) -> Result<(), PlanError> {
        if self.entry(id).is_none() {
            return Err(PlanError::UnknownEntry { id: id.clone() });
        }
        Ok(())
    }

    /// Derive every entry's state from the explicit marks. Entries are in
    /// topological order, so upstream states are final when a dependent is
    /// visited.
    fn recompute_states(&mut self) {
        let Self {
            forward_impact,
            dependencies,
            marks,
            ..
        } = self;

        let mut states: BTreeMap<SectionId, EntryState> = BTreeMap::new();
        for entry in forward_impact.iter_mut() {
            let state = match marks.get(&entry.id) {
                Some(Mark::Settled) => EntryState::Settled,
                Some(Mark::Blocked) => EntryState::Blocked,
                None => {
                    let held = dependencies.get(&entry.id).into_iter().flatten().any(|parent| {
                        matches!(
                            states.get(parent),
                            Some(EntryState::Blocked | EntryState::BlockedUpstream)
                        )
                    });
                    if held {
                        EntryState::BlockedUpstream
                    } else {
                        EntryState::Pending
                    }
                }
            };
            entry.state = state;
            states.insert(entry.id.clone(), state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{CycleBaseline, SectionChange};
    use crate::propagator::compute_plan;
    use crate::tolerance::NeverReview;
    use pretty_assertions::assert_eq;
    use redline_constraint::ConstraintSet;
    use redline_graph::DocumentGraph;
    use redline_model::{DependencyKind, Edge, GovernanceTier, Section, SectionContent};

    /// root -> mid -> {leaf_a, leaf_b}, all Generated below a Reviewable root.
    fn plan_fixture() -> UpdatePlan {
        let graph = DocumentGraph::build(
            [
                Section::new("root", GovernanceTier::Reviewable, SectionContent::text("r")),
                Section::new("mid", GovernanceTier::Generated, SectionContent::text("m")),
                Section::new("leaf.a", GovernanceTier::Generated, SectionContent::text("a")),
                Section::new("leaf.b", GovernanceTier::Generated, SectionContent::text("b")),
            ],
            [
                Edge::new("root", "mid", DependencyKind::DerivesFrom),
                Edge::new("mid", "leaf.a", DependencyKind::DerivesFrom),
                Edge::new("mid", "leaf.b", DependencyKind::DerivesFrom),
            ],
        )
        .unwrap();
        let baseline = CycleBaseline::capture(&graph);
        compute_plan(
            &graph,
            &ConstraintSet::new(),
            &[SectionChange::bare("root")],
            &baseline,
            &NeverReview,
        )
        .unwrap()
    }

    #[test]
    fn blocking_holds_the_downstream_chain() {
        let mut plan = plan_fixture();
        plan.mark_blocked(&SectionId::new("mid")).unwrap();

        assert_eq!(plan.entry(&SectionId::new("mid")).unwrap().state, EntryState::Blocked);
        assert_eq!(
            plan.entry(&SectionId::new("leaf.a")).unwrap().state,
            EntryState::BlockedUpstream
        );
        assert_eq!(
            plan.entry(&SectionId::new("leaf.b")).unwrap().state,
            EntryState::BlockedUpstream
        );
        assert_eq!(plan.blocked().count(), 3);
    }

    #[test]
    fn settling_releases_held_dependents() {
        let mut plan = plan_fixture();
        plan.mark_blocked(&SectionId::new("mid")).unwrap();
        plan.mark_settled(&SectionId::new("mid")).unwrap();

        assert_eq!(
            plan.entry(&SectionId::new("leaf.a")).unwrap().state,
            EntryState::Pending
        );
        assert_eq!(plan.blocked().count(), 0);
        assert!(!plan.is_stable());

        plan.mark_settled(&SectionId::new("leaf.a")).unwrap();
        plan.mark_settled(&SectionId::new("leaf.b")).unwrap();
        assert!(plan.is_stable());
    }

    #[test]
    fn layers_group_independent_entries() {
        let plan = plan_fixture();
        let layers = plan.layers();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0], vec![SectionId::new("mid")]);
        assert_eq!(layers[1], vec![SectionId::new("leaf.a"), SectionId::new("leaf.b")]);
    }

    #[test]
    fn marking_an_unplanned_section_fails() {
        let mut plan = plan_fixture();
        let err = plan.mark_settled(&SectionId::new("root")).unwrap_err();
        assert_eq!(
            err,
            PlanError::UnknownEntry {
                id: SectionId::new("root")
            }
        );
    }

    #[test]
    fn plan_survives_serde() {
        let mut plan = plan_fixture();
        plan.mark_blocked(&SectionId::new("mid")).unwrap();

        let json = serde_json::to_string(&plan).unwrap();
        let back: UpdatePlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
        assert_eq!(back.blocked().count(), 3);
    }
}
