//! The revision cycle driver
//!
//! The planner decides what needs doing; this driver does the walking. Each
//! round it computes the plan for the accepted changes, dispatches the
//! current layer's regenerations and reviews concurrently through the
//! caller's [`Regenerator`], validates what comes back, and feeds the
//! applied updates into the next round as fresh changes. Hard constraint
//! violations block an entry and everything downstream of it; a cycle that
//! stops making progress or exhausts its round budget escalates with
//! diagnostics instead of spinning.
//!
//! Content generation never happens here. The driver owns the loop and the
//! bookkeeping; words come from the caller's agent.

use crate::engine::RevisionEngine;
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use redline_constraint::ConstraintSet;
use redline_graph::DocumentGraph;
use redline_model::{ConstraintId, Section, SectionContent, SectionId, SimilarityProvider, TermExtractor};
use redline_ripple::{
    ChangeSummary, CycleBaseline, EntryState, PlanAction, SectionChange, TolerancePolicy,
    UpdatePlan,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use ulid::Ulid;

/// Unique revision cycle identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CycleId(pub Ulid);

impl CycleId {
    /// Generate a new cycle id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for CycleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failure reported by a [`Regenerator`] implementation
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct AgentError {
    /// What went wrong, in the agent's words
    pub reason: String,
}

impl AgentError {
    /// Wrap a failure description
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A reviewer's decision on a section the plan flagged for review
#[derive(Debug, Clone)]
pub enum ReviewVerdict {
    /// Content stands as written
    Approved,
    /// Content stands with the reviewer's edits applied
    Revised(SectionContent),
    /// Content cannot stand; the entry blocks
    Rejected {
        /// Reviewer's reason, surfaced in the escalation
        reason: String,
    },
}

/// The caller's content generation and review capability
///
/// The driver calls `regenerate` for Generated sections and `review` for
/// Reviewable ones, concurrently within a plan layer. Implementations carry
/// their own model access, retries, and rate limits; the driver treats a
/// returned error as fatal to the cycle.
#[async_trait::async_trait]
pub trait Regenerator: Send + Sync {
    /// Produce replacement content for `section`
    ///
    /// `gating` lists the constraint ids the replacement must satisfy;
    /// the driver validates the result against them before applying it.
    ///
    /// # Errors
    /// Any [`AgentError`] aborts the cycle.
    async fn regenerate(
        &self,
        section: &Section,
        gating: &[ConstraintId],
    ) -> Result<SectionContent, AgentError>;

    /// Decide whether `section` still stands after its inputs changed
    ///
    /// # Errors
    /// Any [`AgentError`] aborts the cycle.
    async fn review(&self, section: &Section) -> Result<ReviewVerdict, AgentError>;
}

/// A blocked plan entry with the rules it failed to clear
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedSection {
    /// The blocked section
    pub id: SectionId,
    /// Constraints gating it
    pub gating: Vec<ConstraintId>,
}

/// Diagnostics for a cycle that could not stabilize
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Escalation {
    /// Rounds completed before giving up
    pub rounds_completed: u32,
    /// Entries blocked on hard violations or rejections
    pub blocked: Vec<BlockedSection>,
    /// Entries still pending when the budget ran out
    pub unresolved: Vec<SectionId>,
    /// Concrete next steps for a human operator
    pub suggested_actions: Vec<String>,
}

impl Display for Escalation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycle stalled after {} rounds with {} blocked and {} unresolved sections",
            self.rounds_completed,
            self.blocked.len(),
            self.unresolved.len()
        )
    }
}

/// Summary of a completed revision cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Cycle identity
    pub cycle: CycleId,
    /// Wall-clock start
    pub started_at: DateTime<Utc>,
    /// Wall-clock end
    pub finished_at: DateTime<Utc>,
    /// Plan rounds executed
    pub rounds: u32,
    /// Sections regenerated, in application order
    pub regenerated: Vec<SectionId>,
    /// Sections reviewed, in application order
    pub reviewed: Vec<SectionId>,
    /// Governance ancestors flagged for human backward review
    pub backward_review: BTreeSet<SectionId>,
    /// Same-tier cousins flagged for consistency checks
    pub lateral_check: BTreeSet<SectionId>,
}

/// What a stabilized cycle hands back
#[derive(Debug)]
pub struct CycleOutcome {
    /// The final published snapshot
    pub graph: DocumentGraph,
    /// Constraints recompiled against the final snapshot where stale
    pub constraints: ConstraintSet,
    /// The cycle's report
    pub report: CycleReport,
}

enum AgentOutput {
    Content(SectionContent),
    Verdict(ReviewVerdict),
}

/// Walks update plans to a stable state using a caller-supplied agent
pub struct RevisionDriver {
    engine: RevisionEngine,
    agent: Arc<dyn Regenerator>,
}

impl RevisionDriver {
    /// Pair an engine with a regeneration agent
    #[must_use]
    pub fn new(engine: RevisionEngine, agent: Arc<dyn Regenerator>) -> Self {
        Self { engine, agent }
    }

    /// The underlying engine
    #[inline]
    #[must_use]
    pub fn engine(&self) -> &RevisionEngine {
        &self.engine
    }

    /// Run one revision cycle to a stable state
    ///
    /// Compiles constraints, then rounds of: plan, dispatch a layer at a
    /// time, validate, apply through a single-writer builder, republish.
    /// Applied updates become the next round's changes; the cycle is stable
    /// when the plan comes back empty and nothing is left blocked.
    ///
    /// # Errors
    /// Component errors pass through; [`EngineError::AgentFailed`] when the
    /// agent errors or a worker is lost; [`EngineError::Escalated`] when a
    /// round settles nothing, `max_cycles` is exceeded, or blocked entries
    /// remain once the ripple has run dry.
    pub async fn run_cycle(
        &self,
        mut graph: DocumentGraph,
        mut changes: Vec<SectionChange>,
        tolerance: &dyn TolerancePolicy,
        similarity: &dyn SimilarityProvider,
        extractor: &dyn TermExtractor,
    ) -> Result<CycleOutcome, EngineError> {
        let cycle = CycleId::new();
        let started_at = Utc::now();
        let baseline = CycleBaseline::capture(&graph);

        let mut constraints = self.engine.compile_constraints(&graph, extractor)?;
        let mut rounds = 0u32;
        let mut regenerated: Vec<SectionId> = Vec::new();
        let mut reviewed: Vec<SectionId> = Vec::new();
        let mut backward_review: BTreeSet<SectionId> = BTreeSet::new();
        let mut lateral_check: BTreeSet<SectionId> = BTreeSet::new();
        // Hard failures and their held dependents, carried across rounds
        // until a later round settles them.
        let mut blocked: BTreeMap<SectionId, Vec<ConstraintId>> = BTreeMap::new();
        let mut held: BTreeSet<SectionId> = BTreeSet::new();

        loop {
            let mut plan = self.engine.compute_ripple_plan(
                &graph,
                &constraints,
                &changes,
                &baseline,
                tolerance,
            )?;
            backward_review.extend(plan.backward_review().iter().cloned());
            lateral_check.extend(plan.lateral_check().iter().cloned());

            if plan.is_empty() {
                break;
            }
            if rounds >= self.engine.config().max_cycles {
                let pending = plan.pending().map(|entry| entry.id.clone());
                return Err(EngineError::Escalated {
                    escalation: build_escalation(rounds, &blocked, &held, pending),
                });
            }
            rounds += 1;

            let round = self
                .run_round(&graph, &constraints, &mut plan, similarity)
                .await?;
            for change in &round.changes {
                blocked.remove(&change.id);
                held.remove(&change.id);
            }
            for entry in plan.blocked() {
                if entry.state == EntryState::Blocked {
                    blocked.insert(entry.id.clone(), entry.gating.clone());
                } else {
                    held.insert(entry.id.clone());
                }
            }
            if round.settled == 0 {
                let pending = plan.pending().map(|entry| entry.id.clone());
                return Err(EngineError::Escalated {
                    escalation: build_escalation(rounds, &blocked, &held, pending),
                });
            }

            graph = round.builder.publish();
            constraints = self
                .engine
                .refresh_constraints(&graph, constraints, extractor)?;
            changes = round.changes;
            regenerated.extend(round.regenerated);
            reviewed.extend(round.reviewed);
        }

        if !blocked.is_empty() || !held.is_empty() {
            return Err(EngineError::Escalated {
                escalation: build_escalation(rounds, &blocked, &held, std::iter::empty()),
            });
        }

        tracing::info!(
            "cycle {} stable after {} rounds, {} regenerated, {} reviewed",
            cycle,
            rounds,
            regenerated.len(),
            reviewed.len()
        );

        Ok(CycleOutcome {
            graph,
            constraints,
            report: CycleReport {
                cycle,
                started_at,
                finished_at: Utc::now(),
                rounds,
                regenerated,
                reviewed,
                backward_review,
                lateral_check,
            },
        })
    }

    /// Dispatch and apply one full pass over the plan's layers
    async fn run_round(
        &self,
        graph: &DocumentGraph,
        constraints: &ConstraintSet,
        plan: &mut UpdatePlan,
        similarity: &dyn SimilarityProvider,
    ) -> Result<RoundOutcome, EngineError> {
        let mut round = RoundOutcome::new(graph.reopen());

        for layer in plan.layers() {
            let outcomes: Arc<DashMap<SectionId, Result<AgentOutput, AgentError>>> =
                Arc::new(DashMap::new());
            let mut tasks: JoinSet<()> = JoinSet::new();
            let mut dispatched: Vec<SectionId> = Vec::new();

            for id in layer {
                let Some(entry) = plan.entry(&id) else { continue };
                if entry.state != EntryState::Pending {
                    continue;
                }
                let Some(section) = graph.section(&id).cloned() else {
                    continue;
                };
                let action = entry.action;
                let gating = entry.gating.clone();
                let agent = Arc::clone(&self.agent);
                let sink = Arc::clone(&outcomes);
                dispatched.push(id.clone());
                tasks.spawn(async move {
                    let outcome = match action {
                        PlanAction::NeedsRegeneration => agent
                            .regenerate(&section, &gating)
                            .await
                            .map(AgentOutput::Content),
                        PlanAction::NeedsReview => {
                            agent.review(&section).await.map(AgentOutput::Verdict)
                        }
                    };
                    sink.insert(id, outcome);
                });
            }

            while let Some(joined) = tasks.join_next().await {
                if let Err(join_error) = joined {
                    tracing::warn!("agent worker lost: {}", join_error);
                }
            }

            for id in dispatched {
                let Some((_, outcome)) = outcomes.remove(&id) else {
                    return Err(EngineError::AgentFailed {
                        id,
                        reason: "agent worker terminated abnormally".to_owned(),
                    });
                };
                match outcome {
                    Ok(AgentOutput::Content(content)) => {
                        self.apply_proposal(
                            graph,
                            constraints,
                            plan,
                            &mut round,
                            &id,
                            content,
                            Applied::Regenerated,
                            similarity,
                        )?;
                    }
                    Ok(AgentOutput::Verdict(ReviewVerdict::Approved)) => {
                        let Some(section) = graph.section(&id) else { continue };
                        // Re-proposing the standing content advances the
                        // version, which is what records the review against
                        // this cycle's baseline.
                        round.builder.propose_content(&id, section.content().clone())?;
                        plan.mark_settled(&id)?;
                        round.settled += 1;
                        round.changes.push(SectionChange::bare(id.clone()));
                        round.reviewed.push(id);
                    }
                    Ok(AgentOutput::Verdict(ReviewVerdict::Revised(content))) => {
                        self.apply_proposal(
                            graph,
                            constraints,
                            plan,
                            &mut round,
                            &id,
                            content,
                            Applied::Reviewed,
                            similarity,
                        )?;
                    }
                    Ok(AgentOutput::Verdict(ReviewVerdict::Rejected { reason })) => {
                        tracing::warn!("review rejected {}: {}", id, reason);
                        plan.mark_blocked(&id)?;
                    }
                    Err(agent_error) => {
                        return Err(EngineError::AgentFailed {
                            id,
                            reason: agent_error.reason,
                        });
                    }
                }
            }
        }

        Ok(round)
    }

    /// Validate one proposal and either apply it or block the entry
    #[allow(clippy::too_many_arguments)]
    fn apply_proposal(
        &self,
        graph: &DocumentGraph,
        constraints: &ConstraintSet,
        plan: &mut UpdatePlan,
        round: &mut RoundOutcome,
        id: &SectionId,
        content: SectionContent,
        kind: Applied,
        similarity: &dyn SimilarityProvider,
    ) -> Result<(), EngineError> {
        let validation = self
            .engine
            .validate(graph, constraints, id, &content, similarity)?;
        if !validation.accepted() {
            let failed = validation.hard_violations().count();
            tracing::warn!("blocking {}: {} hard constraint violations", id, failed);
            plan.mark_blocked(id)?;
            return Ok(());
        }
        for advisory in validation.violations() {
            tracing::debug!("soft finding on {}: {}", id, advisory.detail);
        }

        let summary = graph
            .section(id)
            .map_or_else(ChangeSummary::empty, |section| {
                ChangeSummary::between(section.content(), &content)
            });
        round.builder.propose_content(id, content)?;
        plan.mark_settled(id)?;
        round.settled += 1;
        round.changes.push(SectionChange::new(id.clone(), summary));
        match kind {
            Applied::Regenerated => round.regenerated.push(id.clone()),
            Applied::Reviewed => round.reviewed.push(id.clone()),
        }
        Ok(())
    }
}

enum Applied {
    Regenerated,
    Reviewed,
}

struct RoundOutcome {
    builder: redline_graph::GraphBuilder,
    settled: usize,
    changes: Vec<SectionChange>,
    regenerated: Vec<SectionId>,
    reviewed: Vec<SectionId>,
}

impl RoundOutcome {
    fn new(builder: redline_graph::GraphBuilder) -> Self {
        Self {
            builder,
            settled: 0,
            changes: Vec::new(),
            regenerated: Vec::new(),
            reviewed: Vec::new(),
        }
    }
}

fn build_escalation(
    rounds_completed: u32,
    blocked: &BTreeMap<SectionId, Vec<ConstraintId>>,
    held: &BTreeSet<SectionId>,
    pending: impl Iterator<Item = SectionId>,
) -> Escalation {
    let blocked: Vec<BlockedSection> = blocked
        .iter()
        .map(|(id, gating)| BlockedSection {
            id: id.clone(),
            gating: gating.clone(),
        })
        .collect();
    let mut unresolved: BTreeSet<SectionId> = held.clone();
    unresolved.extend(pending);
    for section in &blocked {
        unresolved.remove(&section.id);
    }
    let unresolved: Vec<SectionId> = unresolved.into_iter().collect();

    let mut suggested_actions = Vec::new();
    if !blocked.is_empty() {
        let ids: Vec<String> = blocked
            .iter()
            .map(|section| section.id.to_string())
            .collect();
        suggested_actions.push(format!(
            "resolve hard constraint violations on: {}",
            ids.join(", ")
        ));
    }
    if !unresolved.is_empty() {
        suggested_actions.push(
            "raise max_cycles or split the change set into smaller batches".to_owned(),
        );
    }
    suggested_actions.push("review the governing sections' figures and rerun".to_owned());

    tracing::warn!(
        "escalating after {} rounds: {} blocked, {} unresolved",
        rounds_completed,
        blocked.len(),
        unresolved.len()
    );

    Escalation {
        rounds_completed,
        blocked,
        unresolved,
        suggested_actions,
    }
}
