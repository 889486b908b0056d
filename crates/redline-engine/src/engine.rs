//! The facade
//!
//! [`RevisionEngine`] is a thin front over the component crates: one place
//! to hold configuration and the compiled-template state, one error type,
//! no behavior of its own beyond wiring.

use crate::config::EngineConfig;
use crate::error::EngineError;
use redline_constraint::{
    validate, ConstraintCompiler, ConstraintSet, TemplateSet, ValidationResult,
};
use redline_graph::DocumentGraph;
use redline_match::{
    match_revisions, match_revisions_bounded, MatchResult, SectionFingerprint,
};
use redline_model::{
    Edge, Section, SectionContent, SectionId, SimilarityProvider, TermExtractor,
};
use redline_ripple::{compute_plan, CycleBaseline, SectionChange, TolerancePolicy, UpdatePlan};

/// Facade over the revision engine's component crates
///
/// Owns the engine configuration and the constraint compiler (with its
/// per-version cache). Everything else is pure computation over arguments,
/// so one engine value can serve any number of concurrent snapshots.
pub struct RevisionEngine {
    config: EngineConfig,
    compiler: ConstraintCompiler,
}

impl RevisionEngine {
    /// Create an engine with no constraint templates declared
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            compiler: ConstraintCompiler::new(TemplateSet::new()),
        }
    }

    /// Replace the declared constraint templates
    #[must_use]
    pub fn with_templates(mut self, templates: TemplateSet) -> Self {
        self.compiler = ConstraintCompiler::new(templates);
        self
    }

    /// The active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build and publish a snapshot from ingestion output
    ///
    /// # Errors
    /// [`EngineError::Graph`] on duplicate ids, unknown endpoints, or cycles.
    pub fn build_graph(
        &self,
        sections: impl IntoIterator<Item = Section>,
        edges: impl IntoIterator<Item = Edge>,
    ) -> Result<DocumentGraph, EngineError> {
        Ok(DocumentGraph::build(sections, edges)?)
    }

    /// Compile the declared templates against a snapshot
    ///
    /// # Errors
    /// [`EngineError::Compilation`] on malformed template parameters or
    /// declarations naming absent sections.
    pub fn compile_constraints(
        &self,
        graph: &DocumentGraph,
        extractor: &dyn TermExtractor,
    ) -> Result<ConstraintSet, EngineError> {
        Ok(self.compiler.compile_constraints(graph, extractor)?)
    }

    /// Recompile only when a governance source moved past the set's versions
    ///
    /// The explicit version comparison is the sole recompilation trigger; a
    /// fresh set passes straight through untouched.
    ///
    /// # Errors
    /// Same conditions as [`RevisionEngine::compile_constraints`].
    pub fn refresh_constraints(
        &self,
        graph: &DocumentGraph,
        current: ConstraintSet,
        extractor: &dyn TermExtractor,
    ) -> Result<ConstraintSet, EngineError> {
        let stale = current.stale_sources(graph);
        if stale.is_empty() {
            return Ok(current);
        }
        tracing::debug!("recompiling constraints, {} stale sources", stale.len());
        self.compile_constraints(graph, extractor)
    }

    /// Validate proposed content for a target section
    ///
    /// Violations come back as findings inside the result, never as errors.
    ///
    /// # Errors
    /// [`EngineError::Graph`] when the target is not in the snapshot.
    pub fn validate(
        &self,
        graph: &DocumentGraph,
        constraints: &ConstraintSet,
        target_id: &SectionId,
        proposed: &SectionContent,
        similarity: &dyn SimilarityProvider,
    ) -> Result<ValidationResult, EngineError> {
        Ok(validate(graph, constraints, target_id, proposed, similarity)?)
    }

    /// Compute the update plan for a set of accepted edits
    ///
    /// # Errors
    /// [`EngineError::Graph`] when a change names an absent section.
    pub fn compute_ripple_plan(
        &self,
        graph: &DocumentGraph,
        constraints: &ConstraintSet,
        changes: &[SectionChange],
        baseline: &CycleBaseline,
        tolerance: &dyn TolerancePolicy,
    ) -> Result<UpdatePlan, EngineError> {
        Ok(compute_plan(graph, constraints, changes, baseline, tolerance)?)
    }

    /// Align two snapshots' sections under the configured weights/threshold
    ///
    /// # Errors
    /// [`EngineError::Matching`] on malformed fingerprint input.
    pub fn match_revisions(
        &self,
        prev: &[SectionFingerprint],
        curr: &[SectionFingerprint],
    ) -> Result<MatchResult, EngineError> {
        Ok(match_revisions(
            prev,
            curr,
            &self.config.weights,
            self.config.threshold,
        )?)
    }

    /// [`RevisionEngine::match_revisions`] under the configured budget
    ///
    /// # Errors
    /// [`EngineError::Matching`], including
    /// [`redline_match::MatchError::ComputationTimeout`] when the budget
    /// elapses.
    pub async fn match_revisions_bounded(
        &self,
        prev: Vec<SectionFingerprint>,
        curr: Vec<SectionFingerprint>,
    ) -> Result<MatchResult, EngineError> {
        Ok(match_revisions_bounded(
            prev,
            curr,
            self.config.weights,
            None,
            self.config.threshold,
            self.config.match_budget(),
        )
        .await?)
    }
}

impl Default for RevisionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
