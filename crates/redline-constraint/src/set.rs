//! Versioned, explicit constraint store
//!
//! The compiled rule set is a value passed into every validation call, not
//! ambient state. It records each governance source's version at compile
//! time so staleness is an explicit comparison, never an implicit
//! invalidation.

use crate::error::CompilationError;
use crate::rule::Constraint;
use indexmap::IndexMap;
use redline_graph::DocumentGraph;
use redline_model::{ConstraintId, SectionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Compiled constraints for one published snapshot
///
/// Iteration order is compile order: sources in topological order, templates
/// in declaration order. Serializable as the logical constraint table plus
/// the per-source version ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    constraints: IndexMap<ConstraintId, Constraint>,
    source_versions: BTreeMap<SectionId, u64>,
}

impl ConstraintSet {
    /// Empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, constraint: Constraint) -> Result<(), CompilationError> {
        if self.constraints.contains_key(&constraint.id) {
            return Err(CompilationError::DuplicateConstraint {
                id: constraint.id.clone(),
            });
        }
        self.constraints.insert(constraint.id.clone(), constraint);
        Ok(())
    }

    /// Record a governance source's version, whether or not it yielded
    /// constraints. Sources with zero templates still participate in
    /// staleness tracking.
    pub(crate) fn record_source(&mut self, source: SectionId, version: u64) {
        self.source_versions.insert(source, version);
    }

    /// Look up one constraint
    #[must_use]
    pub fn get(&self, id: &ConstraintId) -> Option<&Constraint> {
        self.constraints.get(id)
    }

    /// All constraints in compile order
    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.values()
    }

    /// Constraints compiled from one source, in declaration order
    pub fn by_source<'a>(&'a self, source: &'a SectionId) -> impl Iterator<Item = &'a Constraint> {
        self.constraints
            .values()
            .filter(move |constraint| &constraint.source == source)
    }

    /// Per-source versions recorded at compile time, ascending by id
    pub fn sources(&self) -> impl Iterator<Item = (&SectionId, u64)> {
        self.source_versions.iter().map(|(id, &version)| (id, version))
    }

    /// Version recorded for `source`, if it was compiled
    #[must_use]
    pub fn source_version(&self, source: &SectionId) -> Option<u64> {
        self.source_versions.get(source).copied()
    }

    /// Number of compiled constraints
    #[must_use]
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// True when no constraints were compiled
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Governance sections whose current version differs from the version
    /// this set was compiled against, plus governance sections the set has
    /// never seen. Non-empty means the set must be recompiled before its
    /// verdicts can be trusted.
    #[must_use]
    pub fn stale_sources(&self, graph: &DocumentGraph) -> Vec<SectionId> {
        graph
            .sections()
            .filter(|section| section.tier().is_governance())
            .filter(|section| {
                self.source_versions.get(section.id()) != Some(&section.version())
            })
            .map(|section| section.id().clone())
            .collect()
    }
}

impl<'a> IntoIterator for &'a ConstraintSet {
    type Item = &'a Constraint;
    type IntoIter = indexmap::map::Values<'a, ConstraintId, Constraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.constraints.values()
    }
}
