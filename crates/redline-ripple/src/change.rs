//! Accepted edits and the cycle baseline

use redline_graph::DocumentGraph;
use redline_model::{SectionContent, SectionId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Before/after values of one named figure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FigureDelta {
    /// Value before the edit, if the figure existed
    pub before: Option<f64>,
    /// Value after the edit, if the figure survives
    pub after: Option<f64>,
}

impl FigureDelta {
    /// Relative magnitude `|after - before| / |before|`, when computable
    #[must_use]
    pub fn relative_change(&self) -> Option<f64> {
        match (self.before, self.after) {
            (Some(before), Some(after)) if before != 0.0 => {
                Some(((after - before) / before).abs())
            }
            _ => None,
        }
    }

    /// True when the figure appeared, vanished, or moved off zero; such
    /// deltas have no meaningful relative magnitude and are treated as
    /// crossing any fractional tolerance
    #[must_use]
    pub fn is_structural(&self) -> bool {
        match (self.before, self.after) {
            (Some(before), Some(after)) => before == 0.0 && after != 0.0,
            (None, None) => false,
            _ => true,
        }
    }
}

/// What changed in one accepted edit, in terms tolerance policies understand
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// Figures that differ between the revisions
    pub figure_deltas: BTreeMap<String, FigureDelta>,
    /// Terms the revision references that the previous content did not
    pub new_terms: BTreeSet<String>,
    /// Optional caller-assigned change category (for example "scope")
    pub category: Option<String>,
}

impl ChangeSummary {
    /// Summary with no recorded differences
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Diff two content payloads: figure deltas from the figure facets, new
    /// terms from the label facets. Callers with an extraction provider may
    /// extend `new_terms` with extracted vocabulary before planning.
    #[must_use]
    pub fn between(before: &SectionContent, after: &SectionContent) -> Self {
        let mut figure_deltas = BTreeMap::new();
        let names: BTreeSet<&String> =
            before.figures.keys().chain(after.figures.keys()).collect();
        for name in names {
            let delta = FigureDelta {
                before: before.figure(name),
                after: after.figure(name),
            };
            if delta.before != delta.after {
                figure_deltas.insert(name.clone(), delta);
            }
        }

        let new_terms = after
            .labels
            .difference(&before.labels)
            .cloned()
            .collect();

        Self {
            figure_deltas,
            new_terms,
            category: None,
        }
    }

    /// Attach a caller-assigned category
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Record an additional newly referenced term
    #[must_use]
    pub fn with_new_term(mut self, term: impl Into<String>) -> Self {
        self.new_terms.insert(term.into());
        self
    }
}

/// One accepted edit feeding the planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionChange {
    /// Edited section
    pub id: SectionId,
    /// What changed, for tolerance decisions
    pub summary: ChangeSummary,
}

impl SectionChange {
    /// Change with an explicit summary
    #[must_use]
    pub fn new(id: impl Into<SectionId>, summary: ChangeSummary) -> Self {
        Self {
            id: id.into(),
            summary,
        }
    }

    /// Change with nothing tolerance-relevant recorded
    #[must_use]
    pub fn bare(id: impl Into<SectionId>) -> Self {
        Self::new(id, ChangeSummary::empty())
    }
}

/// Per-section version vector captured when a revision cycle begins
///
/// The planner's idempotence guard compares current versions against this
/// baseline: a section whose version already moved past it has been handled
/// this cycle and drops out of further forward impact. Sections absent from
/// the baseline count as already advanced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleBaseline {
    versions: BTreeMap<SectionId, u64>,
}

impl CycleBaseline {
    /// Capture the version vector of a published snapshot
    #[must_use]
    pub fn capture(graph: &DocumentGraph) -> Self {
        Self {
            versions: graph
                .sections()
                .map(|section| (section.id().clone(), section.version()))
                .collect(),
        }
    }

    /// Baseline version recorded for `id`
    #[must_use]
    pub fn version_of(&self, id: &SectionId) -> Option<u64> {
        self.versions.get(id).copied()
    }

    /// True when `id`'s version in `graph` has moved past the baseline
    #[must_use]
    pub fn is_advanced(&self, graph: &DocumentGraph, id: &SectionId) -> bool {
        match (graph.version_of(id), self.version_of(id)) {
            (Some(current), Some(baseline)) => current > baseline,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Number of sections recorded
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// True when nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
