//! Testing utilities for the redline workspace
//!
//! Shared fixtures: section shorthands, canonical document graphs, and
//! provider stubs.

#![allow(missing_docs)]

use redline_graph::DocumentGraph;
use redline_model::{
    DependencyKind, Edge, GovernanceTier, Section, SectionContent, SimilarityProvider,
    TermExtractor,
};

/// A similarity provider that scores every pair the same and embeds nothing.
#[derive(Debug, Clone, Copy)]
pub struct SteadySimilarity(pub f64);

impl Default for SteadySimilarity {
    fn default() -> Self {
        Self(1.0)
    }
}

impl SimilarityProvider for SteadySimilarity {
    fn similarity(&self, _: &str, _: &str) -> f64 {
        self.0
    }

    fn embed(&self, _: &str) -> Vec<f32> {
        Vec::new()
    }
}

/// A term extractor that splits on whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordExtractor;

impl TermExtractor for KeywordExtractor {
    fn extract_terms(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_owned).collect()
    }
}

pub fn section(id: &str, tier: GovernanceTier, body: &str) -> Section {
    Section::new(id, tier, SectionContent::text(body))
}

pub fn figure_section(id: &str, tier: GovernanceTier, body: &str, name: &str, value: f64) -> Section {
    Section::new(id, tier, SectionContent::text(body).with_figure(name, value))
}

/// A linear DerivesFrom chain of Generated sections, head first.
pub fn chain_graph(ids: &[&str]) -> DocumentGraph {
    let sections = ids
        .iter()
        .map(|id| section(id, GovernanceTier::Generated, id));
    let edges = ids
        .windows(2)
        .map(|pair| Edge::new(pair[0], pair[1], DependencyKind::DerivesFrom));
    DocumentGraph::build(sections, edges).unwrap()
}

/// The canonical program document used across the workspace's tests.
///
/// A Locked mandate capping `total` at 50M constrains a Reviewable budget
/// (already edited to 34M), which feeds Generated capex and opex details,
/// which feed a Generated summary. A Reviewable contingency hangs off the
/// mandate as the budget's cousin, outside every forward path.
pub fn program_graph() -> DocumentGraph {
    DocumentGraph::build(
        [
            figure_section(
                "mandate",
                GovernanceTier::Locked,
                "spend no more than the cap",
                "total",
                50_000_000.0,
            ),
            figure_section(
                "budget",
                GovernanceTier::Reviewable,
                "allocation plan, revised",
                "total",
                34_000_000.0,
            ),
            figure_section(
                "contingency",
                GovernanceTier::Reviewable,
                "reserve",
                "reserve",
                2_000_000.0,
            ),
            figure_section(
                "capex",
                GovernanceTier::Generated,
                "capital detail",
                "total",
                20_000_000.0,
            ),
            figure_section(
                "opex",
                GovernanceTier::Generated,
                "operating detail",
                "total",
                14_000_000.0,
            ),
            section("summary", GovernanceTier::Generated, "overview"),
        ],
        [
            Edge::new("mandate", "budget", DependencyKind::Constrains),
            Edge::new("mandate", "contingency", DependencyKind::DerivesFrom),
            Edge::new("budget", "capex", DependencyKind::DerivesFrom),
            Edge::new("budget", "opex", DependencyKind::DerivesFrom),
            Edge::new("capex", "summary", DependencyKind::Summarizes),
            Edge::new("opex", "summary", DependencyKind::Summarizes),
        ],
    )
    .unwrap()
}
