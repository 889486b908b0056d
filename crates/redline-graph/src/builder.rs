//! Single-writer graph construction
//!
//! A [`GraphBuilder`] is the only way to create or mutate graph state. It is
//! exclusive by construction (`&mut self` everywhere), validates every
//! mutation before applying it, and publishes an immutable
//! [`DocumentGraph`] handle readers share without locks.

use crate::error::GraphError;
use crate::graph::DocumentGraph;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use redline_model::{DependencyKind, Edge, Section, SectionContent, SectionId};
use std::collections::BTreeMap;

/// Exclusive builder for one document snapshot
///
/// Acyclicity is maintained incrementally: an edge is rejected up front if
/// its target already reaches its source, so the builder never holds a
/// cyclic state, and [`GraphBuilder::publish`] cannot fail.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    sections: BTreeMap<SectionId, Section>,
    edges: Vec<Edge>,
    graph: DiGraph<SectionId, DependencyKind>,
    indices: BTreeMap<SectionId, NodeIndex>,
}

impl GraphBuilder {
    /// Empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from already-validated parts, skipping re-validation
    pub(crate) fn seeded(sections: BTreeMap<SectionId, Section>, edges: Vec<Edge>) -> Self {
        let mut graph = DiGraph::new();
        let mut indices = BTreeMap::new();
        for id in sections.keys() {
            indices.insert(id.clone(), graph.add_node(id.clone()));
        }
        for edge in &edges {
            graph.add_edge(indices[&edge.source], indices[&edge.target], edge.kind);
        }
        Self {
            sections,
            edges,
            graph,
            indices,
        }
    }

    /// Add a section
    ///
    /// # Errors
    /// [`GraphError::DuplicateId`] if the id is already present; the builder
    /// is unchanged.
    pub fn add_section(&mut self, section: Section) -> Result<(), GraphError> {
        let id = section.id().clone();
        if self.sections.contains_key(&id) {
            return Err(GraphError::DuplicateId { id });
        }
        let index = self.graph.add_node(id.clone());
        self.indices.insert(id.clone(), index);
        self.sections.insert(id, section);
        Ok(())
    }

    /// Add a directed dependency edge
    ///
    /// Re-adding an identical edge is a no-op. Parallel edges of different
    /// kinds between the same pair are allowed.
    ///
    /// # Errors
    /// - [`GraphError::UnknownSection`] if either endpoint is absent
    /// - [`GraphError::CycleDetected`] if the edge would close a cycle
    ///   (including self-edges); the builder is unchanged
    pub fn add_edge(
        &mut self,
        source: impl Into<SectionId>,
        target: impl Into<SectionId>,
        kind: DependencyKind,
    ) -> Result<(), GraphError> {
        let source = source.into();
        let target = target.into();

        let Some(&source_idx) = self.indices.get(&source) else {
            return Err(GraphError::UnknownSection { id: source });
        };
        let Some(&target_idx) = self.indices.get(&target) else {
            return Err(GraphError::UnknownSection { id: target });
        };

        if source == target {
            return Err(GraphError::CycleDetected { source, target });
        }

        let edge = Edge::new(source, target, kind);
        if self.edges.contains(&edge) {
            return Ok(());
        }

        // Reachability check before insertion: if the target already reaches
        // the source, this edge closes a cycle.
        if has_path_connecting(&self.graph, target_idx, source_idx, None) {
            return Err(GraphError::CycleDetected {
                source: edge.source,
                target: edge.target,
            });
        }

        self.graph.add_edge(source_idx, target_idx, kind);
        self.edges.push(edge);
        Ok(())
    }

    /// Propose new content for a section, bumping its version
    ///
    /// Returns the new version on success.
    ///
    /// # Errors
    /// - [`GraphError::UnknownSection`] if the id is absent
    /// - [`GraphError::ImmutableSectionViolation`] if the section is Locked
    ///   and already published; the proposal is discarded
    pub fn propose_content(
        &mut self,
        id: &SectionId,
        content: SectionContent,
    ) -> Result<u64, GraphError> {
        let section = self
            .sections
            .get_mut(id)
            .ok_or_else(|| GraphError::UnknownSection { id: id.clone() })?;
        if section.is_immutable() {
            return Err(GraphError::ImmutableSectionViolation { id: id.clone() });
        }
        section.apply_revision(content);
        tracing::debug!("section {} advanced to v{}", id, section.version());
        Ok(section.version())
    }

    /// Section currently held by the builder
    #[inline]
    #[must_use]
    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.get(id)
    }

    /// True if the builder holds the id
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &SectionId) -> bool {
        self.sections.contains_key(id)
    }

    /// Number of sections held
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// True if no sections have been added
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Publish the snapshot: every section is marked published (freezing
    /// Locked content from here on) and an immutable handle is returned
    #[must_use]
    pub fn publish(mut self) -> DocumentGraph {
        for section in self.sections.values_mut() {
            section.mark_published();
        }
        tracing::debug!(
            "published document graph: {} sections, {} edges",
            self.sections.len(),
            self.edges.len()
        );
        self.assemble()
    }

    /// Wrap the builder state into an immutable graph without touching
    /// publication flags. Restore paths use this; everyone else publishes.
    pub(crate) fn assemble(mut self) -> DocumentGraph {
        self.edges.sort();
        DocumentGraph::from_validated(self.sections, self.edges, self.graph, self.indices)
    }
}
