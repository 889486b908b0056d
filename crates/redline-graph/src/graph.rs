//! Published, immutable document graphs
//!
//! A [`DocumentGraph`] can only be obtained from a [`GraphBuilder`], so its
//! invariants are carried as proof: the edge relation is acyclic, every edge
//! endpoint exists, and every section hash matches its content. All reads
//! are lock-free and safe to share across threads.

use crate::builder::GraphBuilder;
use crate::error::GraphError;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use redline_model::{DependencyKind, Edge, Section, SectionId};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashSet, VecDeque};

/// Immutable snapshot of one document revision
#[derive(Debug, Clone)]
pub struct DocumentGraph {
    sections: BTreeMap<SectionId, Section>,
    edges: Vec<Edge>,
    graph: DiGraph<SectionId, DependencyKind>,
    indices: BTreeMap<SectionId, NodeIndex>,
}

impl DocumentGraph {
    /// Build and publish a snapshot from ingestion output
    ///
    /// # Errors
    /// Propagates the first structural error encountered:
    /// [`GraphError::DuplicateId`], [`GraphError::UnknownSection`], or
    /// [`GraphError::CycleDetected`].
    pub fn build(
        sections: impl IntoIterator<Item = Section>,
        edges: impl IntoIterator<Item = Edge>,
    ) -> Result<Self, GraphError> {
        let mut builder = GraphBuilder::new();
        for section in sections {
            builder.add_section(section)?;
        }
        for edge in edges {
            builder.add_edge(edge.source, edge.target, edge.kind)?;
        }
        Ok(builder.publish())
    }

    pub(crate) fn from_validated(
        sections: BTreeMap<SectionId, Section>,
        edges: Vec<Edge>,
        graph: DiGraph<SectionId, DependencyKind>,
        indices: BTreeMap<SectionId, NodeIndex>,
    ) -> Self {
        Self {
            sections,
            edges,
            graph,
            indices,
        }
    }

    /// Open a fresh builder seeded with this snapshot's state
    ///
    /// Publication flags carry over, so Locked content stays frozen in the
    /// next revision. Structure may be extended; the result is a new
    /// snapshot, never a mutation of this one.
    #[must_use]
    pub fn reopen(&self) -> GraphBuilder {
        GraphBuilder::seeded(self.sections.clone(), self.edges.clone())
    }

    /// Look up a section
    #[inline]
    #[must_use]
    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.get(id)
    }

    /// Sections in ascending id order
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    /// Section ids in ascending order
    pub fn section_ids(&self) -> impl Iterator<Item = &SectionId> {
        self.sections.keys()
    }

    /// All edges, sorted
    #[inline]
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// True if the snapshot holds the id
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &SectionId) -> bool {
        self.sections.contains_key(id)
    }

    /// Current version of a section
    #[inline]
    #[must_use]
    pub fn version_of(&self, id: &SectionId) -> Option<u64> {
        self.sections.get(id).map(Section::version)
    }

    /// Number of sections
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// True if the snapshot is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Deterministic total order consistent with every edge
    ///
    /// Ties between independent sections are broken by ascending id, so the
    /// output is identical across calls and across runs on identical input.
    /// Never fails: published graphs are acyclic by construction.
    #[must_use]
    pub fn topological_order(&self) -> Vec<SectionId> {
        let mut indegree: BTreeMap<&SectionId, usize> =
            self.sections.keys().map(|id| (id, 0usize)).collect();
        let mut outgoing: BTreeMap<&SectionId, Vec<&SectionId>> = BTreeMap::new();
        for edge in &self.edges {
            if let Some(count) = indegree.get_mut(&edge.target) {
                *count += 1;
            }
            outgoing.entry(&edge.source).or_default().push(&edge.target);
        }

        let mut ready: BinaryHeap<Reverse<&SectionId>> = indegree
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(&id, _)| Reverse(id))
            .collect();

        let mut order = Vec::with_capacity(self.sections.len());
        while let Some(Reverse(id)) = ready.pop() {
            order.push(id.clone());
            if let Some(targets) = outgoing.get(id) {
                for &target in targets {
                    if let Some(count) = indegree.get_mut(target) {
                        *count -= 1;
                        if *count == 0 {
                            ready.push(Reverse(target));
                        }
                    }
                }
            }
        }
        order
    }

    /// Transitive ancestors of `id`, excluding `id` itself
    ///
    /// # Errors
    /// [`GraphError::UnknownSection`] if the id is absent.
    pub fn ancestors_of(&self, id: &SectionId) -> Result<BTreeSet<SectionId>, GraphError> {
        let start = self.index_of(id)?;
        Ok(self.reach(start, Direction::Incoming))
    }

    /// Transitive descendants of `id`, excluding `id` itself
    ///
    /// # Errors
    /// [`GraphError::UnknownSection`] if the id is absent.
    pub fn descendants_of(&self, id: &SectionId) -> Result<BTreeSet<SectionId>, GraphError> {
        let start = self.index_of(id)?;
        Ok(self.reach(start, Direction::Outgoing))
    }

    /// Sections that are ancestors of both `a` and `b`
    ///
    /// # Errors
    /// [`GraphError::UnknownSection`] if either id is absent.
    pub fn common_ancestors(
        &self,
        a: &SectionId,
        b: &SectionId,
    ) -> Result<BTreeSet<SectionId>, GraphError> {
        let of_a = self.ancestors_of(a)?;
        let of_b = self.ancestors_of(b)?;
        Ok(of_a.intersection(&of_b).cloned().collect())
    }

    /// Ancestors within `max_depth` hops, with their minimum hop distance
    ///
    /// # Errors
    /// [`GraphError::UnknownSection`] if the id is absent.
    pub fn ancestors_within(
        &self,
        id: &SectionId,
        max_depth: usize,
    ) -> Result<BTreeMap<SectionId, usize>, GraphError> {
        let start = self.index_of(id)?;
        Ok(self.reach_within(start, Direction::Incoming, max_depth))
    }

    /// Descendants within `max_depth` hops, with their minimum hop distance
    ///
    /// # Errors
    /// [`GraphError::UnknownSection`] if the id is absent.
    pub fn descendants_within(
        &self,
        id: &SectionId,
        max_depth: usize,
    ) -> Result<BTreeMap<SectionId, usize>, GraphError> {
        let start = self.index_of(id)?;
        Ok(self.reach_within(start, Direction::Outgoing, max_depth))
    }

    /// SHA-256 digest of the snapshot's structure and content state
    ///
    /// Covers sorted sections (id, version, content hash) and sorted edges.
    /// Two snapshots with identical state digest identically.
    #[must_use]
    pub fn structural_digest(&self) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        for (id, section) in &self.sections {
            hasher.update(id.as_str().as_bytes());
            hasher.update(section.version().to_le_bytes());
            hasher.update(section.content_hash().as_bytes());
        }
        for edge in &self.edges {
            hasher.update(edge.source.as_str().as_bytes());
            hasher.update([edge.kind as u8]);
            hasher.update(edge.target.as_str().as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    fn index_of(&self, id: &SectionId) -> Result<NodeIndex, GraphError> {
        self.indices
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownSection { id: id.clone() })
    }

    fn reach(&self, start: NodeIndex, dir: Direction) -> BTreeSet<SectionId> {
        let mut seen: HashSet<NodeIndex> = HashSet::from([start]);
        let mut queue: VecDeque<NodeIndex> = VecDeque::from([start]);
        let mut out = BTreeSet::new();
        while let Some(node) = queue.pop_front() {
            for next in self.graph.neighbors_directed(node, dir) {
                if seen.insert(next) {
                    queue.push_back(next);
                    out.insert(self.graph[next].clone());
                }
            }
        }
        out
    }

    fn reach_within(
        &self,
        start: NodeIndex,
        dir: Direction,
        max_depth: usize,
    ) -> BTreeMap<SectionId, usize> {
        let mut seen: HashSet<NodeIndex> = HashSet::from([start]);
        let mut frontier = vec![start];
        let mut out = BTreeMap::new();
        for depth in 1..=max_depth {
            let mut next_frontier = Vec::new();
            for node in frontier {
                for next in self.graph.neighbors_directed(node, dir) {
                    if seen.insert(next) {
                        out.insert(self.graph[next].clone(), depth);
                        next_frontier.push(next);
                    }
                }
            }
            if next_frontier.is_empty() {
                break;
            }
            frontier = next_frontier;
        }
        out
    }
}
