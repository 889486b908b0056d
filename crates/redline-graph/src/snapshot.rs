//! Persisted-snapshot schema
//!
//! The engine owns no storage. These row types mirror the logical section
//! and edge tables a caller's storage layer keeps, and are sufficient to
//! reconstruct a [`DocumentGraph`] exactly. Restoring re-runs full
//! structural validation and verifies every stored content hash.

use crate::builder::GraphBuilder;
use crate::error::GraphError;
use crate::graph::DocumentGraph;
use redline_model::{
    ConstraintId, ContentHash, Edge, GovernanceTier, HashError, Section, SectionContent, SectionId,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One row of the section table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SectionRow {
    /// Section id
    pub id: SectionId,
    /// Governance tier
    pub tier: GovernanceTier,
    /// Content payload
    pub content: SectionContent,
    /// Hex-encoded BLAKE3 digest of `content`
    pub content_hash: String,
    /// Monotonic version counter
    pub version: u64,
    /// Ordered rule ids targeting this section
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ConstraintId>,
    /// Whether the section has been part of a published snapshot
    pub published: bool,
    /// Whether the matcher superseded this section
    pub deprecated: bool,
}

/// Full snapshot: section rows plus edge rows
///
/// Edge rows are plain [`Edge`] values; the wire shape already matches the
/// logical table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GraphSnapshot {
    /// Section rows in ascending id order
    pub sections: Vec<SectionRow>,
    /// Edge rows, sorted
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    /// Capture a snapshot of a published graph
    #[must_use]
    pub fn capture(graph: &DocumentGraph) -> Self {
        let sections = graph
            .sections()
            .map(|section| SectionRow {
                id: section.id().clone(),
                tier: section.tier(),
                content: section.content().clone(),
                content_hash: section.content_hash().to_string(),
                version: section.version(),
                constraints: section.constraints().to_vec(),
                published: section.is_published(),
                deprecated: section.is_deprecated(),
            })
            .collect();
        Self {
            sections,
            edges: graph.edges().to_vec(),
        }
    }

    /// Reconstruct the graph, re-validating structure and content hashes
    ///
    /// # Errors
    /// - [`RestoreError::BadHash`] if a stored hash does not parse
    /// - [`RestoreError::HashMismatch`] if a stored hash disagrees with the
    ///   recomputed digest of the row's content
    /// - [`RestoreError::Graph`] for duplicate ids, dangling edges, or
    ///   cycles in the stored rows
    pub fn restore(&self) -> Result<DocumentGraph, RestoreError> {
        let mut builder = GraphBuilder::new();
        for row in &self.sections {
            let stored: ContentHash =
                row.content_hash
                    .parse()
                    .map_err(|source| RestoreError::BadHash {
                        id: row.id.clone(),
                        source,
                    })?;
            let section = Section::restore(
                row.id.clone(),
                row.tier,
                row.content.clone(),
                row.version,
                row.constraints.clone(),
                row.published,
                row.deprecated,
            );
            if section.content_hash() != stored {
                return Err(RestoreError::HashMismatch { id: row.id.clone() });
            }
            builder.add_section(section)?;
        }
        for edge in &self.edges {
            builder.add_edge(edge.source.clone(), edge.target.clone(), edge.kind)?;
        }
        // Publication state comes from the rows, not from publishing again.
        Ok(builder.assemble())
    }
}

/// Errors from reconstructing a graph out of persisted rows
#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    /// Stored hash string is not a valid digest
    #[error("invalid stored hash for {id}: {source}")]
    BadHash {
        /// Row id
        id: SectionId,
        /// Parse failure
        source: HashError,
    },

    /// Stored hash disagrees with the row's content
    #[error("stored hash for {id} does not match recomputed content hash")]
    HashMismatch {
        /// Row id
        id: SectionId,
    },

    /// Rows violate a structural invariant
    #[error(transparent)]
    Graph(#[from] GraphError),
}
