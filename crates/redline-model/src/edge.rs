//! Dependency edges between sections

use crate::id::SectionId;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Kind of a directed dependency `(source, target)`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum DependencyKind {
    /// Target is derived from the source's content
    DerivesFrom,
    /// Source imposes governance rules on the target
    Constrains,
    /// Source provides background the target cites
    Informs,
    /// Target summarizes the source
    Summarizes,
}

impl DependencyKind {
    /// Edge kinds along which constraints are inherited
    #[inline]
    #[must_use]
    pub const fn carries_constraints(self) -> bool {
        matches!(self, Self::DerivesFrom | Self::Constrains)
    }
}

impl Display for DependencyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DerivesFrom => "derivesFrom",
            Self::Constrains => "constrains",
            Self::Informs => "informs",
            Self::Summarizes => "summarizes",
        };
        f.write_str(name)
    }
}

/// A directed dependency between two sections
///
/// Edges are immutable once a snapshot is built; structural changes mean
/// building a new graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Edge {
    /// Section the dependency starts at
    pub source: SectionId,
    /// Section the dependency points to
    pub target: SectionId,
    /// Relation kind
    pub kind: DependencyKind,
}

impl Edge {
    /// Create an edge
    #[inline]
    #[must_use]
    pub fn new(
        source: impl Into<SectionId>,
        target: impl Into<SectionId>,
        kind: DependencyKind,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
        }
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.source, self.kind, self.target)
    }
}
