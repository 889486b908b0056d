//! Section content payloads
//!
//! Content is opaque to the graph but carries ingestion-supplied facets the
//! validator checks exactly: named numeric figures and categorical labels.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The payload of a section
///
/// `body` is the narrative text. `figures` are named numeric claims the
/// ingestion layer extracted ("capex_total" -> 40_000_000.0) and `labels`
/// are categorical references (program names, pillar tags). Both facet maps
/// are ordered so the canonical encoding, and therefore the content hash,
/// is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct SectionContent {
    /// Narrative text of the section
    pub body: String,
    /// Named numeric claims made by the section
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub figures: BTreeMap<String, f64>,
    /// Categorical references made by the section
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub labels: BTreeSet<String>,
}

impl SectionContent {
    /// Content with a body and no facets
    #[inline]
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    /// Add a named numeric figure
    #[must_use]
    pub fn with_figure(mut self, name: impl Into<String>, value: f64) -> Self {
        self.figures.insert(name.into(), value);
        self
    }

    /// Add a categorical label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.insert(label.into());
        self
    }

    /// Look up a figure by name
    #[inline]
    #[must_use]
    pub fn figure(&self, name: &str) -> Option<f64> {
        self.figures.get(name).copied()
    }

    /// True if the body and both facet maps are empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty() && self.figures.is_empty() && self.labels.is_empty()
    }

    /// Canonical byte encoding used for content hashing
    ///
    /// Length-prefixed body followed by sorted figures (name, IEEE-754 bit
    /// pattern) and sorted labels. Two contents with equal fields always
    /// encode identically.
    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.body.len() + 64);
        push_str(&mut buf, &self.body);
        buf.extend_from_slice(&u64_bytes(self.figures.len() as u64));
        for (name, value) in &self.figures {
            push_str(&mut buf, name);
            buf.extend_from_slice(&value.to_bits().to_le_bytes());
        }
        buf.extend_from_slice(&u64_bytes(self.labels.len() as u64));
        for label in &self.labels {
            push_str(&mut buf, label);
        }
        buf
    }
}

fn push_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&u64_bytes(s.len() as u64));
    buf.extend_from_slice(s.as_bytes());
}

#[inline]
fn u64_bytes(n: u64) -> [u8; 8] {
    n.to_le_bytes()
}
