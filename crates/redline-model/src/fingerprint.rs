//! Cross-revision similarity fingerprints
//!
//! A [`Fingerprint`] is the compact signature the matcher compares across
//! snapshots. Everything here is computed by external providers during
//! ingestion; the engine never derives embeddings itself.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Per-section similarity signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Fingerprint {
    /// Normalized title tokens
    pub title_tokens: BTreeSet<String>,
    /// Structural-type tag ("heading", "table", "narrative", ...)
    pub structural_type: String,
    /// Content embedding vector, fixed dimension per snapshot pair
    pub embedding: Vec<f32>,
    /// Relative position of the section in document order, in [0, 1]
    pub position: f64,
}

impl Fingerprint {
    /// Create a fingerprint; `position` is clamped into [0, 1]
    #[must_use]
    pub fn new(structural_type: impl Into<String>, position: f64) -> Self {
        Self {
            title_tokens: BTreeSet::new(),
            structural_type: structural_type.into(),
            embedding: Vec::new(),
            position: position.clamp(0.0, 1.0),
        }
    }

    /// Set title tokens from raw title text via [`normalize_title`]
    #[must_use]
    pub fn with_title(mut self, title: &str) -> Self {
        self.title_tokens = normalize_title(title);
        self
    }

    /// Set pre-normalized title tokens
    #[must_use]
    pub fn with_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.title_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Set the embedding vector
    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }
}

/// Lowercase, split on non-alphanumerics, drop empty tokens
///
/// Providers may apply richer normalization; this is the shared fallback so
/// fixtures and ingestion agree on a baseline.
#[must_use]
pub fn normalize_title(title: &str) -> BTreeSet<String> {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_title_splits_and_lowercases() {
        let tokens = normalize_title("FY26 Capital-Expenditure Plan");
        let expected: BTreeSet<String> = ["fy26", "capital", "expenditure", "plan"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn normalize_title_drops_empty_tokens() {
        let tokens = normalize_title("  --  ");
        assert!(tokens.is_empty());
    }

    #[test]
    fn position_is_clamped() {
        assert_eq!(Fingerprint::new("narrative", 1.7).position, 1.0);
        assert_eq!(Fingerprint::new("narrative", -0.2).position, 0.0);
        assert_eq!(Fingerprint::new("narrative", 0.5).position, 0.5);
    }

    #[test]
    fn builder_helpers() {
        let fp = Fingerprint::new("table", 0.25)
            .with_title("Budget Overview")
            .with_embedding(vec![0.1, 0.2]);
        assert!(fp.title_tokens.contains("budget"));
        assert_eq!(fp.embedding.len(), 2);
    }
}
