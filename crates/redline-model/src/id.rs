//! Stable identifiers for sections and constraints
//!
//! Ids are assigned by the ingestion layer and carried across revision
//! cycles by the matcher. Ascending [`SectionId`] order is the deterministic
//! tie-break used throughout the workspace, so both id types are fully
//! ordered.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Stable identifier of a document section
///
/// Opaque to the engine: ingestion may use slugs ("budget.capex"), numbers,
/// or anything else, as long as ids are unique within a snapshot.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    /// Create a section id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SectionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for SectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of a compiled governance rule
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct ConstraintId(String);

impl ConstraintId {
    /// Create a constraint id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive the id for a template instantiated from a governance section
    ///
    /// Compilation is deterministic per (source, template) pair, so the id
    /// is too.
    #[must_use]
    pub fn derived(source: &SectionId, template: &str) -> Self {
        Self(format!("{source}::{template}"))
    }
}

impl Display for ConstraintId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConstraintId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_id_ordering_is_lexicographic() {
        let a = SectionId::new("alpha");
        let b = SectionId::new("beta");
        assert!(a < b);

        let mut ids = vec![SectionId::new("c"), SectionId::new("a"), SectionId::new("b")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "a");
        assert_eq!(ids[2].as_str(), "c");
    }

    #[test]
    fn section_id_display_roundtrip() {
        let id = SectionId::new("budget.capex");
        assert_eq!(id.to_string(), "budget.capex");
        assert_eq!(SectionId::from("budget.capex"), id);
    }

    #[test]
    fn section_id_serde_transparent() {
        let id = SectionId::new("goals.q3");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"goals.q3\"");
        let back: SectionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn derived_constraint_id_is_deterministic() {
        let source = SectionId::new("mandate.budget");
        let a = ConstraintId::derived(&source, "ceiling");
        let b = ConstraintId::derived(&source, "ceiling");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "mandate.budget::ceiling");
    }
}
