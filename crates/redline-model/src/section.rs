//! Sections and governance tiers
//!
//! A [`Section`] is a node of the document graph. Its tier decides who may
//! change it: Locked sections are immutable mandates once published,
//! Reviewable sections need human approval, Generated sections are
//! machine-regenerable.

use crate::content::SectionContent;
use crate::hash::ContentHash;
use crate::id::{ConstraintId, SectionId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Governance classification of a section
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum GovernanceTier {
    /// Immutable mandate once published
    Locked,
    /// Changes require human approval
    Reviewable,
    /// Machine-regenerable
    Generated,
}

impl GovernanceTier {
    /// Tiers whose sections act as governance sources for constraints
    #[inline]
    #[must_use]
    pub const fn is_governance(self) -> bool {
        matches!(self, Self::Locked | Self::Reviewable)
    }
}

impl Display for GovernanceTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Locked => "locked",
            Self::Reviewable => "reviewable",
            Self::Generated => "generated",
        };
        f.write_str(name)
    }
}

/// A document section
///
/// The version counter starts at 1 and increases by exactly one per accepted
/// revision; the content hash always matches the current content. Sections
/// are never deleted: the matcher marks superseded sections deprecated
/// instead.
///
/// Revisions normally flow through the graph builder's propose-content
/// operation, which enforces tier immutability before calling
/// [`Section::apply_revision`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    id: SectionId,
    tier: GovernanceTier,
    content: SectionContent,
    content_hash: ContentHash,
    version: u64,
    constraints: Vec<ConstraintId>,
    published: bool,
    deprecated: bool,
}

impl Section {
    /// Create a fresh section at version 1
    #[must_use]
    pub fn new(id: impl Into<SectionId>, tier: GovernanceTier, content: SectionContent) -> Self {
        let content_hash = ContentHash::of_content(&content);
        Self {
            id: id.into(),
            tier,
            content,
            content_hash,
            version: 1,
            constraints: Vec::new(),
            published: false,
            deprecated: false,
        }
    }

    /// Attach the ordered rule ids that apply when this section is the
    /// target of validation
    #[must_use]
    pub fn with_constraints(mut self, constraints: Vec<ConstraintId>) -> Self {
        self.constraints = constraints;
        self
    }

    /// Rebuild a section from persisted parts
    ///
    /// The content hash is recomputed from `content`; persisted rows carry
    /// their stored hash separately so restore layers can verify it.
    #[must_use]
    #[allow(clippy::fn_params_excessive_bools)]
    pub fn restore(
        id: SectionId,
        tier: GovernanceTier,
        content: SectionContent,
        version: u64,
        constraints: Vec<ConstraintId>,
        published: bool,
        deprecated: bool,
    ) -> Self {
        let content_hash = ContentHash::of_content(&content);
        Self {
            id,
            tier,
            content,
            content_hash,
            version,
            constraints,
            published,
            deprecated,
        }
    }

    /// Section id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &SectionId {
        &self.id
    }

    /// Governance tier
    #[inline]
    #[must_use]
    pub fn tier(&self) -> GovernanceTier {
        self.tier
    }

    /// Current content
    #[inline]
    #[must_use]
    pub fn content(&self) -> &SectionContent {
        &self.content
    }

    /// Hash of the current content
    #[inline]
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        self.content_hash
    }

    /// Monotonic revision counter
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Ordered rule ids targeting this section
    #[inline]
    #[must_use]
    pub fn constraints(&self) -> &[ConstraintId] {
        &self.constraints
    }

    /// True once the section has been part of a published snapshot
    #[inline]
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.published
    }

    /// True if the matcher superseded this section
    #[inline]
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// True if this section's content may no longer change
    #[inline]
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        self.published && matches!(self.tier, GovernanceTier::Locked)
    }

    /// Replace the content, bumping the version and recomputing the hash
    ///
    /// Tier immutability is the graph builder's concern; this method is the
    /// raw state transition.
    pub fn apply_revision(&mut self, content: SectionContent) {
        self.content_hash = ContentHash::of_content(&content);
        self.content = content;
        self.version += 1;
    }

    /// Mark the section published (Locked content freezes from here on)
    pub fn mark_published(&mut self) {
        self.published = true;
    }

    /// Mark the section superseded by a newer revision
    pub fn mark_deprecated(&mut self) {
        self.deprecated = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(tier: GovernanceTier) -> Section {
        Section::new("s", tier, SectionContent::text("initial"))
    }

    #[test]
    fn new_section_starts_at_version_one() {
        let s = section(GovernanceTier::Generated);
        assert_eq!(s.version(), 1);
        assert!(!s.is_published());
        assert!(!s.is_deprecated());
        assert_eq!(s.content_hash(), ContentHash::of_content(s.content()));
    }

    #[test]
    fn apply_revision_bumps_version_and_hash() {
        let mut s = section(GovernanceTier::Generated);
        let old_hash = s.content_hash();

        s.apply_revision(SectionContent::text("revised"));

        assert_eq!(s.version(), 2);
        assert_ne!(s.content_hash(), old_hash);
        assert_eq!(s.content().body, "revised");
    }

    #[test]
    fn locked_section_becomes_immutable_on_publish() {
        let mut s = section(GovernanceTier::Locked);
        assert!(!s.is_immutable());

        s.mark_published();
        assert!(s.is_immutable());
    }

    #[test]
    fn published_generated_section_stays_mutable() {
        let mut s = section(GovernanceTier::Generated);
        s.mark_published();
        assert!(!s.is_immutable());
    }

    #[test]
    fn governance_tiers() {
        assert!(GovernanceTier::Locked.is_governance());
        assert!(GovernanceTier::Reviewable.is_governance());
        assert!(!GovernanceTier::Generated.is_governance());
        assert_eq!(GovernanceTier::Locked.to_string(), "locked");
    }

    #[test]
    fn restore_preserves_flags() {
        let s = Section::restore(
            SectionId::new("r"),
            GovernanceTier::Locked,
            SectionContent::text("restored"),
            7,
            vec![ConstraintId::new("rule")],
            true,
            false,
        );
        assert_eq!(s.version(), 7);
        assert!(s.is_published());
        assert!(s.is_immutable());
        assert_eq!(s.constraints().len(), 1);
    }
}
