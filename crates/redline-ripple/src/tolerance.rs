//! Backward-review tolerance policies
//!
//! Whether a change is significant enough to pull a governance ancestor in
//! for human re-review is a product decision, so the planner takes the
//! policy as a parameter on every call and hardcodes nothing. The policies
//! here are ready-made choices, not defaults.

use crate::change::SectionChange;
use redline_model::Section;

/// Decides whether an accepted change warrants re-review of an ancestor
pub trait TolerancePolicy: Send + Sync {
    /// True when the change crosses the policy's significance bar for
    /// `ancestor`
    fn crosses(&self, change: &SectionChange, ancestor: &Section) -> bool;
}

impl<T: TolerancePolicy + ?Sized> TolerancePolicy for &T {
    fn crosses(&self, change: &SectionChange, ancestor: &Section) -> bool {
        (**self).crosses(change, ancestor)
    }
}

/// Crosses when any figure moved by more than `max_fraction` relative to its
/// previous value, or appeared, vanished, or moved off zero
#[derive(Debug, Clone, Copy)]
pub struct RelativeDeltaTolerance {
    /// Largest acceptable relative movement, e.g. `0.1` for ten percent
    pub max_fraction: f64,
}

impl RelativeDeltaTolerance {
    /// Policy accepting relative movement up to `max_fraction`
    #[must_use]
    pub fn new(max_fraction: f64) -> Self {
        Self { max_fraction }
    }
}

impl TolerancePolicy for RelativeDeltaTolerance {
    fn crosses(&self, change: &SectionChange, _ancestor: &Section) -> bool {
        change.summary.figure_deltas.values().any(|delta| {
            delta.is_structural()
                || delta
                    .relative_change()
                    .is_some_and(|fraction| fraction > self.max_fraction)
        })
    }
}

/// Crosses when the change references a term the ancestor's body never
/// mentions, matched case-insensitively
#[derive(Debug, Clone, Copy, Default)]
pub struct NewTermTolerance;

impl TolerancePolicy for NewTermTolerance {
    fn crosses(&self, change: &SectionChange, ancestor: &Section) -> bool {
        if change.summary.new_terms.is_empty() {
            return false;
        }
        let body = ancestor.content().body.to_lowercase();
        change
            .summary
            .new_terms
            .iter()
            .any(|term| !body.contains(&term.to_lowercase()))
    }
}

/// Every change pulls every governance ancestor in for review
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReview;

impl TolerancePolicy for AlwaysReview {
    fn crosses(&self, _change: &SectionChange, _ancestor: &Section) -> bool {
        true
    }
}

/// No change ever triggers backward review
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverReview;

impl TolerancePolicy for NeverReview {
    fn crosses(&self, _change: &SectionChange, _ancestor: &Section) -> bool {
        false
    }
}
