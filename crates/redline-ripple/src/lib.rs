//! redline Ripple Propagator
//!
//! Computes which sections an accepted edit disturbs and packages the answer
//! as an [`UpdatePlan`] the revision driver can work through.
//!
//! # Core Concepts
//!
//! - [`SectionChange`] / [`ChangeSummary`]: what changed, as figure deltas
//!   and newly introduced terms rather than raw diffs
//! - [`CycleBaseline`]: the version vector captured when a cycle opens;
//!   sections regenerated past it drop out of later plans
//! - [`TolerancePolicy`]: pluggable judgement on whether a change is big
//!   enough to send its governance ancestors back for review
//! - [`compute_plan`]: pure planning over a published snapshot, yielding
//!   forward impact in dependency order plus backward and lateral review sets
//! - [`UpdatePlan`]: the plan itself, with [`UpdatePlan::mark_settled`] and
//!   [`UpdatePlan::mark_blocked`] tracking execution and holding dependents
//!   behind blocked work
//!
//! Planning never mutates the graph. The same snapshot, changes, baseline,
//! and policy always produce a byte-identical plan.

#![warn(unreachable_pub)]

mod change;
mod plan;
mod propagator;
mod tolerance;

pub use change::{ChangeSummary, CycleBaseline, FigureDelta, SectionChange};
pub use plan::{EntryState, PlanAction, PlanEntry, PlanError, UpdatePlan};
pub use propagator::compute_plan;
pub use tolerance::{
    AlwaysReview, NeverReview, NewTermTolerance, RelativeDeltaTolerance, TolerancePolicy,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
