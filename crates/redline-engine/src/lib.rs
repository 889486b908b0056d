//! redline Revision Engine
//!
//! The facade over the whole pipeline: graph construction, constraint
//! compilation and validation, ripple planning, revision matching, and a
//! driver that walks plans to a stable document using a caller-supplied
//! regeneration agent.
//!
//! # Core Concepts
//!
//! - [`EngineConfig`]: matcher weights, acceptance threshold, solve budget,
//!   and the cycle round limit, loadable from YAML
//! - [`RevisionEngine`]: stateless facade; every call takes the published
//!   snapshot it should operate on
//! - [`Regenerator`]: the caller's async content generation and review
//!   capability, invoked concurrently within each plan layer
//! - [`RevisionDriver::run_cycle`]: plan, dispatch, validate, publish,
//!   repeat until the ripple runs dry or the cycle escalates
//! - [`CycleOutcome`]: the final snapshot, refreshed constraints, and a
//!   serializable [`CycleReport`]
//!
//! The engine never generates content and never talks to a model. Agents
//! are the caller's business; the engine decides what they work on and
//! whether the results can be published.

#![warn(unreachable_pub)]

mod config;
mod driver;
mod engine;
mod error;

pub use config::{EngineConfig, DEFAULT_MATCH_BUDGET_MS, DEFAULT_MAX_CYCLES};
pub use driver::{
    AgentError, BlockedSection, CycleId, CycleOutcome, CycleReport, Escalation, Regenerator,
    ReviewVerdict, RevisionDriver,
};
pub use engine::RevisionEngine;
pub use error::EngineError;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
