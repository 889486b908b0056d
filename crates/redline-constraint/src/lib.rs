//! redline Constraint Validator
//!
//! Turns governance-tier section content into checkable rules and validates
//! proposed content against them.
//!
//! # Core Concepts
//!
//! - [`RuleTemplate`] / [`TemplateSet`]: rule declarations ingestion attaches
//!   to Locked and Reviewable sections
//! - [`ConstraintCompiler`]: instantiates templates against a source's
//!   current content, cached per `(id, version)`
//! - [`ConstraintSet`]: the explicit, versioned rule store passed into every
//!   validation call; [`ConstraintSet::stale_sources`] drives recompilation
//! - [`validate`]: pure evaluation producing [`ValidationResult`] findings;
//!   unsatisfied constraints are data, never errors
//!
//! Constraint inheritance flows along `DerivesFrom` and `Constrains` edges
//! only; `Informs` and `Summarizes` relations never carry rules.

#![warn(unreachable_pub)]

mod compiler;
mod error;
mod rule;
mod set;
mod validator;

pub use compiler::{ConstraintCompiler, TemplateSet};
pub use error::CompilationError;
pub use rule::{Constraint, ConstraintRule, ConstraintScope, RuleTemplate, Severity, TemplateKind};
pub use set::ConstraintSet;
pub use validator::{applicable_constraints, validate, Finding, ValidationResult};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
