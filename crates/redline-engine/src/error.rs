//! Facade error type
//!
//! Wraps each component's error so callers of the facade handle one type.
//! Escalation is the one failure the facade adds itself: a revision cycle
//! that cannot stabilize hands the problem back to a human with diagnostics
//! instead of spinning.

use crate::driver::Escalation;
use redline_constraint::CompilationError;
use redline_graph::GraphError;
use redline_match::MatchError;
use redline_model::SectionId;
use redline_ripple::PlanError;
use thiserror::Error;

/// Error surface of the revision engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Structural or immutability failure from the graph layer
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Constraint compilation failure
    #[error(transparent)]
    Compilation(#[from] CompilationError),

    /// Plan bookkeeping failure
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// Revision matching failure
    #[error(transparent)]
    Matching(#[from] MatchError),

    /// Configuration file could not be read
    #[error("configuration file unreadable: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Configuration payload could not be parsed
    #[error("configuration invalid: {0}")]
    ConfigFormat(#[from] serde_yaml::Error),

    /// The caller's regeneration agent failed on a section
    #[error("agent failed on section {id}: {reason}")]
    AgentFailed {
        /// Section the agent was working
        id: SectionId,
        /// Failure description from the agent
        reason: String,
    },

    /// A revision cycle could not stabilize
    #[error("revision cycle escalated: {escalation}")]
    Escalated {
        /// Diagnostics and suggested next actions
        escalation: Escalation,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_errors_convert_with_from() {
        let graph_err = GraphError::UnknownSection {
            id: SectionId::new("ghost"),
        };
        let engine_err: EngineError = graph_err.into();
        assert!(matches!(engine_err, EngineError::Graph(_)));
        assert_eq!(engine_err.to_string(), "unknown section: ghost");
    }
}
