//! Engine configuration
//!
//! One value object covering the caller-tunable knobs. Defaults are the
//! documented constants; YAML files may set any subset and inherit the rest.

use crate::error::EngineError;
use redline_match::{ScorerWeights, DEFAULT_THRESHOLD};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default wall-clock budget for a bounded matcher solve
pub const DEFAULT_MATCH_BUDGET_MS: u64 = 30_000;

/// Default number of driver rounds before a cycle escalates
pub const DEFAULT_MAX_CYCLES: u32 = 8;

/// Tunable parameters of the revision engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EngineConfig {
    /// Matcher acceptance threshold in [0, 1]
    pub threshold: f64,
    /// Similarity component weights
    pub weights: ScorerWeights,
    /// Wall-clock budget for bounded matcher solves, in milliseconds
    pub match_budget_ms: u64,
    /// Driver rounds allowed before the cycle escalates
    pub max_cycles: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            weights: ScorerWeights::default(),
            match_budget_ms: DEFAULT_MATCH_BUDGET_MS,
            max_cycles: DEFAULT_MAX_CYCLES,
        }
    }
}

impl EngineConfig {
    /// Set the matcher acceptance threshold
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the similarity component weights
    #[must_use]
    pub fn with_weights(mut self, weights: ScorerWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set the bounded-solve budget
    #[must_use]
    pub fn with_match_budget(mut self, budget: Duration) -> Self {
        self.match_budget_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the driver round limit
    #[must_use]
    pub fn with_max_cycles(mut self, max_cycles: u32) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    /// The bounded-solve budget as a [`Duration`]
    #[must_use]
    pub fn match_budget(&self) -> Duration {
        Duration::from_millis(self.match_budget_ms)
    }

    /// Parse a config from YAML; absent keys take their defaults
    ///
    /// # Errors
    /// [`EngineError::ConfigFormat`] on malformed YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, EngineError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML config file
    ///
    /// # Errors
    /// [`EngineError::ConfigIo`] when the file is unreadable,
    /// [`EngineError::ConfigFormat`] when it does not parse.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }
}
