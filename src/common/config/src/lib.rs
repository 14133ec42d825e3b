//! Configuration management for quarry.
//!
//! Controls which normalization stages run and how host code is isolated
//! while independent subtrees are evaluated.

use serde::{Deserialize, Serialize};

/// Global quarry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QuarryConfig {
    /// Normalization pipeline configuration.
    pub normalization: NormalizationConfig,
}

/// Normalization pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// Fold independent (parameter-free) subtrees into constants.
    pub evaluate_independent_subtrees: bool,
    /// Run the rule-based transformation pipeline.
    pub apply_transformations: bool,
    /// Remove transparent identifiers introduced by query chains.
    pub remove_transparent_identifiers: bool,
    /// Capture panics raised by host code as evaluation failures.
    pub catch_host_panics: bool,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            evaluate_independent_subtrees: true,
            apply_transformations: true,
            remove_transparent_identifiers: true,
            catch_host_panics: true,
        }
    }
}

impl NormalizationConfig {
    /// Enable or disable partial evaluation.
    #[must_use]
    pub fn with_partial_evaluation(mut self, enable: bool) -> Self {
        self.evaluate_independent_subtrees = enable;
        self
    }

    /// Enable or disable the transformation pipeline.
    #[must_use]
    pub fn with_transformations(mut self, enable: bool) -> Self {
        self.apply_transformations = enable;
        self
    }

    /// Enable or disable transparent-identifier removal.
    #[must_use]
    pub fn with_transparent_identifier_removal(mut self, enable: bool) -> Self {
        self.remove_transparent_identifiers = enable;
        self
    }

    /// Enable or disable capturing of host panics.
    #[must_use]
    pub fn with_catch_host_panics(mut self, enable: bool) -> Self {
        self.catch_host_panics = enable;
        self
    }
}
