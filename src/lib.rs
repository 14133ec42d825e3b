//! Quarry - normalization core for method-chained query translators
//!
//! Quarry rewrites the expression trees a host language builds for a query
//! into a canonical shape a back-end translator can consume:
//!
//! 1. **Partial evaluation** folds every subtree that depends on neither a
//!    lambda parameter nor a deferred query source into a constant.
//! 2. **Transformation** applies rewrite rules bottom-up until every node is
//!    in normal form.
//! 3. **Transparent-identifier removal** resolves member reads of the
//!    carrier objects query chains introduce.
//!
//! [`Normalizer`] chains the three stages; each is also available on its own.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

use std::fmt;
use std::sync::Arc;

use log::{debug, trace};

// Re-export core crates
pub use common_config as config;
pub use common_display as display;
pub use common_error as error;
pub use quarry_eval as eval;
pub use quarry_expr as expr;
pub use quarry_transform as transform;

pub use common_config::{NormalizationConfig, QuarryConfig};
pub use common_error::{QuarryError, QuarryResult};
pub use quarry_eval::{
    evaluate_independent_subtrees, DefaultEvaluatableFilter, EvaluatableExpressionFilter,
};
pub use quarry_expr::{replace, replace_many, Expr, ExprKind, ExprVisitor};
pub use quarry_transform::{
    remove_transparent_identifiers, ExpressionTransformerRegistry, TransformationProvider,
};

/// Quarry version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runs the normalization stages enabled by its configuration.
#[derive(Clone)]
pub struct Normalizer {
    config: NormalizationConfig,
    filter: Arc<dyn EvaluatableExpressionFilter>,
    provider: Arc<dyn TransformationProvider>,
}

impl Normalizer {
    /// Create a normalizer with every stage enabled, the default filter and
    /// the built-in rules.
    pub fn new() -> Self {
        Self {
            config: NormalizationConfig::default(),
            filter: Arc::new(DefaultEvaluatableFilter),
            provider: Arc::new(ExpressionTransformerRegistry::create_default()),
        }
    }

    /// Create a normalizer from the global configuration.
    pub fn from_config(config: &QuarryConfig) -> Self {
        Self::new().with_config(config.normalization.clone())
    }

    #[must_use]
    pub fn with_config(mut self, config: NormalizationConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `filter` to decide which subtrees may be folded.
    #[must_use]
    pub fn with_filter(mut self, filter: Arc<dyn EvaluatableExpressionFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Use `provider` for the transformation stage.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn TransformationProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn config(&self) -> &NormalizationConfig {
        &self.config
    }

    /// Normalize `expr`.
    ///
    /// Evaluation failures in folded subtrees are kept in the result as
    /// diagnostic nodes; configuration errors and extension contract
    /// violations abort the call.
    pub fn normalize(&self, expr: &Expr) -> QuarryResult<Expr> {
        let mut current = expr.clone();
        trace!("Normalizing:\n{}", current.explain());

        if self.config.evaluate_independent_subtrees {
            current = quarry_eval::evaluate_independent_subtrees_with_config(
                &current,
                self.filter.as_ref(),
                &self.config,
            )?;
            debug!("Partial evaluation done: {:?}", current.kind());
        }

        if self.config.apply_transformations {
            current = quarry_transform::transform(&current, self.provider.as_ref())?;
            debug!("Transformation done: {:?}", current.kind());
        }

        if self.config.remove_transparent_identifiers {
            current = remove_transparent_identifiers(&current)?;
            debug!("Transparent identifier removal done: {:?}", current.kind());
        }

        trace!("Normalized:\n{}", current.explain());
        Ok(current)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use quarry_expr::DataType;

    use super::*;

    #[test]
    fn test_normalize_folds_and_inlines() {
        // (p => p + (1 + 2))(x)
        let p = Expr::parameter("p", DataType::Int64);
        let lambda = Expr::lambda(
            vec![p.clone()],
            p.add_expr(Expr::constant(1i64).add_expr(Expr::constant(2i64))),
        );
        let x = Expr::parameter("x", DataType::Int64);
        let tree = Expr::invoke(lambda, vec![x.clone()]);

        let result = Normalizer::new().normalize(&tree).unwrap();
        assert_eq!(result, x.add_expr(Expr::constant(3i64)));
    }

    #[test]
    fn test_disabled_stages_leave_tree_alone() {
        let tree = Expr::constant(1i64).add_expr(Expr::constant(2i64));
        let config = NormalizationConfig::default()
            .with_partial_evaluation(false)
            .with_transformations(false)
            .with_transparent_identifier_removal(false);

        let result = Normalizer::new().with_config(config).normalize(&tree).unwrap();
        assert!(result.ptr_eq(&tree));
    }
}
