//! Partial evaluation: folds every maximal evaluatable subtree into a
//! constant.
//!
//! Pass 1 ([`EvaluatableTreeFinder`]) finds the evaluatable nodes; pass 2
//! walks top-down and executes the first evaluatable node on each path.
//! Every failure raised while executing a subtree, whatever its class, is
//! captured as an [`EvaluationFailureExpr`] node around a best-effort
//! rewrite of the failing subtree instead of aborting the call. Errors from
//! the analysis itself (extension contract violations) still propagate. Whenever folding changes a node, the whole two-pass
//! algorithm runs again on the result, so an inlined query expression is
//! analyzed from scratch.

use std::panic::{self, AssertUnwindSafe};

use common_config::NormalizationConfig;
use common_error::{QuarryError, QuarryResult};
use log::{debug, warn};
use quarry_expr::visitor::dispatch;
use quarry_expr::*;

use crate::evaluatable::{EvaluatableExpressions, EvaluatableTreeFinder};
use crate::filter::EvaluatableExpressionFilter;
use crate::interpreter::ExprInterpreter;

/// Fold the independent subtrees of `tree` with the default configuration.
pub fn evaluate_independent_subtrees(
    tree: &Expr,
    filter: &dyn EvaluatableExpressionFilter,
) -> QuarryResult<Expr> {
    evaluate_independent_subtrees_with_config(tree, filter, &NormalizationConfig::default())
}

/// Fold the independent subtrees of `tree`.
pub fn evaluate_independent_subtrees_with_config(
    tree: &Expr,
    filter: &dyn EvaluatableExpressionFilter,
    config: &NormalizationConfig,
) -> QuarryResult<Expr> {
    let evaluatable = EvaluatableTreeFinder::analyze(tree, filter)?;
    PartialEvaluatingVisitor {
        evaluatable,
        filter,
        config,
    }
    .visit(tree)
}

/// The folding pass.
struct PartialEvaluatingVisitor<'a> {
    evaluatable: EvaluatableExpressions,
    filter: &'a dyn EvaluatableExpressionFilter,
    config: &'a NormalizationConfig,
}

impl PartialEvaluatingVisitor<'_> {
    /// Execute `subtree` and wrap the result in a constant of the subtree's
    /// type. A constant holding a query source is replaced by the query's
    /// own expression instead.
    fn evaluate_subtree(&self, subtree: &Expr) -> QuarryResult<Expr> {
        if let Some(constant) = subtree.as_constant() {
            if let Value::Query(query) = &constant.value {
                let backing = query.expression();
                if !backing.ptr_eq(subtree) {
                    return Ok(backing);
                }
            }
            return Ok(subtree.clone());
        }

        let value = self.execute(subtree)?;
        Ok(Expr::constant_typed(value, subtree.data_type()))
    }

    fn execute(&self, subtree: &Expr) -> QuarryResult<Value> {
        let interpreter = ExprInterpreter::new();
        if !self.config.catch_host_panics {
            return interpreter.evaluate(subtree);
        }

        panic::catch_unwind(AssertUnwindSafe(|| interpreter.evaluate(subtree)))
            .unwrap_or_else(|payload| Err(QuarryError::host_panic(panic_message(&*payload))))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "host code panicked".to_string()
    }
}

impl ExprVisitor for PartialEvaluatingVisitor<'_> {
    fn visit(&mut self, expr: &Expr) -> QuarryResult<Expr> {
        if expr.kind() == ExprKind::Lambda || !self.evaluatable.contains(expr) {
            return dispatch(self, expr);
        }

        let evaluated = match self.evaluate_subtree(expr) {
            Ok(evaluated) => evaluated,
            Err(err) => {
                if err.is_recoverable() {
                    debug!("Captured evaluation failure in {:?}: {err}", expr.kind());
                } else {
                    warn!("Host code raised {err} while evaluating {:?}", expr.kind());
                }
                let visited = dispatch(self, expr)?;
                return Ok(Expr::evaluation_failure(err, visited));
            }
        };

        if evaluated.ptr_eq(expr) {
            return Ok(evaluated);
        }
        evaluate_independent_subtrees_with_config(&evaluated, self.filter, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DefaultEvaluatableFilter;

    fn fold(expr: &Expr) -> Expr {
        evaluate_independent_subtrees(expr, &DefaultEvaluatableFilter).unwrap()
    }

    #[test]
    fn test_fold_constant_addition() {
        let expr = Expr::constant(1i64).add_expr(Expr::constant(2i64));
        assert_eq!(fold(&expr), Expr::constant(3i64));
    }

    #[test]
    fn test_constant_is_left_alone() {
        let expr = Expr::constant(3i64);
        assert!(fold(&expr).ptr_eq(&expr));
    }

    #[test]
    fn test_folded_constant_keeps_node_type() {
        let ty = DataType::nullable(DataType::Int64);
        let expr = Expr::convert(Expr::constant(1i64), ty.clone());
        assert_eq!(fold(&expr).data_type(), ty);
    }

    #[test]
    fn test_host_panic_is_captured() {
        let method = MethodInfo::static_method(DataType::object("Host"), "Boom", vec![], DataType::Int64)
            .with_body(|_, _| panic!("boom"))
            .build();
        let call = Expr::call(None, method, vec![]);

        let folded = fold(&call);
        let failure = folded.downcast_extension::<EvaluationFailureExpr>().unwrap();
        assert!(matches!(failure.error.as_ref(), QuarryError::HostPanic(msg) if msg == "boom"));
        assert!(failure.evaluated.ptr_eq(&call));
    }

    #[test]
    fn test_fatal_errors_propagate() {
        #[derive(Debug)]
        struct Irreducible;

        impl ExtensionExpr for Irreducible {
            fn tag(&self) -> &'static str {
                "Irreducible"
            }

            fn data_type(&self) -> DataType {
                DataType::Int64
            }

            fn can_reduce(&self) -> bool {
                true
            }

            fn reduce(&self) -> QuarryResult<Expr> {
                Ok(Expr::constant("not an integer"))
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            fn equals(&self, _other: &dyn ExtensionExpr) -> bool {
                false
            }
        }

        let expr = Expr::extension(Irreducible);
        assert!(matches!(
            evaluate_independent_subtrees(&expr, &DefaultEvaluatableFilter),
            Err(QuarryError::ExtensionContract(_))
        ));
    }
}
