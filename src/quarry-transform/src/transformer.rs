//! The transformation pipeline.
//!
//! Children are transformed first. Then the provider's rules for the
//! resulting node are tried in order; the first rule that changes the node
//! stops the iteration and the pipeline starts over on the rule's result,
//! descending into it again. A node no rule changes is in normal form.

use common_error::QuarryResult;
use log::debug;
use quarry_expr::visitor::dispatch;
use quarry_expr::{Expr, ExprVisitor, SubQueryExpr, SubQueryVisitor, Transformation};

/// Supplies the ordered rules to try on a node.
pub trait TransformationProvider: Send + Sync {
    fn get_transformations(&self, expr: &Expr) -> Vec<Transformation>;
}

/// Visitor applying a provider's rules in post-order.
pub struct TransformingVisitor<'a> {
    provider: &'a dyn TransformationProvider,
}

impl<'a> TransformingVisitor<'a> {
    pub fn new(provider: &'a dyn TransformationProvider) -> Self {
        Self { provider }
    }
}

impl ExprVisitor for TransformingVisitor<'_> {
    fn visit(&mut self, expr: &Expr) -> QuarryResult<Expr> {
        let visited = dispatch(self, expr)?;

        for rule in self.provider.get_transformations(&visited) {
            let transformed = rule.transform(&visited)?;
            if !transformed.ptr_eq(&visited) {
                debug!("Rule '{}' rewrote {:?} node", rule.name(), visited.kind());
                return self.visit(&transformed);
            }
        }

        Ok(visited)
    }

    fn as_sub_query_visitor(&mut self) -> Option<&mut dyn SubQueryVisitor> {
        Some(self)
    }
}

impl SubQueryVisitor for TransformingVisitor<'_> {
    fn visit_sub_query(&mut self, expr: &Expr, node: &SubQueryExpr) -> QuarryResult<Expr> {
        node.query_model()
            .transform_expressions(&mut |e| self.visit(e))?;
        Ok(expr.clone())
    }
}

/// Transform `tree` until no rule from `provider` changes any node.
pub fn transform(tree: &Expr, provider: &dyn TransformationProvider) -> QuarryResult<Expr> {
    TransformingVisitor::new(provider).visit(tree)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quarry_expr::{DataType, FnTransformer, Value};

    use super::*;

    /// Applies the same rules to every node.
    struct Everywhere(Vec<Transformation>);

    impl TransformationProvider for Everywhere {
        fn get_transformations(&self, _expr: &Expr) -> Vec<Transformation> {
            self.0.clone()
        }
    }

    /// Decrements positive integer constants by one.
    fn countdown() -> Transformation {
        Arc::new(FnTransformer::new("Countdown", vec![], |expr| {
            match expr.as_constant().map(|c| &c.value) {
                Some(Value::Int64(n)) if *n > 0 => Ok(Expr::constant(n - 1)),
                _ => Ok(expr.clone()),
            }
        }))
    }

    #[test]
    fn test_rules_apply_until_normal_form() {
        let tree = Expr::constant(3i64).add_expr(Expr::constant(2i64));
        let result = transform(&tree, &Everywhere(vec![countdown()])).unwrap();
        assert_eq!(result, Expr::constant(0i64).add_expr(Expr::constant(0i64)));
    }

    #[test]
    fn test_no_rule_returns_input() {
        let x = Expr::parameter("x", DataType::Int64);
        let tree = x.clone().add_expr(x);
        let result = transform(&tree, &Everywhere(vec![countdown()])).unwrap();
        assert!(result.ptr_eq(&tree));
    }
}
