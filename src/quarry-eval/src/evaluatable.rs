//! Evaluatability analysis: finds the subtrees that are safe to execute now.
//!
//! A single bottom-up traversal keeps a running "current subtree is
//! evaluatable" flag. Each node starts evaluatable when its kind can be
//! executed at all; its handler and children may clear the flag; the node is
//! recorded if the flag survives; and the flag is then combined with the
//! parent's.

use std::collections::HashSet;

use common_error::QuarryResult;
use quarry_expr::visitor::{
    dispatch, walk_binary, walk_conditional, walk_invocation, walk_lambda, walk_method_call,
    walk_new, walk_type_is, walk_unary,
};
use quarry_expr::*;

use crate::filter::EvaluatableExpressionFilter;

/// Nodes found evaluatable, by identity.
#[derive(Debug, Default, Clone)]
pub struct EvaluatableExpressions {
    nodes: HashSet<ExprKey>,
}

impl EvaluatableExpressions {
    /// Whether `expr` was found evaluatable.
    pub fn contains(&self, expr: &Expr) -> bool {
        self.nodes.contains(&ExprKey::from(expr))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn insert(&mut self, expr: &Expr) {
        self.nodes.insert(ExprKey::from(expr));
    }

    fn remove(&mut self, expr: &Expr) {
        self.nodes.remove(&ExprKey::from(expr));
    }
}

/// The analysis pass. It never rewrites the tree.
pub struct EvaluatableTreeFinder<'a> {
    filter: &'a dyn EvaluatableExpressionFilter,
    evaluatable: EvaluatableExpressions,
    is_current_subtree_evaluatable: bool,
}

impl<'a> EvaluatableTreeFinder<'a> {
    /// Analyze `tree`, returning every node that may be folded.
    pub fn analyze(
        tree: &Expr,
        filter: &'a dyn EvaluatableExpressionFilter,
    ) -> QuarryResult<EvaluatableExpressions> {
        let mut finder = Self {
            filter,
            evaluatable: EvaluatableExpressions::default(),
            is_current_subtree_evaluatable: false,
        };
        finder.visit(tree)?;
        Ok(finder.evaluatable)
    }

    /// Narrow the flag with a filter verdict, consulting the filter only if
    /// the children left the subtree evaluatable.
    fn narrow(&mut self, verdict: impl FnOnce(&dyn EvaluatableExpressionFilter) -> bool) {
        if self.is_current_subtree_evaluatable {
            self.is_current_subtree_evaluatable = verdict(self.filter);
        }
    }
}

/// Whether a node's kind can be executed by the interpreter.
///
/// Extension nodes qualify when they reduce, transitively, to a kind that
/// does.
fn is_supported(expr: &Expr) -> QuarryResult<bool> {
    match expr.as_extension() {
        None => Ok(true),
        Some(ext) if ext.can_reduce() => is_supported(&expr.reduce_and_check()?),
        Some(_) => Ok(false),
    }
}

fn is_queryable(expr: &Expr) -> bool {
    expr.data_type().is_queryable()
}

impl ExprVisitor for EvaluatableTreeFinder<'_> {
    fn visit(&mut self, expr: &Expr) -> QuarryResult<Expr> {
        let parent_is_evaluatable = self.is_current_subtree_evaluatable;
        self.is_current_subtree_evaluatable = is_supported(expr)?;

        let visited = dispatch(self, expr)?;

        // Lambdas are kept for later per-component processing.
        if self.is_current_subtree_evaluatable && expr.kind() != ExprKind::Lambda {
            self.evaluatable.insert(expr);
        }
        self.is_current_subtree_evaluatable &= parent_is_evaluatable;
        Ok(visited)
    }

    fn visit_constant(&mut self, expr: &Expr, node: &ConstantExpr) -> QuarryResult<Expr> {
        self.narrow(|f| f.is_evaluatable_constant(node));
        Ok(expr.clone())
    }

    fn visit_parameter(&mut self, expr: &Expr, _node: &ParameterExpr) -> QuarryResult<Expr> {
        // A parameter's value flows in from an enclosing scope.
        self.is_current_subtree_evaluatable = false;
        Ok(expr.clone())
    }

    fn visit_lambda(&mut self, expr: &Expr, node: &LambdaExpr) -> QuarryResult<Expr> {
        let visited = walk_lambda(self, expr, node)?;
        self.narrow(|f| f.is_evaluatable_lambda(node));
        Ok(visited)
    }

    fn visit_unary(&mut self, expr: &Expr, node: &UnaryExpr) -> QuarryResult<Expr> {
        let visited = walk_unary(self, expr, node)?;
        self.narrow(|f| f.is_evaluatable_unary(node));
        Ok(visited)
    }

    fn visit_binary(&mut self, expr: &Expr, node: &BinaryExpr) -> QuarryResult<Expr> {
        let visited = walk_binary(self, expr, node)?;
        self.narrow(|f| f.is_evaluatable_binary(node));
        Ok(visited)
    }

    fn visit_member(&mut self, expr: &Expr, node: &MemberExpr) -> QuarryResult<Expr> {
        // Reads through a query source stay for later translation.
        if node.object.as_ref().is_some_and(is_queryable) {
            self.is_current_subtree_evaluatable = false;
        }

        if let Some(object) = &node.object {
            self.visit(object)?;
        }
        self.narrow(|f| f.is_evaluatable_member(node));
        Ok(expr.clone())
    }

    fn visit_method_call(&mut self, expr: &Expr, node: &MethodCallExpr) -> QuarryResult<Expr> {
        // Calls over a query source stay for later translation.
        if node.object.as_ref().is_some_and(is_queryable) || node.arguments.iter().any(is_queryable)
        {
            self.is_current_subtree_evaluatable = false;
        }

        let visited = walk_method_call(self, expr, node)?;
        self.narrow(|f| f.is_evaluatable_method_call(node));
        Ok(visited)
    }

    fn visit_invocation(&mut self, expr: &Expr, node: &InvocationExpr) -> QuarryResult<Expr> {
        let visited = walk_invocation(self, expr, node)?;
        self.narrow(|f| f.is_evaluatable_invocation(node));
        Ok(visited)
    }

    fn visit_new(&mut self, expr: &Expr, node: &NewExpr) -> QuarryResult<Expr> {
        let visited = walk_new(self, expr, node)?;
        self.narrow(|f| f.is_evaluatable_new(node));
        Ok(visited)
    }

    fn visit_member_init(&mut self, expr: &Expr, node: &MemberInitExpr) -> QuarryResult<Expr> {
        for binding in &node.bindings {
            self.visit(&binding.value)?;
            self.narrow(|f| f.is_evaluatable_member_binding(binding));
        }

        // The construction is only considered once every binding is
        // evaluatable, so an initializer is never folded partially.
        if !self.is_current_subtree_evaluatable {
            return Ok(expr.clone());
        }

        self.visit(&node.new_expr)?;
        // The construction must stay a construction node inside the
        // initializer, even when the initializer itself is vetoed.
        self.evaluatable.remove(&node.new_expr);

        self.narrow(|f| f.is_evaluatable_member_init(node));
        Ok(expr.clone())
    }

    fn visit_list_init(&mut self, expr: &Expr, node: &ListInitExpr) -> QuarryResult<Expr> {
        for init in &node.initializers {
            for argument in &init.arguments {
                self.visit(argument)?;
            }
            self.narrow(|f| f.is_evaluatable_element_init(init));
        }

        if !self.is_current_subtree_evaluatable {
            return Ok(expr.clone());
        }

        self.visit(&node.new_expr)?;
        self.evaluatable.remove(&node.new_expr);

        self.narrow(|f| f.is_evaluatable_list_init(node));
        Ok(expr.clone())
    }

    fn visit_conditional(&mut self, expr: &Expr, node: &ConditionalExpr) -> QuarryResult<Expr> {
        let visited = walk_conditional(self, expr, node)?;
        self.narrow(|f| f.is_evaluatable_conditional(node));
        Ok(visited)
    }

    fn visit_type_is(&mut self, expr: &Expr, node: &TypeIsExpr) -> QuarryResult<Expr> {
        let visited = walk_type_is(self, expr, node)?;
        self.narrow(|f| f.is_evaluatable_type_is(node));
        Ok(visited)
    }

    fn as_evaluation_failure_visitor(&mut self) -> Option<&mut dyn EvaluationFailureVisitor> {
        Some(self)
    }
}

impl EvaluationFailureVisitor for EvaluatableTreeFinder<'_> {
    /// A captured failure is final; its subtree is not analyzed again.
    fn visit_evaluation_failure(
        &mut self,
        expr: &Expr,
        _node: &EvaluationFailureExpr,
    ) -> QuarryResult<Expr> {
        self.is_current_subtree_evaluatable = false;
        Ok(expr.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DefaultEvaluatableFilter;

    #[test]
    fn test_parameter_blocks_ancestors() {
        let x = Expr::parameter("x", DataType::Int64);
        let folded = Expr::constant(4i64).mul_expr(Expr::constant(3i64));
        let dependent = x.clone().mul_expr(Expr::constant(3i64));
        let tree = dependent.clone().add_expr(folded.clone());

        let found = EvaluatableTreeFinder::analyze(&tree, &DefaultEvaluatableFilter).unwrap();

        assert!(found.contains(&folded));
        assert!(!found.contains(&dependent));
        assert!(!found.contains(&tree));
        assert!(!found.contains(&x));
    }

    #[test]
    fn test_lambda_is_never_recorded() {
        let lambda = Expr::lambda(vec![], Expr::constant(1i64));
        let found = EvaluatableTreeFinder::analyze(&lambda, &DefaultEvaluatableFilter).unwrap();

        assert!(!found.contains(&lambda));
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_failure_wrapper_is_opaque() {
        let inner = Expr::constant(1i64).add_expr(Expr::constant(2i64));
        let wrapper = Expr::evaluation_failure(common_error::QuarryError::overflow("x"), inner);

        let found = EvaluatableTreeFinder::analyze(&wrapper, &DefaultEvaluatableFilter).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_sub_query_is_not_evaluatable() {
        let model = ExpressionQueryModel::shared(vec![], DataType::Int64);
        let tree = Expr::sub_query(model).add_expr(Expr::constant(1i64));

        let found = EvaluatableTreeFinder::analyze(&tree, &DefaultEvaluatableFilter).unwrap();
        assert!(!found.contains(&tree));
        assert_eq!(found.len(), 1);
    }
}
