//! Host veto over which node shapes may be folded.

use quarry_expr::{
    BinaryExpr, ConditionalExpr, ConstantExpr, ElementInit, InvocationExpr, LambdaExpr,
    ListInitExpr, MemberBinding, MemberExpr, MemberInitExpr, MethodCallExpr, NewExpr, TypeIsExpr,
    UnaryExpr,
};

/// Per-kind predicates consulted by evaluatability analysis.
///
/// Every predicate defaults to `true`. Override one to keep matching nodes
/// unfolded, for example calls a query provider translates itself. A vetoed
/// node also keeps its ancestors unfolded; its children are still analyzed
/// on their own.
///
/// Parameters are never evaluatable and have no predicate. Lambdas are never
/// folded themselves; their predicate only decides whether an enclosing node
/// may be.
pub trait EvaluatableExpressionFilter: Send + Sync {
    fn is_evaluatable_constant(&self, _node: &ConstantExpr) -> bool {
        true
    }

    fn is_evaluatable_lambda(&self, _node: &LambdaExpr) -> bool {
        true
    }

    fn is_evaluatable_unary(&self, _node: &UnaryExpr) -> bool {
        true
    }

    fn is_evaluatable_binary(&self, _node: &BinaryExpr) -> bool {
        true
    }

    fn is_evaluatable_member(&self, _node: &MemberExpr) -> bool {
        true
    }

    fn is_evaluatable_method_call(&self, _node: &MethodCallExpr) -> bool {
        true
    }

    fn is_evaluatable_invocation(&self, _node: &InvocationExpr) -> bool {
        true
    }

    fn is_evaluatable_new(&self, _node: &NewExpr) -> bool {
        true
    }

    fn is_evaluatable_member_init(&self, _node: &MemberInitExpr) -> bool {
        true
    }

    fn is_evaluatable_member_binding(&self, _binding: &MemberBinding) -> bool {
        true
    }

    fn is_evaluatable_list_init(&self, _node: &ListInitExpr) -> bool {
        true
    }

    fn is_evaluatable_element_init(&self, _init: &ElementInit) -> bool {
        true
    }

    fn is_evaluatable_conditional(&self, _node: &ConditionalExpr) -> bool {
        true
    }

    fn is_evaluatable_type_is(&self, _node: &TypeIsExpr) -> bool {
        true
    }
}

/// A filter that allows every shape.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultEvaluatableFilter;

impl EvaluatableExpressionFilter for DefaultEvaluatableFilter {}
