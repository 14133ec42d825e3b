//! Attaches member metadata to tuple constructions.

use common_error::QuarryResult;
use quarry_expr::builtins::tuple_members;
use quarry_expr::{DataType, Expr, ExprKind, ExprNode, ExpressionTransformer};

/// Records that argument `i` of `new Tuple(..)` initializes `Item{i + 1}`,
/// so member reads on the construction can be resolved by the
/// transparent-identifier eliminator.
#[derive(Debug, Default, Clone, Copy)]
pub struct TupleNewTransformer;

impl ExpressionTransformer for TupleNewTransformer {
    fn name(&self) -> &'static str {
        "TupleNewTransformer"
    }

    fn supported_kinds(&self) -> Vec<ExprKind> {
        vec![ExprKind::New]
    }

    fn transform(&self, expr: &Expr) -> QuarryResult<Expr> {
        let ExprNode::New(node) = expr.node() else {
            return Ok(expr.clone());
        };
        if node.members.is_some() {
            return Ok(expr.clone());
        }

        let tuple_type = &node.constructor.data_type;
        let DataType::Tuple(items) = tuple_type else {
            return Ok(expr.clone());
        };
        if node.arguments.len() != items.len() {
            return Ok(expr.clone());
        }

        Expr::construct_with_members(
            node.constructor.clone(),
            node.arguments.clone(),
            tuple_members(tuple_type)?,
        )
    }
}
