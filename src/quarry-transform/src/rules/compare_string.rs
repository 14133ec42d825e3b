//! Desugars comparisons of the string comparison helper against zero.
//!
//! Hosts lower `a == b`, `a < b` and friends on strings to
//! `CompareString(a, b, text) <op> 0`. This rule restores a plain comparison
//! tagged with the comparison mode, so translators see the operands.

use common_error::{QuarryError, QuarryResult};
use quarry_expr::builtins::{is_string_compare_helper, string_compare_to};
use quarry_expr::{
    BinaryOp, ConstantExpr, Expr, ExprKind, ExprNode, ExpressionTransformer, Value,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct StringCompareTransformer;

impl ExpressionTransformer for StringCompareTransformer {
    fn name(&self) -> &'static str {
        "StringCompareTransformer"
    }

    fn supported_kinds(&self) -> Vec<ExprKind> {
        BinaryOp::COMPARISONS.into_iter().map(ExprKind::Binary).collect()
    }

    fn transform(&self, expr: &Expr) -> QuarryResult<Expr> {
        let ExprNode::Binary(node) = expr.node() else {
            return Ok(expr.clone());
        };
        let Some(call) = node.left.as_method_call() else {
            return Ok(expr.clone());
        };
        if !is_string_compare_helper(&call.method) || !is_zero(&node.right) {
            return Ok(expr.clone());
        }

        let [left, right, mode] = call.arguments.as_slice() else {
            return Err(QuarryError::not_supported(format!(
                "{} expects three arguments, got {}",
                call.method.name,
                call.arguments.len()
            )));
        };
        let text_compare = match mode.as_constant() {
            Some(ConstantExpr {
                value: Value::Bool(text_compare),
                ..
            }) => *text_compare,
            _ => {
                return Err(QuarryError::not_supported(
                    "the comparison mode of a string comparison must be a constant",
                ))
            }
        };

        match node.op {
            BinaryOp::Equal | BinaryOp::NotEqual => Ok(Expr::comparison_mode(
                Expr::binary(node.op, left.clone(), right.clone()),
                text_compare,
            )),
            BinaryOp::LessThan
            | BinaryOp::LessThanOrEqual
            | BinaryOp::GreaterThan
            | BinaryOp::GreaterThanOrEqual => {
                let compare_to =
                    Expr::call(Some(left.clone()), string_compare_to(), vec![right.clone()]);
                Ok(Expr::binary(
                    node.op,
                    Expr::comparison_mode(compare_to, text_compare),
                    Expr::constant(0i64),
                ))
            }
            op => Err(QuarryError::not_supported(format!(
                "{op} is not supported on a string comparison"
            ))),
        }
    }
}

fn is_zero(expr: &Expr) -> bool {
    matches!(
        expr.as_constant(),
        Some(ConstantExpr {
            value: Value::Int64(0),
            ..
        })
    )
}
