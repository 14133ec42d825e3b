//! Inlines invocations of literal lambdas.

use std::collections::HashMap;

use common_error::{ensure, QuarryResult};
use quarry_expr::{
    replace_many, Expr, ExprKey, ExprKind, ExprNode, ExpressionTransformer, UnaryOp,
};

/// Rewrites `(p1, .., pn => body)(a1, .., an)` to `body` with every `pi`
/// replaced by `ai`.
///
/// Conversions to the callee's own type are looked through. Callees that are
/// not literal lambdas (delegate values, parameters, member reads) are left
/// alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct InvocationOfLambdaTransformer;

impl ExpressionTransformer for InvocationOfLambdaTransformer {
    fn name(&self) -> &'static str {
        "InvocationOfLambdaTransformer"
    }

    fn supported_kinds(&self) -> Vec<ExprKind> {
        vec![ExprKind::Invocation]
    }

    fn transform(&self, expr: &Expr) -> QuarryResult<Expr> {
        let ExprNode::Invocation(invocation) = expr.node() else {
            return Ok(expr.clone());
        };

        let Some(lambda) = strip_no_op_conversions(&invocation.callee).as_lambda() else {
            return Ok(expr.clone());
        };

        ensure!(
            lambda.parameters.len() == invocation.arguments.len(),
            TypeError: "lambda takes {} arguments but is invoked with {}",
            lambda.parameters.len(),
            invocation.arguments.len()
        );

        let mapping = lambda
            .parameters
            .iter()
            .map(ExprKey::from)
            .zip(invocation.arguments.iter().cloned())
            .collect::<HashMap<_, _>>();
        replace_many(&mapping, &lambda.body)
    }
}

fn strip_no_op_conversions(expr: &Expr) -> &Expr {
    match expr.node() {
        ExprNode::Unary(unary)
            if unary.op == UnaryOp::Convert && unary.data_type == unary.operand.data_type() =>
        {
            strip_no_op_conversions(&unary.operand)
        }
        _ => expr,
    }
}
