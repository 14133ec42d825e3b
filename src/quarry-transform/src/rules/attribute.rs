//! Attribute-directed rule dispatch.
//!
//! A method, or the getter of a property, may declare a
//! [`TransformerFactory`](quarry_expr::TransformerFactory). Calls to it are
//! rewritten by the rule the factory produces. Property reads are handed to
//! the factory as calls to the getter.

use common_error::{config_err, QuarryResult};
use quarry_expr::{Expr, ExprKind, ExprNode, ExpressionTransformer};

#[derive(Debug, Default, Clone, Copy)]
pub struct AttributeEvaluatingTransformer;

impl ExpressionTransformer for AttributeEvaluatingTransformer {
    fn name(&self) -> &'static str {
        "AttributeEvaluatingTransformer"
    }

    fn supported_kinds(&self) -> Vec<ExprKind> {
        vec![ExprKind::MethodCall, ExprKind::MemberAccess]
    }

    fn transform(&self, expr: &Expr) -> QuarryResult<Expr> {
        let call = match expr.node() {
            ExprNode::MethodCall(_) => expr.clone(),
            ExprNode::MemberAccess(member) => match member.member.getter() {
                Some(getter) if !getter.transformer_factories().is_empty() => {
                    Expr::call(member.object.clone(), getter.clone(), vec![])
                }
                _ => return Ok(expr.clone()),
            },
            _ => return Ok(expr.clone()),
        };

        let Some(node) = call.as_method_call() else {
            return Ok(expr.clone());
        };

        let factory = match node.method.transformer_factories() {
            [] => return Ok(expr.clone()),
            [factory] => factory,
            factories => config_err!(
                "method '{}.{}' declares {} transformers; at most one is allowed",
                node.method.declaring_type,
                node.method.name,
                factories.len()
            ),
        };

        let Some(rule) = factory.create_transformer(&call) else {
            config_err!(
                "transformer factory {:?} on '{}.{}' produced no rule",
                factory,
                node.method.declaring_type,
                node.method.name
            );
        };

        let transformed = rule.transform(&call)?;
        if transformed.ptr_eq(&call) {
            return Ok(expr.clone());
        }
        Ok(transformed)
    }
}
