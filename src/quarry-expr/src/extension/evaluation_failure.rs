use std::any::Any;
use std::sync::Arc;

use common_error::{QuarryError, QuarryResult};

use super::ExtensionExpr;
use crate::expr::Expr;
use crate::types::DataType;
use crate::visitor::ExprVisitor;

/// A captured evaluation failure paired with the best-effort rewritten
/// subtree that raised it.
///
/// Reduces to that subtree, so passes that do not handle this node see
/// through it.
#[derive(Debug, Clone)]
pub struct EvaluationFailureExpr {
    pub error: Arc<QuarryError>,
    pub evaluated: Expr,
}

impl EvaluationFailureExpr {
    pub fn new(error: Arc<QuarryError>, evaluated: Expr) -> Self {
        Self { error, evaluated }
    }
}

/// Capability of visitors that inspect captured evaluation failures.
pub trait EvaluationFailureVisitor {
    fn visit_evaluation_failure(
        &mut self,
        expr: &Expr,
        node: &EvaluationFailureExpr,
    ) -> QuarryResult<Expr>;
}

impl ExtensionExpr for EvaluationFailureExpr {
    fn tag(&self) -> &'static str {
        "EvaluationFailure"
    }

    fn data_type(&self) -> DataType {
        self.evaluated.data_type()
    }

    fn can_reduce(&self) -> bool {
        true
    }

    fn reduce(&self) -> QuarryResult<Expr> {
        Ok(self.evaluated.clone())
    }

    /// Rewrites the wrapped subtree and keeps the captured failure.
    fn visit_children(&self, expr: &Expr, visitor: &mut dyn ExprVisitor) -> QuarryResult<Expr> {
        let evaluated = visitor.visit(&self.evaluated)?;
        if evaluated.ptr_eq(&self.evaluated) {
            return Ok(expr.clone());
        }
        Ok(Expr::extension(Self::new(self.error.clone(), evaluated)))
    }

    fn accept(&self, expr: &Expr, visitor: &mut dyn ExprVisitor) -> QuarryResult<Expr> {
        if let Some(v) = visitor.as_evaluation_failure_visitor() {
            return v.visit_evaluation_failure(expr, self);
        }
        visitor.visit_extension(expr)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equals(&self, other: &dyn ExtensionExpr) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|o| {
                self.evaluated == o.evaluated && self.error.to_string() == o.error.to_string()
            })
    }

    fn label(&self) -> String {
        format!("EvaluationFailure({})", self.error)
    }

    fn children(&self) -> Vec<&Expr> {
        vec![&self.evaluated]
    }
}
