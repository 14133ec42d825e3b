use std::any::Any;

use common_error::QuarryResult;

use super::ExtensionExpr;
use crate::expr::Expr;
use crate::types::DataType;
use crate::visitor::ExprVisitor;

/// An equality or relational node tagged with its comparison mode.
///
/// `text_compare` selects culture-aware text semantics instead of ordinal
/// comparison. The node reduces to the wrapped comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonModeExpr {
    pub comparison: Expr,
    pub text_compare: bool,
}

impl ComparisonModeExpr {
    pub fn new(comparison: Expr, text_compare: bool) -> Self {
        Self {
            comparison,
            text_compare,
        }
    }
}

/// Capability of visitors that handle comparison-mode nodes.
pub trait ComparisonModeVisitor {
    fn visit_comparison_mode(
        &mut self,
        expr: &Expr,
        node: &ComparisonModeExpr,
    ) -> QuarryResult<Expr>;
}

impl ExtensionExpr for ComparisonModeExpr {
    fn tag(&self) -> &'static str {
        "ComparisonMode"
    }

    fn data_type(&self) -> DataType {
        self.comparison.data_type()
    }

    fn can_reduce(&self) -> bool {
        true
    }

    fn reduce(&self) -> QuarryResult<Expr> {
        Ok(self.comparison.clone())
    }

    /// Rewrites the wrapped comparison and keeps the mode.
    fn visit_children(&self, expr: &Expr, visitor: &mut dyn ExprVisitor) -> QuarryResult<Expr> {
        let comparison = visitor.visit(&self.comparison)?;
        if comparison.ptr_eq(&self.comparison) {
            return Ok(expr.clone());
        }
        Ok(Expr::comparison_mode(comparison, self.text_compare))
    }

    fn accept(&self, expr: &Expr, visitor: &mut dyn ExprVisitor) -> QuarryResult<Expr> {
        if let Some(v) = visitor.as_comparison_mode_visitor() {
            return v.visit_comparison_mode(expr, self);
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
            .is_some_and(|o| self == o)
    }

    fn label(&self) -> String {
        format!("ComparisonMode(text={})", self.text_compare)
    }

    fn children(&self) -> Vec<&Expr> {
        vec![&self.comparison]
    }
}
