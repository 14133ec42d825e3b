use std::any::Any;
use std::sync::Arc;

use common_error::QuarryResult;

use super::ExtensionExpr;
use crate::expr::Expr;
use crate::query_model::QueryModel;
use crate::types::DataType;
use crate::visitor::ExprVisitor;

/// A subquery: a node owning a nested query model by reference.
///
/// The nested model's expressions are not exposed as children. Passes that
/// must rewrite them implement [`SubQueryVisitor`] and rewrite the model in
/// place, returning the node itself.
#[derive(Debug, Clone)]
pub struct SubQueryExpr {
    model: Arc<dyn QueryModel>,
}

impl SubQueryExpr {
    pub fn new(model: Arc<dyn QueryModel>) -> Self {
        Self { model }
    }

    /// The nested model, shared with every other holder.
    pub fn query_model(&self) -> &Arc<dyn QueryModel> {
        &self.model
    }
}

/// Capability of visitors that handle subquery nodes.
pub trait SubQueryVisitor {
    fn visit_sub_query(&mut self, expr: &Expr, node: &SubQueryExpr) -> QuarryResult<Expr>;
}

impl ExtensionExpr for SubQueryExpr {
    fn tag(&self) -> &'static str {
        "SubQuery"
    }

    fn data_type(&self) -> DataType {
        self.model.result_type()
    }

    fn visit_children(&self, expr: &Expr, _visitor: &mut dyn ExprVisitor) -> QuarryResult<Expr> {
        Ok(expr.clone())
    }

    fn accept(&self, expr: &Expr, visitor: &mut dyn ExprVisitor) -> QuarryResult<Expr> {
        if let Some(v) = visitor.as_sub_query_visitor() {
            return v.visit_sub_query(expr, self);
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
            .is_some_and(|o| Arc::ptr_eq(&self.model, &o.model))
    }
}
