//! The nested query model owned by subquery nodes.

use std::fmt;
use std::sync::{Arc, RwLock};

use common_error::{QuarryError, QuarryResult};

use crate::expr::Expr;
use crate::types::DataType;

/// A structured query held by reference inside a subquery node.
///
/// Rewrites are applied in place: every holder of the same model observes
/// them. Concurrent rewriting of one model from several threads is not
/// supported.
pub trait QueryModel: fmt::Debug + Send + Sync {
    /// Apply `f` to every expression this model holds, replacing each with
    /// the result. Implementations owning nested subqueries propagate `f`
    /// into them.
    fn transform_expressions(
        &self,
        f: &mut dyn FnMut(&Expr) -> QuarryResult<Expr>,
    ) -> QuarryResult<()>;

    /// Result type of the query.
    fn result_type(&self) -> DataType;
}

/// A query model that is just an ordered list of expressions.
pub struct ExpressionQueryModel {
    expressions: RwLock<Vec<Expr>>,
    result_type: DataType,
}

impl ExpressionQueryModel {
    pub fn new(expressions: Vec<Expr>, result_type: DataType) -> Self {
        Self {
            expressions: RwLock::new(expressions),
            result_type,
        }
    }

    /// Create a model already wrapped for sharing between subquery nodes.
    pub fn shared(expressions: Vec<Expr>, result_type: DataType) -> Arc<Self> {
        Arc::new(Self::new(expressions, result_type))
    }

    /// Snapshot of the current expressions.
    pub fn expressions(&self) -> QuarryResult<Vec<Expr>> {
        self.expressions
            .read()
            .map(|exprs| exprs.clone())
            .map_err(|_| QuarryError::internal("query model lock poisoned"))
    }
}

impl QueryModel for ExpressionQueryModel {
    fn transform_expressions(
        &self,
        f: &mut dyn FnMut(&Expr) -> QuarryResult<Expr>,
    ) -> QuarryResult<()> {
        // Transform a snapshot so `f` may read this model without deadlocking.
        let snapshot = self.expressions()?;
        let transformed = snapshot.iter().map(|e| f(e)).collect::<QuarryResult<Vec<_>>>()?;

        let mut guard = self
            .expressions
            .write()
            .map_err(|_| QuarryError::internal("query model lock poisoned"))?;
        *guard = transformed;
        Ok(())
    }

    fn result_type(&self) -> DataType {
        self.result_type.clone()
    }
}

impl fmt::Debug for ExpressionQueryModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionQueryModel")
            .field("result_type", &self.result_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_in_place() {
        let model = ExpressionQueryModel::new(
            vec![Expr::constant(1i64), Expr::constant(2i64)],
            DataType::Int64,
        );

        model
            .transform_expressions(&mut |e| Ok(e.clone().add_expr(Expr::constant(10i64))))
            .unwrap();

        let exprs = model.expressions().unwrap();
        assert_eq!(exprs[0], Expr::constant(1i64).add_expr(Expr::constant(10i64)));
        assert_eq!(exprs.len(), 2);
    }

    #[test]
    fn test_failed_transform_leaves_model_untouched() {
        let original = Expr::constant(1i64);
        let model = ExpressionQueryModel::new(vec![original.clone()], DataType::Int64);

        let result = model.transform_expressions(&mut |_| Err(QuarryError::internal("boom")));
        assert!(result.is_err());
        assert!(model.expressions().unwrap()[0].ptr_eq(&original));
    }
}
