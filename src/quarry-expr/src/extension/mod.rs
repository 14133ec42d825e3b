//! Extension nodes: library- and host-defined node shapes.
//!
//! An extension node may reduce to an equivalent tree of other nodes. It
//! accepts visitors through double dispatch: a node checks whether the active
//! visitor implements the capability trait for its variant and calls the
//! specialized method if so, falling back to the visitor's generic
//! [`ExprVisitor::visit_extension`] hook otherwise.

mod comparison_mode;
mod evaluation_failure;
mod sub_query;

use std::any::Any;
use std::fmt;

use common_error::{QuarryError, QuarryResult};

pub use comparison_mode::{ComparisonModeExpr, ComparisonModeVisitor};
pub use evaluation_failure::{EvaluationFailureExpr, EvaluationFailureVisitor};
pub use sub_query::{SubQueryExpr, SubQueryVisitor};

use crate::expr::Expr;
use crate::types::DataType;
use crate::visitor::ExprVisitor;

/// An extension node.
///
/// `expr` arguments are the handle wrapping `self`, so implementations can
/// return it unchanged.
pub trait ExtensionExpr: fmt::Debug + Send + Sync + 'static {
    /// Discriminating sub-tag.
    fn tag(&self) -> &'static str;

    /// Result type.
    fn data_type(&self) -> DataType;

    /// Whether [`reduce`](Self::reduce) yields an equivalent tree.
    fn can_reduce(&self) -> bool {
        false
    }

    /// Produce an equivalent tree.
    ///
    /// Callers go through [`Expr::reduce_and_check`], which enforces the
    /// reduction contract.
    fn reduce(&self) -> QuarryResult<Expr> {
        Err(QuarryError::extension_contract(format!(
            "extension node '{}' is not reducible",
            self.tag()
        )))
    }

    /// Visit this node's children.
    ///
    /// The default visits the reduction of a reducible node and hands
    /// irreducible nodes to [`ExprVisitor::visit_unknown`].
    fn visit_children(&self, expr: &Expr, visitor: &mut dyn ExprVisitor) -> QuarryResult<Expr> {
        if self.can_reduce() {
            let reduced = expr.reduce_and_check()?;
            return visitor.visit(&reduced);
        }
        visitor.visit_unknown(expr)
    }

    /// Double-dispatch entry point.
    fn accept(&self, expr: &Expr, visitor: &mut dyn ExprVisitor) -> QuarryResult<Expr> {
        visitor.visit_extension(expr)
    }

    fn as_any(&self) -> &dyn Any;

    /// Structural equality with another extension node.
    fn equals(&self, other: &dyn ExtensionExpr) -> bool;

    /// Label used in tree dumps.
    fn label(&self) -> String {
        self.tag().to_string()
    }

    /// Children shown in tree dumps.
    fn children(&self) -> Vec<&Expr> {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use common_error::QuarryError;

    use super::*;

    /// Reduces to a fixed expression.
    #[derive(Debug)]
    struct Fixed {
        to: Option<Expr>,
        data_type: DataType,
    }

    impl ExtensionExpr for Fixed {
        fn tag(&self) -> &'static str {
            "Fixed"
        }

        fn data_type(&self) -> DataType {
            self.data_type.clone()
        }

        fn can_reduce(&self) -> bool {
            self.to.is_some()
        }

        fn reduce(&self) -> QuarryResult<Expr> {
            self.to
                .clone()
                .ok_or_else(|| QuarryError::extension_contract("no reduction"))
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn equals(&self, _other: &dyn ExtensionExpr) -> bool {
            false
        }
    }

    #[test]
    fn test_reduction_must_be_type_compatible() {
        let node = Expr::extension(Fixed {
            to: Some(Expr::constant("text")),
            data_type: DataType::Int64,
        });
        assert!(matches!(
            node.reduce_and_check(),
            Err(QuarryError::ExtensionContract(_))
        ));
    }

    #[test]
    fn test_irreducible_node_cannot_reduce() {
        let node = Expr::extension(Fixed {
            to: None,
            data_type: DataType::Int64,
        });
        assert!(matches!(
            node.reduce_and_check(),
            Err(QuarryError::ExtensionContract(_))
        ));
    }

    #[test]
    fn test_reduction_to_nullable() {
        let node = Expr::extension(Fixed {
            to: Some(Expr::constant(1i64)),
            data_type: DataType::nullable(DataType::Int64),
        });
        assert_eq!(node.reduce_and_check().unwrap(), Expr::constant(1i64));
    }
}
