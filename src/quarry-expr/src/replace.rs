//! Exact-match node substitution.
//!
//! Matching is by node identity. A matched node is replaced without
//! descending into it or into its replacement. Subquery models are rewritten
//! in place.

use std::collections::HashMap;

use common_error::QuarryResult;

use crate::expr::{Expr, ExprKey};
use crate::extension::{SubQueryExpr, SubQueryVisitor};
use crate::visitor::{dispatch, ExprVisitor};

/// Replaces every occurrence of one node.
pub struct ReplacingVisitor<'a> {
    target: &'a Expr,
    replacement: &'a Expr,
}

impl<'a> ReplacingVisitor<'a> {
    pub fn new(target: &'a Expr, replacement: &'a Expr) -> Self {
        Self {
            target,
            replacement,
        }
    }
}

impl ExprVisitor for ReplacingVisitor<'_> {
    fn visit(&mut self, expr: &Expr) -> QuarryResult<Expr> {
        if expr.ptr_eq(self.target) {
            return Ok(self.replacement.clone());
        }
        dispatch(self, expr)
    }

    fn as_sub_query_visitor(&mut self) -> Option<&mut dyn SubQueryVisitor> {
        Some(self)
    }
}

impl SubQueryVisitor for ReplacingVisitor<'_> {
    fn visit_sub_query(&mut self, expr: &Expr, node: &SubQueryExpr) -> QuarryResult<Expr> {
        node.query_model()
            .transform_expressions(&mut |e| self.visit(e))?;
        Ok(expr.clone())
    }
}

/// Replaces every node found in a mapping.
pub struct MultiReplacingVisitor<'a> {
    mapping: &'a HashMap<ExprKey, Expr>,
}

impl<'a> MultiReplacingVisitor<'a> {
    pub fn new(mapping: &'a HashMap<ExprKey, Expr>) -> Self {
        Self { mapping }
    }
}

impl ExprVisitor for MultiReplacingVisitor<'_> {
    fn visit(&mut self, expr: &Expr) -> QuarryResult<Expr> {
        if let Some(replacement) = self.mapping.get(&ExprKey::from(expr)) {
            return Ok(replacement.clone());
        }
        dispatch(self, expr)
    }

    fn as_sub_query_visitor(&mut self) -> Option<&mut dyn SubQueryVisitor> {
        Some(self)
    }
}

impl SubQueryVisitor for MultiReplacingVisitor<'_> {
    fn visit_sub_query(&mut self, expr: &Expr, node: &SubQueryExpr) -> QuarryResult<Expr> {
        node.query_model()
            .transform_expressions(&mut |e| self.visit(e))?;
        Ok(expr.clone())
    }
}

/// Replace `target` with `replacement` throughout `tree`.
///
/// Returns `tree` itself when `target` does not occur.
pub fn replace(target: &Expr, replacement: &Expr, tree: &Expr) -> QuarryResult<Expr> {
    ReplacingVisitor::new(target, replacement).visit(tree)
}

/// Replace every key of `mapping` with its value throughout `tree`.
pub fn replace_many(mapping: &HashMap<ExprKey, Expr>, tree: &Expr) -> QuarryResult<Expr> {
    if mapping.is_empty() {
        return Ok(tree.clone());
    }
    MultiReplacingVisitor::new(mapping).visit(tree)
}
