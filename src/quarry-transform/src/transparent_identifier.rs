//! Transparent-identifier elimination.
//!
//! Query translators introduce anonymous objects (or tuples) to carry
//! several range variables through one lambda parameter. A read of a member
//! of such an object, e.g. `new { a = x, b = y }.a`, is replaced by the
//! expression bound to that member. Removing one layer can expose another,
//! so passes repeat until one changes nothing.

use common_error::QuarryResult;
use log::trace;
use quarry_expr::visitor::walk_member;
use quarry_expr::{
    Expr, ExprNode, ExprVisitor, Member, MemberExpr, SubQueryExpr, SubQueryVisitor,
};

/// Replace member reads of transparent identifiers until none remain.
pub fn remove_transparent_identifiers(tree: &Expr) -> QuarryResult<Expr> {
    let mut current = tree.clone();
    let mut passes = 1usize;

    loop {
        let next = TransparentIdentifierRemovingVisitor.visit(&current)?;
        if next.ptr_eq(&current) {
            trace!("Transparent identifier removal settled after {passes} pass(es)");
            return Ok(next);
        }
        current = next;
        passes += 1;
    }
}

/// One pass of transparent-identifier removal.
struct TransparentIdentifierRemovingVisitor;

/// `(member, value)` pairs assigned by an initializer or a construction
/// with member metadata.
fn member_bindings(expr: &Expr) -> Option<Vec<(&Member, &Expr)>> {
    match expr.node() {
        ExprNode::MemberInit(init) => Some(
            init.bindings
                .iter()
                .map(|binding| (&binding.member, &binding.value))
                .collect(),
        ),
        ExprNode::New(new_expr) => new_expr
            .members
            .as_ref()
            .map(|members| members.iter().zip(&new_expr.arguments).collect()),
        _ => None,
    }
}

impl ExprVisitor for TransparentIdentifierRemovingVisitor {
    fn visit_member(&mut self, expr: &Expr, node: &MemberExpr) -> QuarryResult<Expr> {
        let bindings = node.object.as_ref().and_then(member_bindings);

        // Later assignments shadow earlier ones.
        let matching = bindings.and_then(|bindings| {
            bindings
                .into_iter()
                .rev()
                .find(|(member, _)| **member == node.member)
                .map(|(_, value)| value.clone())
        });

        match matching {
            Some(value) => Ok(value),
            None => walk_member(self, expr, node),
        }
    }

    fn as_sub_query_visitor(&mut self) -> Option<&mut dyn SubQueryVisitor> {
        Some(self)
    }
}

impl SubQueryVisitor for TransparentIdentifierRemovingVisitor {
    fn visit_sub_query(&mut self, expr: &Expr, node: &SubQueryExpr) -> QuarryResult<Expr> {
        node.query_model()
            .transform_expressions(&mut |e| remove_transparent_identifiers(e))?;
        Ok(expr.clone())
    }
}
