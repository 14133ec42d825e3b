//! Visitor core: dispatch-by-kind traversal with structural sharing.
//!
//! [`ExprVisitor::visit`] dispatches on the node kind to one hook per
//! standard kind. Every default hook visits the node's children and rebuilds
//! the node only if some child changed (by handle identity); otherwise it
//! returns the input handle, so an untouched tree comes back as the same
//! object.
//!
//! Extension nodes dispatch through [`ExtensionExpr::accept`]. A visitor that
//! wants a specific extension variant implements that variant's capability
//! trait (for example [`SubQueryVisitor`]) and returns `Some(self)` from the
//! matching `as_*_visitor` method; otherwise the generic
//! [`ExprVisitor::visit_extension`] hook runs.
//!
//! Traversal is recursive; pathologically deep trees can exhaust the stack.
//!
//! [`ExtensionExpr::accept`]: crate::extension::ExtensionExpr::accept

use common_error::{QuarryError, QuarryResult};

use crate::expr::*;
use crate::extension::{ComparisonModeVisitor, EvaluationFailureVisitor, SubQueryVisitor};

/// Upcast to a visitor trait object, for handing `self` to extension nodes.
pub trait AsExprVisitor {
    fn as_expr_visitor(&mut self) -> &mut dyn ExprVisitor;
}

impl<T: ExprVisitor> AsExprVisitor for T {
    fn as_expr_visitor(&mut self) -> &mut dyn ExprVisitor {
        self
    }
}

/// A rewriting traversal over expression trees.
pub trait ExprVisitor: AsExprVisitor {
    /// Visit a node. Overriding this intercepts every node before dispatch.
    fn visit(&mut self, expr: &Expr) -> QuarryResult<Expr> {
        dispatch(self, expr)
    }

    fn visit_constant(&mut self, expr: &Expr, _node: &ConstantExpr) -> QuarryResult<Expr> {
        Ok(expr.clone())
    }

    fn visit_parameter(&mut self, expr: &Expr, _node: &ParameterExpr) -> QuarryResult<Expr> {
        Ok(expr.clone())
    }

    fn visit_lambda(&mut self, expr: &Expr, node: &LambdaExpr) -> QuarryResult<Expr> {
        walk_lambda(self, expr, node)
    }

    fn visit_unary(&mut self, expr: &Expr, node: &UnaryExpr) -> QuarryResult<Expr> {
        walk_unary(self, expr, node)
    }

    fn visit_binary(&mut self, expr: &Expr, node: &BinaryExpr) -> QuarryResult<Expr> {
        walk_binary(self, expr, node)
    }

    fn visit_member(&mut self, expr: &Expr, node: &MemberExpr) -> QuarryResult<Expr> {
        walk_member(self, expr, node)
    }

    fn visit_method_call(&mut self, expr: &Expr, node: &MethodCallExpr) -> QuarryResult<Expr> {
        walk_method_call(self, expr, node)
    }

    fn visit_invocation(&mut self, expr: &Expr, node: &InvocationExpr) -> QuarryResult<Expr> {
        walk_invocation(self, expr, node)
    }

    fn visit_new(&mut self, expr: &Expr, node: &NewExpr) -> QuarryResult<Expr> {
        walk_new(self, expr, node)
    }

    fn visit_member_init(&mut self, expr: &Expr, node: &MemberInitExpr) -> QuarryResult<Expr> {
        walk_member_init(self, expr, node)
    }

    fn visit_list_init(&mut self, expr: &Expr, node: &ListInitExpr) -> QuarryResult<Expr> {
        walk_list_init(self, expr, node)
    }

    fn visit_conditional(&mut self, expr: &Expr, node: &ConditionalExpr) -> QuarryResult<Expr> {
        walk_conditional(self, expr, node)
    }

    fn visit_type_is(&mut self, expr: &Expr, node: &TypeIsExpr) -> QuarryResult<Expr> {
        walk_type_is(self, expr, node)
    }

    /// Generic hook for extension nodes without a matching capability.
    ///
    /// Defaults to the node's own child traversal.
    fn visit_extension(&mut self, expr: &Expr) -> QuarryResult<Expr> {
        match expr.node() {
            ExprNode::Extension(ext) => ext.visit_children(expr, self.as_expr_visitor()),
            _ => self.visit_unknown(expr),
        }
    }

    /// Hook for nodes this visitor cannot traverse at all.
    fn visit_unknown(&mut self, expr: &Expr) -> QuarryResult<Expr> {
        Ok(expr.clone())
    }

    fn as_sub_query_visitor(&mut self) -> Option<&mut dyn SubQueryVisitor> {
        None
    }

    fn as_comparison_mode_visitor(&mut self) -> Option<&mut dyn ComparisonModeVisitor> {
        None
    }

    fn as_evaluation_failure_visitor(&mut self) -> Option<&mut dyn EvaluationFailureVisitor> {
        None
    }
}

/// Dispatch `expr` to the visitor hook for its kind.
pub fn dispatch<V: ExprVisitor + ?Sized>(v: &mut V, expr: &Expr) -> QuarryResult<Expr> {
    match expr.node() {
        ExprNode::Constant(n) => v.visit_constant(expr, n),
        ExprNode::Parameter(n) => v.visit_parameter(expr, n),
        ExprNode::Lambda(n) => v.visit_lambda(expr, n),
        ExprNode::Unary(n) => v.visit_unary(expr, n),
        ExprNode::Binary(n) => v.visit_binary(expr, n),
        ExprNode::MemberAccess(n) => v.visit_member(expr, n),
        ExprNode::MethodCall(n) => v.visit_method_call(expr, n),
        ExprNode::Invocation(n) => v.visit_invocation(expr, n),
        ExprNode::New(n) => v.visit_new(expr, n),
        ExprNode::MemberInit(n) => v.visit_member_init(expr, n),
        ExprNode::ListInit(n) => v.visit_list_init(expr, n),
        ExprNode::Conditional(n) => v.visit_conditional(expr, n),
        ExprNode::TypeIs(n) => v.visit_type_is(expr, n),
        ExprNode::Extension(ext) => ext.accept(expr, v.as_expr_visitor()),
    }
}

/// Visit an optional node; `None` stays `None`.
pub fn visit_opt<V: ExprVisitor + ?Sized>(
    v: &mut V,
    expr: Option<&Expr>,
) -> QuarryResult<Option<Expr>> {
    expr.map(|e| v.visit(e)).transpose()
}

fn visit_all<V: ExprVisitor + ?Sized>(v: &mut V, exprs: &[Expr]) -> QuarryResult<(Vec<Expr>, bool)> {
    let mut changed = false;
    let mut visited = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let new_expr = v.visit(expr)?;
        changed |= !new_expr.ptr_eq(expr);
        visited.push(new_expr);
    }
    Ok((visited, changed))
}

fn same_opt(new: &Option<Expr>, old: &Option<Expr>) -> bool {
    match (new, old) {
        (Some(n), Some(o)) => n.ptr_eq(o),
        (None, None) => true,
        _ => false,
    }
}

// ========== Default child traversals ==========

pub fn walk_lambda<V: ExprVisitor + ?Sized>(
    v: &mut V,
    expr: &Expr,
    node: &LambdaExpr,
) -> QuarryResult<Expr> {
    let body = v.visit(&node.body)?;
    let (parameters, params_changed) = visit_all(v, &node.parameters)?;

    if body.ptr_eq(&node.body) && !params_changed {
        return Ok(expr.clone());
    }
    Ok(Expr::lambda_typed(parameters, body, node.data_type.clone()))
}

pub fn walk_unary<V: ExprVisitor + ?Sized>(
    v: &mut V,
    expr: &Expr,
    node: &UnaryExpr,
) -> QuarryResult<Expr> {
    let operand = v.visit(&node.operand)?;

    if operand.ptr_eq(&node.operand) {
        return Ok(expr.clone());
    }
    Ok(Expr::unary(node.op, operand, node.data_type.clone()))
}

pub fn walk_binary<V: ExprVisitor + ?Sized>(
    v: &mut V,
    expr: &Expr,
    node: &BinaryExpr,
) -> QuarryResult<Expr> {
    let left = v.visit(&node.left)?;
    let conversion = visit_opt(v, node.conversion.as_ref())?;
    let right = v.visit(&node.right)?;

    if left.ptr_eq(&node.left) && right.ptr_eq(&node.right) && same_opt(&conversion, &node.conversion)
    {
        return Ok(expr.clone());
    }
    Ok(Expr::binary_typed(
        node.op,
        left,
        right,
        conversion,
        node.data_type.clone(),
    ))
}

pub fn walk_member<V: ExprVisitor + ?Sized>(
    v: &mut V,
    expr: &Expr,
    node: &MemberExpr,
) -> QuarryResult<Expr> {
    let object = visit_opt(v, node.object.as_ref())?;

    if same_opt(&object, &node.object) {
        return Ok(expr.clone());
    }
    Ok(Expr::member(object, node.member.clone()))
}

pub fn walk_method_call<V: ExprVisitor + ?Sized>(
    v: &mut V,
    expr: &Expr,
    node: &MethodCallExpr,
) -> QuarryResult<Expr> {
    let object = visit_opt(v, node.object.as_ref())?;
    let (arguments, args_changed) = visit_all(v, &node.arguments)?;

    if same_opt(&object, &node.object) && !args_changed {
        return Ok(expr.clone());
    }
    Ok(Expr::call(object, node.method.clone(), arguments))
}

pub fn walk_invocation<V: ExprVisitor + ?Sized>(
    v: &mut V,
    expr: &Expr,
    node: &InvocationExpr,
) -> QuarryResult<Expr> {
    let callee = v.visit(&node.callee)?;
    let (arguments, args_changed) = visit_all(v, &node.arguments)?;

    if callee.ptr_eq(&node.callee) && !args_changed {
        return Ok(expr.clone());
    }
    Ok(Expr::invoke_typed(callee, arguments, node.data_type.clone()))
}

pub fn walk_new<V: ExprVisitor + ?Sized>(
    v: &mut V,
    expr: &Expr,
    node: &NewExpr,
) -> QuarryResult<Expr> {
    let (arguments, args_changed) = visit_all(v, &node.arguments)?;

    if !args_changed {
        return Ok(expr.clone());
    }
    Ok(Expr::from_node(ExprNode::New(NewExpr {
        constructor: node.constructor.clone(),
        arguments,
        members: node.members.clone(),
    })))
}

pub fn walk_member_init<V: ExprVisitor + ?Sized>(
    v: &mut V,
    expr: &Expr,
    node: &MemberInitExpr,
) -> QuarryResult<Expr> {
    let new_expr = v.visit(&node.new_expr)?;
    let mut changed = !new_expr.ptr_eq(&node.new_expr);

    let mut bindings = Vec::with_capacity(node.bindings.len());
    for binding in &node.bindings {
        let value = v.visit(&binding.value)?;
        changed |= !value.ptr_eq(&binding.value);
        bindings.push(MemberBinding::new(binding.member.clone(), value));
    }

    if !changed {
        return Ok(expr.clone());
    }
    Expr::member_init(new_expr, bindings).map_err(|_| construction_replaced("object initializer"))
}

pub fn walk_list_init<V: ExprVisitor + ?Sized>(
    v: &mut V,
    expr: &Expr,
    node: &ListInitExpr,
) -> QuarryResult<Expr> {
    let new_expr = v.visit(&node.new_expr)?;
    let mut changed = !new_expr.ptr_eq(&node.new_expr);

    let mut initializers = Vec::with_capacity(node.initializers.len());
    for init in &node.initializers {
        let (arguments, args_changed) = visit_all(v, &init.arguments)?;
        changed |= args_changed;
        initializers.push(ElementInit::new(init.add_method.clone(), arguments));
    }

    if !changed {
        return Ok(expr.clone());
    }
    Expr::list_init(new_expr, initializers)
        .map_err(|_| construction_replaced("collection initializer"))
}

pub fn walk_conditional<V: ExprVisitor + ?Sized>(
    v: &mut V,
    expr: &Expr,
    node: &ConditionalExpr,
) -> QuarryResult<Expr> {
    let test = v.visit(&node.test)?;
    let if_true = v.visit(&node.if_true)?;
    let if_false = v.visit(&node.if_false)?;

    if test.ptr_eq(&node.test) && if_true.ptr_eq(&node.if_true) && if_false.ptr_eq(&node.if_false)
    {
        return Ok(expr.clone());
    }
    Ok(Expr::from_node(ExprNode::Conditional(ConditionalExpr {
        test,
        if_true,
        if_false,
        data_type: node.data_type.clone(),
    })))
}

pub fn walk_type_is<V: ExprVisitor + ?Sized>(
    v: &mut V,
    expr: &Expr,
    node: &TypeIsExpr,
) -> QuarryResult<Expr> {
    let operand = v.visit(&node.operand)?;

    if operand.ptr_eq(&node.operand) {
        return Ok(expr.clone());
    }
    Ok(Expr::type_is(operand, node.type_operand.clone()))
}

fn construction_replaced(what: &str) -> QuarryError {
    QuarryError::internal(format!(
        "visiting the construction of an {what} must yield a construction node"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    /// Rewrites every Int64 constant `n` into `n + 1`.
    struct Increment;

    impl ExprVisitor for Increment {
        fn visit_constant(&mut self, expr: &Expr, node: &ConstantExpr) -> QuarryResult<Expr> {
            match node.value.as_int64() {
                Some(n) => Ok(Expr::constant(n + 1)),
                None => Ok(expr.clone()),
            }
        }
    }

    struct Identity;

    impl ExprVisitor for Identity {}

    #[test]
    fn test_identity_visit_shares_structure() {
        let x = Expr::parameter("x", DataType::Int64);
        let expr = Expr::lambda(
            vec![x.clone()],
            Expr::condition(
                x.clone().gt(Expr::constant(0i64)),
                x.clone(),
                x.negate(),
            ),
        );

        let visited = Identity.visit(&expr).unwrap();
        assert!(visited.ptr_eq(&expr));
    }

    #[test]
    fn test_rebuilds_only_changed_path() {
        let x = Expr::parameter("x", DataType::Int64);
        let untouched = x.clone().mul_expr(x.clone());
        let expr = untouched.clone().add_expr(Expr::constant(1i64));

        let visited = Increment.visit(&expr).unwrap();
        assert!(!visited.ptr_eq(&expr));

        let ExprNode::Binary(binary) = visited.node() else {
            panic!("expected a binary node");
        };
        assert!(binary.left.ptr_eq(&untouched));
        assert_eq!(binary.right, Expr::constant(2i64));
    }

    #[test]
    fn test_visit_opt_none() {
        assert!(visit_opt(&mut Identity, None).unwrap().is_none());
    }
}
