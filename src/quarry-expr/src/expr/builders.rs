//! Constructors for expression nodes.

use std::sync::Arc;

use common_error::{QuarryError, QuarryResult};

use super::node::*;
use super::{BinaryOp, UnaryOp};
use crate::extension::{ComparisonModeExpr, EvaluationFailureExpr, ExtensionExpr, SubQueryExpr};
use crate::host::{Constructor, Member, Method};
use crate::query_model::QueryModel;
use crate::types::{DataType, Value};

impl Expr {
    // ========== Leaves ==========

    /// Create a literal typed by its value.
    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        let data_type = value.data_type();
        Self::constant_typed(value, data_type)
    }

    /// Create a literal with an explicit result type.
    pub fn constant_typed(value: Value, data_type: DataType) -> Self {
        Self::from_node(ExprNode::Constant(ConstantExpr { value, data_type }))
    }

    /// Create a null literal of the given type.
    pub fn null(data_type: DataType) -> Self {
        Self::constant_typed(Value::Null, data_type)
    }

    /// Create a fresh parameter. Each call yields a distinct variable.
    pub fn parameter(name: impl Into<String>, data_type: DataType) -> Self {
        Self::from_node(ExprNode::Parameter(ParameterExpr {
            name: name.into(),
            data_type,
        }))
    }

    // ========== Lambdas and invocation ==========

    /// Create a lambda; its type is derived from the parameters and body.
    pub fn lambda(parameters: Vec<Expr>, body: Expr) -> Self {
        let data_type = DataType::function(
            parameters.iter().map(Expr::data_type).collect(),
            body.data_type(),
        );
        Self::lambda_typed(parameters, body, data_type)
    }

    /// Create a lambda with an explicit function type.
    pub fn lambda_typed(parameters: Vec<Expr>, body: Expr, data_type: DataType) -> Self {
        Self::from_node(ExprNode::Lambda(LambdaExpr {
            parameters,
            body,
            data_type,
        }))
    }

    /// Invoke a function-typed expression.
    pub fn invoke(callee: Expr, arguments: Vec<Expr>) -> Self {
        let data_type = callee
            .data_type()
            .return_type()
            .cloned()
            .unwrap_or(DataType::Any);
        Self::invoke_typed(callee, arguments, data_type)
    }

    /// Invoke with an explicit result type.
    pub fn invoke_typed(callee: Expr, arguments: Vec<Expr>, data_type: DataType) -> Self {
        Self::from_node(ExprNode::Invocation(InvocationExpr {
            callee,
            arguments,
            data_type,
        }))
    }

    // ========== Operators ==========

    /// Create a unary expression with an explicit result type.
    pub fn unary(op: UnaryOp, operand: Expr, data_type: DataType) -> Self {
        Self::from_node(ExprNode::Unary(UnaryExpr {
            op,
            operand,
            data_type,
        }))
    }

    /// Create a conversion to `target`.
    pub fn convert(operand: Expr, target: DataType) -> Self {
        Self::unary(UnaryOp::Convert, operand, target)
    }

    /// Create a logical NOT expression.
    #[must_use]
    pub fn logical_not(self) -> Self {
        Self::unary(UnaryOp::Not, self, DataType::Bool)
    }

    /// Create a numeric negation.
    #[must_use]
    pub fn negate(self) -> Self {
        let data_type = self.data_type();
        Self::unary(UnaryOp::Negate, self, data_type)
    }

    /// Create a binary expression; the result type follows the operator.
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        let data_type = op.result_type(&left.data_type(), &right.data_type());
        Self::binary_typed(op, left, right, None, data_type)
    }

    /// Create a binary expression with an explicit conversion and type.
    pub fn binary_typed(
        op: BinaryOp,
        left: Expr,
        right: Expr,
        conversion: Option<Expr>,
        data_type: DataType,
    ) -> Self {
        Self::from_node(ExprNode::Binary(BinaryExpr {
            op,
            left,
            right,
            conversion,
            data_type,
        }))
    }

    /// Create an addition expression.
    #[must_use]
    pub fn add_expr(self, other: Self) -> Self {
        Self::binary(BinaryOp::Add, self, other)
    }

    /// Create a subtraction expression.
    #[must_use]
    pub fn sub_expr(self, other: Self) -> Self {
        Self::binary(BinaryOp::Subtract, self, other)
    }

    /// Create a multiplication expression.
    #[must_use]
    pub fn mul_expr(self, other: Self) -> Self {
        Self::binary(BinaryOp::Multiply, self, other)
    }

    /// Create a division expression.
    #[must_use]
    pub fn div_expr(self, other: Self) -> Self {
        Self::binary(BinaryOp::Divide, self, other)
    }

    /// Create an equality expression.
    #[must_use]
    pub fn equal(self, other: Self) -> Self {
        Self::binary(BinaryOp::Equal, self, other)
    }

    /// Create an inequality expression.
    #[must_use]
    pub fn not_equal(self, other: Self) -> Self {
        Self::binary(BinaryOp::NotEqual, self, other)
    }

    /// Create a less than expression.
    #[must_use]
    pub fn lt(self, other: Self) -> Self {
        Self::binary(BinaryOp::LessThan, self, other)
    }

    /// Create a greater than expression.
    #[must_use]
    pub fn gt(self, other: Self) -> Self {
        Self::binary(BinaryOp::GreaterThan, self, other)
    }

    /// Create a conditional AND expression.
    #[must_use]
    pub fn and_also(self, other: Self) -> Self {
        Self::binary(BinaryOp::AndAlso, self, other)
    }

    /// Create a conditional OR expression.
    #[must_use]
    pub fn or_else(self, other: Self) -> Self {
        Self::binary(BinaryOp::OrElse, self, other)
    }

    /// Create a null-coalescing expression.
    #[must_use]
    pub fn coalesce(self, other: Self) -> Self {
        Self::binary(BinaryOp::Coalesce, self, other)
    }

    // ========== Members and calls ==========

    /// Read a member; pass `None` for a static member.
    pub fn member(object: Option<Expr>, member: Member) -> Self {
        Self::from_node(ExprNode::MemberAccess(MemberExpr { object, member }))
    }

    /// Read an instance member of `self`.
    #[must_use]
    pub fn get(self, member: Member) -> Self {
        Self::member(Some(self), member)
    }

    /// Call a method; pass `None` as the receiver for a static method.
    pub fn call(object: Option<Expr>, method: Method, arguments: Vec<Expr>) -> Self {
        Self::from_node(ExprNode::MethodCall(MethodCallExpr {
            object,
            method,
            arguments,
        }))
    }

    // ========== Construction ==========

    /// Call a constructor without member metadata.
    pub fn construct(constructor: Constructor, arguments: Vec<Expr>) -> Self {
        Self::from_node(ExprNode::New(NewExpr {
            constructor,
            arguments,
            members: None,
        }))
    }

    /// Call a constructor, recording the member each argument initializes.
    pub fn construct_with_members(
        constructor: Constructor,
        arguments: Vec<Expr>,
        members: Vec<Member>,
    ) -> QuarryResult<Self> {
        if members.len() != arguments.len() {
            return Err(QuarryError::internal(format!(
                "construction has {} arguments but {} members",
                arguments.len(),
                members.len()
            )));
        }

        Ok(Self::from_node(ExprNode::New(NewExpr {
            constructor,
            arguments,
            members: Some(members),
        })))
    }

    /// Create an object initializer.
    pub fn member_init(new_expr: Expr, bindings: Vec<MemberBinding>) -> QuarryResult<Self> {
        ensure_construction(&new_expr, "object initializer")?;
        Ok(Self::from_node(ExprNode::MemberInit(MemberInitExpr {
            new_expr,
            bindings,
        })))
    }

    /// Create a collection initializer.
    pub fn list_init(new_expr: Expr, initializers: Vec<ElementInit>) -> QuarryResult<Self> {
        ensure_construction(&new_expr, "collection initializer")?;
        Ok(Self::from_node(ExprNode::ListInit(ListInitExpr {
            new_expr,
            initializers,
        })))
    }

    // ========== Control flow and types ==========

    /// Create a ternary conditional; its type is the type of `if_true`.
    pub fn condition(test: Expr, if_true: Expr, if_false: Expr) -> Self {
        let data_type = if_true.data_type();
        Self::from_node(ExprNode::Conditional(ConditionalExpr {
            test,
            if_true,
            if_false,
            data_type,
        }))
    }

    /// Create a runtime type check.
    pub fn type_is(operand: Expr, type_operand: DataType) -> Self {
        Self::from_node(ExprNode::TypeIs(TypeIsExpr {
            operand,
            type_operand,
        }))
    }

    // ========== Extensions ==========

    /// Wrap an extension node.
    pub fn extension(node: impl ExtensionExpr) -> Self {
        Self::from_node(ExprNode::Extension(Arc::new(node)))
    }

    /// Create a subquery node sharing `model`.
    pub fn sub_query(model: Arc<dyn QueryModel>) -> Self {
        Self::extension(SubQueryExpr::new(model))
    }

    /// Create a comparison-mode node around an equality/relational node.
    pub fn comparison_mode(comparison: Expr, text_compare: bool) -> Self {
        Self::extension(ComparisonModeExpr::new(comparison, text_compare))
    }

    /// Create a diagnostic node pairing a captured failure with the
    /// best-effort rewritten subtree that raised it.
    pub fn evaluation_failure(error: QuarryError, evaluated: Expr) -> Self {
        Self::extension(EvaluationFailureExpr::new(Arc::new(error), evaluated))
    }
}

impl MemberBinding {
    /// Bind `value` to `member`.
    pub fn new(member: Member, value: Expr) -> Self {
        Self { member, value }
    }
}

impl ElementInit {
    /// An element-add call.
    pub fn new(add_method: Method, arguments: Vec<Expr>) -> Self {
        Self {
            add_method,
            arguments,
        }
    }
}

fn ensure_construction(expr: &Expr, what: &str) -> QuarryResult<()> {
    if expr.as_new().is_none() {
        return Err(QuarryError::internal(format!(
            "{what} must wrap a construction node, got {:?}",
            expr.kind()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ConstructorInfo, MemberInfo};

    #[test]
    fn test_constant_types() {
        assert_eq!(Expr::constant(1i64).data_type(), DataType::Int64);
        assert_eq!(Expr::null(DataType::String).data_type(), DataType::String);
    }

    #[test]
    fn test_parameters_compare_by_identity() {
        let a = Expr::parameter("x", DataType::Int64);
        let b = Expr::parameter("x", DataType::Int64);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_structural_equality() {
        let x = Expr::parameter("x", DataType::Int64);
        let left = x.clone().add_expr(Expr::constant(1i64));
        let right = x.add_expr(Expr::constant(1i64));
        assert_eq!(left, right);
        assert!(!left.ptr_eq(&right));
    }

    #[test]
    fn test_lambda_type() {
        let x = Expr::parameter("x", DataType::Int64);
        let lambda = Expr::lambda(vec![x.clone()], x.gt(Expr::constant(0i64)));
        assert_eq!(
            lambda.data_type(),
            DataType::function(vec![DataType::Int64], DataType::Bool)
        );
        assert_eq!(
            Expr::invoke(lambda, vec![Expr::constant(1i64)]).data_type(),
            DataType::Bool
        );
    }

    #[test]
    fn test_member_init_requires_construction() {
        let person = DataType::object("Person");
        let name = MemberInfo::field(person.clone(), "name", DataType::String).build();
        let binding = MemberBinding::new(name, Expr::constant("Ada"));

        assert!(Expr::member_init(Expr::constant(1i64), vec![binding.clone()]).is_err());

        let ctor = ConstructorInfo::new(person.clone(), vec![]).build();
        let init = Expr::member_init(Expr::construct(ctor, vec![]), vec![binding]).unwrap();
        assert_eq!(init.data_type(), person);
    }

    #[test]
    fn test_construct_with_members_arity() {
        let ty = DataType::Tuple(vec![DataType::Int64]);
        let ctor = ConstructorInfo::new(ty, vec![DataType::Int64]).build();
        assert!(Expr::construct_with_members(ctor, vec![Expr::constant(1i64)], vec![]).is_err());
    }
}
