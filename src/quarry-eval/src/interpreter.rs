//! Tree-walking interpreter used to execute evaluatable subtrees.

use std::fmt;
use std::sync::Arc;

use common_error::{type_err, QuarryError, QuarryResult};
use quarry_expr::*;

/// Parameter bindings of the enclosing lambdas, innermost last.
#[derive(Debug, Clone, Default)]
struct Scope {
    bindings: Vec<(Expr, Value)>,
}

impl Scope {
    fn lookup(&self, parameter: &Expr) -> Option<&Value> {
        self.bindings
            .iter()
            .rev()
            .find(|(p, _)| p.ptr_eq(parameter))
            .map(|(_, v)| v)
    }

    fn extended(&self, parameters: &[Expr], args: &[Value]) -> Self {
        let mut bindings = self.bindings.clone();
        bindings.extend(parameters.iter().cloned().zip(args.iter().cloned()));
        Self { bindings }
    }
}

/// Executes expression trees against host metadata.
///
/// Integer arithmetic is checked. Arithmetic and comparisons on a null
/// operand are lifted: arithmetic yields null and relational comparisons
/// yield false.
#[derive(Debug, Default)]
pub struct ExprInterpreter {
    scope: Scope,
}

impl ExprInterpreter {
    /// Create an interpreter with no parameters in scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate an expression to a value.
    pub fn evaluate(&self, expr: &Expr) -> QuarryResult<Value> {
        match expr.node() {
            ExprNode::Constant(c) => Ok(c.value.clone()),

            ExprNode::Parameter(p) => self.scope.lookup(expr).cloned().ok_or_else(|| {
                QuarryError::evaluation(format!("parameter '{}' is not bound", p.name))
            }),

            ExprNode::Lambda(l) => Ok(Value::Function(Arc::new(Closure {
                parameters: l.parameters.clone(),
                body: l.body.clone(),
                data_type: l.data_type.clone(),
                scope: self.scope.clone(),
            }))),

            ExprNode::Unary(u) => {
                let operand = self.evaluate(&u.operand)?;
                eval_unary(u.op, operand, &u.data_type)
            }

            ExprNode::Binary(b) => self.eval_binary(b),

            ExprNode::MemberAccess(m) => {
                let receiver = self.evaluate_opt(m.object.as_ref())?;
                m.member.read(receiver.as_ref())
            }

            ExprNode::MethodCall(c) => {
                let receiver = self.evaluate_opt(c.object.as_ref())?;
                let args = self.evaluate_all(&c.arguments)?;
                c.method.invoke(receiver.as_ref(), &args)
            }

            ExprNode::Invocation(i) => {
                let callee = self.evaluate(&i.callee)?;
                let args = self.evaluate_all(&i.arguments)?;
                match callee {
                    Value::Function(f) => f.call(&args),
                    Value::Null => Err(QuarryError::null_reference("cannot invoke a null delegate")),
                    other => type_err!("cannot invoke a value of type {}", other.data_type()),
                }
            }

            ExprNode::New(n) => {
                let args = self.evaluate_all(&n.arguments)?;
                n.constructor.invoke(&args, n.members.as_deref())
            }

            ExprNode::MemberInit(m) => self.eval_member_init(m),

            ExprNode::ListInit(l) => self.eval_list_init(l),

            ExprNode::Conditional(c) => match self.evaluate(&c.test)? {
                Value::Bool(true) => self.evaluate(&c.if_true),
                Value::Bool(false) => self.evaluate(&c.if_false),
                other => type_err!("condition must be Bool, got {}", other.data_type()),
            },

            ExprNode::TypeIs(t) => {
                let value = self.evaluate(&t.operand)?;
                Ok(Value::Bool(
                    !value.is_null() && t.type_operand.is_assignable_from(&value.data_type()),
                ))
            }

            ExprNode::Extension(ext) => {
                if !ext.can_reduce() {
                    return Err(QuarryError::not_supported(format!(
                        "extension node '{}' cannot be evaluated",
                        ext.tag()
                    )));
                }
                self.evaluate(&expr.reduce_and_check()?)
            }
        }
    }

    fn evaluate_opt(&self, expr: Option<&Expr>) -> QuarryResult<Option<Value>> {
        expr.map(|e| self.evaluate(e)).transpose()
    }

    fn evaluate_all(&self, exprs: &[Expr]) -> QuarryResult<Vec<Value>> {
        exprs.iter().map(|e| self.evaluate(e)).collect()
    }

    fn eval_binary(&self, node: &BinaryExpr) -> QuarryResult<Value> {
        match node.op {
            BinaryOp::AndAlso => match self.evaluate(&node.left)? {
                Value::Bool(false) => Ok(Value::Bool(false)),
                Value::Bool(true) => self.eval_bool(&node.right),
                other => type_err!("&& requires Bool operands, got {}", other.data_type()),
            },

            BinaryOp::OrElse => match self.evaluate(&node.left)? {
                Value::Bool(true) => Ok(Value::Bool(true)),
                Value::Bool(false) => self.eval_bool(&node.right),
                other => type_err!("|| requires Bool operands, got {}", other.data_type()),
            },

            BinaryOp::Coalesce => match self.evaluate(&node.left)? {
                Value::Null => self.evaluate(&node.right),
                value => match &node.conversion {
                    Some(conversion) => match self.evaluate(conversion)? {
                        Value::Function(f) => f.call(&[value]),
                        other => type_err!(
                            "coalesce conversion must be a function, got {}",
                            other.data_type()
                        ),
                    },
                    None => Ok(value),
                },
            },

            op => {
                let left = self.evaluate(&node.left)?;
                let right = self.evaluate(&node.right)?;
                eval_binary_op(op, &left, &right)
            }
        }
    }

    fn eval_bool(&self, expr: &Expr) -> QuarryResult<Value> {
        match self.evaluate(expr)? {
            value @ Value::Bool(_) => Ok(value),
            other => type_err!("expected Bool, got {}", other.data_type()),
        }
    }

    fn eval_member_init(&self, node: &MemberInitExpr) -> QuarryResult<Value> {
        let Value::Record(record) = self.evaluate(&node.new_expr)? else {
            type_err!("object initializers require a record-typed construction");
        };

        let mut record = record.as_ref().clone();
        for binding in &node.bindings {
            let value = self.evaluate(&binding.value)?;
            record = record.with_field(&binding.member.name, value);
        }
        Ok(record.into())
    }

    /// Lists collect initializer arguments directly; other collections go
    /// through their add method, whose body returns the updated collection.
    fn eval_list_init(&self, node: &ListInitExpr) -> QuarryResult<Value> {
        let mut collection = self.evaluate(&node.new_expr)?;
        for init in &node.initializers {
            let args = self.evaluate_all(&init.arguments)?;
            collection = match collection {
                Value::List(mut items) => {
                    items.extend(args);
                    Value::List(items)
                }
                other => init.add_method.invoke(Some(&other), &args)?,
            };
        }
        Ok(collection)
    }
}

/// A lambda evaluated to a value, closing over its enclosing scope.
struct Closure {
    parameters: Vec<Expr>,
    body: Expr,
    data_type: DataType,
    scope: Scope,
}

impl Callable for Closure {
    fn call(&self, args: &[Value]) -> QuarryResult<Value> {
        if args.len() != self.parameters.len() {
            return Err(QuarryError::evaluation(format!(
                "lambda expects {} arguments, got {}",
                self.parameters.len(),
                args.len()
            )));
        }

        let interpreter = ExprInterpreter {
            scope: self.scope.extended(&self.parameters, args),
        };
        interpreter.evaluate(&self.body)
    }

    fn data_type(&self) -> DataType {
        self.data_type.clone()
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("data_type", &self.data_type)
            .finish_non_exhaustive()
    }
}

fn eval_unary(op: UnaryOp, operand: Value, target: &DataType) -> QuarryResult<Value> {
    match (op, operand) {
        (UnaryOp::Convert, value) => convert(value, target),
        (_, Value::Null) => Ok(Value::Null),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Negate, Value::Int64(i)) => i
            .checked_neg()
            .map(Value::Int64)
            .ok_or_else(|| QuarryError::overflow(format!("cannot negate {i}"))),
        (UnaryOp::Negate, Value::Float64(f)) => Ok(Value::Float64(-f)),
        (op, other) => type_err!("cannot apply {op} to {}", other.data_type()),
    }
}

/// Convert `value` to `target`.
fn convert(value: Value, target: &DataType) -> QuarryResult<Value> {
    match (value, target) {
        (Value::Null, target) if target.accepts_null() => Ok(Value::Null),
        (Value::Null, target) => Err(QuarryError::invalid_cast(format!(
            "cannot convert null to {target}"
        ))),
        (value, DataType::Nullable(inner)) => convert(value, inner),
        (Value::Int64(i), DataType::Float64) => Ok(Value::Float64(i as f64)),
        (Value::Float64(f), DataType::Int64) => {
            let truncated = f.trunc();
            if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
                Ok(Value::Int64(truncated as i64))
            } else {
                Err(QuarryError::overflow(format!("{f} does not fit in Int64")))
            }
        }
        (value, target) if target.is_assignable_from(&value.data_type()) => Ok(value),
        (value, target) => Err(QuarryError::invalid_cast(format!(
            "cannot convert {} to {target}",
            value.data_type()
        ))),
    }
}

fn eval_binary_op(op: BinaryOp, left: &Value, right: &Value) -> QuarryResult<Value> {
    if op.is_comparison() {
        return compare(op, left, right).map(Value::Bool);
    }

    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::String(l), r) if op == BinaryOp::Add => Ok(Value::String(format!("{l}{}", text(r)))),
        (l, Value::String(r)) if op == BinaryOp::Add => Ok(Value::String(format!("{}{r}", text(l)))),
        (Value::Int64(l), Value::Int64(r)) => int_arithmetic(op, *l, *r),
        (Value::Int64(l), Value::Float64(r)) => float_arithmetic(op, *l as f64, *r),
        (Value::Float64(l), Value::Int64(r)) => float_arithmetic(op, *l, *r as f64),
        (Value::Float64(l), Value::Float64(r)) => float_arithmetic(op, *l, *r),
        (l, r) => type_err!(
            "cannot apply {op} to {} and {}",
            l.data_type(),
            r.data_type()
        ),
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn int_arithmetic(op: BinaryOp, l: i64, r: i64) -> QuarryResult<Value> {
    let result = match op {
        BinaryOp::Add => l.checked_add(r),
        BinaryOp::Subtract => l.checked_sub(r),
        BinaryOp::Multiply => l.checked_mul(r),
        BinaryOp::Divide | BinaryOp::Modulo if r == 0 => {
            return Err(QuarryError::divide_by_zero(format!("{l} {op} 0")));
        }
        BinaryOp::Divide => l.checked_div(r),
        BinaryOp::Modulo => l.checked_rem(r),
        _ => type_err!("{op} is not an arithmetic operator"),
    };
    result
        .map(Value::Int64)
        .ok_or_else(|| QuarryError::overflow(format!("{l} {op} {r}")))
}

fn float_arithmetic(op: BinaryOp, l: f64, r: f64) -> QuarryResult<Value> {
    let result = match op {
        BinaryOp::Add => l + r,
        BinaryOp::Subtract => l - r,
        BinaryOp::Multiply => l * r,
        BinaryOp::Divide => l / r,
        BinaryOp::Modulo => l % r,
        _ => type_err!("{op} is not an arithmetic operator"),
    };
    Ok(Value::Float64(result))
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> QuarryResult<bool> {
    match op {
        BinaryOp::Equal => Ok(values_equal(left, right)),
        BinaryOp::NotEqual => Ok(!values_equal(left, right)),
        _ if left.is_null() || right.is_null() => Ok(false),
        _ => {
            let Some(ordering) = left.partial_compare(right) else {
                type_err!(
                    "cannot compare {} with {}",
                    left.data_type(),
                    right.data_type()
                );
            };
            Ok(match op {
                BinaryOp::LessThan => ordering.is_lt(),
                BinaryOp::LessThanOrEqual => ordering.is_le(),
                BinaryOp::GreaterThan => ordering.is_gt(),
                _ => ordering.is_ge(),
            })
        }
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match left.partial_compare(right) {
        Some(ordering) => ordering.is_eq(),
        None => left == right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &Expr) -> QuarryResult<Value> {
        ExprInterpreter::new().evaluate(expr)
    }

    #[test]
    fn test_arithmetic() {
        let expr = Expr::constant(4i64)
            .mul_expr(Expr::constant(3i64))
            .add_expr(Expr::constant(1i64));
        assert_eq!(eval(&expr).unwrap(), Value::Int64(13));

        let mixed = Expr::constant(1i64).div_expr(Expr::constant(4.0));
        assert_eq!(eval(&mixed).unwrap(), Value::Float64(0.25));
    }

    #[test]
    fn test_checked_arithmetic() {
        let overflow = Expr::constant(i64::MAX).add_expr(Expr::constant(1i64));
        assert!(matches!(eval(&overflow), Err(QuarryError::Overflow(_))));

        let div = Expr::constant(1i64).div_expr(Expr::constant(0i64));
        assert!(matches!(eval(&div), Err(QuarryError::DivideByZero(_))));
    }

    #[test]
    fn test_short_circuit() {
        let failing = Expr::constant(1i64)
            .div_expr(Expr::constant(0i64))
            .gt(Expr::constant(0i64));
        let expr = Expr::constant(false).and_also(failing);
        assert_eq!(eval(&expr).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_null_lifting() {
        let ty = DataType::nullable(DataType::Int64);
        let sum = Expr::null(ty.clone()).add_expr(Expr::constant(1i64));
        assert_eq!(eval(&sum).unwrap(), Value::Null);

        let cmp = Expr::null(ty.clone()).lt(Expr::constant(1i64));
        assert_eq!(eval(&cmp).unwrap(), Value::Bool(false));

        let coalesce = Expr::null(ty).coalesce(Expr::constant(7i64));
        assert_eq!(eval(&coalesce).unwrap(), Value::Int64(7));
    }

    #[test]
    fn test_lambda_invocation_closes_over_scope() {
        let x = Expr::parameter("x", DataType::Int64);
        let y = Expr::parameter("y", DataType::Int64);
        let inner = Expr::lambda(vec![y.clone()], x.clone().add_expr(y));
        let outer = Expr::lambda(
            vec![x],
            Expr::invoke(inner, vec![Expr::constant(10i64)]),
        );
        let call = Expr::invoke(outer, vec![Expr::constant(5i64)]);

        assert_eq!(eval(&call).unwrap(), Value::Int64(15));
    }

    #[test]
    fn test_unbound_parameter() {
        let x = Expr::parameter("x", DataType::Int64);
        assert!(matches!(eval(&x), Err(QuarryError::EvaluationError(_))));
    }

    #[test]
    fn test_conversions() {
        let narrow = Expr::convert(Expr::constant(2.9), DataType::Int64);
        assert_eq!(eval(&narrow).unwrap(), Value::Int64(2));

        let null_to_int = Expr::convert(Expr::null(DataType::Null), DataType::Int64);
        assert!(matches!(eval(&null_to_int), Err(QuarryError::InvalidCast(_))));

        let bad = Expr::convert(Expr::constant("a"), DataType::Int64);
        assert!(matches!(eval(&bad), Err(QuarryError::InvalidCast(_))));
    }

    #[test]
    fn test_member_init() {
        let person = DataType::object("Person");
        let name = MemberInfo::field(person.clone(), "name", DataType::String).build();
        let ctor = ConstructorInfo::new(person, vec![]).build();
        let init = Expr::member_init(
            Expr::construct(ctor, vec![]),
            vec![MemberBinding::new(name.clone(), Expr::constant("Ada"))],
        )
        .unwrap();

        let value = eval(&Expr::member(Some(init), name)).unwrap();
        assert_eq!(value, Value::from("Ada"));
    }

    #[test]
    fn test_list_init() {
        let list = DataType::list(DataType::Int64);
        let ctor = ConstructorInfo::new(list.clone(), vec![]).build();
        let add = MethodInfo::instance(list, "Add", vec![DataType::Int64], DataType::Any).build();
        let init = Expr::list_init(
            Expr::construct(ctor, vec![]),
            vec![
                ElementInit::new(add.clone(), vec![Expr::constant(1i64)]),
                ElementInit::new(add, vec![Expr::constant(2i64)]),
            ],
        )
        .unwrap();

        assert_eq!(
            eval(&init).unwrap(),
            Value::List(vec![Value::Int64(1), Value::Int64(2)])
        );
    }

    #[test]
    fn test_type_is() {
        let is_string = Expr::type_is(Expr::constant("a"), DataType::String);
        assert_eq!(eval(&is_string).unwrap(), Value::Bool(true));

        let null_is_string = Expr::type_is(Expr::null(DataType::String), DataType::String);
        assert_eq!(eval(&null_is_string).unwrap(), Value::Bool(false));
    }
}
