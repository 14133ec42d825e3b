//! Desugars `Value` and `HasValue` reads on nullable wrappers.

use common_error::QuarryResult;
use quarry_expr::{Expr, ExprKind, ExprNode, ExpressionTransformer};

/// Rewrites `x.Value` to `Convert(x, T)` and `x.HasValue` to `x != null`
/// for `x` of type `Nullable(T)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullableValueTransformer;

impl ExpressionTransformer for NullableValueTransformer {
    fn name(&self) -> &'static str {
        "NullableValueTransformer"
    }

    fn supported_kinds(&self) -> Vec<ExprKind> {
        vec![ExprKind::MemberAccess]
    }

    fn transform(&self, expr: &Expr) -> QuarryResult<Expr> {
        let ExprNode::MemberAccess(node) = expr.node() else {
            return Ok(expr.clone());
        };
        let Some(object) = &node.object else {
            return Ok(expr.clone());
        };

        let member = &node.member;
        if member.declaring_type.nullable_inner().is_none() {
            return Ok(expr.clone());
        }

        match member.name.as_str() {
            "Value" => Ok(Expr::convert(object.clone(), member.data_type.clone())),
            "HasValue" => Ok(object
                .clone()
                .not_equal(Expr::null(member.declaring_type.clone()))),
            _ => Ok(expr.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use quarry_expr::builtins::{nullable_has_value, nullable_value};
    use quarry_expr::{DataType, MemberInfo};

    use super::*;

    fn nullable_param() -> Expr {
        Expr::parameter("x", DataType::nullable(DataType::Int64))
    }

    #[test]
    fn test_value_becomes_conversion() {
        let x = nullable_param();
        let read = x.clone().get(nullable_value(DataType::Int64));

        let result = NullableValueTransformer.transform(&read).unwrap();
        assert_eq!(result, Expr::convert(x, DataType::Int64));
    }

    #[test]
    fn test_has_value_becomes_null_check() {
        let x = nullable_param();
        let read = x.clone().get(nullable_has_value(DataType::Int64));

        let result = NullableValueTransformer.transform(&read).unwrap();
        assert_eq!(
            result,
            x.not_equal(Expr::null(DataType::nullable(DataType::Int64)))
        );
        assert_eq!(result.data_type(), DataType::Bool);
    }

    #[test]
    fn test_other_members_are_unchanged() {
        let person = DataType::object("Person");
        let value = MemberInfo::field(person.clone(), "Value", DataType::Int64).build();
        let read = Expr::parameter("p", person).get(value);

        let result = NullableValueTransformer.transform(&read).unwrap();
        assert!(result.ptr_eq(&read));
    }
}
