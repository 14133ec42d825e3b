//! Expression trees.

mod builders;
mod display;
mod node;
mod ops;

pub use node::{
    BinaryExpr, ConditionalExpr, ConstantExpr, ElementInit, Expr, ExprKey, ExprKind, ExprNode,
    InvocationExpr, LambdaExpr, ListInitExpr, MemberBinding, MemberExpr, MemberInitExpr,
    MethodCallExpr, NewExpr, ParameterExpr, TypeIsExpr, UnaryExpr,
};
pub use ops::{BinaryOp, UnaryOp};
