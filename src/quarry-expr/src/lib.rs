//! Expression-tree node model for Quarry.
//!
//! Provides the immutable, structurally shared node model, extension nodes,
//! the visitor core every normalization pass is built on, and exact-match
//! node substitution.

pub mod builtins;
mod expr;
mod extension;
mod host;
mod query_model;
mod replace;
mod transformer;
mod types;
pub mod visitor;

pub use expr::*;
pub use extension::{
    ComparisonModeExpr, ComparisonModeVisitor, EvaluationFailureExpr, EvaluationFailureVisitor,
    ExtensionExpr, SubQueryExpr, SubQueryVisitor,
};
pub use host::{
    Constructor, ConstructorInfo, HostFn, Member, MemberInfo, Method, MethodInfo,
};
pub use query_model::{ExpressionQueryModel, QueryModel};
pub use replace::{replace, replace_many, MultiReplacingVisitor, ReplacingVisitor};
pub use transformer::{
    ExpressionTransformer, FnTransformer, Transformation, TransformerFactory,
};
pub use types::{Callable, DataType, FnCallable, QuerySource, Record, Value};
pub use visitor::{AsExprVisitor, ExprVisitor};
