//! Built-in rewrite rules.
//!
//! Each rule returns its input handle when it does not apply, so the
//! pipeline can tell "no change" by identity.

mod attribute;
mod compare_string;
mod invocation;
mod nullable;
mod tuple_new;

pub use attribute::AttributeEvaluatingTransformer;
pub use compare_string::StringCompareTransformer;
pub use invocation::InvocationOfLambdaTransformer;
pub use nullable::NullableValueTransformer;
pub use tuple_new::TupleNewTransformer;
