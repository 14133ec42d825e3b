//! Partial evaluation for Quarry expression trees.
//!
//! Folds every subtree that does not depend on lambda parameters or deferred
//! query sources into a constant, isolating failures raised by host code.

mod evaluatable;
mod filter;
mod interpreter;
mod partial_eval;

pub use evaluatable::{EvaluatableExpressions, EvaluatableTreeFinder};
pub use filter::{DefaultEvaluatableFilter, EvaluatableExpressionFilter};
pub use interpreter::ExprInterpreter;
pub use partial_eval::{evaluate_independent_subtrees, evaluate_independent_subtrees_with_config};
