//! Rule-based rewriting of Quarry expression trees.
//!
//! - [`transform`] runs a [`TransformationProvider`]'s rules over a tree,
//!   bottom-up, until every node is in normal form.
//! - [`ExpressionTransformerRegistry`] is the default provider, dispatching
//!   rules by node kind; [`ExpressionTransformerRegistry::create_default`]
//!   holds the built-in [`rules`].
//! - [`remove_transparent_identifiers`] resolves member reads of
//!   compiler-introduced carrier objects.

mod registry;
pub mod rules;
mod transformer;
mod transparent_identifier;

pub use registry::{transform_with_defaults, ExpressionTransformerRegistry};
pub use transformer::{transform, TransformationProvider, TransformingVisitor};
pub use transparent_identifier::remove_transparent_identifiers;
