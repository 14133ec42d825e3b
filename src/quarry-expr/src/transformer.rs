//! Rewrite-rule contracts shared by host metadata and the transformation
//! pipeline.

use std::fmt;
use std::sync::Arc;

use common_error::QuarryResult;

use crate::{Expr, ExprKind};

/// A rewrite rule applied by the transformation pipeline.
///
/// A rule returns its input node unchanged (the same [`Expr`] handle) when it
/// does not apply. Returning any other node counts as a change and makes the
/// pipeline re-descend into the result.
pub trait ExpressionTransformer: Send + Sync {
    /// Get the name of this rule.
    fn name(&self) -> &'static str;

    /// Node kinds this rule is registered for by default.
    fn supported_kinds(&self) -> Vec<ExprKind> {
        Vec::new()
    }

    /// Apply this rule to a node.
    fn transform(&self, expr: &Expr) -> QuarryResult<Expr>;
}

/// Shared handle to a rewrite rule.
pub type Transformation = Arc<dyn ExpressionTransformer>;

type TransformFn = dyn Fn(&Expr) -> QuarryResult<Expr> + Send + Sync;

/// An [`ExpressionTransformer`] backed by a closure.
pub struct FnTransformer {
    name: &'static str,
    kinds: Vec<ExprKind>,
    func: Box<TransformFn>,
}

impl FnTransformer {
    /// Wrap a closure as a rule registered for `kinds`.
    pub fn new<F>(name: &'static str, kinds: Vec<ExprKind>, func: F) -> Self
    where
        F: Fn(&Expr) -> QuarryResult<Expr> + Send + Sync + 'static,
    {
        Self {
            name,
            kinds,
            func: Box::new(func),
        }
    }
}

impl ExpressionTransformer for FnTransformer {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supported_kinds(&self) -> Vec<ExprKind> {
        self.kinds.clone()
    }

    fn transform(&self, expr: &Expr) -> QuarryResult<Expr> {
        (self.func)(expr)
    }
}

/// A rule factory declared on a method or property getter.
///
/// At most one factory may be declared per callee; the attribute-directed
/// rule rejects callees with more than one.
pub trait TransformerFactory: fmt::Debug + Send + Sync {
    /// Produce the rule for a call to the declaring method.
    ///
    /// Returning `None` is a configuration error.
    fn create_transformer(&self, call: &Expr) -> Option<Transformation>;
}
