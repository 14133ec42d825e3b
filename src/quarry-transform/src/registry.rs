//! Rule provider that dispatches on node kind.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use common_error::QuarryResult;
use quarry_expr::{Expr, ExprKind, Transformation};

use crate::rules::{
    AttributeEvaluatingTransformer, InvocationOfLambdaTransformer, NullableValueTransformer,
    StringCompareTransformer, TupleNewTransformer,
};
use crate::transformer::TransformationProvider;

/// Registers rules per node kind and returns them in registration order.
///
/// Rules registered without kinds apply to every node, after the rules
/// registered for the node's kind.
#[derive(Default)]
pub struct ExpressionTransformerRegistry {
    by_kind: HashMap<ExprKind, Vec<Transformation>>,
    generic: Vec<Transformation>,
}

impl ExpressionTransformerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in rules.
    pub fn create_default() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(AttributeEvaluatingTransformer));
        registry.register(Arc::new(InvocationOfLambdaTransformer));
        registry.register(Arc::new(TupleNewTransformer));
        registry.register(Arc::new(NullableValueTransformer));
        registry.register(Arc::new(StringCompareTransformer));
        registry
    }

    /// Register a rule for the kinds it declares.
    pub fn register(&mut self, transformation: Transformation) {
        let kinds = transformation.supported_kinds();
        if kinds.is_empty() {
            self.generic.push(transformation);
            return;
        }

        for kind in kinds {
            self.register_for(kind, transformation.clone());
        }
    }

    /// Register a rule for one kind, whatever kinds it declares.
    pub fn register_for(&mut self, kind: ExprKind, transformation: Transformation) {
        self.by_kind.entry(kind).or_default().push(transformation);
    }

    /// Rules registered for `kind`, excluding rules that apply to every kind.
    pub fn transformations_for(&self, kind: ExprKind) -> &[Transformation] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of registrations across all kinds.
    pub fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum::<usize>() + self.generic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TransformationProvider for ExpressionTransformerRegistry {
    fn get_transformations(&self, expr: &Expr) -> Vec<Transformation> {
        self.transformations_for(expr.kind())
            .iter()
            .chain(&self.generic)
            .cloned()
            .collect()
    }
}

impl fmt::Debug for ExpressionTransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds = self
            .by_kind
            .iter()
            .map(|(kind, rules)| {
                let names = rules.iter().map(|r| r.name()).collect::<Vec<_>>();
                format!("{kind:?}: {names:?}")
            })
            .collect::<Vec<_>>();
        kinds.sort();

        f.debug_struct("ExpressionTransformerRegistry")
            .field("by_kind", &kinds)
            .field("generic", &self.generic.len())
            .finish()
    }
}

/// Convenience for providers composed from a fixed list.
impl TransformationProvider for Vec<Transformation> {
    fn get_transformations(&self, _expr: &Expr) -> Vec<Transformation> {
        self.clone()
    }
}

/// Transform `tree` with the built-in rules.
pub fn transform_with_defaults(tree: &Expr) -> QuarryResult<Expr> {
    crate::transformer::transform(tree, &ExpressionTransformerRegistry::create_default())
}
