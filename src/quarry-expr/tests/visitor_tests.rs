//! Integration tests for the visitor core and substitution visitors.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use common_error::QuarryResult;
use proptest::prelude::*;
use quarry_expr::*;

// =========================================================================
// Tree strategies
// =========================================================================

#[derive(Debug, Clone)]
enum Shape {
    Const(i64),
    Param(usize),
    Add(Box<Shape>, Box<Shape>),
    Mul(Box<Shape>, Box<Shape>),
    Neg(Box<Shape>),
    Cond(Box<Shape>, Box<Shape>, Box<Shape>),
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        (-100i64..100).prop_map(Shape::Const),
        (0usize..2).prop_map(Shape::Param),
    ];
    leaf.prop_recursive(5, 48, 3, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone())
                .prop_map(|(l, r)| Shape::Add(Box::new(l), Box::new(r))),
            (inner.clone(), inner.clone())
                .prop_map(|(l, r)| Shape::Mul(Box::new(l), Box::new(r))),
            inner.clone().prop_map(|e| Shape::Neg(Box::new(e))),
            (inner.clone(), inner.clone(), inner)
                .prop_map(|(t, a, b)| Shape::Cond(Box::new(t), Box::new(a), Box::new(b))),
        ]
    })
}

fn build(shape: &Shape, params: &[Expr]) -> Expr {
    match shape {
        Shape::Const(n) => Expr::constant(*n),
        Shape::Param(i) => params[*i].clone(),
        Shape::Add(l, r) => build(l, params).add_expr(build(r, params)),
        Shape::Mul(l, r) => build(l, params).mul_expr(build(r, params)),
        Shape::Neg(e) => build(e, params).negate(),
        Shape::Cond(t, a, b) => Expr::condition(
            build(t, params).gt(Expr::constant(0i64)),
            build(a, params),
            build(b, params),
        ),
    }
}

fn params() -> Vec<Expr> {
    vec![
        Expr::parameter("x", DataType::Int64),
        Expr::parameter("y", DataType::Int64),
    ]
}

/// Counts occurrences of one node.
struct Occurrences<'a> {
    target: &'a Expr,
    count: usize,
}

impl ExprVisitor for Occurrences<'_> {
    fn visit(&mut self, expr: &Expr) -> QuarryResult<Expr> {
        if expr.ptr_eq(self.target) {
            self.count += 1;
        }
        visitor::dispatch(self, expr)
    }
}

fn occurrences(target: &Expr, tree: &Expr) -> usize {
    let mut counter = Occurrences { target, count: 0 };
    counter.visit(tree).unwrap();
    counter.count
}

// =========================================================================
// Substitution
// =========================================================================

#[test]
fn test_no_descent_into_replacement() {
    let x = Expr::parameter("x", DataType::Int64);
    let replacement = x.clone().add_expr(Expr::constant(1i64));
    let tree = x.clone().mul_expr(x.clone());

    let result = replace(&x, &replacement, &tree).unwrap();

    assert_eq!(result, replacement.clone().mul_expr(replacement.clone()));
    assert_eq!(occurrences(&replacement, &result), 2);
    assert_eq!(occurrences(&x, &result), 2);
}

#[test]
fn test_sub_query_propagation() {
    let x = Expr::parameter("x", DataType::Int64);
    let model = ExpressionQueryModel::shared(
        vec![x.clone().gt(Expr::constant(1i64)), Expr::constant(7i64)],
        DataType::queryable(DataType::Int64),
    );
    let sub_query = Expr::sub_query(model.clone());
    let tree = Expr::condition(x.clone().gt(Expr::constant(0i64)), sub_query.clone(), sub_query.clone());

    let result = replace(&x, &Expr::constant(5i64), &tree).unwrap();

    let ExprNode::Conditional(cond) = result.node() else {
        panic!("expected a conditional");
    };
    assert!(cond.if_true.ptr_eq(&sub_query));
    assert!(cond.if_false.ptr_eq(&sub_query));

    let expressions = model.expressions().unwrap();
    assert_eq!(
        expressions[0],
        Expr::constant(5i64).gt(Expr::constant(1i64))
    );
    assert_eq!(expressions[1], Expr::constant(7i64));
}

#[test]
fn test_shared_model_is_visible_through_every_holder() {
    let x = Expr::parameter("x", DataType::Int64);
    let model = ExpressionQueryModel::shared(vec![x.clone()], DataType::Int64);
    let first = Expr::sub_query(model.clone());
    let second = Expr::sub_query(model.clone());

    let mapping = HashMap::from([(ExprKey::from(&x), Expr::constant(1i64))]);
    replace_many(&mapping, &first).unwrap();

    let node = second.downcast_extension::<SubQueryExpr>().unwrap();
    assert_eq!(node.query_model().result_type(), DataType::Int64);
    assert_eq!(model.expressions().unwrap()[0], Expr::constant(1i64));
}

#[test]
fn test_replace_inside_comparison_mode() {
    let s = Expr::parameter("s", DataType::String);
    let tree = Expr::comparison_mode(s.clone().equal(Expr::constant("a")), true);

    let result = replace(&s, &Expr::constant("b"), &tree).unwrap();

    let node = result.downcast_extension::<ComparisonModeExpr>().unwrap();
    assert!(node.text_compare);
    assert_eq!(node.comparison, Expr::constant("b").equal(Expr::constant("a")));
}

// =========================================================================
// Extension dispatch
// =========================================================================

#[derive(Default)]
struct ModeCollector {
    modes: Vec<bool>,
}

impl ExprVisitor for ModeCollector {
    fn as_comparison_mode_visitor(&mut self) -> Option<&mut dyn ComparisonModeVisitor> {
        Some(self)
    }
}

impl ComparisonModeVisitor for ModeCollector {
    fn visit_comparison_mode(
        &mut self,
        expr: &Expr,
        node: &ComparisonModeExpr,
    ) -> QuarryResult<Expr> {
        self.modes.push(node.text_compare);
        Ok(expr.clone())
    }
}

#[test]
fn test_capability_dispatch() {
    let a = Expr::parameter("a", DataType::String);
    let tree = Expr::comparison_mode(a.clone().equal(Expr::constant("x")), false)
        .and_also(Expr::comparison_mode(a.equal(Expr::constant("y")), true));

    let mut collector = ModeCollector::default();
    let result = collector.visit(&tree).unwrap();

    assert!(result.ptr_eq(&tree));
    assert_eq!(collector.modes, vec![false, true]);
}

/// An irreducible extension node without a capability trait.
#[derive(Debug)]
struct Opaque;

impl ExtensionExpr for Opaque {
    fn tag(&self) -> &'static str {
        "Opaque"
    }

    fn data_type(&self) -> DataType {
        DataType::Int64
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equals(&self, other: &dyn ExtensionExpr) -> bool {
        other.as_any().is::<Self>()
    }
}

#[derive(Default)]
struct UnknownCounter {
    unknown: usize,
}

impl ExprVisitor for UnknownCounter {
    fn visit_unknown(&mut self, expr: &Expr) -> QuarryResult<Expr> {
        self.unknown += 1;
        Ok(expr.clone())
    }
}

#[test]
fn test_irreducible_extension_reaches_unknown_hook() {
    let opaque = Expr::extension(Opaque);
    let tree = opaque.clone().add_expr(Expr::constant(1i64));

    let mut counter = UnknownCounter::default();
    let result = counter.visit(&tree).unwrap();

    assert!(result.ptr_eq(&tree));
    assert_eq!(counter.unknown, 1);
}

#[test]
fn test_sub_query_without_capability_is_left_alone() {
    let x = Expr::parameter("x", DataType::Int64);
    let model = ExpressionQueryModel::shared(vec![x.clone()], DataType::Int64);
    let tree = Expr::sub_query(model.clone() as Arc<dyn QueryModel>);

    let mut counter = UnknownCounter::default();
    let result = counter.visit(&tree).unwrap();

    assert!(result.ptr_eq(&tree));
    assert_eq!(counter.unknown, 0);
    assert!(model.expressions().unwrap()[0].ptr_eq(&x));
}

// =========================================================================
// Properties
// =========================================================================

proptest! {
    #[test]
    fn test_replace_absent_target_shares_tree(shape in arb_shape()) {
        let params = params();
        let tree = build(&shape, &params);
        let absent = Expr::parameter("z", DataType::Int64);

        let result = replace(&absent, &Expr::constant(0i64), &tree).unwrap();
        prop_assert!(result.ptr_eq(&tree));

        let mapping = HashMap::from([(ExprKey::from(&absent), Expr::constant(0i64))]);
        let result = replace_many(&mapping, &tree).unwrap();
        prop_assert!(result.ptr_eq(&tree));
    }

    #[test]
    fn test_replace_removes_every_occurrence(shape in arb_shape()) {
        let params = params();
        let tree = build(&shape, &params);

        let result = replace(&params[0], &Expr::constant(0i64), &tree).unwrap();
        prop_assert_eq!(occurrences(&params[0], &result), 0);
        prop_assert_eq!(
            occurrences(&params[1], &result),
            occurrences(&params[1], &tree)
        );
    }
}
