//! End-to-end normalization tests.

use std::sync::Arc;

use quarry::expr::builtins::{
    nullable_has_value, object_to_string, string_compare_helper, string_length,
    tuple_constructor, tuple_item,
};
use quarry::expr::{
    BinaryOp, ComparisonModeExpr, DataType, EvaluationFailureExpr, MethodCallExpr, MethodInfo,
};
use quarry::*;

/// `new Tuple(p, p.HasValue).Item2` over `p: Nullable<Int64>`, the shape a
/// query chain leaves behind after introducing a transparent identifier.
#[test]
fn test_query_predicate_is_normalized() {
    let nullable = DataType::nullable(DataType::Int64);
    let p = Expr::parameter("p", nullable.clone());
    let items = vec![nullable.clone(), DataType::Bool];
    let carrier = Expr::construct(
        tuple_constructor(items.clone()),
        vec![p.clone(), p.clone().get(nullable_has_value(DataType::Int64))],
    );
    let body = carrier.get(tuple_item(&DataType::Tuple(items), 1).unwrap());
    let predicate = Expr::lambda(vec![p.clone()], body);

    let result = Normalizer::new().normalize(&predicate).unwrap();

    let lambda = result.as_lambda().unwrap();
    assert!(lambda.parameters[0].ptr_eq(&p));
    assert_eq!(lambda.body, p.not_equal(Expr::null(nullable)));
}

#[test]
fn test_string_comparison_with_folded_operand() {
    // s => CompareString(s, "A" + "b", true) < 0
    let s = Expr::parameter("s", DataType::String);
    let call = Expr::call(
        None,
        string_compare_helper(),
        vec![
            s.clone(),
            Expr::constant("A").add_expr(Expr::constant("b")),
            Expr::constant(true),
        ],
    );
    let predicate = Expr::lambda(
        vec![s.clone()],
        Expr::binary(BinaryOp::LessThan, call, Expr::constant(0i64)),
    );

    let result = Normalizer::new().normalize(&predicate).unwrap();

    let quarry::expr::ExprNode::Binary(body) = result.as_lambda().unwrap().body.node() else {
        panic!("expected a comparison");
    };
    let mode = body.left.downcast_extension::<ComparisonModeExpr>().unwrap();
    assert!(mode.text_compare);
    let compare_to = mode.comparison.as_method_call().unwrap();
    assert_eq!(compare_to.method.name, "CompareTo");
    assert_eq!(compare_to.arguments[0], Expr::constant("Ab"));
}

#[test]
fn test_failures_survive_normalization() {
    // x => x + null.ToString().Length
    let x = Expr::parameter("x", DataType::Int64);
    let length = Expr::call(Some(Expr::null(DataType::Any)), object_to_string(), vec![])
        .get(string_length());
    let lambda = Expr::lambda(vec![x.clone()], x.add_expr(length));

    let result = Normalizer::new().normalize(&lambda).unwrap();

    let quarry::expr::ExprNode::Binary(add) = result.as_lambda().unwrap().body.node() else {
        panic!("expected an addition");
    };
    let failure = add
        .right
        .downcast_extension::<EvaluationFailureExpr>()
        .unwrap();
    assert!(matches!(failure.error.as_ref(), QuarryError::NullReference(_)));
}

struct KeepProviderCalls;

impl EvaluatableExpressionFilter for KeepProviderCalls {
    fn is_evaluatable_method_call(&self, node: &MethodCallExpr) -> bool {
        node.method.declaring_type != DataType::object("Sql")
    }
}

#[test]
fn test_custom_filter_is_honored() {
    let now = MethodInfo::static_method(DataType::object("Sql"), "Now", vec![], DataType::Int64)
        .with_body(|_, _| Ok(0i64.into()))
        .build();
    let call = Expr::call(None, now, vec![]);

    let folded = Normalizer::new().normalize(&call).unwrap();
    assert_eq!(folded, Expr::constant(0i64));

    let kept = Normalizer::new()
        .with_filter(Arc::new(KeepProviderCalls))
        .normalize(&call)
        .unwrap();
    assert!(kept.ptr_eq(&call));
}

#[test]
fn test_stages_follow_configuration() {
    let p = Expr::parameter("p", DataType::Int64);
    let lambda = Expr::lambda(
        vec![p.clone()],
        p.add_expr(Expr::constant(2i64).mul_expr(Expr::constant(3i64))),
    );
    let x = Expr::parameter("x", DataType::Int64);
    let tree = Expr::invoke(lambda, vec![x.clone()]);

    let fold_only = NormalizationConfig::default().with_transformations(false);
    let folded = Normalizer::new().with_config(fold_only).normalize(&tree).unwrap();
    assert_eq!(folded.kind(), ExprKind::Invocation);

    let transform_only = NormalizationConfig::default().with_partial_evaluation(false);
    let inlined = Normalizer::new()
        .with_config(transform_only)
        .normalize(&tree)
        .unwrap();
    assert_eq!(
        inlined,
        x.clone()
            .add_expr(Expr::constant(2i64).mul_expr(Expr::constant(3i64)))
    );

    let everything = Normalizer::new().normalize(&tree).unwrap();
    assert_eq!(everything, x.add_expr(Expr::constant(6i64)));
}

#[test]
fn test_config_from_json() {
    let json = r#"{ "normalization": { "apply_transformations": false } }"#;
    let config: QuarryConfig = serde_json::from_str(json).unwrap();

    assert!(!config.normalization.apply_transformations);
    assert!(config.normalization.evaluate_independent_subtrees);
    assert!(config.normalization.catch_host_panics);

    let normalizer = Normalizer::from_config(&config);
    assert_eq!(normalizer.config(), &config.normalization);

    let round_trip: QuarryConfig =
        serde_json::from_str(&serde_json::to_string(&config).unwrap()).unwrap();
    assert_eq!(round_trip, config);
}
