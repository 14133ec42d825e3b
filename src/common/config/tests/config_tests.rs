//! Unit tests for common-config crate

use common_config::{NormalizationConfig, QuarryConfig};

#[test]
fn test_quarry_config_default() {
    let config = QuarryConfig::default();

    assert!(config.normalization.evaluate_independent_subtrees);
    assert!(config.normalization.apply_transformations);
    assert!(config.normalization.remove_transparent_identifiers);
    assert!(config.normalization.catch_host_panics);
}

#[test]
fn test_normalization_config_builders() {
    let config = NormalizationConfig::default()
        .with_partial_evaluation(false)
        .with_transformations(false)
        .with_transparent_identifier_removal(false)
        .with_catch_host_panics(false);

    assert!(!config.evaluate_independent_subtrees);
    assert!(!config.apply_transformations);
    assert!(!config.remove_transparent_identifiers);
    assert!(!config.catch_host_panics);
}

#[test]
fn test_quarry_config_serialization() {
    let mut config = QuarryConfig::default();
    config.normalization.apply_transformations = false;
    config.normalization.catch_host_panics = false;

    // Serialize to JSON
    let json = serde_json::to_string(&config).unwrap();

    // Deserialize from JSON
    let deserialized: QuarryConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, config);
}

#[test]
fn test_partial_json_uses_defaults() {
    let json = r#"{ "normalization": { "apply_transformations": false } }"#;
    let config: QuarryConfig = serde_json::from_str(json).unwrap();

    assert!(!config.normalization.apply_transformations);
    assert!(config.normalization.evaluate_independent_subtrees);
    assert!(config.normalization.remove_transparent_identifiers);
}
