use crate::{ResourceLimits, TermsError};

#[test]
fn test_limits_from_json_keep_defaults() {
    let limits = ResourceLimits::from_json(r#"{"max_query_patterns": 4}"#).unwrap();
    assert_eq!(limits.max_query_patterns, 4);
    assert_eq!(limits.max_nesting_depth, ResourceLimits::default().max_nesting_depth);
    assert_eq!(limits.max_solutions, ResourceLimits::default().max_solutions);
}

#[test]
fn test_limits_from_invalid_json() {
    let result = ResourceLimits::from_json(r#"{"max_query_patterns": "many"}"#);
    assert!(matches!(result, Err(TermsError::Engine(_))));
}
