//! Integration tests for skiff-router
//!
//! Tests are organized by feature area and cover:
//! - Static matching
//! - Named parameters
//! - Splat (wildcard remainder) patterns
//! - Trailing-slash equivalence in both modes
//! - Pattern compilation errors

use pretty_assertions::assert_eq;
use rstest::rstest;
use skiff_router::{PathPattern, PatternError};

#[test]
fn test_static_match() {
    let pattern = PathPattern::compile("/about").unwrap();
    assert!(pattern.matches("/about", true).is_some());
    assert!(pattern.matches("/other", true).is_none());
    assert!(pattern.matches("/about/extra", true).is_none());
}

#[test]
fn test_param_extraction() {
    let pattern = PathPattern::compile("/users/:id").unwrap();
    let params = pattern.matches("/users/123", true).unwrap();
    assert_eq!(params.get("id"), Some("123"));
    assert_eq!(params.splat(), None);
}

#[test]
fn test_param_binds_single_segment_only() {
    let pattern = PathPattern::compile("/users/:id").unwrap();
    assert!(pattern.matches("/users", true).is_none());
    assert!(pattern.matches("/users/1/posts", true).is_none());
}

#[test]
fn test_multiple_params() {
    let pattern = PathPattern::compile("/users/:uid/posts/:pid").unwrap();
    let params = pattern.matches("/users/7/posts/42", true).unwrap();
    assert_eq!(params.get("uid"), Some("7"));
    assert_eq!(params.get("pid"), Some("42"));
}

#[test]
fn test_param_names_case_insensitive_lookup() {
    let pattern = PathPattern::compile("/users/:userId").unwrap();
    let params = pattern.matches("/users/9", true).unwrap();
    assert_eq!(params.get("userId"), Some("9"));
    assert_eq!(params.get("userid"), Some("9"));
    assert_eq!(params.get("USERID"), Some("9"));
}

#[test]
fn test_splat_captures_remainder() {
    let pattern = PathPattern::compile("/files/*").unwrap();
    let params = pattern.matches("/files/docs/2024/report.pdf", true).unwrap();
    assert_eq!(params.splat(), Some("docs/2024/report.pdf"));
}

#[test]
fn test_splat_matches_zero_segments() {
    let pattern = PathPattern::compile("/files/*").unwrap();
    let params = pattern.matches("/files", true).unwrap();
    assert_eq!(params.splat(), Some(""));
}

#[test]
fn test_bare_splat_matches_everything() {
    let pattern = PathPattern::compile("*").unwrap();
    assert!(pattern.matches("/", true).is_some());
    assert!(pattern.matches("/anything/at/all", true).is_some());
    assert!(pattern.matches("/anything/", false).is_some());
}

#[test]
fn test_param_and_splat_combined() {
    let pattern = PathPattern::compile("/repos/:name/*").unwrap();
    let params = pattern.matches("/repos/skiff/src/lib.rs", true).unwrap();
    assert_eq!(params.get("name"), Some("skiff"));
    assert_eq!(params.splat(), Some("src/lib.rs"));
}

// ----------------------------------------------------------------------------
// Trailing slashes
// ----------------------------------------------------------------------------

#[rstest]
#[case("/hello", "/hello")]
#[case("/hello", "/hello/")]
#[case("/hello/", "/hello")]
#[case("/hello/", "/hello/")]
fn test_trailing_slash_equivalence_when_ignored(#[case] pattern: &str, #[case] path: &str) {
    let pattern = PathPattern::compile(pattern).unwrap();
    assert!(pattern.matches(path, true).is_some());
}

#[rstest]
#[case("/hello", "/hello", true)]
#[case("/hello", "/hello/", false)]
#[case("/hello/", "/hello", false)]
#[case("/hello/", "/hello/", true)]
fn test_trailing_slash_strict_mode(
    #[case] pattern: &str,
    #[case] path: &str,
    #[case] expected: bool,
) {
    let pattern = PathPattern::compile(pattern).unwrap();
    assert_eq!(pattern.matches(path, false).is_some(), expected);
}

#[test]
fn test_trailing_slash_strict_mode_with_params() {
    let pattern = PathPattern::compile("/users/:id").unwrap();
    assert!(pattern.matches("/users/5", false).is_some());
    assert!(pattern.matches("/users/5/", false).is_none());
}

// ----------------------------------------------------------------------------
// Compilation errors
// ----------------------------------------------------------------------------

#[rstest]
#[case("", PatternError::Empty)]
#[case("/users/:", PatternError::EmptyParamName)]
#[case("/:id/:id", PatternError::DuplicateParamName("id".to_string()))]
#[case("/a/*/b", PatternError::InteriorSplat)]
fn test_compile_errors(#[case] pattern: &str, #[case] expected: PatternError) {
    assert_eq!(PathPattern::compile(pattern).unwrap_err(), expected);
}

#[test]
fn test_compile_normalizes_pattern() {
    let pattern = PathPattern::compile("users//:id").unwrap();
    assert_eq!(pattern.raw(), "/users/:id");
    assert!(pattern.matches("/users/3", true).is_some());
}
