/// Path utilities for validation and normalization
///
/// All functions are **pure**: given same input, always produce same output
/// with no side effects.
///
/// Unlike file-system routers, a *single* trailing slash is preserved here:
/// trailing slashes are significant routing state when an application opts
/// out of trailing-slash equivalence.

use std::borrow::Cow;

/// Validates if a path is in canonical form
///
/// # Rules
///
/// - Must start with `/`
/// - Must not contain `//` or `\`
/// - Must not be empty
///
/// # Examples
///
/// ```
/// use skiff_router::path::is_canonical_path;
///
/// assert!(is_canonical_path("/"));
/// assert!(is_canonical_path("/about"));
/// assert!(is_canonical_path("/about/")); // Trailing slash is significant
///
/// assert!(!is_canonical_path(""));
/// assert!(!is_canonical_path("about")); // Missing leading /
/// assert!(!is_canonical_path("/about//page")); // Double //
/// assert!(!is_canonical_path("/about\\page")); // Backslash
/// ```
pub fn is_canonical_path(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }

    if !path.starts_with('/') {
        return false;
    }

    !path.contains("//") && !path.contains('\\')
}

/// Normalize a path to canonical form
///
/// Zero-copy: returns `Cow::Borrowed` when the input is already canonical,
/// a single allocation otherwise.
///
/// # Handles
///
/// - Missing leading slash: `about` → `/about`
/// - Double slashes: `/path//to` → `/path/to`
/// - Backslashes: `\path\to` → `/path/to`
/// - A single trailing slash is **kept**: `/path/` → `/path/`
///
/// # Examples
///
/// ```
/// use skiff_router::path::normalize_path;
/// use std::borrow::Cow;
///
/// // Canonical paths: zero allocations
/// let path = normalize_path("/about");
/// assert!(matches!(path, Cow::Borrowed("/about")));
///
/// let path = normalize_path("/path//to///page");
/// assert_eq!(path, "/path/to/page");
///
/// let path = normalize_path("/hello/");
/// assert_eq!(path, "/hello/");
/// ```
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_canonical_path(path) {
        return Cow::Borrowed(path);
    }

    let replaced = path.replace('\\', "/");
    let had_trailing_slash = replaced.len() > 1 && replaced.ends_with('/');

    let mut normalized = String::with_capacity(replaced.len() + 1);
    normalized.push('/');
    for segment in replaced.split('/').filter(|s| !s.is_empty()) {
        if normalized.len() > 1 {
            normalized.push('/');
        }
        normalized.push_str(segment);
    }

    if had_trailing_slash && normalized.len() > 1 {
        normalized.push('/');
    }

    Cow::Owned(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_paths() {
        assert!(is_canonical_path("/"));
        assert!(is_canonical_path("/about"));
        assert!(is_canonical_path("/users/123"));
        assert!(is_canonical_path("/hello/"));
    }

    #[test]
    fn test_non_canonical_paths() {
        assert!(!is_canonical_path(""));
        assert!(!is_canonical_path("about"));
        assert!(!is_canonical_path("/a//b"));
        assert!(!is_canonical_path("/a\\b"));
    }

    #[test]
    fn test_normalize_zero_copy() {
        assert!(matches!(normalize_path("/about"), Cow::Borrowed("/about")));
    }

    #[test]
    fn test_normalize_double_slashes() {
        assert_eq!(normalize_path("/path//to///page"), "/path/to/page");
    }

    #[test]
    fn test_normalize_backslashes() {
        assert_eq!(normalize_path("\\users\\123"), "/users/123");
    }

    #[test]
    fn test_normalize_missing_leading_slash() {
        assert_eq!(normalize_path("users/123"), "/users/123");
    }

    #[test]
    fn test_normalize_keeps_single_trailing_slash() {
        assert_eq!(normalize_path("/hello//"), "/hello/");
        assert_eq!(normalize_path("hello/"), "/hello/");
    }

    #[test]
    fn test_normalize_root() {
        assert_eq!(normalize_path("//"), "/");
        assert_eq!(normalize_path(""), "/");
    }
}
