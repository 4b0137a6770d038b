/// Segment classification for route patterns
///
/// Pure functional parsing of path patterns into typed segments.
/// All functions are **pure**: same input → same output, no side effects.

/// Represents different types of pattern segments
///
/// Functional sum type for pattern matching path segments.
///
/// # Examples
///
/// ```
/// use skiff_router::segment::{classify_segment, Segment};
///
/// // Static segment
/// let seg = classify_segment("users");
/// assert!(matches!(seg, Segment::Static(_)));
///
/// // Named parameter
/// let seg = classify_segment(":id");
/// assert!(matches!(seg, Segment::Param(_)));
///
/// // Splat (wildcard remainder)
/// let seg = classify_segment("*");
/// assert!(matches!(seg, Segment::Splat));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Static text segment
    Static(String),
    /// Named parameter: `:id` binds one non-empty path segment
    Param(String),
    /// Splat: `*` consumes the remainder of the path
    Splat,
}

/// Classifies a segment into a pattern type (pure function)
///
/// # Parsing Rules (evaluated in order)
///
/// 1. **Splat**: `*`
/// 2. **Param**: `:name` (name lowercased; matching is name-keyed)
/// 3. **Static**: any other text
///
/// Parameter names are lowercased at classification time so that
/// `:userId` and `:userid` extract under the same key.
pub fn classify_segment(segment: &str) -> Segment {
    if segment == "*" {
        return Segment::Splat;
    }

    match segment.strip_prefix(':') {
        Some(name) => Segment::Param(name.to_lowercase()),
        None => Segment::Static(segment.to_string()),
    }
}
