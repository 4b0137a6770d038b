//! # Skiff Router
//!
//! A zero-dependency path-pattern matching library with support for:
//! - Static paths (`/about`)
//! - Named parameters (`/users/:id`)
//! - Splat (wildcard remainder) patterns (`/files/*`)
//! - Optional trailing-slash equivalence (`/hello` ≈ `/hello/`)
//!
//! Patterns are compiled once at registration time into typed segments;
//! matching is a single allocation-light segment walk. Captured parameter
//! values are returned **raw** — percent-decoding is the caller's concern,
//! which keeps this crate free of runtime dependencies.
//!
//! ## Trailing slashes
//!
//! Matching takes an `ignore_trailing_slashes` flag. When true (the usual
//! framework default), a path and its single-trailing-slash-stripped form
//! are equivalent. When false, a slash mismatch between pattern and path is
//! an immediate non-match, so `/hello` and `/hello/` are distinct routes.
//!
//! ## Example
//!
//! ```
//! use skiff_router::PathPattern;
//!
//! let pattern = PathPattern::compile("/users/:id").unwrap();
//!
//! let params = pattern.matches("/users/123", true).unwrap();
//! assert_eq!(params.get("id"), Some("123"));
//!
//! assert!(pattern.matches("/users", true).is_none());
//! assert!(pattern.matches("/users/123/posts", true).is_none());
//! ```

use std::collections::HashMap;
use std::fmt;

pub mod path;
pub mod segment;

pub use path::{is_canonical_path, normalize_path};
pub use segment::{classify_segment, Segment};

// ============================================================================
// Errors
// ============================================================================

/// Invalid route pattern, fatal at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Pattern string was empty
    Empty,
    /// A `:param` segment had no name
    EmptyParamName,
    /// The same parameter name appeared twice
    DuplicateParamName(String),
    /// A `*` segment appeared before the final position
    InteriorSplat,
    /// More than one `*` segment
    MultipleSplats,
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::Empty => write!(f, "pattern must not be empty"),
            PatternError::EmptyParamName => write!(f, "parameter segment ':' has no name"),
            PatternError::DuplicateParamName(name) => {
                write!(f, "parameter name '{}' appears more than once", name)
            }
            PatternError::InteriorSplat => {
                write!(f, "splat segment '*' is only allowed in the final position")
            }
            PatternError::MultipleSplats => write!(f, "pattern has more than one splat segment"),
        }
    }
}

impl std::error::Error for PatternError {}

// ============================================================================
// Core Types
// ============================================================================

/// Parameters extracted from a matched path.
///
/// Named parameters are keyed by their (lowercased) pattern name; the splat
/// capture, if any, holds the remainder of the path as a single value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: HashMap<String, String>,
    splat: Option<String>,
}

impl PathParams {
    /// Get a named parameter value (name is matched case-insensitively).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(&name.to_lowercase()).map(String::as_str)
    }

    /// The splat capture, if the pattern ended in `*`.
    pub fn splat(&self) -> Option<&str> {
        self.splat.as_deref()
    }

    /// True if no parameters and no splat were captured.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.splat.is_none()
    }

    /// All named parameters as a map.
    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Consume into the underlying map and splat.
    pub fn into_parts(self) -> (HashMap<String, String>, Option<String>) {
        (self.params, self.splat)
    }
}

/// A compiled route path pattern.
///
/// Segment count and parameter names are fixed after compilation.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
    has_splat: bool,
    param_names: Vec<String>,
}

impl PathPattern {
    /// Compiles a path string into a pattern.
    ///
    /// The pattern is normalized first (`//` collapse, backslash
    /// conversion); a single trailing slash is preserved because it is
    /// significant when trailing-slash equivalence is disabled. The bare
    /// pattern `"*"` matches every path.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] for empty patterns, unnamed parameters,
    /// duplicate parameter names, and non-final splats.
    pub fn compile(pattern: &str) -> Result<PathPattern, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }

        // Bare "*" matches everything, including the root path.
        if pattern == "*" {
            return Ok(PathPattern {
                raw: "*".to_string(),
                segments: vec![Segment::Splat],
                has_splat: true,
                param_names: Vec::new(),
            });
        }

        let raw = normalize_path(pattern).into_owned();

        let segments: Vec<Segment> = raw
            .split('/')
            .filter(|s| !s.is_empty())
            .map(classify_segment)
            .collect();

        let mut param_names = Vec::new();
        let mut splat_count = 0;
        for (idx, seg) in segments.iter().enumerate() {
            match seg {
                Segment::Param(name) => {
                    if name.is_empty() {
                        return Err(PatternError::EmptyParamName);
                    }
                    if param_names.contains(name) {
                        return Err(PatternError::DuplicateParamName(name.clone()));
                    }
                    param_names.push(name.clone());
                }
                Segment::Splat => {
                    if idx != segments.len() - 1 {
                        return Err(PatternError::InteriorSplat);
                    }
                    splat_count += 1;
                }
                Segment::Static(_) => {}
            }
        }
        if splat_count > 1 {
            return Err(PatternError::MultipleSplats);
        }

        Ok(PathPattern {
            raw,
            segments,
            has_splat: splat_count == 1,
            param_names,
        })
    }

    /// The normalized pattern string this was compiled from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Names of the pattern's parameters, in order of appearance.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// True if the pattern ends in a splat segment.
    pub fn has_splat(&self) -> bool {
        self.has_splat
    }

    /// Matches an actual request path against this pattern.
    ///
    /// Returns the extracted parameters on success, `None` on mismatch.
    /// Captured values are raw (not percent-decoded).
    pub fn matches(&self, path: &str, ignore_trailing_slashes: bool) -> Option<PathParams> {
        // Bare "*" matches any path; the splat captures everything.
        if self.raw == "*" {
            return Some(PathParams {
                params: HashMap::new(),
                splat: Some(path.trim_matches('/').to_string()),
            });
        }

        // Exact match fast path for fully static patterns.
        if !self.has_splat && self.param_names.is_empty() && self.raw == path {
            return Some(PathParams::default());
        }

        // With equivalence disabled, a slash mismatch is an immediate miss.
        if !ignore_trailing_slashes && slash_mismatch(&self.raw, path) {
            return None;
        }

        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        self.match_segments(&path_segments)
    }

    fn match_segments(&self, path_segments: &[&str]) -> Option<PathParams> {
        if !self.has_splat && self.segments.len() != path_segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        let mut splat = None;

        for (idx, seg) in self.segments.iter().enumerate() {
            match seg {
                Segment::Splat => {
                    // Final segment; consumes zero or more remaining segments.
                    let remainder = if idx < path_segments.len() {
                        path_segments[idx..].join("/")
                    } else {
                        String::new()
                    };
                    splat = Some(remainder);
                    return Some(PathParams { params, splat });
                }
                Segment::Param(name) => {
                    let value = path_segments.get(idx)?;
                    params.insert(name.clone(), (*value).to_string());
                }
                Segment::Static(text) => {
                    if path_segments.get(idx) != Some(&text.as_str()) {
                        return None;
                    }
                }
            }
        }

        Some(PathParams { params, splat })
    }
}

/// True when exactly one of the two paths carries a trailing slash.
fn slash_mismatch(a: &str, b: &str) -> bool {
    let a_slash = a.len() > 1 && a.ends_with('/');
    let b_slash = b.len() > 1 && b.ends_with('/');
    a_slash != b_slash
}
