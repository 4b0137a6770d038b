// File: src/routing.rs
// Purpose: Route table - ordered (method, pattern, handler) entries

use axum::http::Method;
use skiff_router::{PathParams, PathPattern};

use crate::error::SkiffError;
use crate::handler::Handler;

/// A registered (method, path pattern, endpoint handler) binding.
///
/// Immutable once registered; owned exclusively by the [`RouteTable`].
pub struct Route {
    method: Method,
    pattern: PathPattern,
    handler: Handler,
}

impl Route {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

/// A matched route plus the parameters extracted from the request path.
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: PathParams,
}

/// Ordered collection of routes.
///
/// Iteration order is registration order and the first matching route for
/// a given method wins — overlapping patterns resolve by declaration
/// order, a deliberate tie-break. Populated during the single-threaded
/// configuration phase, read-only and lock-free thereafter.
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. The pattern is compiled eagerly, so invalid
    /// patterns are fatal at startup rather than at request time.
    pub fn register(
        &mut self,
        method: Method,
        pattern: &str,
        handler: Handler,
    ) -> Result<(), SkiffError> {
        let compiled = PathPattern::compile(pattern).map_err(|source| SkiffError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        if self
            .routes
            .iter()
            .any(|r| r.method == method && r.pattern.raw() == compiled.raw())
        {
            tracing::warn!(
                method = %method,
                pattern = compiled.raw(),
                "duplicate route registration; first match wins"
            );
        }

        self.routes.push(Route {
            method,
            pattern: compiled,
            handler,
        });
        Ok(())
    }

    /// Resolve an incoming (method, path) to the first matching route.
    ///
    /// Method mismatch never partially matches. Returns `None` when nothing
    /// matches — a resolution outcome, not an error; the caller converts it
    /// into a not-found response.
    pub fn resolve(
        &self,
        method: &Method,
        path: &str,
        ignore_trailing_slashes: bool,
    ) -> Option<RouteMatch<'_>> {
        self.routes
            .iter()
            .filter(|route| &route.method == method)
            .find_map(|route| {
                route
                    .pattern
                    .matches(path, ignore_trailing_slashes)
                    .map(|params| RouteMatch { route, params })
            })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
