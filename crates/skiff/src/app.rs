// File: src/app.rs
// Purpose: Application value - registration surface and request entry point

use axum::http::{HeaderMap, Method, StatusCode};
use skiff_router::{normalize_path, PathPattern};
use std::sync::Arc;

use crate::config::Config;
use crate::context::{Context, Response};
use crate::dispatch::{self, Chain};
use crate::error::{ExceptionType, HandlerException, SkiffError};
use crate::handler::{ExceptionHandler, Handler};
use crate::registry::ExceptionRegistry;
use crate::routing::RouteTable;
use crate::ws::{WsHandlerSet, WsMultiplexer};

const DEFAULT_NOT_FOUND_BODY: &str = "Not found";
const DEFAULT_SERVER_ERROR_BODY: &str = "Internal server error";

/// A before- or after-handler bound to its own path pattern.
struct Filter {
    pattern: PathPattern,
    handler: Handler,
}

/// The application: single owner of the route table, filters, exception
/// registry, websocket multiplexer, and dispatch configuration.
///
/// Registration happens in a single-threaded configuration phase; the app
/// is then shared (typically via `Arc`) and dispatches requests
/// concurrently over read-only state. Registration after traffic has
/// started is unsupported.
///
/// ```
/// use skiff::App;
/// use axum::http::Method;
///
/// let app = App::new()
///     .get("/hello/:name", |ctx| {
///         let name = ctx.path_param("name").unwrap_or("world").to_string();
///         ctx.result(format!("Hello, {name}!"));
///         Ok(())
///     })
///     .unwrap();
///
/// let response = app.handle(Method::GET, "/hello/skiff");
/// assert_eq!(response.body, "Hello, skiff!");
/// ```
pub struct App {
    routes: RouteTable,
    before: Vec<Filter>,
    after: Vec<Filter>,
    exceptions: ExceptionRegistry,
    ws: WsMultiplexer,
    ignore_trailing_slashes: bool,
    not_found_body: String,
    server_error_body: String,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        App {
            routes: RouteTable::new(),
            before: Vec::new(),
            after: Vec::new(),
            exceptions: ExceptionRegistry::new(),
            ws: WsMultiplexer::new(),
            ignore_trailing_slashes: true,
            not_found_body: DEFAULT_NOT_FOUND_BODY.to_string(),
            server_error_body: DEFAULT_SERVER_ERROR_BODY.to_string(),
        }
    }

    /// Create an app from file-based configuration.
    pub fn from_config(config: &Config) -> Self {
        let mut app = App::new();
        app.ignore_trailing_slashes = config.routing.ignore_trailing_slashes;
        app
    }

    // ------------------------------------------------------------------------
    // Configuration builders
    // ------------------------------------------------------------------------

    /// Treat `/path` and `/path/` as distinct routes; an unmatched variant
    /// produces the not-found outcome.
    pub fn dont_ignore_trailing_slashes(mut self) -> Self {
        self.ignore_trailing_slashes = false;
        self
    }

    /// Override the default not-found body.
    pub fn not_found_body(mut self, body: impl Into<String>) -> Self {
        self.not_found_body = body.into();
        self
    }

    /// Override the default unhandled-error body.
    pub fn server_error_body(mut self, body: impl Into<String>) -> Self {
        self.server_error_body = body.into();
        self
    }

    // ------------------------------------------------------------------------
    // Route registration
    // ------------------------------------------------------------------------

    /// Register an endpoint handler for a method and path pattern.
    pub fn route<F>(mut self, method: Method, pattern: &str, f: F) -> Result<Self, SkiffError>
    where
        F: Fn(&mut Context) -> Result<(), HandlerException> + Send + Sync + 'static,
    {
        self.routes.register(method, pattern, Arc::new(f))?;
        Ok(self)
    }

    pub fn get<F>(self, pattern: &str, f: F) -> Result<Self, SkiffError>
    where
        F: Fn(&mut Context) -> Result<(), HandlerException> + Send + Sync + 'static,
    {
        self.route(Method::GET, pattern, f)
    }

    pub fn post<F>(self, pattern: &str, f: F) -> Result<Self, SkiffError>
    where
        F: Fn(&mut Context) -> Result<(), HandlerException> + Send + Sync + 'static,
    {
        self.route(Method::POST, pattern, f)
    }

    pub fn put<F>(self, pattern: &str, f: F) -> Result<Self, SkiffError>
    where
        F: Fn(&mut Context) -> Result<(), HandlerException> + Send + Sync + 'static,
    {
        self.route(Method::PUT, pattern, f)
    }

    pub fn patch<F>(self, pattern: &str, f: F) -> Result<Self, SkiffError>
    where
        F: Fn(&mut Context) -> Result<(), HandlerException> + Send + Sync + 'static,
    {
        self.route(Method::PATCH, pattern, f)
    }

    pub fn delete<F>(self, pattern: &str, f: F) -> Result<Self, SkiffError>
    where
        F: Fn(&mut Context) -> Result<(), HandlerException> + Send + Sync + 'static,
    {
        self.route(Method::DELETE, pattern, f)
    }

    pub fn head<F>(self, pattern: &str, f: F) -> Result<Self, SkiffError>
    where
        F: Fn(&mut Context) -> Result<(), HandlerException> + Send + Sync + 'static,
    {
        self.route(Method::HEAD, pattern, f)
    }

    // ------------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------------

    /// Register a before-handler for paths matching `pattern`.
    pub fn before<F>(mut self, pattern: &str, f: F) -> Result<Self, SkiffError>
    where
        F: Fn(&mut Context) -> Result<(), HandlerException> + Send + Sync + 'static,
    {
        self.before.push(Filter {
            pattern: compile_filter_pattern(pattern)?,
            handler: Arc::new(f),
        });
        Ok(self)
    }

    /// Register a before-handler for every path.
    pub fn before_all<F>(self, f: F) -> Result<Self, SkiffError>
    where
        F: Fn(&mut Context) -> Result<(), HandlerException> + Send + Sync + 'static,
    {
        self.before("*", f)
    }

    /// Register an after-handler for paths matching `pattern`. After-handlers
    /// run on every exit path, including after a caught or unhandled
    /// exception, so cleanup and logging always fire.
    pub fn after<F>(mut self, pattern: &str, f: F) -> Result<Self, SkiffError>
    where
        F: Fn(&mut Context) -> Result<(), HandlerException> + Send + Sync + 'static,
    {
        self.after.push(Filter {
            pattern: compile_filter_pattern(pattern)?,
            handler: Arc::new(f),
        });
        Ok(self)
    }

    /// Register an after-handler for every path.
    pub fn after_all<F>(self, f: F) -> Result<Self, SkiffError>
    where
        F: Fn(&mut Context) -> Result<(), HandlerException> + Send + Sync + 'static,
    {
        self.after("*", f)
    }

    // ------------------------------------------------------------------------
    // Exception mapping
    // ------------------------------------------------------------------------

    /// Bind a handler to an exception type. Thrown exceptions resolve to
    /// the most specific registered ancestor type.
    pub fn exception<F>(mut self, ty: &'static ExceptionType, f: F) -> Self
    where
        F: Fn(&HandlerException, &mut Context) + Send + Sync + 'static,
    {
        let handler: ExceptionHandler = Arc::new(f);
        self.exceptions.register(ty, handler);
        self
    }

    // ------------------------------------------------------------------------
    // WebSocket registration
    // ------------------------------------------------------------------------

    /// Register a websocket handler set for a path pattern.
    pub fn ws(mut self, pattern: &str, handlers: WsHandlerSet) -> Result<Self, SkiffError> {
        self.ws.register(pattern, handlers)?;
        Ok(self)
    }

    pub fn ws_multiplexer(&self) -> &WsMultiplexer {
        &self.ws
    }

    pub fn ignore_trailing_slashes(&self) -> bool {
        self.ignore_trailing_slashes
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    /// Handle a request with no query string or headers. Convenience form
    /// of [`App::handle_request`].
    pub fn handle(&self, method: Method, path: &str) -> Response {
        self.handle_request(method, path, None, HeaderMap::new())
    }

    /// The inbound boundary: the transport delivers (method, path, query,
    /// headers); the app resolves the route, runs the handler chain, and
    /// returns the finalized response for serialization onto the wire.
    ///
    /// Each call owns its own fresh context; one request's failure never
    /// affects another's.
    pub fn handle_request(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        headers: HeaderMap,
    ) -> Response {
        let path = normalize_path(path);

        let Some(matched) = self
            .routes
            .resolve(&method, &path, self.ignore_trailing_slashes)
        else {
            tracing::debug!(method = %method, path = %path, "no route matched");
            return Response {
                status: StatusCode::NOT_FOUND,
                headers: HeaderMap::new(),
                body: self.not_found_body.clone(),
            };
        };

        let chain = Chain {
            before: self.matching_filters(&self.before, &path),
            endpoint: matched.route.handler().clone(),
            after: self.matching_filters(&self.after, &path),
        };

        let mut ctx = Context::new(method, path.as_ref(), matched.params, query, headers);
        dispatch::execute(&chain, &self.exceptions, &mut ctx, &self.server_error_body);
        ctx.into_response()
    }

    fn matching_filters(&self, filters: &[Filter], path: &str) -> Vec<Handler> {
        filters
            .iter()
            .filter(|f| {
                f.pattern
                    .matches(path, self.ignore_trailing_slashes)
                    .is_some()
            })
            .map(|f| f.handler.clone())
            .collect()
    }
}

fn compile_filter_pattern(pattern: &str) -> Result<PathPattern, SkiffError> {
    PathPattern::compile(pattern).map_err(|source| SkiffError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_default_body() {
        let app = App::new();
        let response = app.handle(Method::GET, "/missing");
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(response.body, "Not found");
    }

    #[test]
    fn test_not_found_body_override() {
        let app = App::new().not_found_body("nothing here");
        let response = app.handle(Method::GET, "/missing");
        assert_eq!(response.body, "nothing here");
    }

    #[test]
    fn test_path_normalized_before_matching() {
        let app = App::new()
            .get("/a/b", |ctx| {
                ctx.result("ok");
                Ok(())
            })
            .unwrap();
        let response = app.handle(Method::GET, "/a//b");
        assert_eq!(response.body, "ok");
    }

    #[test]
    fn test_query_reaches_handler() {
        let app = App::new()
            .get("/search", |ctx| {
                let q = ctx.query_param("q").unwrap_or("").to_string();
                ctx.result(q);
                Ok(())
            })
            .unwrap();
        let response =
            app.handle_request(Method::GET, "/search", Some("q=dinghy"), HeaderMap::new());
        assert_eq!(response.body, "dinghy");
    }

    #[test]
    fn test_filter_pattern_scoping() {
        let app = App::new()
            .before("/admin/*", |ctx| {
                ctx.status(StatusCode::UNAUTHORIZED).result("denied");
                ctx.halt();
                Ok(())
            })
            .unwrap()
            .get("/admin/users", |ctx| {
                ctx.result("users");
                Ok(())
            })
            .unwrap()
            .get("/public", |ctx| {
                ctx.result("public");
                Ok(())
            })
            .unwrap();

        assert_eq!(app.handle(Method::GET, "/admin/users").body, "denied");
        assert_eq!(app.handle(Method::GET, "/public").body, "public");
    }
}
