// File: src/context.rs
// Purpose: Per-request context and the finalized response handed to transport

use axum::http::{HeaderMap, Method, StatusCode};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use skiff_router::PathParams;

/// Per-request mutable state, created fresh for every incoming request and
/// owned by the dispatch core for the request's lifetime.
///
/// Handlers read the request side (method, path, params, query, headers)
/// and mutate the response side (status, headers, body, attributes).
pub struct Context {
    method: Method,
    path: String,
    path_params: HashMap<String, String>,
    splat: Option<String>,
    query: QueryParams,
    request_headers: HeaderMap,

    status: StatusCode,
    response_headers: HeaderMap,
    body: String,
    attributes: HashMap<String, JsonValue>,
    halted: bool,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("status", &self.status)
            .finish()
    }
}

impl Context {
    /// Create a new request context.
    ///
    /// Path parameters are percent-decoded here; the router hands them
    /// over raw.
    pub fn new(
        method: Method,
        path: impl Into<String>,
        params: PathParams,
        query_string: Option<&str>,
        request_headers: HeaderMap,
    ) -> Self {
        let (raw_params, splat) = params.into_parts();
        let path_params = raw_params
            .into_iter()
            .map(|(name, value)| (name, percent_decode(&value)))
            .collect();

        Self {
            method,
            path: path.into(),
            path_params,
            splat: splat.map(|s| percent_decode(&s)),
            query: QueryParams::parse(query_string.unwrap_or("")),
            request_headers,
            status: StatusCode::OK,
            response_headers: HeaderMap::new(),
            body: String::new(),
            attributes: HashMap::new(),
            halted: false,
        }
    }

    // -- Request side --

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get a path parameter value (name lookup is case-insensitive).
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(&name.to_lowercase()).map(String::as_str)
    }

    /// The splat capture, if the matched pattern ended in `*`.
    pub fn splat(&self) -> Option<&str> {
        self.splat.as_deref()
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name)
    }

    /// Get a query parameter as a specific type.
    pub fn query_param_as<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        self.query.get_as(name)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.request_headers.get(name)?.to_str().ok()
    }

    // -- Response side --

    /// Set the response status code.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Set the response body.
    pub fn result(&mut self, body: impl Into<String>) -> &mut Self {
        self.body = body.into();
        self
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Add a response header.
    pub fn response_header(&mut self, name: &str, value: &str) -> &mut Self {
        if let (Ok(name), Ok(value)) = (
            axum::http::HeaderName::from_bytes(name.as_bytes()),
            axum::http::HeaderValue::from_str(value),
        ) {
            self.response_headers.insert(name, value);
        }
        self
    }

    // -- Attributes --

    /// Store an arbitrary attribute for later handlers in the chain.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn attribute(&self, key: &str) -> Option<&JsonValue> {
        self.attributes.get(key)
    }

    // -- Chain control --

    /// Stop the before-chain early: the endpoint is skipped and execution
    /// proceeds directly to the after-handlers.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Finalize into the response consumed by the transport layer.
    pub fn into_response(self) -> Response {
        Response {
            status: self.status,
            headers: self.response_headers,
            body: self.body,
        }
    }
}

/// The finalized outcome of one request, ready for serialization onto the
/// wire by the (external) transport layer.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Query parameters from the URL (`?key=value`), percent-decoded once at
/// context creation.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    params: HashMap<String, String>,
}

impl QueryParams {
    /// Parse a raw query string (`a=1&b=two`).
    pub fn parse(query_string: &str) -> Self {
        let mut params = HashMap::new();

        for pair in query_string.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            params.insert(percent_decode(key), percent_decode(value));
        }

        Self { params }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Get a query parameter as a specific type.
    pub fn get_as<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.params.get(key)?.parse().ok()
    }

    pub fn has(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.params
    }
}

/// Percent-decode, falling back to the raw input on invalid sequences.
fn percent_decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiff_router::PathPattern;

    fn context_for(pattern: &str, path: &str, query: Option<&str>) -> Context {
        let params = PathPattern::compile(pattern)
            .unwrap()
            .matches(path, true)
            .unwrap();
        Context::new(Method::GET, path, params, query, HeaderMap::new())
    }

    #[test]
    fn test_path_param_decoded() {
        let ctx = context_for("/users/:name", "/users/j%C3%B8rgen", None);
        assert_eq!(ctx.path_param("name"), Some("jørgen"));
    }

    #[test]
    fn test_query_params_parsed() {
        let ctx = context_for("/search", "/search", Some("q=hello%20world&page=2"));
        assert_eq!(ctx.query_param("q"), Some("hello world"));
        assert_eq!(ctx.query_param_as::<u32>("page"), Some(2));
        assert_eq!(ctx.query_param("missing"), None);
    }

    #[test]
    fn test_query_param_without_value() {
        let ctx = context_for("/flag", "/flag", Some("debug"));
        assert_eq!(ctx.query_param("debug"), Some(""));
    }

    #[test]
    fn test_response_defaults() {
        let ctx = context_for("/x", "/x", None);
        assert_eq!(ctx.status_code(), StatusCode::OK);
        assert_eq!(ctx.body(), "");
        assert!(!ctx.is_halted());
    }

    #[test]
    fn test_result_and_status() {
        let mut ctx = context_for("/x", "/x", None);
        ctx.status(StatusCode::CREATED).result("made it");
        let response = ctx.into_response();
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body, "made it");
    }

    #[test]
    fn test_attributes() {
        let mut ctx = context_for("/x", "/x", None);
        ctx.set_attribute("user-id", 42);
        assert_eq!(ctx.attribute("user-id"), Some(&serde_json::json!(42)));
        assert_eq!(ctx.attribute("other"), None);
    }

    #[test]
    fn test_response_header() {
        let mut ctx = context_for("/x", "/x", None);
        ctx.response_header("x-request-id", "abc");
        let response = ctx.into_response();
        assert_eq!(
            response.headers.get("x-request-id").unwrap().to_str().unwrap(),
            "abc"
        );
    }
}
