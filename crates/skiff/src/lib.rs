// Skiff - embedded HTTP/WebSocket dispatch core
// Route table, handler chains, typed exception mapping, ws session multiplexing

pub mod app;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod registry;
pub mod routing;
pub mod ws;

// Re-export core types
pub use app::App;
pub use config::Config;
pub use context::{Context, QueryParams, Response};
pub use dispatch::Chain;
pub use error::{
    ExceptionType, HandlerException, SkiffError, EXCEPTION, ILLEGAL_ARGUMENT, ILLEGAL_STATE,
    NOT_FOUND, NUMBER_FORMAT, TIMEOUT,
};
pub use handler::{exception_handler, handler, ExceptionHandler, Handler};
pub use registry::ExceptionRegistry;
pub use routing::{Route, RouteMatch, RouteTable};
pub use ws::{SessionState, WsHandlerSet, WsMultiplexer, WsSession};

// Re-export the pattern library for pattern-level use
pub use skiff_router::{PathParams, PathPattern, PatternError};

// Re-export commonly used types from dependencies
pub use axum;
pub use axum::http::{Method, StatusCode};
