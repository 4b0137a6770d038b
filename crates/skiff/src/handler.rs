// File: src/handler.rs
// Purpose: Handler callback signatures used throughout the dispatch core

use std::sync::Arc;

use crate::context::Context;
use crate::error::HandlerException;

/// A request handler: before-handler, endpoint, or after-handler.
///
/// Handlers mutate the context and signal failure by returning a typed
/// [`HandlerException`], which the dispatch core routes through the
/// exception registry.
pub type Handler = Arc<dyn Fn(&mut Context) -> Result<(), HandlerException> + Send + Sync>;

/// An exception handler: receives the concrete thrown exception and the
/// request context. It may set status and body but is never required to
/// re-throw.
pub type ExceptionHandler = Arc<dyn Fn(&HandlerException, &mut Context) + Send + Sync>;

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut Context) -> Result<(), HandlerException> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as an [`ExceptionHandler`].
pub fn exception_handler<F>(f: F) -> ExceptionHandler
where
    F: Fn(&HandlerException, &mut Context) + Send + Sync + 'static,
{
    Arc::new(f)
}
