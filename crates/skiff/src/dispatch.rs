// File: src/dispatch.rs
// Purpose: Handler chain executor - BEFORE -> ENDPOINT -> AFTER state machine

use crate::context::Context;
use crate::error::HandlerException;
use crate::handler::Handler;
use crate::registry::ExceptionRegistry;

/// The handler chain assembled for one matched request: before-handlers
/// whose patterns matched the path, the endpoint, and matching
/// after-handlers, all in registration order.
pub struct Chain {
    pub before: Vec<Handler>,
    pub endpoint: Handler,
    pub after: Vec<Handler>,
}

/// Executes one request's handler chain over its context.
///
/// State machine: `BEFORE → ENDPOINT → AFTER → DONE`, with a side
/// transition to error handling reachable from each executing state.
/// A before-handler calling [`Context::halt`] skips the endpoint and jumps
/// to AFTER. An exception anywhere is resolved against the registry and
/// the matched handler runs with the concrete thrown instance; execution
/// then resumes at AFTER. After-handlers run on every exit path so cleanup
/// always fires, and no handler is ever invoked twice for one context.
///
/// An unresolved exception falls through to the generic server-error
/// outcome (`server_error_body`, status 500).
pub fn execute(chain: &Chain, registry: &ExceptionRegistry, ctx: &mut Context, server_error_body: &str) {
    let mut errored = false;

    // BEFORE
    for before in &chain.before {
        if ctx.is_halted() {
            break;
        }
        if let Err(exc) = before(ctx) {
            handle_exception(registry, &exc, ctx, server_error_body);
            errored = true;
            break;
        }
    }

    // ENDPOINT — skipped when a before-handler halted or threw
    if !errored && !ctx.is_halted() {
        if let Err(exc) = (chain.endpoint)(ctx) {
            handle_exception(registry, &exc, ctx, server_error_body);
        }
    }

    // AFTER — unconditional; cleanup handlers fire even after an
    // error-handling detour. A throwing after-handler is routed through
    // the registry and the remaining after-handlers still run.
    for after in &chain.after {
        if let Err(exc) = after(ctx) {
            handle_exception(registry, &exc, ctx, server_error_body);
        }
    }
}

/// Resolve the thrown exception by type specificity and
/// hand it, with the context, to the registered handler. No registry match
/// is the unhandled-error signal: log it and apply the 500 outcome.
fn handle_exception(
    registry: &ExceptionRegistry,
    exc: &HandlerException,
    ctx: &mut Context,
    server_error_body: &str,
) {
    match registry.resolve(exc) {
        Some(handler) => {
            tracing::debug!(exception = exc.exception_type().name(), "dispatching exception handler");
            handler(exc, ctx);
        }
        None => {
            tracing::error!(
                exception = exc.exception_type().name(),
                error = %exc.error(),
                "unhandled exception in handler chain"
            );
            ctx.status(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
                .result(server_error_body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HandlerException, ILLEGAL_ARGUMENT, NUMBER_FORMAT};
    use crate::handler::{exception_handler, handler};
    use crate::test_support::empty_context;
    use axum::http::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn chain_with(endpoint: Handler) -> Chain {
        Chain {
            before: Vec::new(),
            endpoint,
            after: Vec::new(),
        }
    }

    #[test]
    fn test_plain_endpoint_runs() {
        let chain = chain_with(handler(|ctx| {
            ctx.result("done");
            Ok(())
        }));
        let mut ctx = empty_context();
        execute(&chain, &ExceptionRegistry::new(), &mut ctx, "Internal server error");
        assert_eq!(ctx.body(), "done");
        assert_eq!(ctx.status_code(), StatusCode::OK);
    }

    #[test]
    fn test_halt_skips_endpoint_but_not_after() {
        let endpoint_hits = Arc::new(AtomicUsize::new(0));
        let after_hits = Arc::new(AtomicUsize::new(0));

        let e = endpoint_hits.clone();
        let a = after_hits.clone();
        let chain = Chain {
            before: vec![handler(|ctx| {
                ctx.status(StatusCode::UNAUTHORIZED).result("denied");
                ctx.halt();
                Ok(())
            })],
            endpoint: handler(move |_| {
                e.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
            after: vec![handler(move |_| {
                a.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })],
        };

        let mut ctx = empty_context();
        execute(&chain, &ExceptionRegistry::new(), &mut ctx, "Internal server error");

        assert_eq!(endpoint_hits.load(Ordering::SeqCst), 0);
        assert_eq!(after_hits.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.body(), "denied");
    }

    #[test]
    fn test_unhandled_exception_is_500() {
        let chain = chain_with(handler(|_| {
            Err(HandlerException::msg(&NUMBER_FORMAT, "boom"))
        }));
        let mut ctx = empty_context();
        execute(&chain, &ExceptionRegistry::new(), &mut ctx, "Internal server error");
        assert_eq!(ctx.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ctx.body(), "Internal server error");
    }

    #[test]
    fn test_exception_resumes_at_after() {
        let after_hits = Arc::new(AtomicUsize::new(0));
        let a = after_hits.clone();

        let mut registry = ExceptionRegistry::new();
        registry.register(
            &ILLEGAL_ARGUMENT,
            exception_handler(|exc, ctx| {
                ctx.status(StatusCode::BAD_REQUEST).result(exc.message());
            }),
        );

        let chain = Chain {
            before: Vec::new(),
            endpoint: handler(|_| Err(HandlerException::msg(&NUMBER_FORMAT, "not a number"))),
            after: vec![handler(move |_| {
                a.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })],
        };

        let mut ctx = empty_context();
        execute(&chain, &registry, &mut ctx, "Internal server error");

        assert_eq!(ctx.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ctx.body(), "not a number");
        assert_eq!(after_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_before_exception_skips_endpoint() {
        let endpoint_hits = Arc::new(AtomicUsize::new(0));
        let e = endpoint_hits.clone();

        let chain = Chain {
            before: vec![handler(|_| Err(HandlerException::internal("early failure")))],
            endpoint: handler(move |_| {
                e.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
            after: Vec::new(),
        };

        let mut ctx = empty_context();
        execute(&chain, &ExceptionRegistry::new(), &mut ctx, "Internal server error");

        assert_eq!(endpoint_hits.load(Ordering::SeqCst), 0);
        assert_eq!(ctx.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_after_exception_still_runs_remaining_afters() {
        let last_hits = Arc::new(AtomicUsize::new(0));
        let l = last_hits.clone();

        let chain = Chain {
            before: Vec::new(),
            endpoint: handler(|_| Ok(())),
            after: vec![
                handler(|_| Err(HandlerException::internal("cleanup failed"))),
                handler(move |_| {
                    l.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            ],
        };

        let mut ctx = empty_context();
        execute(&chain, &ExceptionRegistry::new(), &mut ctx, "Internal server error");
        assert_eq!(last_hits.load(Ordering::SeqCst), 1);
    }
}
