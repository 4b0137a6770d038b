// File: src/registry.rs
// Purpose: Exception-type-to-handler registry with specificity resolution

use crate::error::{ExceptionType, HandlerException};
use crate::handler::ExceptionHandler;

/// Maps exception types to handlers.
///
/// Populated during the single-threaded configuration phase, then read
/// concurrently by all request workers. Resolution walks the thrown
/// exception's hierarchy from its concrete type toward the root and returns
/// the handler bound to the first registered ancestor — the most specific
/// match always wins.
///
/// The hierarchy is single-parent, so every type has exactly one ancestor
/// chain and resolution is deterministic. Registering a type twice replaces
/// the earlier handler.
#[derive(Default)]
pub struct ExceptionRegistry {
    bindings: Vec<(&'static ExceptionType, ExceptionHandler)>,
}

impl ExceptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler to an exception type.
    pub fn register(&mut self, ty: &'static ExceptionType, handler: ExceptionHandler) {
        if let Some(existing) = self
            .bindings
            .iter_mut()
            .find(|(bound, _)| std::ptr::eq(*bound, ty))
        {
            tracing::warn!(exception = ty.name(), "replacing exception handler");
            existing.1 = handler;
        } else {
            self.bindings.push((ty, handler));
        }
    }

    /// Resolve the most specific handler for a thrown exception.
    ///
    /// Never fails: returns `None` when no ancestor type is registered, and
    /// the caller applies the default unhandled-error policy.
    pub fn resolve(&self, thrown: &HandlerException) -> Option<&ExceptionHandler> {
        thrown
            .exception_type()
            .hierarchy()
            .find_map(|ty| self.find(ty))
    }

    fn find(&self, ty: &'static ExceptionType) -> Option<&ExceptionHandler> {
        self.bindings
            .iter()
            .find(|(bound, _)| std::ptr::eq(*bound, ty))
            .map(|(_, handler)| handler)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
