// File: src/error.rs
// Purpose: Exception type hierarchy, handler exceptions, and framework errors

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// A node in the exception type hierarchy.
///
/// Exception dispatch works without runtime reflection: every exception
/// carries a `&'static ExceptionType` tag, and each tag names at most one
/// parent. Resolution walks the chain from the concrete type toward the
/// root, so the most specific registered handler always wins and the walk
/// is deterministic by construction.
///
/// User code extends the hierarchy with statics:
///
/// ```
/// use skiff::{ExceptionType, ILLEGAL_ARGUMENT};
///
/// static OUT_OF_RANGE: ExceptionType =
///     ExceptionType::subtype_of("OutOfRange", &ILLEGAL_ARGUMENT);
/// ```
pub struct ExceptionType {
    name: &'static str,
    parent: Option<&'static ExceptionType>,
}

impl ExceptionType {
    /// Declare a new root-level exception type (direct child of [`EXCEPTION`]).
    pub const fn new(name: &'static str) -> Self {
        ExceptionType {
            name,
            parent: Some(&EXCEPTION),
        }
    }

    /// Declare a subtype of an existing exception type.
    pub const fn subtype_of(name: &'static str, parent: &'static ExceptionType) -> Self {
        ExceptionType {
            name,
            parent: Some(parent),
        }
    }

    const fn root(name: &'static str) -> Self {
        ExceptionType { name, parent: None }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<&'static ExceptionType> {
        self.parent
    }

    /// Iterator over this type and its ancestors, most specific first.
    pub fn hierarchy(&'static self) -> impl Iterator<Item = &'static ExceptionType> {
        std::iter::successors(Some(self), |ty| ty.parent)
    }

    /// True if `self` is `other` or a descendant of it.
    pub fn is_a(&'static self, other: &'static ExceptionType) -> bool {
        self.hierarchy().any(|ty| std::ptr::eq(ty, other))
    }
}

impl fmt::Debug for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionType")
            .field("name", &self.name)
            .field("parent", &self.parent.map(|p| p.name))
            .finish()
    }
}

impl fmt::Display for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// ----------------------------------------------------------------------------
// Built-in hierarchy
// ----------------------------------------------------------------------------

/// Root of the exception hierarchy; every type descends from it.
pub static EXCEPTION: ExceptionType = ExceptionType::root("Exception");

/// A handler received an argument it cannot accept.
pub static ILLEGAL_ARGUMENT: ExceptionType = ExceptionType::new("IllegalArgument");

/// A value could not be parsed as a number. Subtype of [`ILLEGAL_ARGUMENT`].
pub static NUMBER_FORMAT: ExceptionType =
    ExceptionType::subtype_of("NumberFormat", &ILLEGAL_ARGUMENT);

/// The application is in a state that forbids the operation.
pub static ILLEGAL_STATE: ExceptionType = ExceptionType::new("IllegalState");

/// A referenced resource does not exist.
pub static NOT_FOUND: ExceptionType = ExceptionType::new("NotFound");

/// An operation exceeded its time budget.
pub static TIMEOUT: ExceptionType = ExceptionType::new("Timeout");

// ----------------------------------------------------------------------------
// HandlerException
// ----------------------------------------------------------------------------

/// The value a failing handler returns: a typed exception with its cause.
///
/// Handlers signal failure with `Err(HandlerException::...)`; the dispatch
/// core resolves the exception type against the registry and invokes the
/// most specific registered handler with this concrete instance.
#[derive(Debug)]
pub struct HandlerException {
    ty: &'static ExceptionType,
    error: anyhow::Error,
}

impl HandlerException {
    pub fn new(ty: &'static ExceptionType, error: impl Into<anyhow::Error>) -> Self {
        HandlerException {
            ty,
            error: error.into(),
        }
    }

    /// Build from a plain message.
    pub fn msg(ty: &'static ExceptionType, message: impl Into<String>) -> Self {
        HandlerException {
            ty,
            error: anyhow::anyhow!(message.into()),
        }
    }

    /// Shorthand for an untyped failure (root [`EXCEPTION`]).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::msg(&EXCEPTION, message)
    }

    pub fn exception_type(&self) -> &'static ExceptionType {
        self.ty
    }

    pub fn error(&self) -> &anyhow::Error {
        &self.error
    }

    /// The failure message, as handlers commonly render it.
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

impl From<SkiffError> for HandlerException {
    fn from(err: SkiffError) -> Self {
        let ty = match &err {
            SkiffError::SessionClosed(_) => &ILLEGAL_STATE,
            _ => &EXCEPTION,
        };
        HandlerException::new(ty, err)
    }
}

impl fmt::Display for HandlerException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.ty, self.error)
    }
}

// ----------------------------------------------------------------------------
// Framework errors
// ----------------------------------------------------------------------------

/// Errors raised by the framework itself, fatal at configuration time or
/// surfaced at the websocket boundary.
#[derive(Debug, Error)]
pub enum SkiffError {
    #[error("invalid route pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: skiff_router::PatternError,
    },

    #[error("no websocket route matches '{0}'")]
    NoWsRoute(String),

    #[error("websocket session {0} is closed")]
    SessionClosed(Uuid),
}
