//! Response assembly subsystem.
//!
//! # Data Flow
//! ```text
//! Outer request
//!     → middleware.rs (snapshot RequestContext, run inner app)
//!     → gate.rs (Content-Type allow-list)
//!     → collect body
//!     → resolver.rs
//!         → scanner.rs (find <get>/<xhrget> tags)
//!         → context.rs (derive internal GET)
//!         → dispatch.rs (run derived request through the inner app)
//!         → recurse into the fragment, splice it in
//!     → recompute Content-Length
//!     → Client
//! ```
//!
//! # Design Decisions
//! - Sibling tags are resolved sequentially, left to right
//! - Failed fragments degrade to the configured error fragment, never to an error response
//! - Nesting is bounded by a depth limit and cycle detection
//! - Configuration is compiled once and shared read-only

pub mod context;
pub mod dispatch;
pub mod gate;
pub mod middleware;
pub mod resolver;
pub mod scanner;

use std::time::Duration;

use axum::http::{uri::InvalidUri, StatusCode};
use tower::BoxError;

pub use context::RequestContext;
pub use dispatch::{Dispatch, ServiceDispatcher};
pub use gate::ContentTypeGate;
pub use middleware::{compose, ResponseAssembler};
pub use resolver::DirectiveResolver;
pub use scanner::{Directive, DirectiveKind};

/// Errors raised while building an assembler.
#[derive(Debug, thiserror::Error)]
pub enum AssemblerError {
    #[error("invalid content type pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Reasons an internal dispatch produced no fragment.
///
/// These never reach the client; each one is replaced by the error fragment.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid reference `{reference}`: {source}")]
    InvalidReference {
        reference: String,
        #[source]
        source: InvalidUri,
    },

    #[error("reference is not valid UTF-8")]
    NonUtf8Reference,

    #[error("handler responded with {0}")]
    Status(StatusCode),

    #[error("handler failed: {0}")]
    Handler(#[source] BoxError),

    #[error("dispatch timed out after {0:?}")]
    TimedOut(Duration),

    #[error("failed to read fragment body: {0}")]
    Body(#[source] axum::Error),

    #[error("nesting exceeds max depth {0}")]
    TooDeep(usize),

    #[error("reference already being resolved")]
    Cycle,
}

impl DispatchError {
    /// Metric label for this failure.
    pub fn outcome(&self) -> &'static str {
        match self {
            DispatchError::InvalidReference { .. } | DispatchError::NonUtf8Reference => {
                "invalid_reference"
            }
            DispatchError::Status(_) => "status",
            DispatchError::Handler(_) => "handler_error",
            DispatchError::TimedOut(_) => "timeout",
            DispatchError::Body(_) => "body_error",
            DispatchError::TooDeep(_) => "too_deep",
            DispatchError::Cycle => "cycle",
        }
    }
}
