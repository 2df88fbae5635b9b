//! HTTP hosting subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → assembler (compose outer response)
//!     → wrapped application (site_router or a caller-supplied Router)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{is_xhr, Xhr, X_REQUESTED_WITH, X_REQUEST_ID, XML_HTTP_REQUEST};
pub use server::{site_router, HttpServer};
