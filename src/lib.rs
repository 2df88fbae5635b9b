//! Response assembly middleware for axum applications.
//!
//! Responses containing `<get>/path?query</get>` or `<xhrget>/path</xhrget>`
//! tags have each tag replaced by the body of an internal GET to that path,
//! recursively, so one page can be built from several handlers.
//!
//! ```ignore
//! use response_assembler::{assembler, config::AssemblyConfig};
//!
//! let app = Router::new()
//!     .route("/", get(|| async { Html("<body><get>/nav</get></body>") }))
//!     .route("/nav", get(nav));
//! let app = assembler::compose(app, &AssemblyConfig::default())?;
//! ```

pub mod assembler;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use assembler::{compose, ResponseAssembler};
pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
