//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the assembler
//! server. All types derive Serde traits for deserialization from TOML files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Application served behind the assembler.
    pub site: SiteConfig,

    /// Directive resolution settings.
    pub assembly: AssemblyConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Static site served by the bundled host.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory whose files are served and may embed directives.
    /// Directory requests serve `index.html`.
    pub document_root: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            document_root: PathBuf::from("public"),
        }
    }
}

/// Directive resolution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Fragment substituted for any directive whose dispatch fails.
    pub error_message: String,

    /// Content-Type patterns (regular expressions) eligible for assembly.
    pub content_types: Vec<String>,

    /// Maximum nesting of internal dispatches.
    pub max_depth: usize,

    /// Deadline for a single internal dispatch in milliseconds (0 disables).
    pub dispatch_timeout_ms: u64,

    /// Maximum body size collected for scanning, in bytes.
    pub max_body_bytes: usize,
}

impl AssemblyConfig {
    pub fn dispatch_timeout(&self) -> Option<Duration> {
        match self.dispatch_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            error_message: "<p>Loading failed...</p>".to_string(),
            content_types: ["text/html", "text/xhtml", "text/css", "text/csv", "text/plain"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_depth: 16,
            dispatch_timeout_ms: 10_000,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for the outer request, including assembly) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
