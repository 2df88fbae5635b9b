//! Response assembler server.
//!
//! Serves a document root and resolves `<get>`/`<xhrget>` directives in the
//! responses before they reach the client.
//!
//! ```text
//!     Client Request        ┌──────────────────────────────────────────────┐
//!     ──────────────────────┼─▶ request id → trace → timeout → assembler   │
//!                           │                                  │           │
//!                           │                                  ▼           │
//!                           │                         ┌────────────────┐   │
//!                           │        internal GETs ──▶│  application   │   │
//!                           │        (per directive)  │ (ServeDir/app) │   │
//!                           │                         └────────────────┘   │
//!     Client Response       │                                  │           │
//!     ◀─────────────────────┼── Content-Length fixed ◀─ resolve directives │
//!                           └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use response_assembler::config::{self, ServerConfig};
use response_assembler::http::HttpServer;
use response_assembler::lifecycle::Shutdown;
use response_assembler::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "response-assembler")]
#[command(about = "Serve a site with <get>/<xhrget> response assembly", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override the document root.
    #[arg(short, long)]
    root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(root) = cli.root {
        config.site.document_root = root;
    }
    if let Err(errors) = config::validation::validate_config(&config) {
        return Err(config::ConfigError::Validation(errors).into());
    }

    logging::init(&config.observability);

    tracing::info!("response-assembler v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        document_root = %config.site.document_root.display(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::for_site(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
