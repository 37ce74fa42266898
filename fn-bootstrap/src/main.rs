//! fn-bootstrap: function entry point.
//!
//! `invoke` handles a single request from stdin (or a file) and writes the
//! response to stdout. `serve` accepts invocations over HTTP.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fn_bootstrap::{Bootstrapper, Handler, HttpConnector, Topology, router};

#[derive(Parser)]
#[command(name = "fn-bootstrap", version)]
#[command(about = "Provision network and registry prerequisites for a functions tenancy")]
struct Args {
    /// Abort a run that takes longer than this many seconds
    #[arg(long, global = true)]
    deadline_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Handle one request and print the response
    Invoke {
        /// Read the request from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Serve invocations over HTTP
    Serve {
        /// Listen address
        #[arg(short, long, default_value = "[::]:8080")]
        listen: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the response, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fn_bootstrap=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    let topology = Topology::default();
    let connector = HttpConnector::new(&topology);
    let handler = Handler::new(
        Bootstrapper::new(connector, topology),
        args.deadline_secs.map(Duration::from_secs),
    );

    match args.command {
        Command::Invoke { input } => {
            let bytes = match input {
                Some(path) => tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut buf = Vec::new();
                    tokio::io::stdin()
                        .read_to_end(&mut buf)
                        .await
                        .context("Failed to read request from stdin")?;
                    buf
                }
            };

            let (status, response) = handler.respond(&bytes).await;
            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');

            let mut stdout = tokio::io::stdout();
            stdout.write_all(&out).await?;
            stdout.flush().await?;

            if !status.is_success() {
                std::process::exit(1);
            }
        }
        Command::Serve { listen } => {
            let listener = TcpListener::bind(&listen)
                .await
                .with_context(|| format!("Failed to bind {listen}"))?;
            info!("Listening on {}", listener.local_addr()?);

            axum::serve(listener, router(Arc::new(handler)))
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            info!("Server stopped");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
