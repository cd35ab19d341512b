//! dropshelf server binary.
//!
//! A small upload service: files posted through the web form land in the
//! storage directory, are listed on the index page and can be downloaded or
//! deleted again. The list of uploads lives in memory for the lifetime of the
//! process.

mod app;
mod config;
mod error;
mod files;
mod frontend;
mod http;
mod logging;
mod registry;
mod storage;

use axum_server::Handle;
use clap::Parser;
use shadow_rs::shadow;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

use crate::config::Args;
use crate::registry::{MemoryRegistry, Registry};
use crate::storage::Storage;

shadow!(build);

/// Starts the server and blocks until shutdown.
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    logging::init_logging();

    let args = Args::parse();
    let storage = Arc::new(Storage::new(PathBuf::from(&args.storage_dir)));
    storage.ensure_root().await?;
    info!(path = ?storage.root_path(), "storage directory ready");

    let registry: Arc<dyn Registry> = Arc::new(MemoryRegistry::new());
    let app = app::build_router(storage, registry, args.upload_max_size);

    let host = args
        .host
        .parse::<IpAddr>()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string()))?;
    let addr = SocketAddr::new(host, args.port);
    let handle = Handle::new();

    info!("Server listening on {}", addr);

    // The serve future resolves once the handle has shut the listener down.
    tokio::spawn(shutdown_signal(
        handle.clone(),
        Duration::from_secs(args.shutdown_grace_secs),
    ));
    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(handle: Handle, grace: Duration) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down...");
    if grace.is_zero() {
        handle.shutdown();
    } else {
        handle.graceful_shutdown(Some(grace));
    }
}
