//! HTTP server bootstrap with graceful shutdown.

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

/// Bind and serve the router until SIGINT or SIGTERM.
pub async fn serve(router: Router, host: &str, port: u16) -> std::io::Result<()> {
    let bind_addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(wait_for_signal())
        .await
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
