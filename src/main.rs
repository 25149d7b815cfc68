//! pgscope - browse and edit PostgreSQL schemas over HTTP.

use std::sync::Arc;

use clap::Parser;
use pgscope::api;
use pgscope::config::Config;
use pgscope::db::{SchemaEngine, pool};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_tracing(&config);

    let urls = config.database_urls()?;
    let database = urls.current_database().to_string();
    let options = config.engine_options();

    info!(
        database = %database,
        "Starting pgscope v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Fail fast if the initial database is unreachable.
    let initial_pool = pool::connect(
        &urls.connection_url(),
        options.max_connections,
        options.connect_timeout,
    )
    .await?;
    pool::ping(&initial_pool).await?;
    info!(database = %database, "connected");

    let engine = Arc::new(SchemaEngine::new(
        initial_pool,
        database,
        Arc::new(urls),
        options,
    ));

    let router = api::router(Arc::clone(&engine));
    api::serve(router, &config.http_host, config.http_port).await?;

    info!("Closing database connections");
    engine.close().await;

    info!("Server shutdown complete");
    Ok(())
}
