//! API server entry point.

use std::sync::Arc;

use api::config::{Config, LogFormat};
use api::routes::invoices::{SharedInventory, SharedStore};
use inventory::{HttpInventoryClient, InMemoryStockLedger};
use invoice_store::{InMemoryInvoiceStore, PostgresInvoiceStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn open_store(config: &Config) -> SharedStore {
    match &config.database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("failed to connect to PostgreSQL");
            let store = PostgresInvoiceStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL invoice store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, invoices are kept in memory");
            Arc::new(InMemoryInvoiceStore::new())
        }
    }
}

fn open_inventory(config: &Config) -> SharedInventory {
    match &config.inventory_url {
        Some(url) => {
            let client = HttpInventoryClient::new(url.as_str(), config.inventory_timeout)
                .expect("failed to build inventory client");
            tracing::info!(
                base_url = client.base_url(),
                timeout_ms = config.inventory_timeout.as_millis() as u64,
                "using remote stock ledger"
            );
            Arc::new(client)
        }
        None => {
            tracing::warn!("INVENTORY_SERVICE_URL not set, using an empty in-process ledger");
            Arc::new(InMemoryStockLedger::new())
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Wire the store and the ledger client
    let store = open_store(&config).await;
    let inventory = open_inventory(&config);
    let state = api::create_default_state(store, inventory);

    // 4. Build the application
    let app = api::create_app(state, metrics_handle);

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
