use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use customer_master_api::app::build_router;
use customer_master_api::config::{Config, StoreBackend};
use customer_master_api::db::Database;
use customer_master_api::db_storage::{CustomerStore, PgCustomerStore};
use customer_master_api::handlers::AppState;
use customer_master_api::memory_storage::MemoryCustomerStore;
use customer_master_api::services::CustomerService;

/// Main entry point for the application.
///
/// Initializes logging, loads configuration, connects the customer store,
/// then serves the HTTP API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "customer_master_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let store: Arc<dyn CustomerStore> = match &config.store {
        StoreBackend::Postgres {
            database_url,
            max_connections,
        } => {
            let db = Database::new(database_url, *max_connections).await?;
            tracing::info!("Database connection pool established");
            db.ensure_schema().await?;
            Arc::new(PgCustomerStore::new(db.pool))
        }
        StoreBackend::Memory => Arc::new(MemoryCustomerStore::new()),
    };

    let app_state = Arc::new(AppState {
        customers: CustomerService::new(store),
        config: config.clone(),
    });

    let app = build_router(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
