pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod store;
pub mod vcs;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use error::{RegistryError, Result};

pub use logic::{
    list_releases, list_tags, CompareLink, CompareMatrix, LatestRelease, Page, PageRequest,
    ReleaseDetail, ReleaseLifecycle, ReleaseListing, ReleaseRow, ReleaseSnapshot, VisibilityFilter,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{MemoryStore, PostgresStore, Store};

pub use vcs::{MemoryVersionControl, SystemGit, VersionControl};

/// Build the application from configuration and serve it until shutdown.
pub async fn run_server(config: crate::config::AppConfig) -> anyhow::Result<()> {
    use axum::serve;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    // Connect to PostgreSQL
    let database_url = config.database_url()?;
    let max_connections = config.database.max_connections.unwrap_or(20);
    let postgres_store = crate::store::PostgresStore::new(&database_url, max_connections).await?;

    // Run migrations
    postgres_store.migrate().await?;

    let store = Arc::new(postgres_store);
    let vcs = Arc::new(SystemGit::new(config.git.repositories_root.clone()));
    let state = api::AppState::new(store, vcs, config.releases.clone());

    let app = crate::api::routes::create_router().with_state(state);

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("Release registry listening on http://{}", bind_address);

    serve(listener, app).await?;

    Ok(())
}
