use axum::{
    routing::{delete, get, patch},
    Router,
};

use crate::api::handlers::{self, SharedState};
use crate::store::traits::Store;
use crate::vcs::VersionControl;

pub fn create_router<S: Store + 'static, V: VersionControl + 'static>() -> Router<SharedState<S, V>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Releases
        .route(
            "/repos/:owner/:repo/releases",
            get(handlers::list_releases::<S, V>).post(handlers::create_release::<S, V>),
        )
        .route(
            "/repos/:owner/:repo/releases/tag/*tag",
            get(handlers::get_release_by_tag::<S, V>),
        )
        .route(
            "/repos/:owner/:repo/releases/:id",
            patch(handlers::update_release::<S, V>).delete(handlers::delete_release::<S, V>),
        )
        // Tags
        .route(
            "/repos/:owner/:repo/tags",
            get(handlers::list_tags::<S, V>).post(handlers::create_tag::<S, V>),
        )
        .route(
            "/repos/:owner/:repo/tags/*tag",
            delete(handlers::delete_tag::<S, V>),
        )
}
