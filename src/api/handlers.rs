use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::ReleaseConfig;
use crate::error::RegistryError;
use crate::logic::{self, Page, PageRequest, ReleaseDetail, ReleaseLifecycle, ReleaseListing};
use crate::model::{
    CreateRelease, EditRelease, NewTag, Release, ReleaseId, Repository, Tag, TagEntry, UserContext,
};
use crate::store::traits::Store;
use crate::vcs::VersionControl;

/// Shared handler state: storage, the version-control collaborator and the
/// listing configuration.
pub struct AppState<S, V> {
    pub store: Arc<S>,
    pub vcs: Arc<V>,
    pub releases: ReleaseConfig,
}

impl<S, V> AppState<S, V> {
    pub fn new(store: Arc<S>, vcs: Arc<V>, releases: ReleaseConfig) -> Arc<Self> {
        Arc::new(Self {
            store,
            vcs,
            releases,
        })
    }
}

pub type SharedState<S, V> = Arc<AppState<S, V>>;

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteReleaseQuery {
    pub delete_tag: Option<bool>,
}

pub fn status_for(err: &RegistryError) -> StatusCode {
    match err {
        RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
        RegistryError::PermissionDenied => StatusCode::FORBIDDEN,
        RegistryError::DuplicateTag(_) => StatusCode::CONFLICT,
        RegistryError::InvalidTarget(_)
        | RegistryError::EmptyTitle
        | RegistryError::InvalidTagName(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RegistryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: RegistryError) -> ApiError {
    let status = status_for(&err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        log::error!("Request failed: {:#}", err);
    }
    (status, Json(ErrorResponse::new(&err.to_string())))
}

async fn load_repository<S: Store>(store: &S, owner: &str, name: &str) -> Result<Repository, ApiError> {
    match store.get_repository_by_name(owner, name).await {
        Ok(Some(repository)) => Ok(repository),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Repository not found")),
        )),
        Err(e) => Err(error_response(e)),
    }
}

/// GET /repos/{owner}/{repo}/releases
pub async fn list_releases<S: Store, V: VersionControl>(
    Path((owner, repo)): Path<(String, String)>,
    Query(page): Query<PageRequest>,
    State(state): State<SharedState<S, V>>,
    viewer: UserContext,
) -> Result<Json<ReleaseListing>, ApiError> {
    let repository = load_repository(&*state.store, &owner, &repo).await?;

    logic::list_releases(&*state.store, &repository, &viewer, page, &state.releases)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /repos/{owner}/{repo}/releases
pub async fn create_release<S: Store, V: VersionControl>(
    Path((owner, repo)): Path<(String, String)>,
    State(state): State<SharedState<S, V>>,
    viewer: UserContext,
    RequestJson(request): RequestJson<CreateRelease>,
) -> Result<(StatusCode, Json<Release>), ApiError> {
    let repository = load_repository(&*state.store, &owner, &repo).await?;

    match ReleaseLifecycle::create(&*state.store, &*state.vcs, &repository, &viewer, request).await {
        Ok(release) => Ok((StatusCode::CREATED, Json(release))),
        Err(e) => Err(error_response(e)),
    }
}

/// GET /repos/{owner}/{repo}/releases/tag/{tag}
pub async fn get_release_by_tag<S: Store, V: VersionControl>(
    Path((owner, repo, tag)): Path<(String, String, String)>,
    State(state): State<SharedState<S, V>>,
    viewer: UserContext,
) -> Result<Json<ReleaseDetail>, ApiError> {
    let repository = load_repository(&*state.store, &owner, &repo).await?;

    ReleaseLifecycle::get_by_tag(
        &*state.store,
        &repository,
        &viewer,
        &tag,
        state.releases.label_precedence,
    )
    .await
    .map(Json)
    .map_err(error_response)
}

/// PATCH /repos/{owner}/{repo}/releases/{id}
pub async fn update_release<S: Store, V: VersionControl>(
    Path((owner, repo, id)): Path<(String, String, ReleaseId)>,
    State(state): State<SharedState<S, V>>,
    viewer: UserContext,
    RequestJson(edit): RequestJson<EditRelease>,
) -> Result<Json<Release>, ApiError> {
    let repository = load_repository(&*state.store, &owner, &repo).await?;

    ReleaseLifecycle::update(&*state.store, &*state.vcs, &repository, &viewer, id, edit)
        .await
        .map(Json)
        .map_err(error_response)
}

/// DELETE /repos/{owner}/{repo}/releases/{id}
pub async fn delete_release<S: Store, V: VersionControl>(
    Path((owner, repo, id)): Path<(String, String, ReleaseId)>,
    Query(query): Query<DeleteReleaseQuery>,
    State(state): State<SharedState<S, V>>,
    viewer: UserContext,
) -> Result<Json<serde_json::Value>, ApiError> {
    let repository = load_repository(&*state.store, &owner, &repo).await?;
    let delete_tag = query.delete_tag.unwrap_or(false);

    match ReleaseLifecycle::delete(&*state.store, &*state.vcs, &repository, &viewer, id, delete_tag).await {
        Ok(()) => Ok(Json(serde_json::json!({
            "success": true,
            "message": format!("Release {} deleted successfully", id)
        }))),
        Err(e) => Err(error_response(e)),
    }
}

/// GET /repos/{owner}/{repo}/tags
pub async fn list_tags<S: Store, V: VersionControl>(
    Path((owner, repo)): Path<(String, String)>,
    Query(page): Query<PageRequest>,
    State(state): State<SharedState<S, V>>,
    viewer: UserContext,
) -> Result<Json<Page<TagEntry>>, ApiError> {
    let repository = load_repository(&*state.store, &owner, &repo).await?;

    logic::list_tags(&*state.store, &*state.vcs, &repository, &viewer, page, &state.releases)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /repos/{owner}/{repo}/tags
pub async fn create_tag<S: Store, V: VersionControl>(
    Path((owner, repo)): Path<(String, String)>,
    State(state): State<SharedState<S, V>>,
    viewer: UserContext,
    RequestJson(request): RequestJson<NewTag>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let repository = load_repository(&*state.store, &owner, &repo).await?;

    match ReleaseLifecycle::create_tag(&*state.store, &*state.vcs, &repository, &viewer, request).await {
        Ok(tag) => Ok((StatusCode::CREATED, Json(tag))),
        Err(e) => Err(error_response(e)),
    }
}

/// DELETE /repos/{owner}/{repo}/tags/{tag}
pub async fn delete_tag<S: Store, V: VersionControl>(
    Path((owner, repo, tag)): Path<(String, String, String)>,
    State(state): State<SharedState<S, V>>,
    viewer: UserContext,
) -> Result<Json<serde_json::Value>, ApiError> {
    let repository = load_repository(&*state.store, &owner, &repo).await?;

    match ReleaseLifecycle::delete_tag(&*state.store, &*state.vcs, &repository, &viewer, &tag).await {
        Ok(()) => Ok(Json(serde_json::json!({
            "success": true,
            "message": format!("Tag '{}' deleted successfully", tag)
        }))),
        Err(e) => Err(error_response(e)),
    }
}
