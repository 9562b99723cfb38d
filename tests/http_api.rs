use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use release_registry::api::{create_router, AppState};
use release_registry::config::ReleaseConfig;
use release_registry::store::RepositoryStore;
use release_registry::{Capability, MemoryStore, MemoryVersionControl, Repository};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app() -> Router {
    let store = Arc::new(MemoryStore::new());
    let vcs = Arc::new(MemoryVersionControl::new());
    let repo = Repository::new("1".into(), "user2".into(), "user2".into(), "repo1".into());

    store.upsert_repository(repo.clone()).await.unwrap();
    store.set_collaborator(&repo.id, &"user1".to_string(), Capability::Write);
    vcs.push_commit(
        &repo.id,
        "master",
        "65f1bf27bc3bf70f64657658635e66094edbcb4d",
        Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
    );

    let state = AppState::new(
        store,
        vcs,
        ReleaseConfig::default().with_default_page_size(10),
    );
    create_router::<MemoryStore, MemoryVersionControl>().with_state(state)
}

async fn send(app: &Router, method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn release_body(tag: &str, publish: bool) -> Value {
    json!({ "tag_name": tag, "title": tag, "publish": publish })
}

#[tokio::test]
async fn test_health_check() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_create_and_list_releases() {
    let app = app().await;
    let releases = "/repos/user2/repo1/releases";

    let (status, created) = send(&app, Method::POST, releases, Some("user2"), Some(release_body("v1.1", true))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["tag_name"], "v1.1");
    assert_eq!(created["target_commitish"], "master");
    assert_eq!(created["is_draft"], false);

    let (status, _) = send(&app, Method::POST, releases, Some("user1"), Some(release_body("draft-release", false))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, listing) = send(&app, Method::GET, releases, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["total_count"], 1);
    assert_eq!(listing["page_size"], 10);
    assert_eq!(listing["releases"][0]["label"], "stable");

    let (_, listing) = send(&app, Method::GET, releases, Some("user1"), None).await;
    assert_eq!(listing["total_count"], 2);
    assert_eq!(listing["latest"]["tag_name"], "draft-release");
    assert_eq!(listing["latest"]["label"], "draft");
    assert_eq!(
        listing["releases"][0]["compare"][0]["url"],
        "/user2/repo1/compare/v1.1...master"
    );
}

#[tokio::test]
async fn test_error_statuses() {
    let app = app().await;
    let releases = "/repos/user2/repo1/releases";

    let (status, _) = send(&app, Method::GET, "/repos/user2/missing/releases", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::POST, releases, Some("user4"), Some(release_body("v1.0", true))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, Method::POST, releases, None, Some(release_body("v1.0", true))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::POST, releases, Some("user2"), Some(json!({ "tag_name": "v1.0", "title": "" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, Method::POST, releases, Some("user2"), Some(release_body("v1.0", true))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, Method::POST, releases, Some("user1"), Some(release_body("V1.0", true))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_get_edit_and_delete_release() {
    let app = app().await;
    let (_, draft) = send(
        &app,
        Method::POST,
        "/repos/user2/repo1/releases",
        Some("user2"),
        Some(release_body("v2.0", false)),
    )
    .await;
    let id = draft["id"].as_i64().unwrap();

    let (status, _) = send(&app, Method::GET, "/repos/user2/repo1/releases/tag/v2.0", Some("user4"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, published) = send(
        &app,
        Method::PATCH,
        &format!("/repos/user2/repo1/releases/{}", id),
        Some("user1"),
        Some(json!({ "publish": true, "body": "notes" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(published["is_draft"], false);
    assert_eq!(published["has_tag"], true);
    assert_eq!(published["created_at"], draft["created_at"]);

    let (status, detail) = send(&app, Method::GET, "/repos/user2/repo1/releases/tag/v2.0", Some("user4"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["label"], "stable");
    assert_eq!(detail["reference"]["type"], "tag");
    assert_eq!(detail["body"], "notes");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/repos/user2/repo1/releases/{}?delete_tag=true", id),
        Some("user2"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, tags) = send(&app, Method::GET, "/repos/user2/repo1/tags", Some("user2"), None).await;
    assert_eq!(tags["total_count"], 0);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/repos/user2/repo1/releases/{}", id),
        Some("user2"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tag_endpoints() {
    let app = app().await;
    let tags = "/repos/user2/repo1/tags";

    let (status, tag) = send(&app, Method::POST, tags, Some("user2"), Some(json!({ "tag_name": "release/2024" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(tag["commit_id"], "65f1bf27bc3bf70f64657658635e66094edbcb4d");

    let (status, _) = send(&app, Method::POST, tags, Some("user2"), Some(json!({ "tag_name": "release/2024" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::POST, tags, Some("user2"), Some(json!({ "tag_name": "bad tag" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, listed) = send(&app, Method::GET, tags, Some("user4"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["items"][0]["name"], "release/2024");
    assert_eq!(listed["items"][0]["can_delete"], false);

    let (status, _) = send(&app, Method::DELETE, "/repos/user2/repo1/tags/release/2024", Some("user4"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::DELETE, "/repos/user2/repo1/tags/release/2024", Some("user2"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, listed) = send(&app, Method::GET, tags, Some("user2"), None).await;
    assert_eq!(listed["total_count"], 0);
}

#[tokio::test]
async fn test_paging_over_real_server() {
    let app = app().await;
    for i in 0..12 {
        let (status, _) = send(
            &app,
            Method::POST,
            "/repos/user2/repo1/releases",
            Some("user2"),
            Some(release_body(&format!("v0.0.{}", i), true)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let base_url = format!("http://{}", address);

    let page: Value = client
        .get(format!("{}/repos/user2/repo1/releases?page=2&limit=5", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["page"], 2);
    assert_eq!(page["page_size"], 5);
    assert_eq!(page["total_pages"], 3);
    assert_eq!(page["releases"].as_array().unwrap().len(), 5);
    assert_eq!(page["releases"][0]["tag_name"], "v0.0.6");
    assert_eq!(page["latest"]["tag_name"], "v0.0.11");

    let capped: Value = client
        .get(format!("{}/repos/user2/repo1/releases?limit=500", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(capped["page_size"], 50);
    assert_eq!(capped["releases"].as_array().unwrap().len(), 12);

    let response = client
        .get(format!("{}/repos/user2/repo1/releases?page=9", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let beyond: Value = response.json().await.unwrap();
    assert!(beyond["releases"].as_array().unwrap().is_empty());
    assert_eq!(beyond["total_count"], 12);
}
