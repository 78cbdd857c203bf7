//! HTTP API driven in-process through the router.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use sheetsync::api::{self, AppState};
use sheetsync::models::{ServerConfig, SyncStatus};
use sheetsync::pipeline::{StaticSheetSource, SyncGuard, SyncJob};
use sheetsync::services::Aggregator;
use sheetsync::storage::{DocumentStore, LocalStore, MemoryStore};

const CSV: &str = "STUDENT_NAME,ROLL_NO,DEPARTMENT,CUMULATIVE_REWARD_POINTS\n\
                   Ada Lovelace,21CB01,COMPUTER SCIENCE AND BUSINESS,2100\n\
                   Grace Hopper,21CS02,COMPUTER SCIENCE,1500\n\
                   Linus,21ME03,Civil,90\n";

async fn app_with(csv: Option<&str>) -> (Router, Arc<dyn DocumentStore>) {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let status = SyncStatus::new();
    let job = csv.map(|csv| {
        Arc::new(SyncJob::new(
            Arc::new(StaticSheetSource::new(csv)),
            Arc::clone(&store),
            SyncGuard::new(),
            status.clone(),
        ))
    });
    if let Some(job) = &job {
        job.run().await.unwrap();
    }

    let aggregator = Aggregator::new(Arc::clone(&store), status, "gsheets");
    let router = api::router(AppState::new(aggregator, job), &ServerConfig::default());
    (router, store)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_list_all_grouped() {
    let (app, _) = app_with(Some(CSV)).await;
    let (status, body) = call(&app, Method::GET, "/api/departments/all", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["responseTime"].as_str().unwrap().ends_with("ms"));
    assert_eq!(body["data"]["CSBS"][0]["name"], "Ada Lovelace");
    assert_eq!(body["data"]["CSBS"][0]["status"], "active");
    assert_eq!(body["data"]["CSE"][0]["status"], "warning");
    assert_eq!(body["data"]["Civil"][0]["status"], "at-risk");
    assert_eq!(body["data"]["Civil"][0]["initials"], "L");
}

#[tokio::test]
async fn test_students_carry_client_keys() {
    let (app, _) = app_with(Some(CSV)).await;
    let (_, body) = call(&app, Method::GET, "/api/departments/all", None).await;

    let grace = &body["data"]["CSE"][0];
    assert_eq!(grace["rp"], 1500);
    assert_eq!(grace["avatar"], "GH");
    assert_eq!(grace["rollNo"], "21CS02");
    assert_eq!(grace["department"], "CSE");
    assert_eq!(grace["DEPARTMENT"], "COMPUTER SCIENCE");

    let (_, listing) = call(&app, Method::GET, "/api/departments/CSE", None).await;
    assert_eq!(listing["data"][0]["rp"], 1500);
}

#[tokio::test]
async fn test_list_one_category_by_code_or_name() {
    let (app, _) = app_with(Some(CSV)).await;

    let (status, by_code) = call(&app, Method::GET, "/api/departments/CSBS", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_code["department"], "CSBS");
    assert_eq!(by_code["count"], 1);

    let (_, by_name) = call(
        &app,
        Method::GET,
        "/api/departments/COMPUTER%20SCIENCE%20AND%20BUSINESS",
        None,
    )
    .await;
    assert_eq!(by_name["count"], 1);
    assert_eq!(by_name["data"], by_code["data"]);

    let (status, empty) = call(&app, Method::GET, "/api/departments/AERO", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty["count"], 0);
}

#[tokio::test]
async fn test_metadata() {
    let (app, _) = app_with(Some(CSV)).await;
    let (status, body) = call(&app, Method::GET, "/api/metadata", None).await;

    assert_eq!(status, StatusCode::OK);
    let meta = &body["metadata"];
    assert_eq!(meta["recordCount"], 3);
    assert_eq!(meta["categories"], json!(["CSBS", "CSE", "Civil"]));
    assert_eq!(meta["collectionName"], "gsheets");
    assert_eq!(meta["lastSync"]["recordCount"], 3);
}

#[tokio::test]
async fn test_raw_document_lifecycle() {
    let (app, _) = app_with(None).await;

    let (status, created) = call(
        &app,
        Method::POST,
        "/api/data",
        Some(json!({"STUDENT_NAME": "Ken Thompson", "rp": 1200})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["message"], "Document added successfully");
    let id = created["insertedId"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 24);

    let (status, updated) = call(
        &app,
        Method::PUT,
        &format!("/api/data/{id}"),
        Some(json!({"rp": 2500})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["modifiedCount"], 1);

    let (_, listed) = call(&app, Method::GET, "/api/data", None).await;
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["data"][0]["rp"], 2500);
    assert_eq!(listed["data"][0]["_id"], id.as_str());

    let (status, deleted) = call(&app, Method::DELETE, &format!("/api/data/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deletedCount"], 1);

    let (_, again) = call(&app, Method::DELETE, &format!("/api/data/{id}"), None).await;
    assert_eq!(again["deletedCount"], 0);
}

#[tokio::test]
async fn test_validation_errors_are_400() {
    let (app, _) = app_with(None).await;

    let (status, body) = call(&app, Method::POST, "/api/data", Some(json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
    assert!(body["timestamp"].is_string());

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/data",
        Some(json!({"_id": "0123456789abcdef01234567"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, Method::PUT, "/api/data/not-an-id", Some(json!({"a": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/data")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_reports_store() {
    let (app, _) = app_with(None).await;
    let (status, body) = call(&app, Method::GET, "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storeConnected"], true);
    assert!(body["uptime"].is_number());
}

#[tokio::test]
async fn test_health_reports_disconnected_store() {
    let tmp = tempfile::TempDir::new().unwrap();
    let root = tmp.path().join("store");
    let store: Arc<dyn DocumentStore> = Arc::new(LocalStore::open(&root).await.unwrap());
    let aggregator = Aggregator::new(store, SyncStatus::new(), "gsheets");
    let app = api::router(AppState::new(aggregator, None), &ServerConfig::default());

    std::fs::remove_dir_all(&root).unwrap();
    let (status, body) = call(&app, Method::GET, "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "database-disconnected");
    assert_eq!(body["storeConnected"], false);
}

#[tokio::test]
async fn test_trigger_sync() {
    let (app, store) = app_with(Some(CSV)).await;
    let (status, body) = call(&app, Method::POST, "/api/sync", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recordCount"], 3);
    assert_eq!(body["outcome"], "replaced");
    assert_eq!(body["generation"], 2);
    assert_eq!(store.stats().await.unwrap().generation, 2);
}

#[tokio::test]
async fn test_trigger_sync_without_source_is_error() {
    let (app, _) = app_with(None).await;
    let (status, body) = call(&app, Method::POST, "/api/sync", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_unknown_path_is_json_404() {
    let (app, _) = app_with(None).await;
    let (status, body) = call(&app, Method::GET, "/api/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "error": "Endpoint not found"}));
}
