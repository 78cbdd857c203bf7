// src/api/handlers.rs

use std::time::Instant;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use serde_json::{Value, json};

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::error::AppError;
use crate::models::{DocumentId, RawDocument};
use crate::storage::Filter;

/// Accept only a JSON object as a document body.
fn document_body(body: Result<Json<Value>, JsonRejection>) -> ApiResult<RawDocument> {
    let Json(value) = body?;
    match value {
        Value::Object(map) => Ok(RawDocument::from(map)),
        _ => Err(AppError::validation("request body must be a JSON object").into()),
    }
}

pub async fn list_grouped(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let started = Instant::now();
    let groups = state.aggregator.get_all().await?;

    Ok(Json(json!({
        "success": true,
        "timestamp": Utc::now(),
        "responseTime": format!("{}ms", started.elapsed().as_millis()),
        "data": groups,
    })))
}

pub async fn list_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    let listing = state.aggregator.get_by_category(&name).await?;

    Ok(Json(json!({
        "success": true,
        "department": listing.category,
        "count": listing.count,
        "data": listing.students,
    })))
}

pub async fn metadata(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let metadata = state.aggregator.get_stats().await?;
    Ok(Json(json!({ "success": true, "metadata": metadata })))
}

pub async fn list_raw(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let documents = state.store.find_all(&Filter::All).await?;
    Ok(Json(json!({
        "success": true,
        "count": documents.len(),
        "data": documents,
    })))
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let document = document_body(body)?;
    let id = state.store.insert_one(document).await?;
    log::info!("Document inserted with id {}", id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Document added successfully",
            "insertedId": id,
        })),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let id = DocumentId::parse(&id)?;
    let patch = document_body(body)?;
    let modified = state.store.update_one(&id, patch).await?;
    log::info!("Document {} updated: {} modified", id, modified);

    Ok(Json(json!({
        "success": true,
        "message": "Document updated successfully",
        "modifiedCount": modified,
    })))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = DocumentId::parse(&id)?;
    let deleted = state.store.delete_one(&id).await?;
    log::info!("Document {} deleted: {} removed", id, deleted);

    Ok(Json(json!({
        "success": true,
        "message": "Document deleted successfully",
        "deletedCount": deleted,
    })))
}

/// Liveness check. Reports store reachability but never fails itself.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let connected = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Health check: store unreachable: {}", e);
            false
        }
    };

    Json(json!({
        "status": if connected { "healthy" } else { "database-disconnected" },
        "time": Utc::now(),
        "uptime": state.started.elapsed().as_secs_f64(),
        "storeConnected": connected,
    }))
}

pub async fn trigger_sync(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let job = state
        .sync
        .as_ref()
        .ok_or_else(|| AppError::config("no sheet source is configured"))?;
    let report = job.run().await?;

    Ok(Json(json!({
        "success": true,
        "recordCount": report.record_count,
        "outcome": report.outcome,
        "syncedAt": report.synced_at,
        "generation": report.generation,
    })))
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "Endpoint not found" })),
    )
}
