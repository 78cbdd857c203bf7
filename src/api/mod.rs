//! HTTP API.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /api/departments/all` | grouped students |
//! | `GET /api/departments/{name}` | one category, by code or program name |
//! | `GET /api/metadata` | collection overview |
//! | `GET, POST /api/data` | raw documents |
//! | `PUT, DELETE /api/data/{id}` | single raw document |
//! | `GET /api/health` | liveness |
//! | `POST /api/sync` | run a sync now |

pub mod error;
mod handlers;

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post, put};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::models::ServerConfig;
use crate::pipeline::SyncJob;
use crate::services::Aggregator;
use crate::storage::DocumentStore;

pub use error::{ApiError, ApiResult};

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Aggregator,
    pub store: Arc<dyn DocumentStore>,
    /// `None` when no sheet source is configured
    pub sync: Option<Arc<SyncJob>>,
    pub started: Instant,
}

impl AppState {
    pub fn new(aggregator: Aggregator, sync: Option<Arc<SyncJob>>) -> Self {
        Self {
            store: Arc::clone(aggregator.store()),
            aggregator,
            sync,
            started: Instant::now(),
        }
    }
}

/// Browser origins from config; unparsable entries are skipped.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring CORS origin {:?}: {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

/// Build the API router.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/api/departments/all", get(handlers::list_grouped))
        .route("/api/departments/{name}", get(handlers::list_category))
        .route("/api/metadata", get(handlers::metadata))
        .route("/api/data", get(handlers::list_raw).post(handlers::create))
        .route(
            "/api/data/{id}",
            put(handlers::update).delete(handlers::delete),
        )
        .route("/api/health", get(handlers::health))
        .route("/api/sync", post(handlers::trigger_sync))
        .fallback(handlers::not_found)
        .layer(cors_layer(config))
        .with_state(state)
}
