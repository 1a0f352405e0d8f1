//! HTTP surface over the repositories and the alert service.

pub mod handlers;

use crate::core::StoreError;
use crate::repository::Repositories;
use crate::service::AlertService;
use crate::storage::CacheStore;
use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug)]
pub enum WebError {
    Store(StoreError),
    Input(String),
    NotFound(String),
    Internal(String),
}

impl From<StoreError> for WebError {
    fn from(err: StoreError) -> Self {
        WebError::Store(err)
    }
}

impl WebError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            WebError::Store(StoreError::InvalidArgument(msg)) | WebError::Input(msg) => {
                (StatusCode::BAD_REQUEST, msg, "invalid_argument")
            }
            WebError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "not_found"),
            WebError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg, "internal_error")
            }
            WebError::Store(err) => {
                tracing::error!(error = %err, "store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    err.to_string(),
                    "store_error",
                )
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, WebError>;

/// Runs a blocking store call on tokio's blocking pool.
///
/// Store writes hold the store lock across an fsync; async workers must not wait on that.
pub async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| WebError::Internal(format!("blocking task failed: {err}")))?
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CacheStore>,
    pub repos: Repositories,
    pub alerts: AlertService,
}

impl AppState {
    pub fn new(store: Arc<CacheStore>) -> Self {
        let repos = Repositories::new(Arc::clone(&store));
        let alerts = AlertService::new(repos.clone());
        Self {
            store,
            repos,
            alerts,
        }
    }

    /// Uses `alerts` (and the repositories behind it) instead of building defaults.
    pub fn with_alerts(store: Arc<CacheStore>, alerts: AlertService) -> Self {
        Self {
            store,
            repos: alerts.repositories().clone(),
            alerts,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/person",
            get(handlers::list_people)
                .post(handlers::create_person)
                .put(handlers::update_person)
                .delete(handlers::delete_person),
        )
        .route(
            "/firestation",
            get(handlers::get_firestation)
                .post(handlers::create_station_mapping)
                .put(handlers::update_station_mapping)
                .delete(handlers::delete_station_mapping),
        )
        .route(
            "/medicalRecord",
            get(handlers::list_medical_records)
                .post(handlers::create_medical_record)
                .put(handlers::update_medical_record)
                .delete(handlers::delete_medical_record),
        )
        .route("/childAlert", get(handlers::child_alert))
        .route("/phoneAlert", get(handlers::phone_alert))
        .route("/fire", get(handlers::fire))
        .route("/flood/stations", get(handlers::flood))
        .route("/personInfo", get(handlers::person_info))
        .route("/communityEmail", get(handlers::community_email))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
