use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{delete, get, put};
use axum::{Extension, Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{Instrument, debug};

use crate::error::{AppError, attach_correlation};
use crate::models::{AccountKeysResponse, PutKeyRequest};
use crate::state::AppState;
use crate::telemetry::{CorrelationId, correlation_layer, request_span};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .merge(key_routes())
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(correlation_layer))
        .with_state(state)
}

fn key_routes() -> Router<AppState> {
    Router::new()
        .route("/wallet/key", put(store_key))
        .route("/wallet/key/{account_id}", get(fetch_key))
        .route("/wallet/key/delete/{account_id}", delete(delete_key))
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.keys.health_check().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "unavailable" }))),
    }
}

/// Raw `Authorization` value. Non-UTF-8 bytes are kept lossily so the value
/// still counts as present and fails verification rather than looking absent.
fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}

/// Account id from the path, or `None` when the segment cannot be decoded.
/// The service decides what that means once the caller is verified.
fn account_id(path: Result<Path<String>, PathRejection>) -> Option<String> {
    match path {
        Ok(Path(account_id)) => Some(account_id),
        Err(rejection) => {
            debug!(%rejection, "account id path rejected");
            None
        }
    }
}

async fn fetch_key(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    headers: HeaderMap,
    path: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let span = request_span("http.get", &correlation.0);
    async move {
        let header = authorization(&headers);
        let record = state.keys.fetch(header.as_deref(), account_id(path)).await?;
        Ok((StatusCode::OK, Json(AccountKeysResponse::from(record))))
    }
    .instrument(span)
    .await
    .map_err(|err: AppError| attach_correlation(err, &correlation))
}

async fn store_key(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    headers: HeaderMap,
    body: Result<Json<PutKeyRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let span = request_span("http.put", &correlation.0);
    async move {
        let header = authorization(&headers);
        // An unreadable body still goes through verification first and then
        // fails field validation like any request with absent fields.
        let request = body.map(|Json(value)| value).unwrap_or_else(|rejection| {
            debug!(%rejection, "store request body rejected");
            PutKeyRequest::default()
        });
        let (account_id, secret) = request.into_parts();
        state.keys.store(header.as_deref(), account_id, secret).await?;
        Ok(StatusCode::CREATED)
    }
    .instrument(span)
    .await
    .map_err(|err: AppError| attach_correlation(err, &correlation))
}

async fn delete_key(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    headers: HeaderMap,
    path: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let span = request_span("http.delete", &correlation.0);
    async move {
        let header = authorization(&headers);
        state.keys.delete(header.as_deref(), account_id(path)).await?;
        Ok(StatusCode::OK)
    }
    .instrument(span)
    .await
    .map_err(|err: AppError| attach_correlation(err, &correlation))
}
