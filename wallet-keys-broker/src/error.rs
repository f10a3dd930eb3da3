use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::service::KeyError;
use crate::telemetry::{CORRELATION_ID_HEADER, CorrelationId, correlation_header_value};

#[derive(Debug, Error)]
#[error("{kind}")]
pub struct AppError {
    kind: KeyError,
    correlation_id: Option<String>,
}

impl AppError {
    pub fn new(kind: KeyError) -> Self {
        Self {
            kind,
            correlation_id: None,
        }
    }

    pub fn with_correlation(mut self, id: String) -> Self {
        self.correlation_id = Some(id);
        self
    }

    pub fn status(&self) -> StatusCode {
        status_for(&self.kind)
    }
}

pub fn status_for(kind: &KeyError) -> StatusCode {
    match kind {
        KeyError::TokenMissing | KeyError::InvalidKey => StatusCode::BAD_REQUEST,
        KeyError::TokenVerificationFailed => StatusCode::UNAUTHORIZED,
        KeyError::KeyNotFound => StatusCode::NOT_FOUND,
        KeyError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<KeyError> for AppError {
    fn from(value: KeyError) -> Self {
        AppError::new(value)
    }
}

/// Error responses carry only a status code and the correlation header.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();
        if let Some(value) = self
            .correlation_id
            .as_deref()
            .and_then(correlation_header_value)
        {
            response.headers_mut().insert(CORRELATION_ID_HEADER, value);
        }
        response
    }
}

pub fn attach_correlation(err: AppError, correlation: &CorrelationId) -> AppError {
    err.with_correlation(correlation.0.clone())
}
