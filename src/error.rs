//! HTTP error type shared by both services.
//!
//! Every error body is `{"message": "..."}`. Server-side failures are logged
//! with their cause and reported to the client without internals, except the
//! catalog users proxy whose message is part of its contract.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::bus::BusError;
use crate::catalog::CatalogError;
use crate::envelope::EnvelopeError;
use crate::identity::{AuthError, RequesterError};
use crate::storage::StorageError;

/// Errors returned from HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Broker error: {0}")]
    Bus(#[from] BusError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Error fetching users: {0}")]
    Upstream(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Bus(_)
            | ApiError::Storage(_)
            | ApiError::Envelope(_)
            | ApiError::Auth(_)
            | ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(m)
            | ApiError::Unauthorized(m)
            | ApiError::NotFound(m)
            | ApiError::Conflict(m) => m.clone(),
            ApiError::Upstream(_) => self.to_string(),
            _ => "Internal service error".to_string(),
        }
    }
}

impl From<RequesterError> for ApiError {
    fn from(e: RequesterError) -> Self {
        match e {
            RequesterError::Bus(e) => ApiError::Bus(e),
            RequesterError::Envelope(e) => ApiError::Envelope(e),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Upstream(e) => ApiError::Upstream(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = %status, error = %self, "Request failed");
        }
        (status, Json(json!({ "message": self.public_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_client_errors_expose_message() {
        let (status, body) = body_of(ApiError::Conflict("Email already registered".into())).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Email already registered");
    }

    #[tokio::test]
    async fn test_internal_errors_are_sanitized() {
        let (status, body) =
            body_of(ApiError::Bus(BusError::Connection("amqp://secret@host".into()))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal service error");
    }

    #[tokio::test]
    async fn test_upstream_error_keeps_prefix() {
        let (status, body) = body_of(ApiError::Upstream("connection refused".into())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Error fetching users: connection refused");
    }

    #[test]
    fn test_requester_error_maps_to_server_error() {
        let err: ApiError = RequesterError::Bus(BusError::Receive("gone".into())).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
