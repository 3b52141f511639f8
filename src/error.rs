//! Error types for the catalog gateway
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Catalog Error Enum ==
/// Unified error type for the catalog gateway.
///
/// `Clone` because a single failed upstream batch is delivered to every
/// requester attached to it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Bad caller input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Upstream call failed or returned a non-success status
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    /// Unexpected runtime failure
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CatalogError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CatalogError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            CatalogError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the catalog gateway.
pub type Result<T> = std::result::Result<T, CatalogError>;
