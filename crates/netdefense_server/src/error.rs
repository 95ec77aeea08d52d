//! HTTP-facing error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use netdefense_core::error::{ErrorKind, GameError};
use serde::Serialize;
use thiserror::Error;

use crate::config::CatalogLoadError;
use crate::store::StoreError;

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A game rule rejected the request.
    #[error(transparent)]
    Game(#[from] GameError),

    /// The document store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The request carried no player identifier.
    #[error("Missing x-player-id header")]
    MissingPlayer,

    /// The player identifier header was malformed.
    #[error("Malformed x-player-id header")]
    InvalidPlayer,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Stable error tag.
    pub error: String,
    /// Human-readable rejection message.
    pub reason: String,
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Game(err) => match err.kind() {
                ErrorKind::TileNotFound
                | ErrorKind::BuildingNotFound
                | ErrorKind::ConnectionNotFound
                | ErrorKind::IncidentNotFound => StatusCode::NOT_FOUND,
                ErrorKind::InsufficientFunds | ErrorKind::InsufficientItems => {
                    StatusCode::PAYMENT_REQUIRED
                }
                ErrorKind::InvalidCatalog => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
            Self::Store(StoreError::Conflict { .. }) => StatusCode::CONFLICT,
            Self::Store(StoreError::Codec(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MissingPlayer | Self::InvalidPlayer => StatusCode::UNAUTHORIZED,
        }
    }

    /// Stable tag for the response body.
    #[must_use]
    pub fn tag(&self) -> String {
        match self {
            Self::Game(err) => format!("{:?}", err.kind()),
            Self::Store(StoreError::Conflict { .. }) => "StoreConflict".to_string(),
            Self::Store(StoreError::Codec(_)) => "StoreFailure".to_string(),
            Self::MissingPlayer | Self::InvalidPlayer => "Unauthorized".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.tag(),
            reason: self.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(error = %body.error, reason = %body.reason, "Request failed");
        } else {
            tracing::warn!(error = %body.error, reason = %body.reason, "Request rejected");
        }
        (status, Json(body)).into_response()
    }
}

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Game data failed to load.
    #[error(transparent)]
    Load(#[from] CatalogLoadError),

    /// Socket error.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}
