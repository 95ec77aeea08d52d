//! Player identity from request headers.
//!
//! Authentication happens upstream; by the time a request reaches this
//! server it carries an opaque, stable player identifier.

use std::fmt;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

/// Header carrying the player identifier.
pub const PLAYER_HEADER: &str = "x-player-id";

/// Longest accepted player identifier, in bytes.
pub const MAX_PLAYER_ID_LEN: usize = 128;

/// Opaque player identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(String);

impl PlayerId {
    /// Accept a non-empty identifier of printable ASCII.
    #[must_use]
    pub fn new(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let valid = !raw.is_empty()
            && raw.len() <= MAX_PLAYER_ID_LEN
            && raw.bytes().all(|b| b.is_ascii_graphic());
        valid.then(|| Self(raw.to_string()))
    }

    /// The identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for PlayerId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(PLAYER_HEADER)
            .ok_or(ApiError::MissingPlayer)?;
        header
            .to_str()
            .ok()
            .and_then(Self::new)
            .ok_or(ApiError::InvalidPlayer)
    }
}
