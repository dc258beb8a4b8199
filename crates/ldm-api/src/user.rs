//! Caller identification.
//!
//! The user id comes from a configurable request header. When the header
//! is absent the configured default id is used, unless the server requires
//! an explicit id. A header that is present but unusable is always a 400.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use ldm_core::config::ServerConfig;

use crate::error::ApiError;
use crate::state::AppState;

/// Longest accepted user id.
pub const MAX_USER_ID_LEN: usize = 128;

/// The resolved user id for a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve the user id from request headers.
    pub fn resolve(
        headers: &axum::http::HeaderMap,
        server: &ServerConfig,
    ) -> Result<Self, ApiError> {
        let Some(value) = headers.get(server.user_id_header.as_str()) else {
            if server.require_user_id {
                return Err(ApiError::BadRequest(format!(
                    "missing {} header",
                    server.user_id_header
                )));
            }
            return Ok(UserId(server.default_user_id.clone()));
        };

        let raw = value.to_str().map_err(|_| {
            ApiError::BadRequest(format!(
                "{} header must be visible ASCII",
                server.user_id_header
            ))
        })?;
        let id = raw.trim();
        if id.is_empty() {
            return Err(ApiError::BadRequest(format!(
                "{} header cannot be blank",
                server.user_id_header
            )));
        }
        if id.len() > MAX_USER_ID_LEN {
            return Err(ApiError::BadRequest(format!(
                "{} header exceeds {} characters",
                server.user_id_header, MAX_USER_ID_LEN
            )));
        }
        Ok(UserId(id.to_string()))
    }
}

impl FromRequestParts<AppState> for UserId {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        UserId::resolve(&parts.headers, &state.config.server)
    }
}
