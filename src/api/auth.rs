//! HTTP Basic authentication against the in-memory credential store.

use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;
use tracing::debug;

use crate::api::ApiState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    MissingAuthorization,
    MalformedAuthorization,
    InvalidCredentials,
    NotFound,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn body(&self) -> (&'static str, &'static str) {
        match self {
            ApiError::MissingAuthorization => {
                ("Unauthorized", "Missing or invalid Authorization header")
            }
            ApiError::MalformedAuthorization => {
                ("Unauthorized", "Invalid Authorization header format")
            }
            ApiError::InvalidCredentials => ("Unauthorized", "Invalid credentials"),
            ApiError::NotFound => ("Not Found", "The requested resource was not found"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (error, message) = self.body();
        (self.status(), Json(json!({ "error": error, "message": message }))).into_response()
    }
}

/// A request that carried valid Basic credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
}

impl FromRequestParts<ApiState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::MissingAuthorization)?;
        let encoded = header
            .strip_prefix("Basic ")
            .ok_or(ApiError::MissingAuthorization)?;

        let (username, password) = decode_basic(encoded)?;

        let known = state
            .users
            .iter()
            .any(|u| u.username == username && u.password == password);
        if !known {
            debug!(%username, "rejected login");
            return Err(ApiError::InvalidCredentials);
        }

        Ok(AuthUser { username })
    }
}

/// Decode the `user:password` pair of a Basic credential.
fn decode_basic(encoded: &str) -> Result<(String, String), ApiError> {
    let raw = STANDARD
        .decode(encoded.trim())
        .map_err(|_| ApiError::MalformedAuthorization)?;
    let text = String::from_utf8(raw).map_err(|_| ApiError::MalformedAuthorization)?;
    let (username, password) = text
        .split_once(':')
        .ok_or(ApiError::InvalidCredentials)?;
    Ok((username.to_string(), password.to_string()))
}
