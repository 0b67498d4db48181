use axum::Json;
use axum::extract::State;
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::api::{ApiError, ApiState, AuthUser};

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) async fn index() -> Json<Value> {
    Json(json!({
        "message": "Welcome to Loto Game API",
        "endpoints": {
            "login": "POST /api/login",
            "profile": "GET /api/profile (requires auth)",
            "health": "GET /api/health",
        },
    }))
}

pub(crate) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": now() }))
}

pub(crate) async fn login(State(state): State<ApiState>, user: AuthUser) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Login successful",
        "user": {
            "username": user.username,
            "secret": &*state.admin_token,
        },
        "timestamp": now(),
    }))
}

pub(crate) async fn profile(user: AuthUser) -> Json<Value> {
    Json(json!({
        "user": { "username": user.username },
        "message": "This is a protected route",
        "timestamp": now(),
    }))
}

pub(crate) async fn not_found() -> ApiError {
    ApiError::NotFound
}
