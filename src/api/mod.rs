//! REST login API
//!
//! A small HTTP API next to the relay. Its only link to the relay is the
//! admin token: an authenticated `POST /api/login` returns it as `secret`, and
//! a client that presents it as `clientName` is admitted as admin.

mod auth;
mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::{ApiSettings, UserCredentials};
use crate::utils::RelayError;

pub use auth::{ApiError, AuthUser};

#[derive(Debug, Clone)]
pub struct ApiState {
    pub users: Arc<Vec<UserCredentials>>,
    pub admin_token: Arc<str>,
}

impl ApiState {
    pub fn new(users: Vec<UserCredentials>, admin_token: &str) -> Self {
        Self {
            users: Arc::new(users),
            admin_token: Arc::from(admin_token),
        }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/health", get(handlers::health))
        .route("/api/login", post(handlers::login))
        .route("/api/profile", get(handlers::profile))
        .fallback(handlers::not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_api_server(settings: &ApiSettings, admin_token: &str) -> Result<(), RelayError> {
    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("login API listening on http://{addr}");

    let app = router(ApiState::new(settings.users.clone(), admin_token));
    axum::serve(listener, app).await?;
    Ok(())
}
