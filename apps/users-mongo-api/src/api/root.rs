//! Welcome endpoint

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone, Serialize, ToSchema)]
pub struct WelcomeResponse {
    pub message: String,
}

pub fn router(project_name: &str) -> Router {
    let welcome = WelcomeResponse {
        message: format!("Welcome to {project_name}!"),
    };

    Router::new()
        .route("/", get(welcome_handler))
        .with_state(Arc::new(welcome))
}

/// Greet API clients
#[utoipa::path(
    get,
    path = "/",
    tag = "Root",
    responses(
        (status = 200, description = "Welcome message", body = WelcomeResponse)
    )
)]
pub async fn welcome_handler(State(welcome): State<Arc<WelcomeResponse>>) -> Json<WelcomeResponse> {
    Json(welcome.as_ref().clone())
}
