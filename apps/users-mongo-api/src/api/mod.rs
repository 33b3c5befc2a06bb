//! HTTP routes served by the users API.

pub mod health;
pub mod root;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Create all API routes
pub fn routes(state: &AppState) -> Router {
    Router::new()
        .merge(root::router(&state.config.settings.project_name))
        .merge(users::router(state))
        .merge(health::router(state.clone()))
}
