use axum_helpers::server::{create_production_app, create_router, health_router};
use axum_helpers::{create_cors_layer, create_permissive_cors_layer};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::mongodb::MongoConnection;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    // A missing .env file is fine; the process environment still applies
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    info!(
        project = %config.settings.project_name,
        environment = ?config.environment,
        access_token_expire_minutes = config.settings.access_token_expire_minutes,
        "Configuration loaded"
    );
    if config.settings.uses_default_secret_key() {
        warn!("SECRET_KEY is not set; using the placeholder value");
    }
    info!("Connecting to MongoDB at {}", config.mongodb.redacted_url());

    let connection = MongoConnection::initialize(&config.mongodb).await?;
    api::users::init_indexes(connection.database()).await?;

    let state = AppState {
        mongo: connection.database().clone(),
        config,
    };

    let cors = cors_layer(&state.config)?;
    let routes = api::routes(&state).merge(health_router(state.config.app));
    let app = create_router::<openapi::ApiDoc>(routes, cors, &state.config.settings.openapi_url());

    info!(
        "Starting {} with graceful shutdown ({}s timeout)",
        state.config.settings.project_name,
        SHUTDOWN_TIMEOUT.as_secs()
    );

    create_production_app(app, &state.config.server, SHUTDOWN_TIMEOUT, async move {
        info!("Shutting down: closing MongoDB connections");
        connection.close().await;
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Users MongoDB API shutdown complete");
    Ok(())
}

/// Permissive CORS while developing, the configured allow-list in production
fn cors_layer(config: &Config) -> eyre::Result<CorsLayer> {
    if config.environment.is_production() {
        Ok(create_cors_layer(config.settings.cors_origins.as_slice())?)
    } else {
        Ok(create_permissive_cors_layer())
    }
}
