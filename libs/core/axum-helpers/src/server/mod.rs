//! Server infrastructure module.
//!
//! This module provides:
//! - Router setup with OpenAPI documentation and common middleware
//! - Health and readiness helpers
//! - Graceful shutdown with a bounded cleanup step
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router, health_router};
//! use core_config::app_info;
//!
//! let routes = api_routes.merge(health_router(app_info!()));
//! let router = create_router::<ApiDoc>(routes, cors, "/api/v1/openapi.json");
//!
//! create_production_app(router, &config.server, Duration::from_secs(30), cleanup).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{create_production_app, create_router};
pub use health::{HealthCheckFuture, HealthResponse, health_router, run_health_checks};
pub use shutdown::shutdown_signal;
