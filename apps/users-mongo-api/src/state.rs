//! Shared application state passed to the route builders.

use database::mongodb::Database;

use crate::config::Config;

/// Cheap to clone: the database handle shares the driver's connection pool.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: Config,
    /// Handle to the configured MongoDB database
    pub mongo: Database,
}
