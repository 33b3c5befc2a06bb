//! MongoDB connection handle and MongoDB-specific helpers.

mod config;
mod connector;
mod errors;
mod health;

pub use config::{DEFAULT_DATABASE, DEFAULT_URL, MongoConfig};
pub use connector::{MongoConnection, MongoError};
pub use errors::{DUPLICATE_KEY_CODE, is_duplicate_key_error};
pub use health::{HealthStatus, check_health, check_health_detailed};

// Re-export MongoDB types for convenience
pub use mongodb::Database;
