//! Database library providing the MongoDB connection handle and helpers
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB support
//! - `config` - Configuration support with `core_config::FromEnv`
//!
//! # Example
//!
//! ```ignore
//! use database::mongodb::{MongoConfig, MongoConnection};
//!
//! let config = MongoConfig::with_database("mongodb://localhost:27017", "mydb");
//! let connection = MongoConnection::initialize(&config).await?;
//! let users = connection.database().collection::<Document>("users");
//!
//! // on shutdown
//! connection.close().await;
//! ```

#[cfg(feature = "mongodb")]
pub mod mongodb;
