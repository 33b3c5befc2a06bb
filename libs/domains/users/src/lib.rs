//! Users Domain
//!
//! CRUD with soft delete for the `User` resource, stored in MongoDB.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Uniqueness checks, hashing, no-op detection
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + MongoDB and in-memory implementations)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use database::mongodb::{MongoConfig, MongoConnection};
//! use domain_users::{handlers, MongoUserRepository, UserService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connection = MongoConnection::initialize(&MongoConfig::default()).await?;
//!
//! let repository = MongoUserRepository::new(connection.database().clone());
//! repository.create_indexes().await?;
//!
//! let router = handlers::router(UserService::new(repository));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod password;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{UserError, UserResult};
pub use handlers::ApiDoc;
pub use models::{
    CreateUser, RecordId, UpdateUser, User, UserFilter, UserMessageResponse, UserResponse,
};
pub use mongodb::MongoUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
