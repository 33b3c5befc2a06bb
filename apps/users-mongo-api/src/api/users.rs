//! Users resource wiring

use axum::Router;
use database::mongodb::Database;
use domain_users::{MongoUserRepository, UserResult, UserService, handlers};

use crate::state::AppState;

/// Ensure the unique indexes the users collection relies on
pub async fn init_indexes(db: &Database) -> UserResult<()> {
    MongoUserRepository::new(db.clone()).create_indexes().await
}

pub fn router(state: &AppState) -> Router {
    let repository = MongoUserRepository::new(state.mongo.clone());
    handlers::router(UserService::new(repository))
}
