use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User with this user_id already exists")]
    UserIdTaken,

    #[error("User with this email already exists")]
    EmailTaken,

    #[error("User not found")]
    NotFound,

    #[error("No changes were made")]
    NoChanges,

    #[error("Invalid record id: {0}")]
    InvalidId(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type UserResult<T> = Result<T, UserError>;

/// Convert UserError to AppError for standardized error responses
impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::UserIdTaken | UserError::EmailTaken => AppError::Conflict(err.to_string()),
            UserError::NotFound => AppError::NotFound(err.to_string()),
            UserError::NoChanges => AppError::NoChanges(err.to_string()),
            UserError::InvalidId(_) => AppError::BadRequest(err.to_string()),
            UserError::PasswordHash(msg) => AppError::InternalServerError(msg),
            UserError::Database(msg) => AppError::Database(msg),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for UserError {
    fn from(err: mongodb::error::Error) -> Self {
        UserError::Database(err.to_string())
    }
}
