//! User Service - Business logic layer

use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{UserError, UserResult};
use crate::models::{
    CreateUser, NewUser, UpdateUser, User, UserChanges, UserFilter, normalize_email,
};
use crate::password::hash_password;
use crate::repository::UserRepository;

/// User service providing business logic operations
///
/// Input shape is validated by the extractors before it gets here; the
/// service enforces uniqueness, hashing and the no-op rule.
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    /// Create a new UserService with the given repository
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a new user
    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    pub async fn create_user(&self, mut input: CreateUser) -> UserResult<User> {
        input.email = normalize_email(&input.email);

        if self
            .repository
            .find_by_user_id(&input.user_id)
            .await?
            .is_some()
        {
            return Err(UserError::UserIdTaken);
        }

        if self.repository.find_by_email(&input.email).await?.is_some() {
            return Err(UserError::EmailTaken);
        }

        let hashed_password = hash_password(&input.password)?;
        let new_user = NewUser::from_request(input, hashed_password, Utc::now());

        self.repository.insert(new_user).await
    }

    /// List users with pagination and an optional active filter
    #[instrument(skip(self))]
    pub async fn list_users(&self, filter: UserFilter) -> UserResult<Vec<User>> {
        self.repository.list(filter).await
    }

    /// Get a user by `user_id`, active or not
    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: &str) -> UserResult<User> {
        self.repository
            .find_by_user_id(user_id)
            .await?
            .ok_or(UserError::NotFound)
    }

    /// Apply a partial update and return the stored result
    #[instrument(skip(self, input))]
    pub async fn update_user(&self, user_id: &str, input: UpdateUser) -> UserResult<User> {
        self.get_user(user_id).await?;

        let email = input.email.as_deref().map(normalize_email);
        if let Some(ref email) = email {
            if let Some(owner) = self.repository.find_by_email(email).await? {
                if owner.user_id != user_id {
                    return Err(UserError::EmailTaken);
                }
            }
        }

        let changes = UserChanges {
            full_name: input.full_name,
            email,
            city: input.city,
            is_active: input.is_active,
            hashed_password: input.password.as_deref().map(hash_password).transpose()?,
        };

        if changes.is_empty() {
            return Err(UserError::NoChanges);
        }

        let modified = self
            .repository
            .update(user_id, changes, Utc::now())
            .await?;
        if modified == 0 {
            return Err(UserError::NoChanges);
        }

        self.get_user(user_id).await
    }

    /// Soft-delete a user by clearing `is_active`
    #[instrument(skip(self))]
    pub async fn deactivate_user(&self, user_id: &str) -> UserResult<()> {
        let matched = self.repository.deactivate(user_id, Utc::now()).await?;
        if matched == 0 {
            return Err(UserError::NotFound);
        }
        Ok(())
    }
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
