use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::{NewUser, RecordId, User, UserChanges, UserFilter};

/// Repository trait for User persistence
///
/// Lookups are by the public `user_id`; the store-assigned id is only
/// used to read back a freshly inserted record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user and return it as stored.
    ///
    /// A unique-index violation surfaces as `UserIdTaken` or `EmailTaken`.
    async fn insert(&self, user: NewUser) -> UserResult<User>;

    /// Find a user by `user_id`, active or not
    async fn find_by_user_id(&self, user_id: &str) -> UserResult<Option<User>>;

    /// Find a user by email, active or not
    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// List users in store order, honouring skip/limit/is_active
    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>>;

    /// Apply `changes` plus `updated_at = now`, but only if at least one
    /// supplied value differs from the stored one. Returns the number of
    /// modified records (0 or 1).
    async fn update(
        &self,
        user_id: &str,
        changes: UserChanges,
        now: DateTime<Utc>,
    ) -> UserResult<u64>;

    /// Set `is_active = false` and `updated_at = now`. Returns the number of
    /// matched records (0 or 1).
    async fn deactivate(&self, user_id: &str, now: DateTime<Utc>) -> UserResult<u64>;
}

/// In-memory implementation of UserRepository (for development/testing)
///
/// Keeps insertion order so listing behaves like a collection scan, and
/// enforces the same uniqueness rules as the MongoDB indexes.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<Vec<User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: NewUser) -> UserResult<User> {
        let mut users = self.users.write().await;

        if users.iter().any(|u| u.user_id == user.user_id) {
            return Err(UserError::UserIdTaken);
        }
        if users.iter().any(|u| u.email == user.email) {
            return Err(UserError::EmailTaken);
        }

        let user = user.into_user(RecordId::new());
        users.push(user.clone());

        tracing::info!(user_id = %user.user_id, id = %user.id, "Created user");
        Ok(user)
    }

    async fn find_by_user_id(&self, user_id: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>> {
        let users = self.users.read().await;

        let result = users
            .iter()
            .filter(|u| filter.is_active.is_none_or(|active| u.is_active == active))
            .skip(usize::try_from(filter.skip).unwrap_or(usize::MAX))
            .take(usize::try_from(filter.limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(result)
    }

    async fn update(
        &self,
        user_id: &str,
        changes: UserChanges,
        now: DateTime<Utc>,
    ) -> UserResult<u64> {
        let mut users = self.users.write().await;

        if let Some(ref email) = changes.email {
            if users.iter().any(|u| u.user_id != user_id && u.email == *email) {
                return Err(UserError::EmailTaken);
            }
        }

        match users.iter_mut().find(|u| u.user_id == user_id) {
            Some(user) if changes.differs_from(user) => {
                changes.apply_to(user, now);
                tracing::info!(user_id = %user_id, "Updated user");
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn deactivate(&self, user_id: &str, now: DateTime<Utc>) -> UserResult<u64> {
        let mut users = self.users.write().await;

        match users.iter_mut().find(|u| u.user_id == user_id) {
            Some(user) => {
                user.is_active = false;
                user.updated_at = now;
                tracing::info!(user_id = %user_id, "Deactivated user");
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(user_id: &str, email: &str) -> NewUser {
        NewUser {
            user_id: user_id.to_string(),
            full_name: "Test User".to_string(),
            email: email.to_string(),
            city: "NYC".to_string(),
            is_active: true,
            hashed_password: "$argon2id$hash".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = InMemoryUserRepository::new();
        let created = repo.insert(new_user("alice01", "a@x.io")).await.unwrap();

        let by_id = repo.find_by_user_id("alice01").await.unwrap().unwrap();
        let by_email = repo.find_by_email("a@x.io").await.unwrap().unwrap();
        assert_eq!(by_id, created);
        assert_eq!(by_email.id, created.id);
    }

    #[tokio::test]
    async fn test_insert_enforces_uniqueness() {
        let repo = InMemoryUserRepository::new();
        repo.insert(new_user("alice01", "a@x.io")).await.unwrap();

        let dup_id = repo.insert(new_user("alice01", "b@x.io")).await;
        assert!(matches!(dup_id, Err(UserError::UserIdTaken)));

        let dup_email = repo.insert(new_user("bob01", "a@x.io")).await;
        assert!(matches!(dup_email, Err(UserError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order_and_paginates() {
        let repo = InMemoryUserRepository::new();
        for i in 0..5 {
            repo.insert(new_user(&format!("user{i}"), &format!("u{i}@x.io")))
                .await
                .unwrap();
        }

        let page = repo
            .list(UserFilter {
                skip: 1,
                limit: 2,
                is_active: None,
            })
            .await
            .unwrap();
        let ids: Vec<_> = page.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, ["user1", "user2"]);

        let empty = repo
            .list(UserFilter {
                limit: 0,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_update_is_guarded_by_differences() {
        let repo = InMemoryUserRepository::new();
        repo.insert(new_user("alice01", "a@x.io")).await.unwrap();

        let same = UserChanges {
            city: Some("NYC".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.update("alice01", same, Utc::now()).await.unwrap(), 0);

        let moved = UserChanges {
            city: Some("Boston".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.update("alice01", moved, Utc::now()).await.unwrap(), 1);

        let stored = repo.find_by_user_id("alice01").await.unwrap().unwrap();
        assert_eq!(stored.city, "Boston");
        assert!(stored.updated_at >= stored.created_at);
    }

    #[tokio::test]
    async fn test_update_rejects_taken_email() {
        let repo = InMemoryUserRepository::new();
        repo.insert(new_user("alice01", "a@x.io")).await.unwrap();
        repo.insert(new_user("bob01", "b@x.io")).await.unwrap();

        let changes = UserChanges {
            email: Some("a@x.io".to_string()),
            ..Default::default()
        };
        let result = repo.update("bob01", changes, Utc::now()).await;
        assert!(matches!(result, Err(UserError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_deactivate_keeps_record() {
        let repo = InMemoryUserRepository::new();
        repo.insert(new_user("alice01", "a@x.io")).await.unwrap();

        assert_eq!(repo.deactivate("alice01", Utc::now()).await.unwrap(), 1);
        assert_eq!(repo.deactivate("nobody", Utc::now()).await.unwrap(), 0);

        let stored = repo.find_by_user_id("alice01").await.unwrap().unwrap();
        assert!(!stored.is_active);

        let inactive = repo
            .list(UserFilter {
                is_active: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(inactive.len(), 1);
    }
}
