//! MongoDB implementation of UserRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database::mongodb::is_duplicate_key_error;
use futures::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{self, Document, doc, oid::ObjectId},
    options::{FindOptions, IndexOptions},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{UserError, UserResult};
use crate::models::{NewUser, User, UserChanges, UserFilter};
use crate::repository::UserRepository;

pub const COLLECTION: &str = "users";

const USER_ID_INDEX: &str = "user_id_unique";
const EMAIL_INDEX: &str = "email_unique";

/// Stored shape of a user document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    user_id: String,
    full_name: String,
    email: String,
    city: String,
    is_active: bool,
    hashed_password: String,
    created_at: bson::DateTime,
    updated_at: bson::DateTime,
}

fn to_bson_datetime(value: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(value.timestamp_millis())
}

fn from_bson_datetime(value: bson::DateTime) -> UserResult<DateTime<Utc>> {
    let millis = value.timestamp_millis();
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| UserError::Database(format!("stored timestamp {millis} is out of range")))
}

impl From<NewUser> for UserDocument {
    fn from(user: NewUser) -> Self {
        let created_at = to_bson_datetime(user.created_at);
        Self {
            id: None,
            user_id: user.user_id,
            full_name: user.full_name,
            email: user.email,
            city: user.city,
            is_active: user.is_active,
            hashed_password: user.hashed_password,
            created_at,
            updated_at: created_at,
        }
    }
}

impl TryFrom<UserDocument> for User {
    type Error = UserError;

    fn try_from(doc: UserDocument) -> Result<Self, Self::Error> {
        let id = doc
            .id
            .ok_or_else(|| UserError::Database("user document has no _id".to_string()))?;

        Ok(User {
            id: id.into(),
            user_id: doc.user_id,
            full_name: doc.full_name,
            email: doc.email,
            city: doc.city,
            is_active: doc.is_active,
            hashed_password: doc.hashed_password,
            created_at: from_bson_datetime(doc.created_at)?,
            updated_at: from_bson_datetime(doc.updated_at)?,
        })
    }
}

/// MongoDB implementation of the UserRepository
pub struct MongoUserRepository {
    collection: Collection<UserDocument>,
}

impl MongoUserRepository {
    /// Create a new MongoUserRepository over the `users` collection
    ///
    /// # Example
    /// ```ignore
    /// let connection = MongoConnection::initialize(&config).await?;
    /// let repo = MongoUserRepository::new(connection.database().clone());
    /// repo.create_indexes().await?;
    /// ```
    pub fn new(db: Database) -> Self {
        Self::with_collection(db, COLLECTION)
    }

    /// Create a new MongoUserRepository with a custom collection name
    pub fn with_collection(db: Database, collection_name: &str) -> Self {
        let collection = db.collection::<UserDocument>(collection_name);
        Self { collection }
    }

    /// Ensure the unique indexes on `user_id` and `email` exist.
    #[instrument(skip(self))]
    pub async fn create_indexes(&self) -> UserResult<()> {
        let unique = |name: &str| IndexOptions::builder().unique(true).name(name.to_string()).build();

        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "user_id": 1 })
                .options(unique(USER_ID_INDEX))
                .build(),
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(unique(EMAIL_INDEX))
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("User indexes ensured");
        Ok(())
    }

    /// Build a MongoDB filter document from UserFilter
    fn build_filter(filter: &UserFilter) -> Document {
        match filter.is_active {
            Some(active) => doc! { "is_active": active },
            None => doc! {},
        }
    }

    /// Build the guarded `(filter, update)` pair for a partial update.
    ///
    /// The filter only matches when some supplied field differs from the
    /// stored value, so an update repeating current values modifies nothing.
    fn build_update(
        user_id: &str,
        changes: UserChanges,
        now: DateTime<Utc>,
    ) -> (Document, Document) {
        let mut set = Document::new();

        if let Some(full_name) = changes.full_name {
            set.insert("full_name", full_name);
        }
        if let Some(email) = changes.email {
            set.insert("email", email);
        }
        if let Some(city) = changes.city {
            set.insert("city", city);
        }
        if let Some(is_active) = changes.is_active {
            set.insert("is_active", is_active);
        }
        if let Some(hashed_password) = changes.hashed_password {
            set.insert("hashed_password", hashed_password);
        }

        let differs: Vec<Document> = set
            .iter()
            .map(|(field, value)| {
                let mut guard = Document::new();
                guard.insert(field.clone(), doc! { "$ne": value.clone() });
                guard
            })
            .collect();

        set.insert("updated_at", to_bson_datetime(now));

        let filter = doc! { "user_id": user_id, "$or": differs };
        (filter, doc! { "$set": set })
    }

    /// Map a unique-index violation to the matching conflict.
    fn conflict_or(err: mongodb::error::Error) -> UserError {
        if !is_duplicate_key_error(&err) {
            return err.into();
        }
        if err.to_string().contains(EMAIL_INDEX) {
            UserError::EmailTaken
        } else {
            UserError::UserIdTaken
        }
    }

    async fn find_one(&self, filter: Document) -> UserResult<Option<User>> {
        self.collection
            .find_one(filter)
            .await?
            .map(User::try_from)
            .transpose()
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    async fn insert(&self, user: NewUser) -> UserResult<User> {
        let result = self
            .collection
            .insert_one(UserDocument::from(user))
            .await
            .map_err(Self::conflict_or)?;

        let id = result.inserted_id.as_object_id().ok_or_else(|| {
            UserError::Database(format!("unexpected inserted id {}", result.inserted_id))
        })?;

        let user = self
            .find_one(doc! { "_id": id })
            .await?
            .ok_or_else(|| UserError::Database(format!("inserted user {} not found", id)))?;

        tracing::info!(id = %user.id, "User created successfully");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_user_id(&self, user_id: &str) -> UserResult<Option<User>> {
        self.find_one(doc! { "user_id": user_id }).await
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        self.find_one(doc! { "email": email }).await
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: UserFilter) -> UserResult<Vec<User>> {
        // The driver treats limit 0 as "no limit".
        if filter.limit == 0 {
            return Ok(Vec::new());
        }

        let options = FindOptions::builder()
            .skip(filter.skip)
            .limit(i64::try_from(filter.limit).unwrap_or(i64::MAX))
            .build();

        let documents: Vec<UserDocument> = self
            .collection
            .find(Self::build_filter(&filter))
            .with_options(options)
            .await?
            .try_collect()
            .await?;

        documents.into_iter().map(User::try_from).collect()
    }

    #[instrument(skip(self, changes))]
    async fn update(
        &self,
        user_id: &str,
        changes: UserChanges,
        now: DateTime<Utc>,
    ) -> UserResult<u64> {
        if changes.is_empty() {
            return Ok(0);
        }

        let (filter, update) = Self::build_update(user_id, changes, now);
        let result = self
            .collection
            .update_one(filter, update)
            .await
            .map_err(|e| {
                if is_duplicate_key_error(&e) {
                    UserError::EmailTaken
                } else {
                    e.into()
                }
            })?;

        tracing::info!(modified = result.modified_count, "User update applied");
        Ok(result.modified_count)
    }

    #[instrument(skip(self))]
    async fn deactivate(&self, user_id: &str, now: DateTime<Utc>) -> UserResult<u64> {
        let result = self
            .collection
            .update_one(
                doc! { "user_id": user_id },
                doc! { "$set": { "is_active": false, "updated_at": to_bson_datetime(now) } },
            )
            .await?;

        tracing::info!(matched = result.matched_count, "User deactivated");
        Ok(result.matched_count)
    }
}
