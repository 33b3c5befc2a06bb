use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::UserError;

/// Allowed characters for the public `user_id` handle.
pub static USER_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_-]+$").expect("user_id pattern is a valid regex")
});

/// Largest page a list request may ask for.
pub const MAX_LIMIT: u64 = 100;

/// Store-assigned record identifier.
///
/// Wraps the MongoDB `ObjectId`; on the wire it is always the 24-character
/// hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(ObjectId);

impl RecordId {
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    pub fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ObjectId> for RecordId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl FromStr for RecordId {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s)
            .map(Self)
            .map_err(|_| UserError::InvalidId(s.to_string()))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// User entity as held by the repositories.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: RecordId,
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub city: String,
    pub is_active: bool,
    /// Argon2 PHC string, never exposed in API responses
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user ready to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub city: String,
    pub is_active: bool,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    /// Build the insertable record from a request and an already hashed password.
    pub fn from_request(input: CreateUser, hashed_password: String, now: DateTime<Utc>) -> Self {
        Self {
            user_id: input.user_id,
            full_name: input.full_name,
            email: input.email,
            city: input.city,
            is_active: input.is_active,
            hashed_password,
            created_at: now,
        }
    }

    pub fn into_user(self, id: RecordId) -> User {
        User {
            id,
            user_id: self.user_id,
            full_name: self.full_name,
            email: self.email,
            city: self.city,
            is_active: self.is_active,
            hashed_password: self.hashed_password,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Lowercase the domain part of an email address; the local part keeps its case.
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn default_active() -> bool {
    true
}

/// DTO for creating a new user
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    /// Public handle: letters, digits, `_` and `-`
    #[validate(length(min = 3, max = 50), regex(path = *USER_ID_PATTERN))]
    #[schema(example = "alice01", min_length = 3, max_length = 50, pattern = r"^[a-zA-Z0-9_-]+$")]
    pub user_id: String,

    #[validate(length(min = 2, max = 100))]
    #[schema(example = "Alice Smith", min_length = 2, max_length = 100)]
    pub full_name: String,

    #[validate(email)]
    #[schema(example = "a@x.io", format = Email)]
    pub email: String,

    #[validate(length(min = 2, max = 100))]
    #[schema(example = "NYC", min_length = 2, max_length = 100)]
    pub city: String,

    #[serde(default = "default_active")]
    #[schema(default = true)]
    pub is_active: bool,

    #[validate(length(min = 6))]
    #[schema(example = "secret1", min_length = 6, format = Password)]
    pub password: String,
}

/// Fields are optional but not nullable: an explicit `null` fails to parse.
fn non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// DTO for updating an existing user. Omitted fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[serde(default, deserialize_with = "non_null")]
    #[validate(length(min = 2, max = 100))]
    pub full_name: Option<String>,

    #[serde(default, deserialize_with = "non_null")]
    #[validate(email)]
    #[schema(format = Email)]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "non_null")]
    #[validate(length(min = 2, max = 100))]
    #[schema(example = "Boston")]
    pub city: Option<String>,

    #[serde(default, deserialize_with = "non_null")]
    pub is_active: Option<bool>,

    #[serde(default, deserialize_with = "non_null")]
    #[validate(length(min = 6))]
    #[schema(format = Password)]
    pub password: Option<String>,
}

/// The stored fields an update will `$set`, built only from supplied values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub is_active: Option<bool>,
    pub hashed_password: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.city.is_none()
            && self.is_active.is_none()
            && self.hashed_password.is_none()
    }

    /// True if applying these changes would alter at least one stored value.
    pub fn differs_from(&self, user: &User) -> bool {
        self.full_name.as_ref().is_some_and(|v| *v != user.full_name)
            || self.email.as_ref().is_some_and(|v| *v != user.email)
            || self.city.as_ref().is_some_and(|v| *v != user.city)
            || self.is_active.is_some_and(|v| v != user.is_active)
            || self
                .hashed_password
                .as_ref()
                .is_some_and(|v| *v != user.hashed_password)
    }

    pub fn apply_to(self, user: &mut User, now: DateTime<Utc>) {
        if let Some(full_name) = self.full_name {
            user.full_name = full_name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(city) = self.city {
            user.city = city;
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
        if let Some(hashed_password) = self.hashed_password {
            user.hashed_password = hashed_password;
        }
        user.updated_at = now;
    }
}

/// Public view of a user. Carries no password material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, example = "65f1c0ffee0123456789abcd")]
    pub id: RecordId,
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub city: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            user_id: user.user_id,
            full_name: user.full_name,
            email: user.email,
            city: user.city,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Body returned by create and update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserMessageResponse {
    #[schema(example = "User created successfully")]
    pub message: String,
    pub user: UserResponse,
}

impl UserMessageResponse {
    pub fn new(message: impl Into<String>, user: User) -> Self {
        Self {
            message: message.into(),
            user: user.into(),
        }
    }
}

/// Query-string boolean that also accepts `1/0`, `yes/no`, `on/off`, `t/f` and `y/n`.
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "t" | "y" => Ok(Some(true)),
        "false" | "0" | "no" | "off" | "f" | "n" => Ok(Some(false)),
        _ => Err(de::Error::invalid_value(
            de::Unexpected::Str(&raw),
            &"a boolean",
        )),
    }
}

fn default_limit() -> u64 {
    10
}

/// Query parameters for listing users
#[derive(Debug, Clone, PartialEq, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilter {
    /// Number of records to skip
    #[serde(default)]
    pub skip: u64,
    /// Number of records to return (max 100)
    #[serde(default = "default_limit")]
    #[validate(range(max = MAX_LIMIT))]
    #[param(maximum = 100, default = 10)]
    pub limit: u64,
    /// Only users with this active flag
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_active: Option<bool>,
}

impl Default for UserFilter {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
            is_active: None,
        }
    }
}
