use mongodb::{Client, Database, options::ClientOptions};
use std::time::Duration;
use tracing::{error, info, instrument};

use super::{MongoConfig, check_health};

/// Error type for MongoDB operations
#[derive(Debug, thiserror::Error)]
pub enum MongoError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}

/// The process-wide MongoDB handle.
///
/// A value of this type only exists once [`MongoConnection::initialize`] has
/// connected and pinged the server, so "used before initialization" cannot
/// happen. `close` consumes the handle.
///
/// The driver keeps its own connection pool behind `Client`; cloning the
/// [`Database`] returned by [`MongoConnection::database`] is cheap and is how
/// repositories get access.
#[derive(Debug)]
pub struct MongoConnection {
    client: Client,
    database: Database,
}

impl MongoConnection {
    /// Connect using `config` and verify the server answers a `ping`.
    ///
    /// There is no retry: an unreachable server is reported immediately so the
    /// caller can refuse to start.
    #[instrument(skip(config), fields(url = %config.redacted_url(), database = %config.database))]
    pub async fn initialize(config: &MongoConfig) -> Result<Self, MongoError> {
        info!("Connecting to MongoDB");

        let options = client_options(config).await.inspect_err(|e| {
            error!(error = %e, "Invalid MongoDB connection options");
        })?;
        let client = Client::with_options(options)?;
        let database = client.database(&config.database);

        let connection = Self { client, database };
        connection.ping().await.map_err(|e| {
            error!(error = %e, "MongoDB did not answer ping");
            MongoError::ConnectionFailed(e.to_string())
        })?;

        info!("Successfully connected to MongoDB");
        Ok(connection)
    }

    /// The configured database
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Run `{ ping: 1 }` against the configured database
    pub async fn ping(&self) -> Result<(), MongoError> {
        check_health(&self.database).await
    }

    /// Shut the client down and release its connections.
    pub async fn close(self) {
        info!(database = %self.database.name(), "Closing MongoDB connection");
        self.client.shutdown().await;
        info!("MongoDB connection closed");
    }
}

async fn client_options(config: &MongoConfig) -> Result<ClientOptions, MongoError> {
    let mut options = ClientOptions::parse(&config.url).await?;

    options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
    options.server_selection_timeout =
        Some(Duration::from_secs(config.server_selection_timeout_secs));

    if let Some(ref app_name) = config.app_name {
        options.app_name = Some(app_name.clone());
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_options_apply_config() {
        let config = MongoConfig {
            connect_timeout_secs: 3,
            server_selection_timeout_secs: 4,
            ..MongoConfig::with_database("mongodb://localhost:27017", "test")
        }
        .with_app_name("users-api");

        let options = client_options(&config).await.unwrap();
        assert_eq!(options.connect_timeout, Some(Duration::from_secs(3)));
        assert_eq!(options.server_selection_timeout, Some(Duration::from_secs(4)));
        assert_eq!(options.app_name.as_deref(), Some("users-api"));
    }

    #[tokio::test]
    async fn test_initialize_rejects_malformed_url() {
        let config = MongoConfig::with_database("not-a-mongo-url", "test");
        let result = MongoConnection::initialize(&config).await;
        assert!(matches!(result, Err(MongoError::Mongo(_))));
    }

    #[tokio::test]
    async fn test_initialize_fails_fast_when_unreachable() {
        let config = MongoConfig {
            connect_timeout_secs: 1,
            server_selection_timeout_secs: 1,
            ..MongoConfig::with_database("mongodb://127.0.0.1:1", "test")
        };
        let result = MongoConnection::initialize(&config).await;
        assert!(matches!(result, Err(MongoError::ConnectionFailed(_))));
    }

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn test_initialize_and_close() {
        let url = std::env::var("MONGODB_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let connection = MongoConnection::initialize(&MongoConfig::with_database(url, "test"))
            .await
            .unwrap();
        assert_eq!(connection.database().name(), "test");
        connection.close().await;
    }
}
