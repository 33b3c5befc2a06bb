//! MongoDB test infrastructure
//!
//! Provides a `TestMongo` helper that creates a MongoDB container for testing.

use database::mongodb::{MongoConfig, MongoConnection};
use mongodb::Database;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::mongo::Mongo;

/// Test MongoDB wrapper that ensures proper cleanup
///
/// The container is automatically stopped and removed when this struct is dropped.
///
/// # Example
///
/// ```no_run
/// use test_utils::TestMongo;
///
/// # async fn example() {
/// let mongo = TestMongo::new().await;
/// let db = mongo.database();
/// // Pass db to your repository
/// # }
/// ```
pub struct TestMongo {
    #[allow(dead_code)]
    container: ContainerAsync<Mongo>,
    connection: MongoConnection,
    pub connection_string: String,
}

impl TestMongo {
    /// Create a new test MongoDB instance with a database named `test`
    ///
    /// Uses the MongoDB 7 image.
    pub async fn new() -> Self {
        Self::with_database("test").await
    }

    /// Create a new test MongoDB instance using `database` as the default database
    pub async fn with_database(database: &str) -> Self {
        let container = Mongo::default()
            .with_tag("7")
            .start()
            .await
            .expect("Failed to start MongoDB container");

        let host_port = container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");

        let connection_string = format!("mongodb://127.0.0.1:{}", host_port);

        let config = MongoConfig::with_database(connection_string.clone(), database)
            .with_app_name("test-utils");
        let connection = MongoConnection::initialize(&config)
            .await
            .expect("Failed to connect to MongoDB");

        tracing::info!(port = host_port, "Test MongoDB ready (mongo:7)");

        Self {
            container,
            connection,
            connection_string,
        }
    }

    /// Get a handle to the test database (cheap to clone)
    pub fn database(&self) -> Database {
        self.connection.database().clone()
    }

    /// Get the underlying connection handle
    pub fn connection(&self) -> &MongoConnection {
        &self.connection
    }

    /// Get the connection string for manual client creation
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

// Container is automatically cleaned up when TestMongo is dropped
impl Drop for TestMongo {
    fn drop(&mut self) {
        tracing::debug!("Cleaning up test MongoDB container");
    }
}
