//! Test utilities for database operations.
//!
//! Integration tests run against a throwaway `PostgreSQL` database created per
//! test, so concurrent tests never share rows.

use crate::migrations::Migrator;
use sea_orm::{
    ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, SqlxPostgresConnector,
    Statement,
};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tracing::info;

/// Tables owned by this crate, children first.
const TABLES: [&str; 5] = ["note_history", "reaction", "note_favorite", "following", "note"];

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_port(name: &str, default: u16) -> u16 {
    std::env::var(name)
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(default)
}

/// Test database configuration, read from `TEST_DB_*`.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: env_or("TEST_DB_HOST", "localhost"),
            port: env_port("TEST_DB_PORT", 5433),
            username: env_or("TEST_DB_USER", "engage_test"),
            password: env_or("TEST_DB_PASSWORD", "engage_test"),
            database: env_or("TEST_DB_NAME", "engage_test"),
        }
    }
}

impl TestDbConfig {
    /// URL of the configured database.
    #[must_use]
    pub fn database_url(&self) -> String {
        self.url_for(&self.database)
    }

    /// URL of the maintenance database, used to create and drop test databases.
    #[must_use]
    pub fn postgres_url(&self) -> String {
        self.url_for("postgres")
    }

    fn url_for(&self, database: &str) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{database}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// A migrated test database.
pub struct TestDatabase {
    conn: DatabaseConnection,
    config: TestDbConfig,
    owned: bool,
}

impl TestDatabase {
    /// Connect to the configured database and migrate it.
    pub async fn new() -> Result<Self, DbErr> {
        let config = TestDbConfig::default();
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        Ok(Self {
            conn,
            config,
            owned: false,
        })
    }

    /// Create a fresh database with a random name and migrate it.
    pub async fn create_unique() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        config.database = format!("engage_test_{}", &suffix[..12]);

        let admin = Database::connect(&config.postgres_url()).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{}\"", config.database),
            ))
            .await?;
        admin.close().await?;

        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;
        info!(database = %config.database, "Created test database");

        Ok(Self {
            conn,
            config,
            owned: true,
        })
    }

    /// Get the database connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// A shareable handle for repositories.
    #[must_use]
    pub fn shared(&self) -> Arc<DatabaseConnection> {
        Arc::new(SqlxPostgresConnector::from_sqlx_postgres_pool(
            self.conn.get_postgres_connection_pool().clone(),
        ))
    }

    /// Empty every table of this crate.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        let truncate = format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", TABLES.join(", "));
        self.conn
            .execute(Statement::from_string(DatabaseBackend::Postgres, truncate))
            .await?;
        Ok(())
    }

    /// Close the connection and, for databases made by [`Self::create_unique`], drop it.
    pub async fn teardown(self) -> Result<(), DbErr> {
        if !self.owned {
            self.cleanup().await?;
            return self.conn.close().await;
        }

        self.conn.close().await?;
        let admin = Database::connect(&self.config.postgres_url()).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)", self.config.database),
            ))
            .await?;
        admin.close().await?;
        info!(database = %self.config.database, "Dropped test database");
        Ok(())
    }
}

/// Test Redis configuration, read from `TEST_REDIS_*`.
#[derive(Debug, Clone)]
pub struct TestRedisConfig {
    /// Redis host.
    pub host: String,
    /// Redis port.
    pub port: u16,
}

impl Default for TestRedisConfig {
    fn default() -> Self {
        Self {
            host: env_or("TEST_REDIS_HOST", "localhost"),
            port: env_port("TEST_REDIS_PORT", 6380),
        }
    }
}

impl TestRedisConfig {
    /// Get the Redis URL.
    #[must_use]
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}", self.host, self.port)
    }
}
