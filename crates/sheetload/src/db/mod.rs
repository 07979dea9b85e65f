//! Warehouse connection management.
//!
//! The connection is a plain [`DatabaseConnection`] value owned by the
//! caller. Reconnecting means calling [`connect`] again and replacing the
//! old handle. On PostgreSQL every table lives in the configured schema,
//! selected through the connection's search path, so entities carry no
//! schema prefix and the same code runs against SQLite in tests.

use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, DatabaseBackend, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::sanitize::redact_database_url;

pub mod entities;
pub mod error;
pub mod file_metadata_repo;
pub mod migrations;

pub use error::DatabaseError;
pub use migrations::Migrator;

/// How to reach the warehouse.
#[derive(Debug, Clone)]
pub struct WarehouseOptions {
    pub url: String,
    /// PostgreSQL schema holding the warehouse tables. Ignored on SQLite.
    pub schema: Option<String>,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

impl WarehouseOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            schema: None,
            max_connections: 4,
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    fn is_postgres(&self) -> bool {
        self.url.starts_with("postgres://") || self.url.starts_with("postgresql://")
    }
}

/// Opens a connection, creates the warehouse schema if needed and applies
/// pending migrations.
pub async fn connect(options: &WarehouseOptions) -> Result<DatabaseConnection, DatabaseError> {
    let schema = match (&options.schema, options.is_postgres()) {
        (Some(schema), true) => Some(validate_schema(schema)?),
        _ => None,
    };

    let mut connect_options = ConnectOptions::new(options.url.clone());
    connect_options
        .max_connections(options.max_connections)
        .connect_timeout(options.connect_timeout)
        .sqlx_logging(false);
    if let Some(schema) = schema {
        connect_options.set_schema_search_path(schema);
    }

    let conn = sea_orm::Database::connect(connect_options)
        .await
        .map_err(|e| DatabaseError::Connect {
            url: redact_database_url(&options.url),
            source: e,
        })?;

    if let Some(schema) = schema {
        if conn.get_database_backend() == DatabaseBackend::Postgres {
            conn.execute_unprepared(&format!("CREATE SCHEMA IF NOT EXISTS \"{}\"", schema))
                .await?;
        }
    }

    Migrator::up(&conn, None)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

    log::info!(
        "Connected to warehouse at {}",
        redact_database_url(&options.url)
    );

    Ok(conn)
}

/// Round-trips to the server to verify the handle is still usable.
pub async fn ping(conn: &DatabaseConnection) -> Result<(), DatabaseError> {
    conn.ping().await?;
    Ok(())
}

/// Schema names are interpolated into DDL, so only plain identifiers pass.
fn validate_schema(schema: &str) -> Result<&str, DatabaseError> {
    let valid = !schema.is_empty()
        && schema
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !schema.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(schema)
    } else {
        Err(DatabaseError::InvalidSchema(schema.to_string()))
    }
}
