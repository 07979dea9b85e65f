//! Database error types.

use thiserror::Error;

/// Errors from database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error reported by SeaORM or the underlying driver.
    #[error("Database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    /// The warehouse could not be reached.
    #[error("Failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: sea_orm::DbErr,
    },

    /// Startup table creation failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// The configured schema name is not a plain identifier.
    #[error("Invalid schema name: {0}")]
    InvalidSchema(String),
}
