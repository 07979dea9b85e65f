//! Per-file ingestion state: the watermark that makes the loop idempotent.
//!
//! A file needs processing when it has never been seen, when no watermark
//! has been accepted for it yet, or when its modification time is strictly
//! newer than the stored watermark. Lookups fail open and writes are best
//! effort: a broken state backend causes reprocessing, never a skipped file
//! or a crashed loop.

use std::time::SystemTime;

use chrono::{DateTime, SubsecRound, Utc};
use sea_orm::DatabaseConnection;
use tracing::{debug, error};

use crate::db::entities::file_metadata::Model;
use crate::db::{file_metadata_repo, DatabaseError};

pub use crate::db::entities::file_metadata::FileStatus;

/// Converts a filesystem modification time into a watermark.
///
/// Truncated to microseconds, the finest precision PostgreSQL stores, so a
/// round-tripped watermark compares equal to a fresh observation of the
/// same file.
pub fn watermark(modified: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(modified).trunc_subsecs(6)
}

pub struct StateStore<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> StateStore<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns true unless the stored watermark is at least `observed`.
    pub async fn needs_processing(&self, filename: &str, observed: DateTime<Utc>) -> bool {
        match file_metadata_repo::find(self.db, filename).await {
            Ok(None) => true,
            Ok(Some(state)) => match state.last_modified {
                Some(last_modified) => observed > last_modified,
                None => true,
            },
            Err(e) => {
                error!(file = filename, error = %e, "State lookup failed, processing anyway");
                true
            }
        }
    }

    /// Accepts `observed` as the new watermark and records the outcome.
    pub async fn record_outcome(
        &self,
        filename: &str,
        observed: DateTime<Utc>,
        status: FileStatus,
    ) {
        let result =
            file_metadata_repo::upsert(self.db, filename, observed, Utc::now(), status).await;
        self.log_write(filename, status, result);
    }

    /// Records a failed attempt but leaves the watermark where it was, so
    /// the file is picked up again on the next cycle.
    pub async fn record_retryable_failure(&self, filename: &str) {
        let status = FileStatus::Error;
        let result =
            file_metadata_repo::upsert_keep_watermark(self.db, filename, Utc::now(), status)
                .await;
        self.log_write(filename, status, result);
    }

    pub async fn get(&self, filename: &str) -> Result<Option<Model>, DatabaseError> {
        file_metadata_repo::find(self.db, filename).await
    }

    fn log_write(&self, filename: &str, status: FileStatus, result: Result<(), DatabaseError>) {
        match result {
            Ok(()) => debug!(file = filename, status = %status, "Recorded file state"),
            Err(e) => error!(
                file = filename,
                status = %status,
                error = %e,
                "Failed to record file state"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect, WarehouseOptions};
    use chrono::{Duration, TimeZone};

    async fn test_db() -> DatabaseConnection {
        connect(&WarehouseOptions::new("sqlite::memory:").with_max_connections(1))
            .await
            .expect("Failed to create test database")
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_unseen_file_needs_processing() {
        let db = test_db().await;
        let store = StateStore::new(&db);
        assert!(store.needs_processing("clients.xlsx", at(0)).await);
    }

    #[tokio::test]
    async fn test_unchanged_file_is_skipped() {
        let db = test_db().await;
        let store = StateStore::new(&db);

        store
            .record_outcome("clients.xlsx", at(0), FileStatus::Success)
            .await;
        assert!(!store.needs_processing("clients.xlsx", at(0)).await);
        assert!(!store.needs_processing("clients.xlsx", at(-5)).await);
    }

    #[tokio::test]
    async fn test_newer_file_is_reprocessed_after_either_outcome() {
        let db = test_db().await;
        let store = StateStore::new(&db);

        for status in [FileStatus::Success, FileStatus::Error] {
            store.record_outcome("ventes.xlsx", at(0), status).await;
            assert!(
                store
                    .needs_processing("ventes.xlsx", at(0) + Duration::microseconds(1))
                    .await
            );
        }
    }

    #[tokio::test]
    async fn test_retryable_failure_keeps_file_pending() {
        let db = test_db().await;
        let store = StateStore::new(&db);

        store.record_retryable_failure("ventes.xlsx").await;
        assert!(store.needs_processing("ventes.xlsx", at(0)).await);

        let state = store.get("ventes.xlsx").await.unwrap().unwrap();
        assert_eq!(state.status, FileStatus::Error);
        assert_eq!(state.last_modified, None);

        // An earlier success keeps its watermark through a retryable failure.
        store
            .record_outcome("ventes.xlsx", at(10), FileStatus::Success)
            .await;
        store.record_retryable_failure("ventes.xlsx").await;
        assert!(!store.needs_processing("ventes.xlsx", at(10)).await);
        assert!(store.needs_processing("ventes.xlsx", at(11)).await);
    }

    #[tokio::test]
    async fn test_lookup_failure_fails_open() {
        // A handle to a database without our tables.
        let broken = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        let store = StateStore::new(&broken);
        assert!(store.needs_processing("clients.xlsx", at(0)).await);

        // Writes are swallowed.
        store
            .record_outcome("clients.xlsx", at(0), FileStatus::Success)
            .await;
        store.record_retryable_failure("clients.xlsx").await;
    }

    #[test]
    fn test_watermark_truncates_to_microseconds() {
        let t = SystemTime::UNIX_EPOCH + std::time::Duration::new(1_700_000_000, 123_456_789);
        let w = watermark(t);
        assert_eq!(w.timestamp_subsec_nanos(), 123_456_000);
    }
}
