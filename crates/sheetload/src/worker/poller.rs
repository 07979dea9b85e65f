use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::db::{self, DatabaseError, WarehouseOptions};
use crate::dispatcher::dispatch;
use crate::error::SheetloadError;
use crate::reader::{ResilientReader, SheetParser, XlsxParser};
use crate::state::StateStore;
use crate::worker::scanner::DirectoryScanner;

/// Granularity of shutdown checks while sleeping.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    /// Pause after a completed cycle.
    pub poll: Duration,
    /// Pause after a cycle that failed.
    pub error_backoff: Duration,
    /// Pause after the warehouse could not be reached.
    pub reconnect_backoff: Duration,
}

impl PollIntervals {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll: config.polling_interval(),
            error_backoff: config.error_backoff(),
            reconnect_backoff: config.reconnect_backoff(),
        }
    }
}

/// Counters for one pass over the watched directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub seen: usize,
    pub processed: usize,
    pub skipped: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct Poller<P = XlsxParser> {
    options: WarehouseOptions,
    scanner: DirectoryScanner,
    reader: Arc<ResilientReader<P>>,
    intervals: PollIntervals,
    db: Option<DatabaseConnection>,
}

impl Poller<XlsxParser> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.warehouse_options(),
            DirectoryScanner::new(&config.watch.directory),
            Arc::new(ResilientReader::xlsx(config.retry_policy())),
            PollIntervals::from_config(config),
        )
    }
}

impl<P: SheetParser + 'static> Poller<P> {
    pub fn new(
        options: WarehouseOptions,
        scanner: DirectoryScanner,
        reader: Arc<ResilientReader<P>>,
        intervals: PollIntervals,
    ) -> Self {
        Self {
            options,
            scanner,
            reader,
            intervals,
            db: None,
        }
    }

    /// The live warehouse handle, if the last cycle established one.
    pub fn connection(&self) -> Option<&DatabaseConnection> {
        self.db.as_ref()
    }

    /// Runs cycles until `shutdown` is set. Never returns an error: every
    /// failure is logged and followed by a backoff.
    pub async fn run(&mut self, shutdown: Arc<AtomicBool>) {
        info!(
            directory = %self.scanner.input_directory().display(),
            interval = ?self.intervals.poll,
            "Watching directory"
        );

        while !shutdown.load(Ordering::Relaxed) {
            let delay = match self.run_cycle().await {
                Ok(report) => {
                    if report.processed > 0 {
                        info!(
                            seen = report.seen,
                            processed = report.processed,
                            succeeded = report.succeeded,
                            failed = report.failed,
                            "Cycle complete"
                        );
                    } else {
                        debug!(seen = report.seen, "Nothing to process");
                    }
                    self.intervals.poll
                }
                Err(SheetloadError::Database(e)) => {
                    error!(
                        error = %e,
                        retry_in = ?self.intervals.reconnect_backoff,
                        "Warehouse unavailable"
                    );
                    self.intervals.reconnect_backoff
                }
                Err(e) => {
                    error!(
                        error = %e,
                        retry_in = ?self.intervals.error_backoff,
                        "Polling cycle failed"
                    );
                    self.intervals.error_backoff
                }
            };

            sleep_unless_shutdown(delay, &shutdown).await;
        }

        info!("Poller shutting down...");
    }

    /// One pass: make sure the warehouse is reachable, list candidates and
    /// process every file whose watermark is stale.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, SheetloadError> {
        let db = self.ensure_connection().await?;
        let candidates = self.scanner.scan()?;
        let store = StateStore::new(&db);
        let mut report = CycleReport::default();

        for candidate in candidates {
            report.seen += 1;

            if !store
                .needs_processing(&candidate.filename, candidate.modified)
                .await
            {
                report.skipped += 1;
                continue;
            }

            report.processed += 1;
            info!(file = %candidate.filename, "Processing file");

            let outcome = dispatch(&db, Arc::clone(&self.reader), &candidate.path).await;

            if outcome.is_retryable() {
                warn!(file = %candidate.filename, "Import will be retried next cycle");
                store.record_retryable_failure(&candidate.filename).await;
            } else {
                store
                    .record_outcome(&candidate.filename, candidate.modified, outcome.status())
                    .await;
            }

            if outcome.is_success() {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
        }

        Ok(report)
    }

    /// Reuses the current handle if it answers a ping, otherwise connects.
    /// A handle that fails its ping is dropped.
    async fn ensure_connection(&mut self) -> Result<DatabaseConnection, DatabaseError> {
        let conn = match self.db.take() {
            Some(conn) => {
                db::ping(&conn).await?;
                conn
            }
            None => db::connect(&self.options).await?,
        };
        Ok(self.db.insert(conn).clone())
    }
}

/// Sleeps for `duration`, returning early once `shutdown` is set.
pub async fn sleep_unless_shutdown(duration: Duration, shutdown: &AtomicBool) {
    let deadline = tokio::time::Instant::now() + duration;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            return;
        }
        let now = tokio::time::Instant::now();
        if now >= deadline {
            return;
        }
        tokio::time::sleep((deadline - now).min(SHUTDOWN_POLL)).await;
    }
}
