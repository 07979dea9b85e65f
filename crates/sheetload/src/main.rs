//! sheetload - polls a directory for spreadsheet exports and loads them
//! into the warehouse.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info};

use sheetload::sanitize::redact_database_url;
use sheetload::{telemetry, Config, Poller};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("sheetload: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = telemetry::init(config.log_format) {
        eprintln!("sheetload: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Starting sheetload v{}", env!("CARGO_PKG_VERSION"));
    match serde_json::to_string(&config) {
        Ok(json) => info!(config = %json, "Configuration loaded"),
        Err(e) => error!(error = %e, "Failed to serialize configuration"),
    }
    info!(
        url = %redact_database_url(&config.database_url()),
        schema = %config.database.schema,
        "Using warehouse"
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Shutdown signal received");
        handler_flag.store(true, Ordering::Relaxed);
    }) {
        error!(error = %e, "Failed to install signal handler");
        return ExitCode::FAILURE;
    }

    let mut poller = Poller::from_config(&config);
    poller.run(shutdown).await;

    info!("sheetload stopped");
    ExitCode::SUCCESS
}
