//! CLI command implementations

pub mod history;
pub mod import;
pub mod init;
pub mod logs;
pub mod new;
pub mod status;
pub mod transactions;

use std::path::PathBuf;

use anyhow::{Context, Result};
use inflow_core::services::{EntryPoint, LogEvent, LoggingService};
use inflow_core::InflowContext;

/// Get the inflow directory from environment or default
pub fn get_inflow_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("INFLOW_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".inflow")
    }
}

/// Get or create the inflow context
pub fn get_context() -> Result<InflowContext> {
    let inflow_dir = get_inflow_dir();

    std::fs::create_dir_all(&inflow_dir)
        .with_context(|| format!("Failed to create inflow directory: {:?}", inflow_dir))?;

    InflowContext::new(&inflow_dir).context("Failed to initialize inflow context")
}

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let inflow_dir = get_inflow_dir();
    std::fs::create_dir_all(&inflow_dir).ok()?;
    LoggingService::new(&inflow_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}
