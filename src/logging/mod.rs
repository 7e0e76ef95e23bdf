//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output with configurable log levels
//! - JSON-formatted local file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use vaxflow::logging::init_logging;
//! use vaxflow::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a submission job
#[macro_export]
macro_rules! log_job_start {
    ($job_id:expr, $provider:expr, $batches:expr) => {
        tracing::info!(
            job_id = %$job_id,
            provider = %$provider,
            batches = $batches,
            "Starting submission"
        );
    };
}

/// Log the completion of a submission job
#[macro_export]
macro_rules! log_job_complete {
    ($job_id:expr, $successful:expr, $failed:expr) => {
        tracing::info!(
            job_id = %$job_id,
            successful = $successful,
            failed = $failed,
            "Submission completed"
        );
    };
}

/// Log a batch dispatch
#[macro_export]
macro_rules! log_batch_dispatch {
    ($batch_seq:expr, $records:expr) => {
        tracing::info!(
            batch_seq = $batch_seq,
            records = $records,
            "Dispatching batch"
        );
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_macros_compile() {
        // These tests just verify that the macros compile correctly
        // Actual logging output is not tested in unit tests
    }
}
