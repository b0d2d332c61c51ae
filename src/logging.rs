//! # Structured Logging Module
//!
//! Environment-aware structured logging to the console and, optionally, to
//! JSON files for following completions across threads.

use std::path::Path;
use std::process;
use std::sync::OnceLock;

use chrono::Utc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{ConfigManager, LoggingSettings};
use crate::events::ErrorCode;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging. Later calls are no-ops.
///
/// The filter comes from `RUST_LOG` when set, then `settings.level`, then the
/// environment default.
pub fn init_structured_logging(settings: &LoggingSettings) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = ConfigManager::detect_environment();
        let directive = filter_directive(settings, &environment);
        let pid = process::id();

        let console = if settings.json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(EnvFilter::new(&directive))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(EnvFilter::new(&directive))
                .boxed()
        };

        let file = settings.directory.as_deref().map(|directory| {
            let file_name = log_file_name(&environment, pid);
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            // Lives for the process so buffered lines are flushed.
            std::mem::forget(guard);
            fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .json()
                .with_filter(EnvFilter::new(&directive))
        });

        // A host application may already own the global subscriber.
        if tracing_subscriber::registry()
            .with(console)
            .with(file)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = pid,
            environment = %environment,
            filter = %directive,
            log_directory = ?settings.directory.as_deref().map(Path::display),
            "Structured logging initialized"
        );
    });
}

fn filter_directive(settings: &LoggingSettings, environment: &str) -> String {
    std::env::var("RUST_LOG")
        .ok()
        .filter(|value| !value.is_empty())
        .or_else(|| settings.level.clone())
        .unwrap_or_else(|| default_log_level(environment).to_string())
}

/// Log level based on environment
fn default_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

fn log_file_name(environment: &str, pid: u32) -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    format!("{environment}.{pid}.{timestamp}.log")
}

/// Log structured data for a publish and its outcome
pub fn log_publish_operation(
    operation: &str,
    event_name: &str,
    code: Option<ErrorCode>,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        event_name = %event_name,
        code = code.map(ErrorCode::raw),
        outcome = code.map(|c| c.to_string()).as_deref(),
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "PUBLISH_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}
