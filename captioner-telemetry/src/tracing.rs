use captioner_config::Environment;
use std::io::Error;
use std::sync::Once;
use std::{
    backtrace::{Backtrace, BacktraceStatus},
    panic::PanicHookInfo,
};
use thiserror::Error;
use tracing::subscriber::{SetGlobalDefaultError, set_global_default};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::{LogTracer, log_tracer::SetLoggerError};
use tracing_subscriber::{EnvFilter, FmtSubscriber, Registry, fmt, layer::SubscriberExt};

#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to init log tracer: {0}")]
    InitLogTracer(#[from] SetLoggerError),

    #[error("failed to set global default subscriber: {0}")]
    SetGlobalDefault(#[from] SetGlobalDefaultError),

    #[error("an io error occurred: {0}")]
    Io(#[from] Error),
}

#[must_use]
pub enum LogFlusher {
    Flusher(WorkerGuard),
    NullFlusher,
}

static INIT_TEST_TRACING: Once = Once::new();

/// Call this function once at the beginning of a test and then set the ENABLE_TRACING
/// environment variable to 1 to view tracing in the terminal:
///
/// ENABLE_TRACING=1 cargo test <test_name>
///
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        if std::env::var("ENABLE_TRACING").is_ok() {
            // The default environment is prod, which emits JSON lines; tests
            // want readable terminal output.
            Environment::Dev.set();
            let _log_flusher = init_tracing().expect("Failed to initialize tracing for tests");
        }
    });
}

/// Initializes tracing for the application.
///
/// Production output is one JSON object per line on standard output with the
/// log level, message, and any structured fields attached to the event.
pub fn init_tracing() -> Result<LogFlusher, TracingError> {
    // Initialize the log tracer to capture logs from the `log` crate
    // and send them to the `tracing` subscriber. This captures logs
    // from libraries that use the `log` crate.
    LogTracer::init()?;

    let is_prod = Environment::load()?.is_prod();

    // Set the default log level to `info` if not specified in the `RUST_LOG` environment variable.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_flusher = if is_prod {
        configure_prod_tracing(filter)?
    } else {
        configure_dev_tracing(filter)?
    };

    set_tracing_panic_hook();

    // Return the log flusher to ensure buffered log lines are flushed before
    // the application exits.
    Ok(log_flusher)
}

/// Configures tracing for production environments.
///
/// Sets up structured JSON logging to standard output.
fn configure_prod_tracing(filter: EnvFilter) -> Result<LogFlusher, TracingError> {
    // Use a non-blocking writer so request handlers never stall on stdout.
    let (stdout_writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    let format = fmt::format()
        .with_level(true)
        // ANSI colors are only for terminal output
        .with_ansi(false)
        // Disable target to reduce noise in the logs
        .with_target(false);

    let subscriber = Registry::default().with(filter).with(
        fmt::layer()
            .event_format(format)
            .with_writer(stdout_writer)
            .json()
            .with_current_span(true)
            .with_span_list(true),
    );

    set_global_default(subscriber)?;

    Ok(LogFlusher::Flusher(guard))
}

/// Configures tracing for development environments with human-readable output.
fn configure_dev_tracing(filter: EnvFilter) -> Result<LogFlusher, TracingError> {
    let format = fmt::format()
        // Emit the log level in the log output
        .with_level(true)
        // Enable ANSI colors for terminal output
        .with_ansi(true)
        // Make it pretty
        .pretty()
        // Disable line number, file, and target in the log output
        // to reduce noise in the logs
        .with_line_number(false)
        .with_file(false)
        .with_target(true);

    let subscriber_builder = FmtSubscriber::builder()
        .event_format(format)
        .with_env_filter(filter);

    let subscriber = subscriber_builder.finish();

    set_global_default(subscriber)?;

    Ok(LogFlusher::NullFlusher)
}

/// The default panic hook logs the panic information to stderr, which means
/// it will not reach our logging system. This function replaces the default
/// panic hook with one that logs the panic information using `tracing`, and
/// then calls the original hook.
fn set_tracing_panic_hook() {
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        panic_hook(info);
        prev_hook(info);
    }));
}

/// A custom panic hook that logs the panic information using `tracing`.
fn panic_hook(panic_info: &PanicHookInfo) {
    let backtrace = Backtrace::capture();
    let (backtrace, note) = match backtrace.status() {
        BacktraceStatus::Captured => (Some(backtrace), None),
        BacktraceStatus::Disabled => (
            None,
            Some("run with RUST_BACKTRACE=1 to display backtraces"),
        ),
        BacktraceStatus::Unsupported => {
            (None, Some("backtraces are not supported on this platform"))
        }
        _ => (None, Some("backtrace status is unknown")),
    };

    let payload = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    };

    let location = panic_info.location().map(|location| location.to_string());

    tracing::error!(
        panic.payload = payload,
        panic.location = location,
        panic.backtrace = backtrace.map(tracing::field::display),
        panic.note = note,
        "a panic occurred",
    );
}
