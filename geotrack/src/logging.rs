//! Logging infrastructure.
//!
//! Structured `tracing` output to a log file, optionally mirrored to stdout:
//! - The file is appended to across runs (the tracker is long-lived)
//! - Local RFC 3339 timestamps on both outputs
//! - Level from `RUST_LOG`, defaulting to `info` (`debug` when requested)

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the global subscriber.
///
/// # Arguments
///
/// * `log_path` - Log file; its directory is created if needed
/// * `stdout` - Also print to stdout (the `run` command does, one-shot commands don't)
/// * `debug` - Use `debug` as the default level instead of `info`
///
/// # Errors
///
/// Returns an error if the log directory cannot be created.
pub fn init_logging(log_path: &Path, stdout: bool, debug: bool) -> Result<LoggingGuard, io::Error> {
    let (dir, file) = split_log_path(log_path)?;
    fs::create_dir_all(dir)?;

    let file_appender = tracing_appender::rolling::never(dir, file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_timer(LocalTime::rfc_3339())
        .with_target(true);

    let stdout_layer = stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(true)
            .with_timer(LocalTime::rfc_3339())
            .with_target(false)
            .boxed()
    });

    let default_level = if debug { "debug" } else { "info" };
    let env_filter = if debug {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Split a log path into the directory and file name the appender wants.
fn split_log_path(log_path: &Path) -> Result<(&Path, &std::ffi::OsStr), io::Error> {
    let file = log_path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("log path {} has no file name", log_path.display()),
        )
    })?;
    let dir = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok((dir, file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path() {
        let (dir, file) = split_log_path(Path::new("/var/log/geotrack/geotrack.log")).unwrap();
        assert_eq!(dir, Path::new("/var/log/geotrack"));
        assert_eq!(file, "geotrack.log");
    }

    #[test]
    fn test_split_bare_file_name() {
        let (dir, file) = split_log_path(Path::new("geotrack.log")).unwrap();
        assert_eq!(dir, Path::new("."));
        assert_eq!(file, "geotrack.log");
    }

    #[test]
    fn test_split_rejects_directory_only() {
        assert!(split_log_path(Path::new("/")).is_err());
    }

    #[test]
    fn test_guard_structure() {
        use tracing_appender::non_blocking::NonBlocking;

        let (non_blocking, guard) = NonBlocking::new(std::io::sink());
        drop(non_blocking);

        let _logging_guard = LoggingGuard { _file_guard: guard };
    }

    // The global subscriber can only be installed once per process, so
    // init_logging itself is exercised by the CLI rather than here.
}
