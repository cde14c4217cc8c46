//! Console logging plus optional rotating file logs.
//!
//! # Configuration
//!
//! - `PORTFOLIO_FILE_LOGGING`: Set to "true" or "1" to enable file logging
//! - `PORTFOLIO_LOG_DIR`: Override default log directory (defaults to `{asset_dir}/logs`)
//! - `PORTFOLIO_LOG_MAX_FILES`: Number of daily log files to retain (default: 7)
//!
//! File output is JSON, one event per line:
//! ```json
//! {"timestamp":"2026-03-02T10:30:00Z","level":"INFO","target":"server","message":"..."}
//! ```

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};
use utils::{assets::log_dir, path::expand_tilde};

const LOG_FILE_PREFIX: &str = "portfolio.log";

/// Crates whose events are shown at the requested level; everything else is
/// limited to warnings.
const WORKSPACE_CRATES: &[&str] = &[
    "server",
    "services",
    "db",
    "deployment",
    "local_deployment",
    "utils",
];

#[derive(Debug, Clone)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    pub log_dir: PathBuf,
    /// Number of daily log files to retain.
    pub max_files: usize,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        let enabled = std::env::var("PORTFOLIO_FILE_LOGGING")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let log_dir = std::env::var("PORTFOLIO_LOG_DIR")
            .map(|dir| expand_tilde(&dir))
            .unwrap_or_else(|_| log_dir());

        let max_files = std::env::var("PORTFOLIO_LOG_MAX_FILES")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(7);

        Self {
            enabled,
            log_dir,
            max_files,
        }
    }
}

/// `warn` globally, `log_level` for the workspace crates
pub fn filter_directives(log_level: &str) -> String {
    let mut directives = String::from("warn,tower_http=info");
    for name in WORKSPACE_CRATES {
        directives.push_str(&format!(",{name}={log_level}"));
    }
    directives
}

fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(filter_directives(log_level)).unwrap_or_else(|e| {
        eprintln!("Invalid log level {log_level:?} ({e}), falling back to info");
        EnvFilter::new(filter_directives("info"))
    })
}

/// Initialize the logging system with optional file output.
///
/// Returns a guard that must be held for the lifetime of the application
/// to ensure all logs are flushed. If file logging is not enabled, returns None.
pub fn init_logging(log_level: &str) -> Option<WorkerGuard> {
    let config = FileLoggingConfig::default();

    let console_layer = tracing_subscriber::fmt::layer().with_filter(build_filter(log_level));

    if !config.enabled {
        tracing_subscriber::registry().with(console_layer).init();
        return None;
    }

    if let Err(e) = std::fs::create_dir_all(&config.log_dir) {
        eprintln!("Failed to create log directory {:?}: {}", config.log_dir, e);
        tracing_subscriber::registry().with(console_layer).init();
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(build_filter(log_level));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!(
        log_dir = ?config.log_dir,
        max_files = config.max_files,
        "File logging enabled"
    );

    let log_dir = config.log_dir.clone();
    let max_files = config.max_files;
    std::thread::spawn(move || {
        cleanup_old_logs(&log_dir, max_files);
    });

    Some(guard)
}

/// Clean up old log files, keeping only the most recent `max_files`.
fn cleanup_old_logs(log_dir: &Path, max_files: usize) {
    let entries = match std::fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX))
        })
        .filter_map(|e| {
            e.metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(|t| (e.path(), t))
        })
        .collect();

    // Newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    for (path, _) in log_files.into_iter().skip(max_files) {
        if let Err(e) = std::fs::remove_file(&path) {
            tracing::warn!("Failed to remove old log file {:?}: {}", path, e);
        } else {
            tracing::debug!("Removed old log file: {:?}", path);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, thread, time::Duration};

    use serial_test::serial;

    use super::*;

    #[test]
    fn directives_cover_workspace_crates() {
        let directives = filter_directives("debug");
        assert!(directives.starts_with("warn,"));
        assert!(directives.contains("server=debug"));
        assert!(directives.contains("local_deployment=debug"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    #[serial]
    fn config_reads_environment() {
        // SAFETY: Tests run serially via #[serial] attribute
        unsafe {
            std::env::set_var("PORTFOLIO_FILE_LOGGING", "1");
            std::env::set_var("PORTFOLIO_LOG_DIR", "/tmp/portfolio-logs");
            std::env::set_var("PORTFOLIO_LOG_MAX_FILES", "3");
        }
        let config = FileLoggingConfig::default();
        unsafe {
            std::env::remove_var("PORTFOLIO_FILE_LOGGING");
            std::env::remove_var("PORTFOLIO_LOG_DIR");
            std::env::remove_var("PORTFOLIO_LOG_MAX_FILES");
        }

        assert!(config.enabled);
        assert_eq!(config.log_dir, PathBuf::from("/tmp/portfolio-logs"));
        assert_eq!(config.max_files, 3);
    }

    #[test]
    fn cleanup_keeps_newest_files() {
        let dir = tempfile::tempdir().unwrap();
        for day in ["2026-01-01", "2026-01-02", "2026-01-03"] {
            fs::write(dir.path().join(format!("{LOG_FILE_PREFIX}.{day}")), day).unwrap();
            thread::sleep(Duration::from_millis(20));
        }
        fs::write(dir.path().join("other.txt"), "keep").unwrap();

        cleanup_old_logs(dir.path(), 2);

        assert!(!dir.path().join("portfolio.log.2026-01-01").exists());
        assert!(dir.path().join("portfolio.log.2026-01-02").exists());
        assert!(dir.path().join("portfolio.log.2026-01-03").exists());
        assert!(dir.path().join("other.txt").exists());
    }
}
