use std::path::PathBuf;

use directories::ProjectDirs;

use crate::path::expand_tilde;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");

/// Directory holding the database and logs.
///
/// Respects `PORTFOLIO_ASSET_DIR`. Debug builds default to `dev_assets/` at the
/// workspace root, release builds to the platform data directory.
pub fn asset_dir() -> PathBuf {
    let path = if let Ok(custom) = std::env::var("PORTFOLIO_ASSET_DIR") {
        expand_tilde(&custom)
    } else if cfg!(debug_assertions) {
        PathBuf::from(PROJECT_ROOT).join("../../dev_assets")
    } else {
        ProjectDirs::from("com", "portfolio", "portfolio")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    };

    if !path.exists() {
        if let Err(e) = std::fs::create_dir_all(&path) {
            tracing::warn!("Failed to create asset directory {:?}: {}", path, e);
        }
    }

    path
    // ✔ macOS → ~/Library/Application Support/portfolio
    // ✔ Linux → ~/.local/share/portfolio   (respects XDG_DATA_HOME)
    // ✔ Windows → %APPDATA%\portfolio\portfolio
}

/// Get the database file path.
///
/// Respects the `PORTFOLIO_DATABASE_PATH` environment variable.
/// Default: `{asset_dir}/portfolio.sqlite`
pub fn database_path() -> PathBuf {
    if let Ok(path) = std::env::var("PORTFOLIO_DATABASE_PATH") {
        return expand_tilde(&path);
    }
    asset_dir().join("portfolio.sqlite")
}

/// Directory the local storage backend writes into, served under `/uploads`.
///
/// Respects `PORTFOLIO_UPLOADS_DIR`. Default: `{cwd}/public/uploads`
pub fn uploads_dir() -> PathBuf {
    if let Ok(path) = std::env::var("PORTFOLIO_UPLOADS_DIR") {
        return expand_tilde(&path);
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("public")
        .join("uploads")
}

/// Default directory for rotated log files.
pub fn log_dir() -> PathBuf {
    asset_dir().join("logs")
}
