// Configuration loading

pub mod session;
pub mod settings;

use std::path::PathBuf;

/// Overrides the configuration directory (used by tests and portable installs).
pub const HOME_ENV: &str = "STOCKTAKE_HOME";

/// Directory holding settings.json, stocktake.toml and saved sessions.
pub fn config_dir() -> PathBuf {
    if let Ok(home) = std::env::var(HOME_ENV) {
        if !home.is_empty() {
            return PathBuf::from(home);
        }
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stocktake")
}
