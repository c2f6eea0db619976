// Application settings
// Loaded from ~/.config/stocktake/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use stocktake_recon::persist::DEFAULT_NAMESPACE;
use stocktake_recon::StocktakeConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Store
    #[serde(rename = "store.namespace")]
    pub namespace: String,

    #[serde(rename = "store.dir")]
    pub store_dir: Option<PathBuf>,  // None = <config dir>/sessions

    // Export
    #[serde(rename = "export.dir")]
    pub export_dir: Option<PathBuf>,  // None = current directory

    // Engine
    #[serde(rename = "config.path")]
    pub engine_config: Option<PathBuf>,  // None = <config dir>/stocktake.toml if present
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            store_dir: None,
            export_dir: None,
            engine_config: None,
        }
    }
}

/// Strip comments (lines starting with //)
fn strip_comments(contents: &str) -> String {
    contents
        .lines()
        .filter(|line| !line.trim().starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        crate::config_dir().join("settings.json")
    }

    /// Default engine config path
    pub fn engine_config_default_path() -> PathBuf {
        crate::config_dir().join("stocktake.toml")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file();
            return settings;
        }

        Self::load_from(&path)
    }

    /// Load settings from a specific file, falling back to defaults on any error
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&strip_comments(&contents)) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("Error parsing {}: {}; using default settings", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    #[cfg(test)]
    fn save_to(&self, path: &Path) -> Result<(), String> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Session store directory
    pub fn store_dir(&self) -> PathBuf {
        self.store_dir
            .clone()
            .unwrap_or_else(crate::session::FileStore::default_dir)
    }

    /// Resolve the engine config: explicit path, then the default file, then defaults.
    ///
    /// An explicitly configured file must exist and parse.
    pub fn engine_config(&self) -> Result<StocktakeConfig, String> {
        let (path, required) = match &self.engine_config {
            Some(path) => (path.clone(), true),
            None => (Self::engine_config_default_path(), false),
        };

        if !required && !path.exists() {
            return Ok(StocktakeConfig::default());
        }

        let text = fs::read_to_string(&path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        StocktakeConfig::from_toml(&text).map_err(|e| format!("{}: {e}", path.display()))
    }

    /// Create default settings file with comments
    fn create_default_file(&self) {
        let path = Self::config_path();

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("Error creating config directory: {}", e);
                return;
            }
        }

        let default_config = r#"{
    // Key the scan session is saved under; one session per namespace
    "store.namespace": "stockscan",

    // Where sessions are saved (null = <config dir>/sessions)
    "store.dir": null,

    // Default directory for scanned.csv / missing.csv (null = current directory)
    "export.dir": null,

    // Engine config: header spellings, target condition, scanner timings
    // (null = <config dir>/stocktake.toml when present, else built-in defaults)
    "config.path": null
}
"#;

        if let Err(e) = fs::write(&path, default_config) {
            log::warn!("Error writing default settings.json: {}", e);
        }
    }

    /// Get the config file path for display/opening
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}
