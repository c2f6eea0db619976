//! Opening and saving the persisted scan session.
//!
//! Every command that touches state goes through [`ScanSession`]: it resolves
//! settings, builds the engine from the configured schema, and restores the
//! state saved under the active namespace.

use std::path::PathBuf;

use stocktake_config::session::FileStore;
use stocktake_config::settings::Settings;
use stocktake_recon::{Engine, PersistenceGateway, StoreError};

use crate::exit_codes::{store_exit_code, EXIT_CONFIG, EXIT_NO_DATA};
use crate::CliError;

/// Global options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub namespace: Option<String>,
    pub store_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

pub struct ScanSession {
    pub engine: Engine,
    pub settings: Settings,
    gateway: PersistenceGateway<FileStore>,
}

impl ScanSession {
    pub fn open(opts: &SessionOptions) -> Result<Self, CliError> {
        let mut settings = Settings::load();
        if let Some(ns) = &opts.namespace {
            settings.namespace = ns.clone();
        }
        if let Some(dir) = &opts.store_dir {
            settings.store_dir = Some(dir.clone());
        }
        if let Some(path) = &opts.config {
            settings.engine_config = Some(path.clone());
        }

        let config = settings.engine_config().map_err(|e| CliError {
            code: EXIT_CONFIG,
            message: e,
            hint: Some(format!("settings: {}", Settings::config_path_display())),
        })?;

        let store_dir = settings.store_dir();
        tracing::debug!(
            namespace = %settings.namespace,
            store = %store_dir.display(),
            "opening session"
        );

        let gateway =
            PersistenceGateway::with_namespace(FileStore::new(store_dir), settings.namespace.clone());
        let engine = match gateway.load().map_err(CliError::store)? {
            Some(state) => Engine::with_state(config, state),
            None => Engine::new(config),
        };

        Ok(Self { engine, settings, gateway })
    }

    pub fn namespace(&self) -> &str {
        self.gateway.namespace()
    }

    /// Fail with EXIT_NO_DATA when nothing has been loaded yet.
    pub fn require_records(&self) -> Result<(), CliError> {
        if self.engine.state().records.is_empty() {
            return Err(CliError {
                code: EXIT_NO_DATA,
                message: format!("no inventory loaded in session '{}'", self.namespace()),
                hint: Some("run `stocktake load <file>` first".to_string()),
            });
        }
        Ok(())
    }

    pub fn save(&mut self) -> Result<(), CliError> {
        self.gateway.save(self.engine.state()).map_err(CliError::store)
    }

    /// Remove the stored document and reset the in-memory engine.
    pub fn clear(&mut self) -> Result<(), CliError> {
        self.engine.clear();
        self.gateway.clear().map_err(CliError::store)
    }
}

impl CliError {
    pub fn store(err: StoreError) -> Self {
        let hint = match &err {
            StoreError::Backend { .. } => {
                Some("check store.dir in settings.json or pass --store-dir".to_string())
            }
            StoreError::Encode(_) => None,
        };
        Self { code: store_exit_code(&err), message: err.to_string(), hint }
    }
}
