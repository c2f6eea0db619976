//! `stocktake-recon` - Stock-take reconciliation engine.
//!
//! Pure engine crate: receives raw CSV text and raw scan codes, returns
//! structured outcomes. No CLI or file IO dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod intake;
pub mod integrity;
pub mod model;
pub mod parse;
pub mod persist;
pub mod record;
pub mod schema;

pub use config::StocktakeConfig;
pub use engine::Engine;
pub use error::{ConfigError, ExportError, StoreError};
pub use model::{
    DuplicateSerialGroup, InventoryRecord, LoadReport, Progress, ReconciliationState,
    ScanOutcome,
};
pub use persist::{MemoryStore, PersistenceGateway, StateStore};
