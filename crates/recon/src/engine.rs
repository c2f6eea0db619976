use crate::config::StocktakeConfig;
use crate::export::ExportKind;
use crate::integrity::find_duplicate_serials;
use crate::model::{InventoryRecord, LoadReport, Progress, ReconciliationState, ScanOutcome};
use crate::record::{clean_stock, ingest};

/// Owns one [`ReconciliationState`] and every transition on it.
///
/// Operations run to completion and never do IO. Callers persist the state
/// (see [`crate::persist::PersistenceGateway`]) after each mutating call.
#[derive(Debug, Clone)]
pub struct Engine {
    config: StocktakeConfig,
    target: String,
    state: ReconciliationState,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(StocktakeConfig::default())
    }
}

fn blank_to_none(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

impl Engine {
    pub fn new(config: StocktakeConfig) -> Self {
        Self::with_state(config, ReconciliationState::default())
    }

    /// Resume from a previously persisted state.
    pub fn with_state(config: StocktakeConfig, state: ReconciliationState) -> Self {
        let target = config.normalized_target();
        Self {
            config,
            target,
            state,
        }
    }

    pub fn config(&self) -> &StocktakeConfig {
        &self.config
    }

    pub fn state(&self) -> &ReconciliationState {
        &self.state
    }

    pub fn into_state(self) -> ReconciliationState {
        self.state
    }

    // -----------------------------------------------------------------------
    // Load
    // -----------------------------------------------------------------------

    /// Replace the record set from raw CSV text. Clears scans and filters.
    pub fn load(&mut self, text: &str) -> LoadReport {
        self.load_named(text, None)
    }

    /// Like [`Engine::load`], remembering where the text came from.
    pub fn load_named(&mut self, text: &str, source: Option<&str>) -> LoadReport {
        let ingested = ingest(&self.config.schema, text);
        let duplicates = find_duplicate_serials(&ingested.records);

        if !ingested.header_found {
            log::warn!("no header row found; loaded 0 records");
        } else {
            log::info!(
                "loaded {} records ({} rows dropped without stock id)",
                ingested.records.len(),
                ingested.dropped_rows
            );
        }
        for group in &duplicates {
            log::warn!("double booking: {group}");
        }

        self.state = ReconciliationState {
            records: ingested.records.clone(),
            loaded_at: Some(chrono::Utc::now().to_rfc3339()),
            source: source.map(String::from),
            ..ReconciliationState::default()
        };

        LoadReport {
            records: ingested.records,
            duplicates,
            header_found: ingested.header_found,
            dropped_rows: ingested.dropped_rows,
        }
    }

    /// Drop everything back to the empty state.
    pub fn clear(&mut self) {
        self.state = ReconciliationState::default();
    }

    // -----------------------------------------------------------------------
    // View
    // -----------------------------------------------------------------------

    /// Blank values clear the corresponding filter.
    pub fn set_filter(&mut self, make: Option<&str>, model: Option<&str>) {
        self.state.filter_make = blank_to_none(make);
        self.state.filter_model = blank_to_none(model);
    }

    fn is_eligible(&self, record: &InventoryRecord) -> bool {
        record.normalized_condition() == self.target
    }

    fn is_expected(&self, record: &InventoryRecord) -> bool {
        self.is_eligible(record)
            && self
                .state
                .filter_make
                .as_ref()
                .map_or(true, |m| record.make.as_ref() == Some(m))
            && self
                .state
                .filter_model
                .as_ref()
                .map_or(true, |m| record.model.as_ref() == Some(m))
    }

    /// Records that should be scanned under the current condition and filters.
    pub fn expected_view(&self) -> Vec<&InventoryRecord> {
        self.state
            .records
            .iter()
            .filter(|r| self.is_expected(r))
            .collect()
    }

    pub fn export_view(&self, kind: ExportKind) -> Vec<&InventoryRecord> {
        self.expected_view()
            .into_iter()
            .filter(|r| {
                let scanned = self.state.scanned.contains(&r.stock_id);
                match kind {
                    ExportKind::Scanned => scanned,
                    ExportKind::Missing => !scanned,
                }
            })
            .collect()
    }

    /// Distinct makes among condition-eligible records, first-seen order.
    pub fn makes(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for record in self.state.records.iter().filter(|r| self.is_eligible(r)) {
            if let Some(make) = record.make.as_deref().filter(|m| !m.is_empty()) {
                if !out.contains(&make) {
                    out.push(make);
                }
            }
        }
        out
    }

    /// Distinct models among condition-eligible records, optionally for one make.
    pub fn models(&self, make: Option<&str>) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for record in self.state.records.iter().filter(|r| self.is_eligible(r)) {
            if make.is_some_and(|m| record.make.as_deref() != Some(m)) {
                continue;
            }
            if let Some(model) = record.model.as_deref().filter(|m| !m.is_empty()) {
                if !out.contains(&model) {
                    out.push(model);
                }
            }
        }
        out
    }

    // -----------------------------------------------------------------------
    // Scan
    // -----------------------------------------------------------------------

    /// Reconcile one raw scan code against the expected view.
    pub fn submit_scan(&mut self, raw_code: &str) -> ScanOutcome {
        let code = clean_stock(raw_code);
        if code.is_empty() {
            log::debug!("scan rejected: empty code");
            return ScanOutcome::RejectedEmpty;
        }

        let Some(record) = self
            .state
            .records
            .iter()
            .find(|r| r.stock_id == code && self.is_expected(r))
            .cloned()
        else {
            log::debug!("scan rejected: {code} not expected");
            return ScanOutcome::RejectedNotFound(code);
        };

        if self.state.scanned.contains(&record.stock_id) {
            log::debug!("scan rejected: {code} already scanned");
            return ScanOutcome::RejectedDuplicate(record.stock_id);
        }

        self.state.scanned.insert(record.stock_id.clone());
        self.state.last_scan = Some(record.stock_id.clone());
        log::debug!("scan accepted: {}", record.stock_id);
        ScanOutcome::Accepted(record)
    }

    /// The record behind `last_scan`, if it is still loaded.
    pub fn last_scan_record(&self) -> Option<&InventoryRecord> {
        let id = self.state.last_scan.as_ref()?;
        self.state.records.iter().find(|r| &r.stock_id == id)
    }

    pub fn progress(&self) -> Progress {
        let view = self.expected_view();
        let scanned = view
            .iter()
            .filter(|r| self.state.scanned.contains(&r.stock_id))
            .count();
        Progress::from_counts(view.len(), scanned)
    }

    /// Forget all scans; keep records and filters.
    pub fn reset_scans(&mut self) {
        self.state.scanned.clear();
        self.state.last_scan = None;
    }
}
