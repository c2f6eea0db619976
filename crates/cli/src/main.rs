// stocktake CLI - headless stock-take scanning sessions

mod exit_codes;
mod logging;
mod scan;
mod session;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use stocktake_recon::export::{render, ExportKind};
use stocktake_recon::integrity::describe;
use stocktake_recon::{Engine, InventoryRecord, LoadReport};

use exit_codes::{EXIT_ERROR, EXIT_IO, EXIT_NO_DATA, EXIT_SUCCESS, EXIT_USAGE};
use scan::{format_progress, ScanArgs};
use session::{ScanSession, SessionOptions};

#[derive(Parser)]
#[command(name = "stocktake")]
#[command(about = "Reconcile barcode scans against an inventory export")]
#[command(version)]
struct Cli {
    /// Session namespace (overrides store.namespace)
    #[arg(long, global = true, env = "STOCKTAKE_NAMESPACE")]
    namespace: Option<String>,

    /// Directory sessions are stored in (overrides store.dir)
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Engine config TOML (overrides config.path)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load an inventory CSV, replacing the session's records and scans
    #[command(after_help = "\
Examples:
  stocktake load stock_report.csv
  stocktake load export.csv --namespace back-room
  stocktake load stock_report.csv --json")]
    Load {
        /// Inventory export (CSV, any column order, preamble rows allowed)
        file: PathBuf,

        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },

    /// Submit scan codes (one per argument, or one per stdin line)
    #[command(after_help = "\
Examples:
  stocktake scan 001 002 003
  scanner-feed | stocktake scan --coalesce
  stocktake scan 001 --strict --json")]
    Scan {
        /// Codes to submit (omit to read stdin)
        codes: Vec<String>,

        /// Output outcomes and progress as JSON
        #[arg(long)]
        json: bool,

        /// Exit 7 if any scan is rejected
        #[arg(long)]
        strict: bool,

        /// Drop repeats of the same code arriving within the camera cooldown
        #[arg(long)]
        coalesce: bool,
    },

    /// Narrow the expected view by make and/or model (omitted = cleared)
    Filter {
        #[arg(long)]
        make: Option<String>,

        #[arg(long)]
        model: Option<String>,
    },

    /// List makes and models available for filtering
    Options {
        /// Only models of this make
        #[arg(long)]
        make: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Show progress, filters and the last accepted scan
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Report serial numbers booked to more than one stock item
    #[command(after_help = "\
Examples:
  stocktake check stock_report.csv
  stocktake check stock_report.csv --json")]
    Check {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Export the scanned or missing view
    #[command(after_help = "\
Examples:
  stocktake export missing
  stocktake export scanned -o scanned.csv
  stocktake export missing --save
  stocktake export missing --format json -o missing.json")]
    Export {
        /// scanned | missing
        kind: ExportKind,

        /// Output file (omit or '-' for stdout)
        #[arg(long, short = 'o', conflicts_with = "save")]
        output: Option<PathBuf>,

        /// Write <kind>.csv into export.dir (or the current directory)
        #[arg(long)]
        save: bool,

        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,
    },

    /// Forget all scans, keeping records and filters
    Reset,

    /// Delete the stored session
    Clear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let opts = SessionOptions {
        namespace: cli.namespace,
        store_dir: cli.store_dir,
        config: cli.config,
    };

    let result = match cli.command {
        Commands::Load { file, json } => cmd_load(&opts, &file, json),
        Commands::Scan { codes, json, strict, coalesce } => {
            ScanSession::open(&opts).and_then(|mut session| {
                scan::cmd_scan(&mut session, ScanArgs { codes, json, strict, coalesce })
            })
        }
        Commands::Filter { make, model } => cmd_filter(&opts, make, model),
        Commands::Options { make, json } => cmd_options(&opts, make, json),
        Commands::Status { json } => cmd_status(&opts, json),
        Commands::Check { file, json } => cmd_check(&opts, &file, json),
        Commands::Export { kind, output, save, format } => {
            cmd_export(&opts, kind, output, save, format)
        }
        Commands::Reset => cmd_reset(&opts),
        Commands::Clear => cmd_clear(&opts),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| CliError::general(e.to_string()))?;
    println!("{json}");
    Ok(())
}

fn no_header(file: &Path) -> CliError {
    CliError {
        code: EXIT_NO_DATA,
        message: format!("{}: no header row found", file.display()),
        hint: Some("expected a row naming Stock, Make, Model and Condition columns".to_string()),
    }
}

// ============================================================================
// load / check
// ============================================================================

fn read_inventory(file: &Path) -> Result<String, CliError> {
    stocktake_io::csv::import(file).map_err(CliError::io)
}

fn load_summary(report: &LoadReport, expected: usize) -> serde_json::Value {
    json!({
        "records": report.records.len(),
        "expected": expected,
        "dropped_rows": report.dropped_rows,
        "header_found": report.header_found,
        "duplicates": report.duplicates,
    })
}

fn cmd_load(opts: &SessionOptions, file: &Path, json: bool) -> Result<(), CliError> {
    let text = read_inventory(file)?;
    let mut session = ScanSession::open(opts)?;

    let source = file.file_name().map(|n| n.to_string_lossy().into_owned());
    let report = session.engine.load_named(&text, source.as_deref());
    session.save()?;

    if !report.header_found {
        return Err(no_header(file));
    }

    let expected = session.engine.expected_view().len();
    if json {
        return print_json(&load_summary(&report, expected));
    }

    println!(
        "loaded {} records into '{}': {} expected as '{}', {} rows dropped",
        report.records.len(),
        session.namespace(),
        expected,
        session.engine.config().normalized_target(),
        report.dropped_rows,
    );
    for line in describe(&report.duplicates) {
        println!("{line}");
    }
    Ok(())
}

fn cmd_check(opts: &SessionOptions, file: &Path, json: bool) -> Result<(), CliError> {
    let text = read_inventory(file)?;
    let session = ScanSession::open(opts)?;

    // Scratch engine: the stored session is left untouched
    let mut engine = Engine::new(session.engine.config().clone());
    let report = engine.load(&text);
    if !report.header_found {
        return Err(no_header(file));
    }

    if json {
        return print_json(&report.duplicates);
    }
    for line in describe(&report.duplicates) {
        println!("{line}");
    }
    Ok(())
}

// ============================================================================
// filter / options / status
// ============================================================================

fn cmd_filter(opts: &SessionOptions, make: Option<String>, model: Option<String>) -> Result<(), CliError> {
    let mut session = ScanSession::open(opts)?;
    session.require_records()?;

    session.engine.set_filter(make.as_deref(), model.as_deref());
    session.save()?;

    let state = session.engine.state();
    println!(
        "filter: make={} model={}",
        state.filter_make.as_deref().unwrap_or("*"),
        state.filter_model.as_deref().unwrap_or("*"),
    );
    println!("{}", format_progress(&session.engine.progress()));
    Ok(())
}

fn cmd_options(opts: &SessionOptions, make: Option<String>, json: bool) -> Result<(), CliError> {
    let session = ScanSession::open(opts)?;
    session.require_records()?;

    let makes = session.engine.makes();
    let models = session.engine.models(make.as_deref());

    if json {
        return print_json(&json!({ "makes": makes, "models": models }));
    }
    println!("makes:  {}", makes.join(", "));
    println!("models: {}", models.join(", "));
    Ok(())
}

fn cmd_status(opts: &SessionOptions, json: bool) -> Result<(), CliError> {
    let session = ScanSession::open(opts)?;
    let engine = &session.engine;
    let state = engine.state();
    let progress = engine.progress();

    if json {
        return print_json(&json!({
            "namespace": session.namespace(),
            "source": state.source,
            "loaded_at": state.loaded_at,
            "records": state.records.len(),
            "progress": progress,
            "filter": { "make": state.filter_make, "model": state.filter_model },
            "last_scan": engine.last_scan_record(),
        }));
    }

    if state.is_empty() {
        println!("session '{}': nothing loaded", session.namespace());
        return Ok(());
    }

    println!(
        "session '{}': {} records from {}",
        session.namespace(),
        state.records.len(),
        state.source.as_deref().unwrap_or("(unknown)"),
    );
    if let Some(make) = &state.filter_make {
        println!("make:   {make}");
    }
    if let Some(model) = &state.filter_model {
        println!("model:  {model}");
    }
    if let Some(last) = engine.last_scan_record() {
        println!("last:   {}", scan::format_outcome(&stocktake_recon::ScanOutcome::Accepted(last.clone())));
    }
    println!("{}", format_progress(&progress));
    if progress.is_complete() {
        println!("all expected items scanned");
    }
    Ok(())
}

// ============================================================================
// export
// ============================================================================

fn write_stdout(records: &[&InventoryRecord], format: ExportFormat) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        ExportFormat::Csv => render(records, &mut out).map_err(|e| CliError::io(e.to_string()))?,
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut out, records).map_err(|e| CliError::io(e.to_string()))?;
            writeln!(out).map_err(|e| CliError::io(e.to_string()))?;
        }
    }
    out.flush().map_err(|e| CliError::io(e.to_string()))
}

fn cmd_export(
    opts: &SessionOptions,
    kind: ExportKind,
    output: Option<PathBuf>,
    save: bool,
    format: ExportFormat,
) -> Result<(), CliError> {
    let session = ScanSession::open(opts)?;
    session.require_records()?;
    let records = session.engine.export_view(kind);

    let path = if save {
        let dir = session.settings.export_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        let name = match format {
            ExportFormat::Csv => kind.file_name(),
            ExportFormat::Json => format!("{kind}.json"),
        };
        Some(dir.join(name))
    } else {
        output.filter(|p| p.as_os_str() != "-")
    };

    let Some(path) = path else {
        return write_stdout(&records, format);
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            return Err(CliError::io(format!("{}: directory does not exist", parent.display()))
                .with_hint("create it first or set export.dir in settings.json"));
        }
    }

    match format {
        ExportFormat::Csv => stocktake_io::csv::export_view(&session.engine, kind, &path),
        ExportFormat::Json => stocktake_io::json::export(&records, &path).map(|()| records.len()),
    }
    .map_err(CliError::io)
    .map(|count| eprintln!("wrote {count} {kind} records to {}", path.display()))
}

// ============================================================================
// reset / clear
// ============================================================================

fn cmd_reset(opts: &SessionOptions) -> Result<(), CliError> {
    let mut session = ScanSession::open(opts)?;
    let count = session.engine.state().scanned.len();
    session.engine.reset_scans();
    session.save()?;
    println!("cleared {count} scans in '{}'", session.namespace());
    Ok(())
}

fn cmd_clear(opts: &SessionOptions) -> Result<(), CliError> {
    let mut session = ScanSession::open(opts)?;
    session.clear()?;
    println!("cleared session '{}'", session.namespace());
    Ok(())
}
