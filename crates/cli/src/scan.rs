//! `stocktake scan` - submit codes to the persisted session.

use std::io::{self, BufRead, Write};
use std::time::Instant;

use serde::Serialize;
use stocktake_recon::intake::DecodeCoalescer;
use stocktake_recon::{InventoryRecord, Progress, ScanOutcome};

use crate::exit_codes::EXIT_SCAN_REJECTED;
use crate::session::ScanSession;
use crate::CliError;

pub struct ScanArgs {
    pub codes: Vec<String>,
    pub json: bool,
    pub strict: bool,
    pub coalesce: bool,
}

#[derive(Serialize)]
struct ScanReport<'a> {
    outcomes: &'a [ScanOutcome],
    progress: Progress,
}

pub fn cmd_scan(session: &mut ScanSession, args: ScanArgs) -> Result<(), CliError> {
    if args.coalesce && !args.codes.is_empty() {
        return Err(CliError::usage("--coalesce only applies when reading codes from stdin"));
    }
    session.require_records()?;

    let mut outcomes = Vec::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.codes.is_empty() {
        let mut coalescer = args
            .coalesce
            .then(|| DecodeCoalescer::from_config(&session.engine.config().intake));

        for line in io::stdin().lock().lines() {
            let line = line.map_err(|e| CliError::io(format!("stdin: {e}")))?;
            if let Some(c) = coalescer.as_mut() {
                if !c.accept(&line, Instant::now()) {
                    tracing::debug!(code = %line.trim(), "suppressed repeat decode");
                    continue;
                }
            }
            let outcome = submit(session, &line)?;
            if !args.json {
                writeln!(out, "{}", format_outcome(&outcome)).map_err(|e| CliError::io(e.to_string()))?;
                out.flush().map_err(|e| CliError::io(e.to_string()))?;
            }
            outcomes.push(outcome);
        }
    } else {
        for code in &args.codes {
            let outcome = submit(session, code)?;
            if !args.json {
                writeln!(out, "{}", format_outcome(&outcome)).map_err(|e| CliError::io(e.to_string()))?;
            }
            outcomes.push(outcome);
        }
    }

    let progress = session.engine.progress();
    if args.json {
        let report = ScanReport { outcomes: &outcomes, progress };
        let json = serde_json::to_string_pretty(&report).map_err(|e| CliError::io(e.to_string()))?;
        writeln!(out, "{json}").map_err(|e| CliError::io(e.to_string()))?;
    } else {
        writeln!(out, "{}", format_progress(&progress)).map_err(|e| CliError::io(e.to_string()))?;
    }

    let rejected = outcomes.iter().filter(|o| !o.is_accepted()).count();
    if args.strict && rejected > 0 {
        return Err(CliError {
            code: EXIT_SCAN_REJECTED,
            message: format!("{rejected} of {} scans rejected", outcomes.len()),
            hint: None,
        });
    }
    Ok(())
}

/// Submit one code. Accepted scans are saved before the next line is read.
fn submit(session: &mut ScanSession, code: &str) -> Result<ScanOutcome, CliError> {
    let outcome = session.engine.submit_scan(code);
    if outcome.is_accepted() {
        session.save()?;
    }
    Ok(outcome)
}

fn describe(record: &InventoryRecord) -> String {
    [&record.serial, &record.make, &record.model, &record.calibre]
        .into_iter()
        .filter_map(|f| f.as_deref())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn format_outcome(outcome: &ScanOutcome) -> String {
    match outcome {
        ScanOutcome::Accepted(record) => {
            let detail = describe(record);
            if detail.is_empty() {
                format!("OK         {}", record.stock_id)
            } else {
                format!("OK         {}  {}", record.stock_id, detail)
            }
        }
        ScanOutcome::RejectedDuplicate(id) => format!("DUPLICATE  {id}"),
        ScanOutcome::RejectedNotFound(id) => format!("NOT FOUND  {id}"),
        ScanOutcome::RejectedEmpty => "EMPTY".to_string(),
    }
}

pub fn format_progress(progress: &Progress) -> String {
    format!(
        "progress: {}/{} scanned, {} remaining ({}%)",
        progress.scanned, progress.expected, progress.remaining, progress.percent
    )
}
