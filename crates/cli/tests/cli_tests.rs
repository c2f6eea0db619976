// End-to-end tests for the `stocktake` binary.
// Run with: cargo test -p stocktake-cli --test cli_tests -- --nocapture

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

/// Isolated config home per test; sessions land in `<home>/sessions`.
struct Sandbox {
    home: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self { home: TempDir::new().unwrap() }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_stocktake"));
        cmd.env("STOCKTAKE_HOME", self.home.path())
            .env_remove("STOCKTAKE_NAMESPACE")
            .env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.cmd().args(args).output().expect("run stocktake")
    }

    fn run_stdin(&self, args: &[&str], input: &str) -> Output {
        let mut child = self
            .cmd()
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn stocktake");
        child.stdin.take().unwrap().write_all(input.as_bytes()).unwrap();
        child.wait_with_output().unwrap()
    }

    fn loaded() -> Self {
        let sandbox = Self::new();
        let out = sandbox.run(&["load", &fixture("inventory.csv")]);
        assert!(out.status.success(), "load failed: {}", stderr(&out));
        sandbox
    }

    fn status(&self) -> serde_json::Value {
        let out = self.run(&["status", "--json"]);
        assert!(out.status.success());
        serde_json::from_slice(&out.stdout).expect("valid JSON")
    }
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// load / check
// ---------------------------------------------------------------------------

#[test]
fn load_prints_counts_and_double_booking() {
    let sandbox = Sandbox::new();
    let out = sandbox.run(&["load", &fixture("inventory.csv")]);
    assert!(out.status.success());

    let text = stdout(&out);
    assert!(text.contains("loaded 5 records into 'stockscan': 4 expected as 'new'"), "{text}");
    assert!(text.contains("DOUBLE BOOKING: serial SN-2 booked to 2 stock items (2002, 2003)"));
    assert!(!text.contains("NO DOUBLE BOOKINGS DETECTED"));
}

#[test]
fn load_json_summary() {
    let sandbox = Sandbox::new();
    let out = sandbox.run(&["load", &fixture("inventory.csv"), "--json"]);
    assert!(out.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(summary["records"], 5);
    assert_eq!(summary["expected"], 4);
    assert_eq!(summary["header_found"], true);
    assert_eq!(summary["duplicates"][0]["serial"], "SN-2");
    assert_eq!(summary["duplicates"][0]["stock_ids"], serde_json::json!(["2002", "2003"]));
}

#[test]
fn load_without_header_exits_no_data() {
    let sandbox = Sandbox::new();
    let out = sandbox.run(&["load", &fixture("no_header.csv")]);
    assert_eq!(out.status.code(), Some(6));
    assert!(stderr(&out).contains("no header row found"));
    assert_eq!(sandbox.status()["records"], 0);
}

#[test]
fn load_missing_file_exits_io() {
    let sandbox = Sandbox::new();
    let out = sandbox.run(&["load", "/nonexistent/inventory.csv"]);
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn check_reports_without_touching_session() {
    let sandbox = Sandbox::new();
    let out = sandbox.run(&["check", &fixture("inventory.csv"), "--json"]);
    assert!(out.status.success());

    let groups: Vec<serde_json::Value> = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["serial"], "SN-2");

    assert_eq!(sandbox.status()["records"], 0);
}

// ---------------------------------------------------------------------------
// scan
// ---------------------------------------------------------------------------

#[test]
fn scan_codes_report_outcomes_and_progress() {
    let sandbox = Sandbox::loaded();
    let out = sandbox.run(&["scan", "2001", "2001.0", "2004", "9999"]);
    assert!(out.status.success());

    let text = stdout(&out);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "OK         2001  SN-1 Acme X1 9mm");
    assert_eq!(lines[1], "DUPLICATE  2001");
    // Used stock is not expected
    assert_eq!(lines[2], "NOT FOUND  2004");
    assert_eq!(lines[3], "NOT FOUND  9999");
    assert_eq!(lines[4], "progress: 1/4 scanned, 3 remaining (25%)");

    let status = sandbox.status();
    assert_eq!(status["progress"]["scanned"], 1);
    assert_eq!(status["last_scan"]["stock_id"], "2001");
}

#[test]
fn scan_reads_stdin_lines() {
    let sandbox = Sandbox::loaded();
    let out = sandbox.run_stdin(&["scan", "--json"], "2002\r\n 2003.0 \n\n");
    assert!(out.status.success(), "{}", stderr(&out));

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let outcomes = report["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0]["outcome"], "accepted");
    assert_eq!(outcomes[0]["value"]["stock_id"], "2002");
    assert_eq!(outcomes[1]["value"]["stock_id"], "2003");
    assert_eq!(outcomes[2]["outcome"], "rejected_empty");
    assert_eq!(report["progress"]["scanned"], 2);
    assert_eq!(report["progress"]["percent"], 50);
}

#[test]
fn coalesce_drops_rapid_repeats() {
    let sandbox = Sandbox::loaded();
    let out = sandbox.run_stdin(&["scan", "--coalesce"], "2001\n2001\n2002\n");
    assert!(out.status.success());

    let text = stdout(&out);
    assert!(!text.contains("DUPLICATE"), "{text}");
    assert!(text.contains("progress: 2/4 scanned"));
}

#[test]
fn coalesce_with_codes_is_usage_error() {
    let sandbox = Sandbox::loaded();
    let out = sandbox.run(&["scan", "2001", "--coalesce"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn strict_scan_exits_on_rejection() {
    let sandbox = Sandbox::loaded();
    let out = sandbox.run(&["scan", "--strict", "2001", "9999"]);
    assert_eq!(out.status.code(), Some(7));
    assert!(stderr(&out).contains("1 of 2 scans rejected"));

    // The accepted scan is still kept
    assert_eq!(sandbox.status()["progress"]["scanned"], 1);
}

#[test]
fn scan_before_load_exits_no_data() {
    let sandbox = Sandbox::new();
    let out = sandbox.run(&["scan", "2001"]);
    assert_eq!(out.status.code(), Some(6));
    assert!(stderr(&out).contains("stocktake load"));
}

// ---------------------------------------------------------------------------
// filter / options
// ---------------------------------------------------------------------------

#[test]
fn filter_narrows_expected_view() {
    let sandbox = Sandbox::loaded();
    let out = sandbox.run(&["filter", "--make", "Acme", "--model", "X2"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("progress: 0/2 scanned"));

    // Outside the filter
    let out = sandbox.run(&["scan", "2001"]);
    assert!(stdout(&out).contains("NOT FOUND  2001"));

    let status = sandbox.status();
    assert_eq!(status["filter"]["make"], "Acme");
    assert_eq!(status["filter"]["model"], "X2");

    // No flags clears both
    assert!(sandbox.run(&["filter"]).status.success());
    let status = sandbox.status();
    assert!(status["filter"]["make"].is_null());
    assert_eq!(status["progress"]["expected"], 4);
}

#[test]
fn options_list_eligible_makes_and_models() {
    let sandbox = Sandbox::loaded();
    let out = sandbox.run(&["options", "--json"]);
    let opts: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(opts["makes"], serde_json::json!(["Acme", "Bolt"]));
    // B7 is only held as used stock
    assert_eq!(opts["models"], serde_json::json!(["X1", "X2", "B9"]));

    let out = sandbox.run(&["options", "--make", "Acme", "--json"]);
    let opts: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(opts["models"], serde_json::json!(["X1", "X2"]));
}

// ---------------------------------------------------------------------------
// export
// ---------------------------------------------------------------------------

#[test]
fn export_missing_to_stdout() {
    let sandbox = Sandbox::loaded();
    sandbox.run(&["scan", "2001", "2005"]);

    let out = sandbox.run(&["export", "missing"]);
    assert!(out.status.success());
    assert_eq!(
        stdout(&out),
        "Stock,Serial,Make,Model,Calibre,Condition\n\
         2002,SN-2,Acme,X2,9mm,new\n\
         2003,SN-2,Acme,X2,9mm,New\n"
    );
}

#[test]
fn export_scanned_to_file_as_json() {
    let sandbox = Sandbox::loaded();
    sandbox.run(&["scan", "2005"]);

    let path = sandbox.home.path().join("scanned.json");
    let out = sandbox.run(&["export", "scanned", "--format", "json", "-o", path.to_str().unwrap()]);
    assert!(out.status.success(), "{}", stderr(&out));

    let rows: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["stock_id"], "2005");
    assert_eq!(rows[0]["make"], "Bolt");
}

#[test]
fn export_save_uses_settings_export_dir() {
    let sandbox = Sandbox::loaded();
    let exports = sandbox.home.path().join("exports");
    std::fs::create_dir(&exports).unwrap();
    std::fs::write(
        sandbox.home.path().join("settings.json"),
        serde_json::json!({ "export.dir": exports }).to_string(),
    )
    .unwrap();

    let out = sandbox.run(&["export", "missing", "--save"]);
    assert!(out.status.success(), "{}", stderr(&out));

    let csv = std::fs::read_to_string(exports.join("missing.csv")).unwrap();
    assert_eq!(csv.lines().count(), 5);
}

#[test]
fn export_into_missing_directory_exits_io() {
    let sandbox = Sandbox::loaded();
    let out = sandbox.run(&["export", "missing", "-o", "/nonexistent/dir/missing.csv"]);
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn export_unknown_kind_is_usage_error() {
    let sandbox = Sandbox::loaded();
    let out = sandbox.run(&["export", "everything"]);
    assert_eq!(out.status.code(), Some(2));
}

// ---------------------------------------------------------------------------
// reset / clear / namespaces / config
// ---------------------------------------------------------------------------

#[test]
fn reset_keeps_records_and_filters() {
    let sandbox = Sandbox::loaded();
    sandbox.run(&["filter", "--make", "Acme"]);
    sandbox.run(&["scan", "2001", "2002"]);

    let out = sandbox.run(&["reset"]);
    assert!(stdout(&out).contains("cleared 2 scans"));

    let status = sandbox.status();
    assert_eq!(status["records"], 5);
    assert_eq!(status["filter"]["make"], "Acme");
    assert_eq!(status["progress"]["scanned"], 0);
    assert!(status["last_scan"].is_null());
}

#[test]
fn clear_drops_stored_session() {
    let sandbox = Sandbox::loaded();
    assert!(sandbox.home.path().join("sessions/stockscan.json").exists());

    assert!(sandbox.run(&["clear"]).status.success());
    assert!(!sandbox.home.path().join("sessions/stockscan.json").exists());
    assert_eq!(sandbox.status()["records"], 0);
}

#[test]
fn namespaces_are_isolated() {
    let sandbox = Sandbox::loaded();
    sandbox.run(&["scan", "2001"]);

    let out = sandbox.run(&["status", "--json", "--namespace", "front-counter"]);
    let other: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(other["namespace"], "front-counter");
    assert_eq!(other["records"], 0);

    assert_eq!(sandbox.status()["progress"]["scanned"], 1);
}

#[test]
fn store_dir_flag_overrides_settings() {
    let sandbox = Sandbox::new();
    let store = sandbox.home.path().join("elsewhere");
    let out = sandbox.run(&["load", &fixture("inventory.csv"), "--store-dir", store.to_str().unwrap()]);
    assert!(out.status.success());
    assert!(store.join("stockscan.json").exists());
}

#[test]
fn custom_target_condition_from_config() {
    let sandbox = Sandbox::new();
    let config = sandbox.home.path().join("used.toml");
    std::fs::write(&config, "target_condition = \"Used\"\n").unwrap();

    let out = sandbox.run(&["load", &fixture("inventory.csv"), "--config", config.to_str().unwrap()]);
    assert!(stdout(&out).contains("1 expected as 'used'"), "{}", stdout(&out));
}

#[test]
fn invalid_config_exits_config_error() {
    let sandbox = Sandbox::new();
    let config = sandbox.home.path().join("bad.toml");
    std::fs::write(&config, "target_condition = [").unwrap();

    let out = sandbox.run(&["status", "--config", config.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(4));
}

#[test]
fn corrupt_session_starts_fresh() {
    let sandbox = Sandbox::loaded();
    std::fs::write(sandbox.home.path().join("sessions/stockscan.json"), "{ not json").unwrap();

    let status = sandbox.status();
    assert_eq!(status["records"], 0);
}

#[test]
fn similar_namespaces_keep_separate_files() {
    let sandbox = Sandbox::new();
    let out = sandbox.run(&["load", &fixture("inventory.csv"), "--namespace", "shop 1"]);
    assert!(out.status.success());
    assert!(sandbox.home.path().join("sessions/shop%201.json").exists());

    let out = sandbox.run(&["status", "--json", "--namespace", "shop_1"]);
    let other: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(other["records"], 0);
}
