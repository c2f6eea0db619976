//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad args)                               |
//! | 3    | I/O error (unreadable input, unwritable export)      |
//! | 4    | Invalid settings or engine config                    |
//! | 5    | Session store failure                                |
//! | 6    | No data (no header row found, or nothing loaded)     |
//! | 7    | Scan rejected (only with `scan --strict`)            |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Input file unreadable or export target unwritable.
pub const EXIT_IO: u8 = 3;

/// settings.json / stocktake.toml could not be used.
pub const EXIT_CONFIG: u8 = 4;

/// The session store rejected a read or write.
pub const EXIT_STORE: u8 = 5;

/// No usable inventory: header row not found, or no session loaded.
pub const EXIT_NO_DATA: u8 = 6;

/// At least one scan was rejected and `--strict` was given.
pub const EXIT_SCAN_REJECTED: u8 = 7;

use stocktake_recon::StoreError;

/// Map a StoreError to its exit code.
pub fn store_exit_code(err: &StoreError) -> u8 {
    match err {
        StoreError::Encode(_) => EXIT_ERROR,
        StoreError::Backend { .. } => EXIT_STORE,
    }
}
