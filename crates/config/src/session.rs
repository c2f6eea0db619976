use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use stocktake_recon::{StateStore, StoreError};

/// Key-value store backed by one JSON file per key.
///
/// Keys are namespace strings. Bytes outside `[A-Za-z0-9_-]` are written as
/// `%XX`, so distinct keys always get distinct files inside the store directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<config dir>/sessions`
    pub fn default_dir() -> PathBuf {
        crate::config_dir().join("sessions")
    }

    /// File a key is stored in.
    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }

    fn backend_err(key: &str, e: impl std::fmt::Display) -> StoreError {
        StoreError::Backend {
            namespace: key.to_string(),
            message: e.to_string(),
        }
    }
}

/// Percent-encode a key for use as a file stem. The empty key becomes `%`,
/// which no non-empty key encodes to.
fn encode_key(key: &str) -> String {
    if key.is_empty() {
        return "%".to_string();
    }
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::backend_err(key, e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| Self::backend_err(key, e))?;

        // Write-then-rename: readers never see a half-written session
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| Self::backend_err(key, e))?;
        fs::rename(&tmp, &path).map_err(|e| Self::backend_err(key, e))
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::backend_err(key, e)),
        }
    }
}
