//! # Quick Exit
//!
//! The page a user is sent to when they hit the quick-exit button. The URL is
//! the only state this crate keeps on the device; it lives in a [`LocalStore`]
//! under [`QUICK_EXIT_KEY`].
//!
//! Only `http` and `https` URLs with a host are accepted. The check runs when
//! a URL is saved and again when it is read, so a value written to the store
//! by other means can never be used; [`QuickExit::url`] falls back to
//! [`DEFAULT_EXIT_URL`] instead.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

pub const QUICK_EXIT_KEY: &str = "reporther.quickExitUrl";
pub const DEFAULT_EXIT_URL: &str = "https://www.google.com/";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid exit URL: {0}")]
    InvalidUrl(String),
    #[error("Local storage unavailable: {0}")]
    Io(String),
    #[error("Local storage corrupted: {0}")]
    Corrupted(String),
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        StorageError::Io(error.to_string())
    }
}

impl From<StorageError> for crate::error::AppError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::InvalidUrl(message) => crate::error::AppError::InvalidInput(message),
            other => crate::error::AppError::Storage(other.to_string()),
        }
    }
}

/// Device-local string storage.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, StorageError> {
        self.values
            .lock()
            .map_err(|_| StorageError::Io("memory store lock poisoned".into()))
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values()?.remove(key);
        Ok(())
    }
}

/// A JSON object on disk, rewritten atomically on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, Value>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&text).map_err(|error| StorageError::Corrupted(error.to_string()))
    }

    // Write to a sibling temp file, then rename over the original.
    fn save(&self, values: &BTreeMap<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(values)
            .map_err(|error| StorageError::Corrupted(error.to_string()))?;
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;
        debug!(path = %self.path.display(), "Local store written");
        Ok(())
    }

    fn modify<F>(&self, change: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, Value>),
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StorageError::Io("file store lock poisoned".into()))?;
        let mut values = self.load()?;
        change(&mut values);
        self.save(&values)
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .load()?
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.modify(|values| {
            values.insert(key.to_string(), Value::String(value.to_string()));
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.modify(|values| {
            values.remove(key);
        })
    }
}

/// Parses `raw` and accepts it only as an `http`/`https` URL with a host.
pub fn validate_exit_url(raw: &str) -> Result<Url, StorageError> {
    let url = Url::parse(raw.trim()).map_err(|error| {
        StorageError::InvalidUrl(format!("{raw:?} is not a valid URL ({error})"))
    })?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(StorageError::InvalidUrl(format!(
                "only http and https URLs are allowed, got {scheme}"
            )))
        }
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(StorageError::InvalidUrl(format!("{raw:?} has no host")));
    }
    Ok(url)
}

/// Reads and writes the quick-exit URL.
pub struct QuickExit<S> {
    store: S,
}

impl<S: LocalStore> QuickExit<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates and stores `raw`. An invalid URL leaves the stored value untouched.
    pub fn save_url(&self, raw: &str) -> Result<Url, StorageError> {
        let url = validate_exit_url(raw).map_err(|error| {
            warn!(error = %error, "Rejected quick-exit URL");
            error
        })?;
        self.store.set(QUICK_EXIT_KEY, url.as_str())?;
        info!(url = %url, "Quick-exit URL saved");
        Ok(url)
    }

    /// The URL to exit to; the default when nothing valid is stored.
    pub fn url(&self) -> String {
        let stored = match self.store.get(QUICK_EXIT_KEY) {
            Ok(stored) => stored,
            Err(error) => {
                warn!(error = %error, "Quick-exit URL unreadable, using default");
                None
            }
        };
        stored
            .and_then(|raw| match validate_exit_url(&raw) {
                Ok(url) => Some(String::from(url)),
                Err(error) => {
                    warn!(error = %error, "Stored quick-exit URL ignored");
                    None
                }
            })
            .unwrap_or_else(|| DEFAULT_EXIT_URL.to_string())
    }

    /// The raw stored value, valid or not.
    pub fn stored_url(&self) -> Result<Option<String>, StorageError> {
        self.store.get(QUICK_EXIT_KEY)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(QUICK_EXIT_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_http_urls_are_accepted() {
        assert!(validate_exit_url("https://weather.example.com/today").is_ok());
        assert!(validate_exit_url("  http://news.example.org ").is_ok());

        for raw in [
            "ftp://bad",
            "javascript:alert(1)",
            "data:text/html,hi",
            "file:///etc/passwd",
            "not a url",
            "",
        ] {
            assert!(
                matches!(validate_exit_url(raw), Err(StorageError::InvalidUrl(_))),
                "accepted {raw:?}"
            );
        }
    }

    #[test]
    fn test_rejected_url_keeps_previous_value() {
        let exit = QuickExit::new(MemoryStore::new());
        exit.save_url("https://weather.example.com/").unwrap();

        assert!(exit.save_url("ftp://bad").is_err());
        assert_eq!(
            exit.stored_url().unwrap().as_deref(),
            Some("https://weather.example.com/")
        );
        assert_eq!(exit.url().as_str(), "https://weather.example.com/");
    }

    #[test]
    fn test_tampered_value_falls_back_to_default() {
        let store = MemoryStore::new();
        store.set(QUICK_EXIT_KEY, "javascript:alert(1)").unwrap();
        let exit = QuickExit::new(store);

        assert_eq!(exit.url().as_str(), DEFAULT_EXIT_URL);
        exit.clear().unwrap();
        assert_eq!(exit.stored_url().unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings").join("local.json");

        let exit = QuickExit::new(FileStore::new(&path));
        assert_eq!(exit.url().as_str(), DEFAULT_EXIT_URL);
        exit.save_url("https://recipes.example.net/soup").unwrap();

        let reopened = QuickExit::new(FileStore::new(&path));
        assert_eq!(reopened.url().as_str(), "https://recipes.example.net/soup");
        assert!(!path.with_extension("tmp").exists());

        reopened.clear().unwrap();
        assert_eq!(QuickExit::new(FileStore::new(&path)).stored_url().unwrap(), None);
    }

    #[test]
    fn test_corrupted_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(store.get(QUICK_EXIT_KEY), Err(StorageError::Corrupted(_))));
        assert_eq!(QuickExit::new(store).url().as_str(), DEFAULT_EXIT_URL);
    }
}
