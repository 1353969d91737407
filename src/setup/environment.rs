//! Machine environment configuration
//!
//! Registers the engine directory on PATH and points TESSDATA_PREFIX at the
//! trained data directory. The backing store is injected so runs can target
//! the real machine environment or an in-memory map.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ProvisionError, ProvisionResult};

pub const PATH_KEY: &str = "Path";
pub const DATA_PREFIX_KEY: &str = "TESSDATA_PREFIX";
pub const PATH_SEPARATOR: char = ';';

/// Persistent key/value store holding machine-wide environment variables.
///
/// Writes mutate shared global state: callers need elevated privileges and
/// must not run two configurers against the same store at once.
pub trait ConfigStore: Send + Sync {
    /// Returns `None` when the value does not exist
    fn get(&self, key: &str) -> ProvisionResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> ProvisionResult<()>;
}

/// In-memory store
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: Mutex::new(
                values
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            read_only: false,
        }
    }

    /// Store that rejects writes like an unelevated process would
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, key: &str) -> ProvisionResult<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ProvisionResult<()> {
        if self.read_only {
            return Err(ProvisionError::environment(format!(
                "Access is denied writing {}",
                key
            )));
        }
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Amends PATH and sets the data prefix in a `ConfigStore`
pub struct EnvironmentConfigurer {
    store: Arc<dyn ConfigStore>,
    install_dir: String,
    data_dir: String,
}

impl EnvironmentConfigurer {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        install_dir: impl Into<String>,
        data_dir: impl Into<String>,
    ) -> Self {
        Self {
            store,
            install_dir: install_dir.into(),
            data_dir: data_dir.into(),
        }
    }

    pub fn configure(&self) -> ProvisionResult<()> {
        match self.apply() {
            Ok(()) => {
                tracing::info!(
                    install_dir = %self.install_dir,
                    data_dir = %self.data_dir,
                    "PATH and TESSDATA_PREFIX configured"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("Error modifying environment variables: {}", e.message);
                Err(e)
            }
        }
    }

    fn apply(&self) -> ProvisionResult<()> {
        let current = self.store.get(PATH_KEY)?.unwrap_or_default();
        if current.contains(char::REPLACEMENT_CHARACTER) {
            // Writing it back would persist the lossy decode over the original
            return Err(ProvisionError::environment(format!(
                "{} was not decoded losslessly, refusing to rewrite it",
                PATH_KEY
            )));
        }

        if let Some(updated) = append_path_entry(&current, &self.install_dir) {
            self.store.set(PATH_KEY, &updated)?;
            tracing::debug!(entry = %self.install_dir, "Appended to PATH");
        } else {
            tracing::debug!(entry = %self.install_dir, "Already on PATH");
        }

        self.store.set(DATA_PREFIX_KEY, &self.data_dir)
    }
}

/// New PATH value with `entry` appended, or `None` if it is already a substring
pub fn append_path_entry(current: &str, entry: &str) -> Option<String> {
    if current.contains(entry) {
        return None;
    }
    if current.is_empty() {
        Some(entry.to_string())
    } else {
        Some(format!("{}{}{}", current, PATH_SEPARATOR, entry))
    }
}
