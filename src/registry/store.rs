//! Bincode-backed registry store.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::RegistryError;

/// File name of the backing store inside the registry directory.
const REGISTRY_FILE: &str = "sensor.reg";

/// Per-entity registration state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    /// Whether the entity has been registered with the remote side.
    pub registered: bool,
    /// Whether the entity is currently disabled.
    pub disabled: bool,
}

/// # Durable per-entity registered/disabled store.
///
/// Records are created implicitly on first write and never deleted except
/// by a full [`Registry::reset`]. Reads never fail: an unknown ID is simply
/// "not registered, not disabled".
pub struct Registry {
    inner: Mutex<Inner>,
}

struct Inner {
    records: HashMap<String, RegistryRecord>,
    file: PathBuf,
}

impl Registry {
    /// Opens the backing store under `dir`, creating the directory if
    /// needed.
    ///
    /// An absent or empty file decodes as an empty map. Any other decode
    /// failure is fatal: continuing with unknown registration state risks
    /// registering entities twice.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let file = dir.join(REGISTRY_FILE);

        let records = match fs::read(&file) {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => bincode::deserialize(&bytes)
                .map_err(|err| RegistryError::Corrupt(err.to_string()))?,
            Err(err) if err.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            inner: Mutex::new(Inner { records, file }),
        })
    }

    /// Deletes the backing store under `dir` entirely.
    ///
    /// Fails with [`RegistryError::NotFound`] if no store exists there.
    pub fn reset(dir: impl AsRef<Path>) -> Result<(), RegistryError> {
        let file = dir.as_ref().join(REGISTRY_FILE);
        match fs::remove_file(&file) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(RegistryError::NotFound(file)),
            Err(err) => Err(err.into()),
        }
    }

    /// Whether `id` has been registered. Unknown IDs read as `false`.
    pub fn is_registered(&self, id: &str) -> bool {
        let inner = self.lock();
        match inner.records.get(id) {
            Some(record) => record.registered,
            None => {
                trace!(entity_id = id, "entity not found in registry");
                false
            }
        }
    }

    /// Whether `id` is disabled. Unknown IDs read as `false`.
    pub fn is_disabled(&self, id: &str) -> bool {
        let inner = self.lock();
        match inner.records.get(id) {
            Some(record) => record.disabled,
            None => {
                trace!(entity_id = id, "entity not found in registry");
                false
            }
        }
    }

    /// Sets the registered flag for `id`, creating the record if needed,
    /// and synchronously rewrites the backing store.
    pub fn set_registered(&self, id: &str, value: bool) -> Result<(), RegistryError> {
        let mut inner = self.lock();
        inner.records.entry(id.to_owned()).or_default().registered = value;
        inner.write()
    }

    /// Sets the disabled flag for `id`, creating the record if needed, and
    /// synchronously rewrites the backing store.
    pub fn set_disabled(&self, id: &str, value: bool) -> Result<(), RegistryError> {
        let mut inner = self.lock();
        inner.records.entry(id.to_owned()).or_default().disabled = value;
        inner.write()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("registry mutex poisoned")
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Registry")
            .field("file", &inner.file)
            .field("records", &inner.records.len())
            .finish()
    }
}

impl Inner {
    /// Rewrites the entire store. Called with the mutex held, so writers
    /// for different IDs cannot interleave.
    fn write(&self) -> Result<(), RegistryError> {
        let bytes = bincode::serialize(&self.records)
            .map_err(|err| RegistryError::Corrupt(err.to_string()))?;
        fs::write(&self.file, bytes)?;
        Ok(())
    }
}
