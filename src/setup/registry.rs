//! Machine-wide environment store
//!
//! Reads and writes `HKLM\...\Session Manager\Environment` through the
//! registry API. Values are written as REG_EXPAND_SZ so `%VAR%` references
//! inside PATH keep expanding.

use std::io;

use super::environment::ConfigStore;
use crate::error::{ProvisionError, ProvisionResult};

pub const MACHINE_ENVIRONMENT_KEY: &str =
    r"SYSTEM\CurrentControlSet\Control\Session Manager\Environment";

pub struct RegistryStore {
    key: String,
}

impl RegistryStore {
    pub fn machine() -> Self {
        Self {
            key: MACHINE_ENVIRONMENT_KEY.to_string(),
        }
    }
}

#[cfg(windows)]
impl RegistryStore {
    fn open(&self) -> ProvisionResult<winreg::RegKey> {
        use winreg::enums::{HKEY_LOCAL_MACHINE, KEY_READ, KEY_WRITE};

        winreg::RegKey::predef(HKEY_LOCAL_MACHINE)
            .open_subkey_with_flags(&self.key, KEY_READ | KEY_WRITE)
            .map_err(|e| {
                ProvisionError::environment(format!("Cannot open HKLM\\{}: {}", self.key, e))
            })
    }
}

#[cfg(windows)]
impl ConfigStore for RegistryStore {
    fn get(&self, name: &str) -> ProvisionResult<Option<String>> {
        let key = self.open()?;
        value_or_missing(name, key.get_value::<String, _>(name))
    }

    fn set(&self, name: &str, value: &str) -> ProvisionResult<()> {
        use winreg::enums::RegType::REG_EXPAND_SZ;

        let key = self.open()?;
        let data = winreg::RegValue {
            bytes: expand_sz_bytes(value),
            vtype: REG_EXPAND_SZ,
        };
        key.set_raw_value(name, &data).map_err(|e| {
            ProvisionError::environment(format!("Cannot write {}: {}", name, e))
        })
    }
}

#[cfg(not(windows))]
impl ConfigStore for RegistryStore {
    fn get(&self, name: &str) -> ProvisionResult<Option<String>> {
        Err(unsupported(&self.key, name))
    }

    fn set(&self, name: &str, _value: &str) -> ProvisionResult<()> {
        Err(unsupported(&self.key, name))
    }
}

#[cfg(not(windows))]
fn unsupported(key: &str, name: &str) -> ProvisionError {
    ProvisionError::environment(format!(
        "HKLM\\{}\\{} is only available on Windows",
        key, name
    ))
}

/// Map a registry read to the store contract: a missing value is `None`,
/// every other failure is an environment error.
pub fn value_or_missing(name: &str, read: io::Result<String>) -> ProvisionResult<Option<String>> {
    match read {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ProvisionError::environment(format!(
            "Cannot read {}: {}",
            name, e
        ))),
    }
}

/// NUL-terminated UTF-16LE, the wire form of REG_SZ and REG_EXPAND_SZ
pub fn expand_sz_bytes(value: &str) -> Vec<u8> {
    value
        .encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(|unit| unit.to_le_bytes())
        .collect()
}
