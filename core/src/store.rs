//! Local Store: durable, synchronous key/value persistence on the device.

use anyhow::Result;
use chrono::NaiveDate;

use crate::db::Database;

/// Scope used for local keys when no identity is known.
pub const DEVICE_SCOPE: &str = "device";

pub trait LocalStore: Send {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
    /// Entries whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>>;
}

impl LocalStore for Database {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.kv_get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.kv_set(key, value)
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        self.kv_scan_prefix(prefix)
    }
}

#[must_use]
pub fn profile_key(scope: &str) -> String {
    format!("profile/{scope}")
}

#[must_use]
pub fn progress_prefix(scope: &str) -> String {
    format!("progress/{scope}/")
}

#[must_use]
pub fn progress_key(scope: &str, date: NaiveDate) -> String {
    format!("{}{}", progress_prefix(scope), date.format("%Y-%m-%d"))
}
