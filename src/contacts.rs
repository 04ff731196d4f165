//! The contact registry: a static device-to-contact lookup table.
//!
//! Loaded once at startup from a JSON file keyed by device id and treated
//! as read-only for the process lifetime. A device missing from the
//! registry is a valid state, not an error; ingestion simply skips
//! notification for it.

use crate::core::ContactEntry;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// Immutable mapping from device id to its guardian and police contacts.
#[derive(Debug, Clone, Default)]
pub struct ContactRegistry {
    entries: HashMap<String, ContactEntry>,
}

impl ContactRegistry {
    /// Loads the registry from a JSON object of the form
    /// `{"PC-01": {"guardian": "+91...", "police": "+91..."}}`.
    ///
    /// A missing or malformed file is a fatal startup error.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read contact mapping {}", path.display()))?;
        let entries: HashMap<String, ContactEntry> = serde_json::from_str(&raw)
            .with_context(|| format!("malformed contact mapping {}", path.display()))?;
        info!(devices = entries.len(), path = %path.display(), "contact registry loaded");
        Ok(Self { entries })
    }

    /// Builds a registry from in-memory entries, for tests.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, ContactEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Looks up the contacts registered for a device. Pure read.
    pub fn resolve(&self, device_id: &str) -> Option<&ContactEntry> {
        self.entries.get(device_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
