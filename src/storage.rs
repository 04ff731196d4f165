//! Durable file-per-record alert storage.
//!
//! Each alert is written to its own JSON file under the alerts directory,
//! named from the device id, receipt timestamp, and a monotonic sequence
//! number. Writes go to a temp file, are fsynced, and are renamed into
//! place, so concurrent feed readers never observe a torn record. An
//! in-memory tail index (rebuilt once at open) keeps `recent` bounded by
//! `n` instead of rescanning the directory on every poll.

use crate::core::{AlertRecord, AlertStore};
use async_trait::async_trait;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from the persistence medium. Surfaced to the caller as an
/// ingestion failure, never silently swallowed.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("alert storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode alert record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

struct StoreIndex {
    /// Storage keys in append order. The tail of this vec is the feed.
    keys: Vec<String>,
    /// Next sequence number, disambiguates same-second appends.
    seq: u64,
}

/// File-backed implementation of [`AlertStore`].
pub struct FileAlertStore {
    dir: PathBuf,
    index: Arc<Mutex<StoreIndex>>,
}

impl FileAlertStore {
    /// Opens (creating if necessary) the alerts directory and rebuilds the
    /// key index from the files already present, ordered by the timestamp
    /// and sequence embedded in their names.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let mut keys = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("alert_") && name.ends_with(".json") {
                keys.push(name.into_owned());
            }
        }
        keys.sort_by_key(|k| sort_key(k));

        let seq = keys.iter().filter_map(|k| sort_key(k).map(|(_, s)| s)).max();
        let seq = seq.map_or(0, |s| s + 1);
        debug!(dir = %dir.display(), records = keys.len(), "alert store opened");

        Ok(Self {
            dir,
            index: Arc::new(Mutex::new(StoreIndex { keys, seq })),
        })
    }

    /// Number of records currently indexed.
    pub fn len(&self) -> usize {
        self.index.lock().unwrap().keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AlertStore for FileAlertStore {
    async fn append(&self, record: &AlertRecord) -> Result<String, StorageError> {
        let json = serde_json::to_vec_pretty(record)?;
        let dir = self.dir.clone();
        let index = self.index.clone();
        let device = sanitize_device_id(&record.alert.device_id);
        let stamp = record.server_ts.format("%Y%m%d_%H%M%S").to_string();

        tokio::task::spawn_blocking(move || {
            // The index lock serializes appends, so the existence check and
            // the rename below cannot race another append in this process.
            let mut index = index.lock().unwrap();
            let key = loop {
                let key = format!("alert_{}_{}_{:06}.json", device, stamp, index.seq);
                index.seq += 1;
                if !dir.join(&key).exists() {
                    break key;
                }
            };

            let tmp_path = dir.join(format!(".{}.tmp", key));
            let result = (|| -> Result<(), StorageError> {
                let mut file = fs::File::create(&tmp_path)?;
                file.write_all(&json)?;
                // The record must be on stable storage before we acknowledge.
                file.sync_all()?;
                fs::rename(&tmp_path, dir.join(&key))?;
                Ok(())
            })();

            if let Err(e) = result {
                let _ = fs::remove_file(&tmp_path);
                return Err(e);
            }

            index.keys.push(key.clone());
            Ok(key)
        })
        .await?
    }

    async fn recent(&self, n: usize) -> Result<Vec<AlertRecord>, StorageError> {
        let keys: Vec<String> = {
            let index = self.index.lock().unwrap();
            let start = index.keys.len().saturating_sub(n);
            index.keys[start..].to_vec()
        };
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || {
            let mut records = Vec::with_capacity(keys.len());
            for key in keys {
                let bytes = fs::read(dir.join(&key))?;
                match serde_json::from_slice(&bytes) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        warn!(key = %key, error = %e, "unreadable alert record");
                        return Err(e.into());
                    }
                }
            }
            Ok(records)
        })
        .await?
    }
}

/// Replaces filesystem-hostile characters in a device id.
fn sanitize_device_id(device_id: &str) -> String {
    device_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Extracts the `(YYYYmmdd_HHMMSS, sequence)` ordering key embedded in a
/// storage key. Returns `None` for names that do not match the layout.
fn sort_key(name: &str) -> Option<(String, u64)> {
    let stem = name.strip_prefix("alert_")?.strip_suffix(".json")?;
    // The device id may itself contain underscores; parse from the right.
    let mut parts = stem.rsplitn(4, '_');
    let seq = parts.next()?.parse::<u64>().ok()?;
    let hms = parts.next()?;
    let ymd = parts.next()?;
    parts.next()?;
    if ymd.len() != 8 || hms.len() != 6 {
        return None;
    }
    Some((format!("{}_{}", ymd, hms), seq))
}
