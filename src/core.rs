//! Core domain types and service traits for ClipWatch
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern component interactions throughout the application.

use crate::storage::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The body of an inbound emergency alert, as reported by a device.
///
/// Field names follow the wire contract (`deviceID`, `lat`, `lon`, ...).
/// Aliases accept the snake_case spellings some device firmware emits
/// (`device_id`, `latitude`, `longitude`, `alert_type`). Unrecognized
/// telemetry fields are preserved verbatim in `extra` so the stored record
/// always contains the full payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AlertPayload {
    /// Identifier of the originating device.
    #[serde(rename = "deviceID", alias = "device_id")]
    pub device_id: String,
    /// Event classification, e.g. "SOS_BUTTON", "FALL_DETECTED".
    #[serde(default, alias = "alert_type", skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// GPS latitude, absent when the device has no fix.
    #[serde(default, alias = "latitude", skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// GPS longitude, absent when the device has no fix.
    #[serde(default, alias = "longitude", skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// Battery percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<f64>,
    /// Heart rate in bpm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hr: Option<f64>,
    /// Raw accelerometer reading, shape is device-dependent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accel: Option<serde_json::Value>,
    /// Device-supplied timestamp. Kept as opaque data, never used for
    /// ordering; `server_ts` is authoritative.
    #[serde(
        default,
        alias = "ts",
        alias = "timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub device_ts: Option<String>,
    /// Any additional payload fields, stored as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AlertPayload {
    /// Creates a minimal payload with only a device id, for tests and
    /// internal tooling.
    pub fn for_device(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            ..Default::default()
        }
    }
}

/// A persisted emergency alert: the device payload plus the server-assigned
/// receipt timestamp that defines the record's position in the feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertRecord {
    #[serde(flatten)]
    pub alert: AlertPayload,
    /// UTC receipt time assigned by the service, serialized as ISO-8601.
    pub server_ts: DateTime<Utc>,
}

impl AlertRecord {
    /// Stamps a payload with the current UTC time.
    pub fn stamp(alert: AlertPayload) -> Self {
        Self {
            alert,
            server_ts: Utc::now(),
        }
    }
}

/// Emergency contacts registered for one device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactEntry {
    /// The pre-registered personal contact for the device's owner.
    pub guardian: String,
    /// The police contact responsible for the device's area.
    pub police: String,
}

/// The outcome of a single notification attempt.
///
/// Delivery problems are values, not errors: the ingestion path never fails
/// because a notification did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The channel accepted the message.
    Delivered,
    /// No channel is configured; the message was written to the log instead.
    Simulated,
    /// The channel rejected the message or did not answer in time.
    Failed(String),
}

// =============================================================================
// Service Traits
// =============================================================================

/// Durable, append-only storage for alert records.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Persists a new record and returns its storage key.
    ///
    /// The record is on stable storage before this returns; an existing
    /// record is never overwritten.
    async fn append(&self, record: &AlertRecord) -> Result<String, StorageError>;

    /// Returns up to `n` of the most recently appended records, oldest
    /// first (most-recent-last). An empty store yields an empty vec.
    async fn recent(&self, n: usize) -> Result<Vec<AlertRecord>, StorageError>;
}

/// Delivers one notification to one contact.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Attempts delivery and reports the outcome. Never returns an error;
    /// all failure modes collapse into `DispatchOutcome::Failed`.
    async fn notify(&self, contact: &str, message: &str) -> DispatchOutcome;
}
