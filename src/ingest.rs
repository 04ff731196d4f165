//! The alert ingestion service.
//!
//! Per request: validate the payload, stamp it with the server receipt
//! time, persist it, resolve the device's contacts, and hand the
//! notifications to a background task. The acknowledgement carries the
//! storage key and never waits on (or reflects) notification outcomes.

use crate::contacts::ContactRegistry;
use crate::core::{AlertPayload, AlertRecord, AlertStore, DispatchOutcome, Notifier};
use crate::formatting;
use crate::storage::StorageError;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// The acknowledgement returned for a persisted alert.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IngestAck {
    pub status: String,
    /// The storage key of the persisted record.
    pub file: String,
}

#[derive(Debug, Error)]
pub enum IngestError {
    /// Malformed or incomplete inbound alert; nothing was persisted.
    #[error("invalid alert payload: {0}")]
    Validation(String),
    /// The persistence medium failed; the caller must retry.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Wires the store, registry, and dispatcher into the per-request state
/// machine described on [`IngestService::ingest`].
pub struct IngestService {
    store: Arc<dyn AlertStore>,
    registry: Arc<ContactRegistry>,
    notifier: Arc<dyn Notifier>,
}

impl IngestService {
    pub fn new(
        store: Arc<dyn AlertStore>,
        registry: Arc<ContactRegistry>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            registry,
            notifier,
        }
    }

    /// Ingests one alert: Received → Validated → Stamped → Persisted →
    /// ContactsResolved → Notified | NotifySkipped.
    ///
    /// Persistence failures abort the request before any notification is
    /// attempted. Notification failures never surface here; they are
    /// logged by the background dispatch task.
    pub async fn ingest(&self, payload: AlertPayload) -> Result<IngestAck, IngestError> {
        if payload.device_id.trim().is_empty() {
            metrics::counter!("alerts_rejected").increment(1);
            return Err(IngestError::Validation("missing device id".to_string()));
        }

        let record = AlertRecord::stamp(payload);
        let key = self.store.append(&record).await?;
        metrics::counter!("alerts_received").increment(1);
        info!(
            device = %record.alert.device_id,
            reason = record.alert.reason.as_deref().unwrap_or("UNKNOWN"),
            key = %key,
            "alert persisted"
        );

        match self.registry.resolve(&record.alert.device_id) {
            Some(entry) => {
                let body = formatting::sms_body(&record);
                let notifier = self.notifier.clone();
                let device = record.alert.device_id.clone();
                let contacts = [
                    ("guardian", entry.guardian.clone()),
                    ("police", entry.police.clone()),
                ];
                // Fire-and-forget: the response does not wait on delivery.
                tokio::spawn(async move {
                    for (role, contact) in contacts {
                        let outcome = notifier.notify(&contact, &body).await;
                        match outcome {
                            DispatchOutcome::Delivered => {
                                info!(device = %device, role, to = %contact, "notification delivered");
                            }
                            DispatchOutcome::Simulated => {
                                info!(device = %device, role, to = %contact, "notification simulated");
                            }
                            DispatchOutcome::Failed(reason) => {
                                warn!(device = %device, role, to = %contact, %reason, "notification failed");
                            }
                        }
                    }
                });
            }
            None => {
                debug!(device = %record.alert.device_id, "device has no registered contacts, skipping notification");
            }
        }

        Ok(IngestAck {
            status: "logged".to_string(),
            file: key,
        })
    }
}
