//! Ingestion service tests: validation, notification isolation, and the
//! unknown-device skip path.

mod helpers;

use clipwatch::contacts::ContactRegistry;
use clipwatch::core::{AlertPayload, AlertStore};
use clipwatch::ingest::{IngestError, IngestService};
use clipwatch::storage::FileAlertStore;
use helpers::{pc01_registry, RecordingNotifier};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn service(
    registry: ContactRegistry,
    notifier: Arc<RecordingNotifier>,
) -> (IngestService, Arc<FileAlertStore>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileAlertStore::open(dir.path()).unwrap());
    let service = IngestService::new(store.clone(), Arc::new(registry), notifier);
    (service, store, dir)
}

#[tokio::test]
async fn payload_without_device_id_is_rejected_and_not_persisted() {
    let notifier = RecordingNotifier::simulated();
    let (service, store, _dir) = service(pc01_registry(), notifier.clone());

    let result = service.ingest(AlertPayload::for_device("")).await;
    assert!(matches!(result, Err(IngestError::Validation(_))));
    assert!(store.is_empty());
    assert!(notifier.calls().is_empty());
}

#[tokio::test]
async fn ingest_succeeds_even_when_every_notification_fails() {
    let notifier = RecordingNotifier::failing();
    let (service, store, _dir) = service(pc01_registry(), notifier.clone());

    let ack = service
        .ingest(AlertPayload::for_device("PC-01"))
        .await
        .expect("ingest must not fail on notification failure");

    assert_eq!(ack.status, "logged");
    assert!(ack.file.starts_with("alert_PC-01_"));
    assert_eq!(store.recent(10).await.unwrap().len(), 1);

    // Both contacts were still attempted, guardian first.
    assert!(notifier.wait_for_calls(2, Duration::from_secs(2)).await);
    let calls = notifier.calls();
    assert_eq!(calls[0].0, "+911111111111");
    assert_eq!(calls[1].0, "+912222222222");
}

#[tokio::test]
async fn unknown_device_persists_but_dispatches_nothing() {
    let notifier = RecordingNotifier::simulated();
    let (service, store, _dir) = service(ContactRegistry::default(), notifier.clone());

    let ack = service
        .ingest(AlertPayload::for_device("GHOST-9"))
        .await
        .expect("unknown device is a valid skip state");

    assert_eq!(ack.status, "logged");
    assert_eq!(store.recent(10).await.unwrap().len(), 1);

    // Give any stray dispatch task time to run before asserting zero calls.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(notifier.calls().is_empty());
}

#[tokio::test]
async fn message_body_carries_device_reason_location_and_time() {
    let notifier = RecordingNotifier::simulated();
    let (service, _store, _dir) = service(pc01_registry(), notifier.clone());

    let mut payload = AlertPayload::for_device("PC-01");
    payload.reason = Some("SOS_BUTTON".to_string());
    payload.lat = Some(12.9716);
    payload.lon = Some(77.5946);
    service.ingest(payload).await.unwrap();

    assert!(notifier.wait_for_calls(2, Duration::from_secs(2)).await);
    let (_, message) = notifier.calls().remove(0);
    assert!(message.contains("Device: PC-01"));
    assert!(message.contains("Reason: SOS_BUTTON"));
    assert!(message.contains("Location: 12.9716, 77.5946"));
    assert!(message.contains("Time: "));
}

#[test]
fn payload_accepts_firmware_field_aliases() {
    let payload: AlertPayload = serde_json::from_value(serde_json::json!({
        "device_id": "PC-01",
        "alert_type": "FALL_DETECTED",
        "latitude": 12.972,
        "longitude": 77.595,
        "custom_field": "kept"
    }))
    .unwrap();

    assert_eq!(payload.device_id, "PC-01");
    assert_eq!(payload.reason.as_deref(), Some("FALL_DETECTED"));
    assert_eq!(payload.lat, Some(12.972));
    assert_eq!(payload.lon, Some(77.595));
    assert_eq!(
        payload.extra.get("custom_field"),
        Some(&serde_json::Value::String("kept".to_string()))
    );
}

#[test]
fn device_timestamp_is_preserved_but_separate_from_server_time() {
    let payload: AlertPayload = serde_json::from_value(serde_json::json!({
        "deviceID": "PC-01",
        "timestamp": "2020-01-01T00:00:00Z"
    }))
    .unwrap();
    assert_eq!(payload.device_ts.as_deref(), Some("2020-01-01T00:00:00Z"));

    let record = clipwatch::core::AlertRecord::stamp(payload);
    // The server stamp is authoritative and unrelated to the device's claim.
    assert!(record.server_ts.timestamp() > 1_500_000_000);
}
